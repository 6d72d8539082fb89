//! Planetgen CLI - Procedural planet bitmap generator.
//!
//! Writes a disc of ocean and land on a starfield as a 24-bit BMP, and
//! patches cloud cover onto existing maps.

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

use planetgen::clouds::{overlay_clouds, CloudConfig};
use planetgen::config::PlanetConfig;
use planetgen::export::{
    expected_file_size, read_header, read_header_with_len, row_padding, BitmapHeader,
    BitmapOptions, SizeFields,
};
use planetgen::pipeline::RenderTarget;
use planetgen::terrain::{planet_radius, PixelClass, TerrainConfig};

/// Procedural planet bitmap generator.
#[derive(Parser)]
#[command(name = "planetgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new planet map.
    Generate {
        /// Grid width and height in pixels.
        #[arg(short = 'n', long, default_value = "127", conflicts_with = "config")]
        size: u32,

        /// Grid width, overriding --size.
        #[arg(long, conflicts_with = "config")]
        width: Option<u32>,

        /// Grid height, overriding --size.
        #[arg(long, conflicts_with = "config")]
        height: Option<u32>,

        /// Upper bound of the terrain noise (lower bound is 0).
        #[arg(long, default_value = "16", conflicts_with = "config")]
        noise_max: u8,

        /// Smoothed elevations at or below this are ocean.
        #[arg(long, default_value = "7", conflicts_with = "config")]
        sea_level: u8,

        /// Neighborhood radius used for smoothing.
        #[arg(long, default_value = "8", conflicts_with = "config")]
        radius: u8,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output bitmap path.
        #[arg(short, long, default_value = "map.bmp")]
        output: PathBuf,

        /// Resolution recorded in the header, in dots per inch.
        #[arg(long, default_value = "0", conflicts_with = "config")]
        dpi: f32,

        /// Write the true file and image sizes into the header.
        #[arg(long, conflicts_with = "config")]
        exact_size_fields: bool,

        /// Overlay clouds after the terrain is written.
        #[arg(long, conflicts_with = "config")]
        clouds: bool,

        /// Upper bound of the cloud noise.
        #[arg(long, default_value = "16", conflicts_with = "config")]
        cloud_max: u8,

        /// Smoothed cloud values above this draw a cloud.
        #[arg(long, default_value = "9", conflicts_with = "config")]
        cloud_level: u8,

        /// Neighborhood radius used for cloud smoothing.
        #[arg(long, default_value = "3", conflicts_with = "config")]
        cloud_radius: u8,

        /// JSON run description; cannot be combined with the terrain and cloud flags.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Draw a fresh cloud layer onto an existing map.
    Overlay {
        /// Bitmap written by `generate`.
        path: PathBuf,

        /// Upper bound of the cloud noise.
        #[arg(long, default_value = "16")]
        cloud_max: u8,

        /// Smoothed cloud values above this draw a cloud.
        #[arg(long, default_value = "9")]
        cloud_level: u8,

        /// Neighborhood radius used for cloud smoothing.
        #[arg(long, default_value = "3")]
        cloud_radius: u8,

        /// Random seed for reproducible clouds.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Classic form: terrain then clouds on a square grid.
    Run {
        size: u32,
        noise_max: u8,
        sea_level: u8,
        radius: u8,
        cloud_max: u8,
        cloud_level: u8,
        cloud_radius: u8,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output bitmap path.
        #[arg(short, long, default_value = "map.bmp")]
        output: PathBuf,
    },

    /// Display the header of a map, or the layout of a grid size.
    Info {
        /// Existing bitmap to inspect.
        path: Option<PathBuf>,

        /// Grid size to describe when no path is given.
        #[arg(short = 'n', long, default_value = "127")]
        size: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            size,
            width,
            height,
            noise_max,
            sea_level,
            radius,
            seed,
            output,
            dpi,
            exact_size_fields,
            clouds,
            cloud_max,
            cloud_level,
            cloud_radius,
            config,
        } => {
            let planet = match config {
                Some(path) => PlanetConfig::from_json_file(&path).unwrap_or_else(|e| {
                    eprintln!("Error loading {}: {}", path.display(), e);
                    std::process::exit(1);
                }),
                None => {
                    let width = width.unwrap_or(size);
                    let height = height.unwrap_or(size);
                    let terrain = TerrainConfig {
                        width,
                        height,
                        noise_max,
                        sea_level,
                        smoothing_radius: radius,
                        dpi,
                        size_fields: if exact_size_fields {
                            SizeFields::Exact
                        } else {
                            SizeFields::Legacy
                        },
                    };
                    let clouds = clouds.then(|| CloudConfig {
                        width,
                        height,
                        noise_max: cloud_max,
                        cloud_level,
                        smoothing_radius: cloud_radius,
                    });
                    PlanetConfig { seed: None, terrain, clouds }
                }
            };
            run_generate(planet, seed, &output);
        }
        Commands::Overlay {
            path,
            cloud_max,
            cloud_level,
            cloud_radius,
            seed,
        } => {
            run_overlay(&path, cloud_max, cloud_level, cloud_radius, seed);
        }
        Commands::Run {
            size,
            noise_max,
            sea_level,
            radius,
            cloud_max,
            cloud_level,
            cloud_radius,
            seed,
            output,
        } => {
            let planet = PlanetConfig {
                seed: None,
                terrain: TerrainConfig::square(size).with_levels(noise_max, sea_level, radius),
                clouds: Some(CloudConfig::square(size).with_levels(cloud_max, cloud_level, cloud_radius)),
            };
            run_generate(planet, seed, &output);
        }
        Commands::Info { path, size } => match path {
            Some(path) => run_info_file(&path),
            None => run_info_size(size),
        },
    }
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    })
}

fn run_generate(planet: PlanetConfig, seed: Option<u64>, output: &Path) {
    if let Err(e) = planet.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // The command-line seed wins over the one in a config file.
    let seed = resolve_seed(seed.or(planet.seed));
    let terrain = &planet.terrain;

    println!("Planetgen - Procedural Planet Generator");
    println!("=======================================");
    println!("Grid: {}x{}", terrain.width, terrain.height);
    println!(
        "Noise: [0, {}], sea level {}, radius {}",
        terrain.noise_max, terrain.sea_level, terrain.smoothing_radius
    );
    println!("Planet radius: {}", terrain.planet_radius());
    println!("Seed: {}", seed);
    println!("Output: {}", output.display());

    let start = Instant::now();
    let pipeline = planet.pipeline();
    let mut target = RenderTarget::new(output, seed);

    println!("\nRunning generation pipeline...");
    pipeline
        .run_with_callbacks(
            &mut target,
            |name, i, total| {
                println!("  [{}/{}] Starting: {}", i + 1, total, name);
            },
            |name, i, total| {
                println!("  [{}/{}] Completed: {}", i + 1, total, name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during generation: {}", e);
            std::process::exit(1);
        });

    if let Some(buffer) = &target.terrain {
        println!("\nTerrain:");
        println!("  Ocean: {:>8} pixels", buffer.count(PixelClass::Ocean));
        println!("  Land:  {:>8} pixels", buffer.count(PixelClass::Land));
        println!("  Stars: {:>8} pixels", buffer.count(PixelClass::Star));
    }
    if let Some(stats) = &target.clouds {
        println!("Clouds:");
        println!("  Thin:  {:>8} pixels", stats.thin);
        println!("  Thick: {:>8} pixels", stats.thick);
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_overlay(path: &Path, cloud_max: u8, cloud_level: u8, cloud_radius: u8, seed: Option<u64>) {
    let header = read_header(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let (width, height) = header.dimensions();
    let seed = resolve_seed(seed);

    println!("Overlaying clouds on {} ({}x{}, seed {})", path.display(), width, height, seed);

    let config = CloudConfig {
        width,
        height,
        noise_max: cloud_max,
        cloud_level,
        smoothing_radius: cloud_radius,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let start = Instant::now();
    let stats = overlay_clouds(path, &config, &mut rng).unwrap_or_else(|e| {
        eprintln!("Error during overlay: {}", e);
        std::process::exit(1);
    });

    println!("  Cleared: {:>8} pixels", stats.cleared);
    println!("  Thin:    {:>8} pixels", stats.thin);
    println!("  Thick:   {:>8} pixels", stats.thick);
    println!("Completed in {:.2?}", start.elapsed());
}

fn run_info_file(path: &Path) {
    let (header, actual) = read_header_with_len(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let (width, height) = header.dimensions();

    println!("Planetgen - Bitmap Info");
    println!("=======================");
    println!("Path:           {}", path.display());
    println!("Dimensions:     {}x{}", width, height);
    println!("Bits per pixel: {}", header.bit_count);
    println!("Pixel offset:   {}", header.pixel_offset);
    println!("Size field:     {:>10} bytes", header.file_size);
    println!("Image size:     {:>10} bytes", header.image_size);
    println!("File length:    {:>10} bytes", actual);
    println!("Resolution:     {} x {} pixels/meter", header.x_ppm, header.y_ppm);
    if u64::from(header.file_size) != actual {
        println!("Note: header size field differs from the file length");
    }
}

fn run_info_size(size: u32) {
    let header = BitmapHeader::new(size, size, &BitmapOptions::default()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let pixels = size as u64 * size as u64;
    let exact = expected_file_size(size, size);

    println!("Planetgen - Grid Info");
    println!("=====================");
    println!();
    println!("Grid: {}x{} ({} pixels)", size, size, pixels);
    println!("Planet radius: {}", planet_radius(size, size));
    println!("Row padding: {} bytes", row_padding(size));
    println!();
    println!("File sizes:");
    println!("  On disk:            {:>10} bytes", exact);
    println!("  Legacy size field:  {:>10} bytes", header.file_size);
}
