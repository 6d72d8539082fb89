//! Uniform random noise fields.

use rand::Rng;
use thiserror::Error;

/// Errors that can occur while building a noise field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoiseError {
    #[error("Invalid noise range: max ({max}) < min ({min})")]
    InvalidRange { min: u8, max: u8 },
    #[error("Invalid noise field dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Noise field needs {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A rectangular grid of independently drawn integers.
///
/// Values are stored in row-major order and never change after the field is
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseField {
    width: u32,
    height: u32,
    min: u8,
    max: u8,
    values: Vec<u8>,
}

impl NoiseField {
    /// Draws a new field where every cell is uniform in `[min, max]`.
    ///
    /// # Arguments
    /// * `rng` - Generator to draw from; the caller owns seeding
    /// * `width` - Number of columns
    /// * `height` - Number of rows
    /// * `min` - Inclusive lower bound
    /// * `max` - Inclusive upper bound
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        width: u32,
        height: u32,
        min: u8,
        max: u8,
    ) -> Result<Self, NoiseError> {
        if max < min {
            return Err(NoiseError::InvalidRange { min, max });
        }
        check_dimensions(width, height)?;

        let len = width as usize * height as usize;
        let values: Vec<u8> = (0..len).map(|_| rng.gen_range(min..=max)).collect();

        tracing::debug!(width, height, min, max, "generated noise field");

        Ok(Self {
            width,
            height,
            min,
            max,
            values,
        })
    }

    /// Builds a field from explicit row-major values.
    ///
    /// The recorded bounds are the observed min/max of `values`.
    pub fn from_values(width: u32, height: u32, values: Vec<u8>) -> Result<Self, NoiseError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(NoiseError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }

        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);

        Ok(Self {
            width,
            height,
            min,
            max,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Inclusive `(min, max)` bounds of the field.
    pub fn range(&self) -> (u8, u8) {
        (self.min, self.max)
    }

    /// Returns the value at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.values[y as usize * self.width as usize + x as usize])
    }

    /// Row-major view of all values.
    pub fn values(&self) -> &[u8] {
        &self.values
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), NoiseError> {
    if width == 0 || height == 0 {
        return Err(NoiseError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_values_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let field = NoiseField::generate(&mut rng, 32, 24, 3, 9).unwrap();

        assert_eq!(field.values().len(), 32 * 24);
        assert!(field.values().iter().all(|&v| (3..=9).contains(&v)));
        assert_eq!(field.range(), (3, 9));
    }

    #[test]
    fn test_full_range_is_reachable() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let field = NoiseField::generate(&mut rng, 64, 64, 0, 4).unwrap();

        for v in 0..=4u8 {
            assert!(field.values().contains(&v), "value {} never drawn", v);
        }
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let field = NoiseField::generate(&mut rng, 5, 5, 6, 6).unwrap();
        assert!(field.values().iter().all(|&v| v == 6));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = NoiseField::generate(&mut rng, 4, 4, 10, 2).unwrap_err();
        assert_eq!(err, NoiseError::InvalidRange { min: 10, max: 2 });
    }

    #[test]
    fn test_rejects_empty_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            NoiseField::generate(&mut rng, 0, 4, 0, 1),
            Err(NoiseError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = NoiseField::generate(&mut ChaCha8Rng::seed_from_u64(99), 16, 16, 0, 16).unwrap();
        let b = NoiseField::generate(&mut ChaCha8Rng::seed_from_u64(99), 16, 16, 0, 16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_values_and_lookup() {
        let field = NoiseField::from_values(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(field.get(0, 0), Some(1));
        assert_eq!(field.get(2, 1), Some(6));
        assert_eq!(field.get(3, 0), None);
        assert_eq!(field.get(0, 2), None);
        assert_eq!(field.range(), (1, 6));
    }

    #[test]
    fn test_from_values_length_mismatch() {
        let err = NoiseField::from_values(3, 3, vec![0; 4]).unwrap_err();
        assert_eq!(err, NoiseError::LengthMismatch { expected: 9, actual: 4 });
    }
}
