//! Neighborhood averaging over noise fields.

use crate::noise::NoiseField;

/// Floored mean of the `(2r+1)^2` square neighborhood centered on `(x, y)`.
///
/// Returns `None` when any part of the neighborhood falls outside the field,
/// so border cells never see a partial or empty average.
///
/// # Arguments
/// * `field` - Noise values to average
/// * `x` - Column of the center cell
/// * `y` - Row of the center cell
/// * `radius` - Neighborhood radius (grad)
pub fn neighborhood_elevation(field: &NoiseField, x: u32, y: u32, radius: u8) -> Option<u32> {
    let r = radius as u32;
    if x < r || y < r {
        return None;
    }
    let (x1, y1) = (x as u64 + r as u64, y as u64 + r as u64);
    if x1 >= field.width() as u64 || y1 >= field.height() as u64 {
        return None;
    }

    let width = field.width() as usize;
    let values = field.values();
    let side = 2 * r as usize + 1;

    let mut sum: u64 = 0;
    for row in (y - r) as usize..=y1 as usize {
        let start = row * width + (x - r) as usize;
        sum += values[start..start + side].iter().map(|&v| v as u64).sum::<u64>();
    }

    let members = (side * side) as u64;
    Some((sum / members) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32, height: u32) -> NoiseField {
        let values = (0..width * height).map(|i| (i % 7) as u8).collect();
        NoiseField::from_values(width, height, values).unwrap()
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let field = ramp(5, 4);
        for y in 0..4 {
            for x in 0..5 {
                assert_eq!(
                    neighborhood_elevation(&field, x, y, 0),
                    field.get(x, y).map(u32::from)
                );
            }
        }
    }

    #[test]
    fn test_mean_is_floored() {
        // 3x3 block summing to 13 -> mean 1.44
        let field = NoiseField::from_values(3, 3, vec![1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap();
        assert_eq!(neighborhood_elevation(&field, 1, 1, 1), Some(1));

        let field = NoiseField::from_values(3, 3, vec![2, 2, 2, 2, 9, 2, 2, 2, 2]).unwrap();
        // sum 25 / 9 = 2.77
        assert_eq!(neighborhood_elevation(&field, 1, 1, 1), Some(2));
    }

    #[test]
    fn test_border_cells_are_undefined() {
        let field = ramp(6, 6);
        assert_eq!(neighborhood_elevation(&field, 0, 3, 1), None);
        assert_eq!(neighborhood_elevation(&field, 3, 0, 1), None);
        assert_eq!(neighborhood_elevation(&field, 5, 3, 1), None);
        assert_eq!(neighborhood_elevation(&field, 3, 5, 1), None);
        assert!(neighborhood_elevation(&field, 1, 1, 1).is_some());
        assert!(neighborhood_elevation(&field, 4, 4, 1).is_some());
    }

    #[test]
    fn test_radius_larger_than_field() {
        let field = ramp(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(neighborhood_elevation(&field, x, y, 10), None);
            }
        }
    }

    #[test]
    fn test_uniform_field_average() {
        let field = NoiseField::from_values(9, 9, vec![6; 81]).unwrap();
        assert_eq!(neighborhood_elevation(&field, 4, 4, 4), Some(6));
    }
}
