use serde::{Deserialize, Serialize};

/// A latitude/longitude box in degrees.
///
/// Latitudes are constrained to [-90, 90], longitudes to [-180, 180].
/// Boxes crossing the antimeridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeographicBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Coordinates in range and north/south, east/west ordered.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.north)
            && (-90.0..=90.0).contains(&self.south)
            && (-180.0..=180.0).contains(&self.east)
            && (-180.0..=180.0).contains(&self.west)
            && self.north >= self.south
            && self.east >= self.west
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude <= self.north
            && latitude >= self.south
            && longitude <= self.east
            && longitude >= self.west
    }
}

#[cfg(test)]
mod tests {
    use super::GeographicBounds;

    #[test]
    fn test_valid_bounds() {
        let b = GeographicBounds::new(45.0, 40.0, -70.0, -75.0);
        assert!(b.is_valid());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let b = GeographicBounds::new(95.0, 40.0, -70.0, -75.0);
        assert!(!b.is_valid());
    }

    #[test]
    fn test_inverted_bounds() {
        let b = GeographicBounds::new(40.0, 45.0, -70.0, -75.0);
        assert!(!b.is_valid());
    }

    #[test]
    fn test_contains() {
        let b = GeographicBounds::new(45.0, 40.0, -70.0, -75.0);
        assert!(b.contains(42.0, -72.0));
        assert!(!b.contains(42.0, -60.0));
        assert!(!b.contains(50.0, -72.0));
    }

    #[test]
    fn test_contains_edges() {
        let b = GeographicBounds::new(45.0, 40.0, -70.0, -75.0);
        assert!(b.contains(45.0, -75.0));
        assert!(b.contains(40.0, -70.0));
    }
}
