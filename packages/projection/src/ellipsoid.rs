//! Reference ellipsoids and geodetic/geocentric conversion.

/// Maximum iterations when solving geocentric -> geodetic latitude.
const MAX_LATITUDE_ITERATIONS: usize = 16;

/// A reference ellipsoid described by its semi-axes, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius.
    pub semi_major: f64,
    /// Polar radius.
    pub semi_minor: f64,
}

/// GRS80 / WGS84 ellipsoid.
pub const WGS84: Ellipsoid = Ellipsoid {
    semi_major: 6_378_137.0,
    semi_minor: 6_356_752.314_245,
};

/// Airy 1830 ellipsoid, used by OSGB36.
pub const AIRY_1830: Ellipsoid = Ellipsoid {
    semi_major: 6_377_563.396,
    semi_minor: 6_356_256.909,
};

impl Ellipsoid {
    /// First eccentricity squared.
    #[must_use]
    pub fn eccentricity_squared(&self) -> f64 {
        let a2 = self.semi_major * self.semi_major;
        (a2 - self.semi_minor * self.semi_minor) / a2
    }

    /// Third flattening, `(a - b) / (a + b)`.
    #[must_use]
    pub fn third_flattening(&self) -> f64 {
        (self.semi_major - self.semi_minor) / (self.semi_major + self.semi_minor)
    }

    /// Converts geodetic latitude/longitude (radians, zero height) to
    /// geocentric cartesian coordinates.
    #[must_use]
    pub fn to_cartesian(&self, lat: f64, lon: f64) -> [f64; 3] {
        let e2 = self.eccentricity_squared();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let nu = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        [
            nu * cos_lat * lon.cos(),
            nu * cos_lat * lon.sin(),
            (1.0 - e2) * nu * sin_lat,
        ]
    }

    /// Converts geocentric cartesian coordinates back to geodetic
    /// latitude/longitude in radians. Height is discarded.
    #[must_use]
    pub fn from_cartesian(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.eccentricity_squared();
        let p = x.hypot(y);

        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let sin_lat = lat.sin();
            let nu = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (z + e2 * nu * sin_lat).atan2(p);
            let converged = (next - lat).abs() < 1e-12;
            lat = next;
            if converged {
                break;
            }
        }

        (lat, y.atan2(x))
    }
}
