//! Transverse Mercator projection using the Ordnance Survey series
//! expansions (accurate to well under a millimetre within the grid).

use crate::ellipsoid::{AIRY_1830, Ellipsoid};

/// Maximum iterations when inverting the meridional arc.
const MAX_ARC_ITERATIONS: usize = 64;

/// A Transverse Mercator grid definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Scale factor on the central meridian.
    pub scale_factor: f64,
    /// Latitude of the true origin, in degrees.
    pub origin_lat_deg: f64,
    /// Longitude of the true origin (central meridian), in degrees.
    pub origin_lon_deg: f64,
    /// Easting of the true origin, in metres.
    pub false_easting: f64,
    /// Northing of the true origin, in metres.
    pub false_northing: f64,
}

/// Ordnance Survey National Grid (EPSG:27700) on OSGB36.
pub const BRITISH_NATIONAL_GRID: TransverseMercator = TransverseMercator {
    ellipsoid: AIRY_1830,
    scale_factor: 0.999_601_271_7,
    origin_lat_deg: 49.0,
    origin_lon_deg: -2.0,
    false_easting: 400_000.0,
    false_northing: -100_000.0,
};

/// Radii of curvature at a latitude, already scaled by `F0`.
struct Curvature {
    nu: f64,
    rho: f64,
    eta2: f64,
}

impl TransverseMercator {
    fn curvature(&self, lat: f64) -> Curvature {
        let a = self.ellipsoid.semi_major * self.scale_factor;
        let e2 = self.ellipsoid.eccentricity_squared();
        let sin2 = lat.sin().powi(2);
        let nu = a / (1.0 - e2 * sin2).sqrt();
        let rho = a * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);

        Curvature {
            nu,
            rho,
            eta2: nu / rho - 1.0,
        }
    }

    /// Developed meridional arc from the origin latitude to `lat`.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let n = self.ellipsoid.third_flattening();
        let (n2, n3) = (n * n, n * n * n);
        let lat0 = self.origin_lat_deg.to_radians();
        let d = lat - lat0;
        let s = lat + lat0;

        let ma = (1.0 + n + 1.25 * n2 + 1.25 * n3) * d;
        let mb = (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos();
        let mc = (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * d).sin() * (2.0 * s).cos();
        let md = 35.0 / 24.0 * n3 * (3.0 * d).sin() * (3.0 * s).cos();

        self.ellipsoid.semi_minor * self.scale_factor * (ma - mb + mc - md)
    }

    /// Projects latitude/longitude (radians, on this grid's ellipsoid) to
    /// `(easting, northing)` in metres.
    #[must_use]
    pub fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let Curvature { nu, rho, eta2 } = self.curvature(lat);
        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan2 = lat.tan().powi(2);
        let tan4 = tan2 * tan2;
        let cos3 = cos_lat.powi(3);
        let cos5 = cos_lat.powi(5);

        let i = self.meridional_arc(lat) + self.false_northing;
        let ii = nu / 2.0 * sin_lat * cos_lat;
        let iii = nu / 24.0 * sin_lat * cos3 * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin_lat * cos5 * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos_lat;
        let v = nu / 6.0 * cos3 * (nu / rho - tan2);
        let vi = nu / 120.0
            * cos5
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let dl = lon - self.origin_lon_deg.to_radians();
        let (dl2, dl3) = (dl * dl, dl * dl * dl);

        let northing = i + ii * dl2 + iii * dl2 * dl2 + iiia * dl3 * dl3;
        let easting = self.false_easting + iv * dl + v * dl3 + vi * dl3 * dl2;

        (easting, northing)
    }

    /// Inverse of [`Self::forward`]: `(easting, northing)` in metres to
    /// latitude/longitude in radians.
    #[must_use]
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let a = self.ellipsoid.semi_major * self.scale_factor;
        let dn = northing - self.false_northing;

        let mut lat = self.origin_lat_deg.to_radians();
        let mut arc = 0.0;
        for _ in 0..MAX_ARC_ITERATIONS {
            lat += (dn - arc) / a;
            arc = self.meridional_arc(lat);
            if (dn - arc).abs() < 1e-5 {
                break;
            }
        }

        let Curvature { nu, rho, eta2 } = self.curvature(lat);
        let cos_lat = lat.cos();
        let tan = lat.tan();
        let (tan2, tan4) = (tan * tan, tan.powi(4));
        let tan6 = tan4 * tan2;

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = 1.0 / (cos_lat * nu);
        let xi = 1.0 / (cos_lat * 6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
        let xii = 1.0 / (cos_lat * 120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xiia = 1.0 / (cos_lat * 5040.0 * nu.powi(7))
            * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

        let de = easting - self.false_easting;
        let (de2, de3) = (de * de, de * de * de);

        let out_lat = lat - vii * de2 + viii * de2 * de2 - ix * de3 * de3;
        let out_lon = self.origin_lon_deg.to_radians() + x * de - xi * de3 + xii * de3 * de2
            - xiia * de3 * de2 * de2;

        (out_lat, out_lon)
    }
}
