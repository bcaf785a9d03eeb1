//! Seven-parameter Helmert datum shift between geocentric frames.

/// Helmert transformation parameters.
///
/// Translations are in metres, scale in parts per million and rotations in
/// arc-seconds (position-vector convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub scale_ppm: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

/// WGS84 -> OSGB36, as published by Ordnance Survey.
///
/// Accurate to a few metres, which is far below what matters when summing
/// woodland areas.
pub const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    scale_ppm: 20.4894,
    rx: -0.1502,
    ry: -0.2470,
    rz: -0.8421,
};

impl Helmert {
    /// Approximate inverse transformation (all parameters negated).
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            scale_ppm: -self.scale_ppm,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
        }
    }

    /// Applies the shift to a geocentric cartesian position.
    #[must_use]
    pub fn apply(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let s = 1.0 + self.scale_ppm * 1e-6;
        let rx = (self.rx / 3600.0).to_radians();
        let ry = (self.ry / 3600.0).to_radians();
        let rz = (self.rz / 3600.0).to_radians();

        [
            self.tx + s * x - rz * y + ry * z,
            self.ty + rz * x + s * y - rx * z,
            self.tz - ry * x + rx * y + s * z,
        ]
    }
}
