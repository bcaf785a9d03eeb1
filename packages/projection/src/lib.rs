#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reprojection from WGS84 longitude/latitude to the British National Grid.
//!
//! Geographic degrees are not a unit of area: a square degree shrinks
//! towards the poles. Every area this workspace reports is measured after
//! reprojecting to EPSG:27700, a metre-based Transverse Mercator grid, so
//! `unsigned_area()` yields square metres directly.
//!
//! The transform is implemented in pure Rust (Helmert datum shift followed
//! by the Ordnance Survey Transverse Mercator series) so no native PROJ
//! installation is required.

pub mod ellipsoid;
pub mod helmert;
pub mod transverse_mercator;

use geo::{Area, Coord, MapCoords, MultiPolygon};
use thiserror::Error;

use crate::ellipsoid::{AIRY_1830, WGS84};
use crate::helmert::{Helmert, WGS84_TO_OSGB36};
use crate::transverse_mercator::{BRITISH_NATIONAL_GRID, TransverseMercator};

/// Square metres per square kilometre.
const SQ_M_PER_SQ_KM: f64 = 1_000_000.0;

/// Errors that can occur while reprojecting a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// A coordinate component was NaN or infinite.
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// Longitude or easting.
        x: f64,
        /// Latitude or northing.
        y: f64,
    },

    /// The coordinate lies outside the target system's area of use.
    #[error("Coordinate ({x}, {y}) is outside the projection's area of use")]
    OutOfDomain {
        /// Longitude in degrees.
        x: f64,
        /// Latitude in degrees.
        y: f64,
    },
}

/// Longitude/latitude rectangle in which a projection is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfUse {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl AreaOfUse {
    /// Whether `(lon, lat)` in degrees falls inside this area (inclusive).
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

/// EPSG:27700 area of use (United Kingdom, onshore and offshore).
pub const BRITISH_NATIONAL_GRID_AREA: AreaOfUse = AreaOfUse {
    min_lon: -9.01,
    min_lat: 49.75,
    max_lon: 2.01,
    max_lat: 61.01,
};

/// Converts geographic coordinates into a planar, metre-based system.
///
/// Implementations must map each vertex independently so that ring
/// structure and vertex order survive untouched.
pub trait Reprojector {
    /// Projects one `(lon, lat)` coordinate in degrees to `(x, y)` metres.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the coordinate is non-finite or
    /// outside the target system's area of use.
    fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError>;

    /// Projects every vertex of a multi-polygon.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProjectionError`] raised by any vertex.
    fn project_multi_polygon(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, ProjectionError> {
        geometry.try_map_coords(|coord| self.project(coord))
    }

    /// Planar area of a geographic multi-polygon, in square kilometres.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if any vertex fails to project.
    fn area_km2(&self, geometry: &MultiPolygon<f64>) -> Result<f64, ProjectionError> {
        Ok(self.project_multi_polygon(geometry)?.unsigned_area() / SQ_M_PER_SQ_KM)
    }
}

/// WGS84 (EPSG:4326) to British National Grid (EPSG:27700).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsgbReprojector {
    datum_shift: Helmert,
    grid: TransverseMercator,
    area_of_use: AreaOfUse,
}

impl Default for OsgbReprojector {
    fn default() -> Self {
        Self::new()
    }
}

impl OsgbReprojector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            datum_shift: WGS84_TO_OSGB36,
            grid: BRITISH_NATIONAL_GRID,
            area_of_use: BRITISH_NATIONAL_GRID_AREA,
        }
    }

    /// Grid `(easting, northing)` back to WGS84 `(lon, lat)` in degrees.
    ///
    /// Not used for area measurement; handy for building fixtures from
    /// known grid squares. Round trips agree to a few millimetres.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::NonFinite`] for NaN or infinite input.
    pub fn unproject(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        check_finite(coord)?;

        let (lat, lon) = self.grid.inverse(coord.x, coord.y);
        let cartesian = AIRY_1830.to_cartesian(lat, lon);
        let shifted = self.datum_shift.inverse().apply(cartesian);
        let (lat, lon) = WGS84.from_cartesian(shifted);

        Ok(Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        })
    }
}

impl Reprojector for OsgbReprojector {
    fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        check_finite(coord)?;
        if !self.area_of_use.contains(coord.x, coord.y) {
            return Err(ProjectionError::OutOfDomain {
                x: coord.x,
                y: coord.y,
            });
        }

        let cartesian = WGS84.to_cartesian(coord.y.to_radians(), coord.x.to_radians());
        let shifted = self.datum_shift.apply(cartesian);
        let (lat, lon) = AIRY_1830.from_cartesian(shifted);
        let (easting, northing) = self.grid.forward(lat, lon);

        Ok(Coord {
            x: easting,
            y: northing,
        })
    }
}

fn check_finite(coord: Coord<f64>) -> Result<(), ProjectionError> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::NonFinite {
            x: coord.x,
            y: coord.y,
        })
    }
}
