//! Coordinate reference systems as far as a WMS request cares about them:
//! an identifier for the `srs`/`crs` parameter, a projection into the units
//! `bbox` is expressed in, and the axis order WMS 1.3 expects.

use std::fmt;
use std::sync::Arc;

use crate::core::geo::{LatLng, LatLngBounds, Point, TileCoord};
use crate::{Result, WmsError};

pub trait Crs: Send + Sync + fmt::Debug {
    /// Identifier sent to the server, e.g. `EPSG:3857`
    fn code(&self) -> &str;

    /// Projects a geographic coordinate into this CRS's native units
    fn project(&self, lat_lng: &LatLng) -> Point;

    /// Whether WMS 1.3 expects latitude before longitude for this CRS
    fn is_lat_lon(&self) -> bool {
        false
    }

    /// Geographic extent of a tile in this CRS's tile grid
    fn tile_bounds(&self, coord: TileCoord) -> LatLngBounds {
        coord.bounds()
    }
}

/// Spherical Mercator, the default for web maps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg3857;

impl Crs for Epsg3857 {
    fn code(&self) -> &str {
        "EPSG:3857"
    }

    fn project(&self, lat_lng: &LatLng) -> Point {
        lat_lng.to_mercator()
    }
}

/// WGS 84 geographic coordinates. Registered with lat/lon axis order, so
/// WMS 1.3 servers expect `bbox` as south,west,north,east.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg4326;

impl Crs for Epsg4326 {
    fn code(&self) -> &str {
        "EPSG:4326"
    }

    fn project(&self, lat_lng: &LatLng) -> Point {
        Point::new(lat_lng.lng, lat_lng.lat)
    }

    fn is_lat_lon(&self) -> bool {
        true
    }

    // Equirectangular grid: two tiles across and one down at zoom 0.
    fn tile_bounds(&self, coord: TileCoord) -> LatLngBounds {
        let span = 180.0 / 2_f64.powi(coord.z as i32);
        let west = -180.0 + coord.x as f64 * span;
        let north = 90.0 - coord.y as f64 * span;
        LatLngBounds::from_coords(north - span, west, north, west + span)
    }
}

/// OGC CRS:84, WGS 84 with longitude first in every WMS version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crs84;

impl Crs for Crs84 {
    fn code(&self) -> &str {
        "CRS:84"
    }

    fn project(&self, lat_lng: &LatLng) -> Point {
        Point::new(lat_lng.lng, lat_lng.lat)
    }

    fn tile_bounds(&self, coord: TileCoord) -> LatLngBounds {
        Epsg4326.tile_bounds(coord)
    }
}

/// Resolves a CRS identifier such as `EPSG:4326` (case-insensitive)
pub fn crs_from_code(code: &str) -> Result<Arc<dyn Crs>> {
    match code.trim().to_uppercase().as_str() {
        "EPSG:3857" | "EPSG:900913" | "EPSG:102100" | "EPSG:102113" => Ok(Arc::new(Epsg3857)),
        "EPSG:4326" => Ok(Arc::new(Epsg4326)),
        "CRS:84" | "OGC:CRS84" => Ok(Arc::new(Crs84)),
        _ => Err(WmsError::UnknownCrs(code.to_string())),
    }
}
