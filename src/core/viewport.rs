use std::f64::consts::PI;
use std::sync::Arc;

use crate::core::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, TILE_SIZE};
use crate::core::crs::{Crs, Epsg3857};
use crate::core::geo::{LatLng, LatLngBounds, Point, EARTH_RADIUS, MAX_LATITUDE};
use crate::traits::MapView;

/// The current view of the map: center, zoom, screen dimensions and the
/// CRS requests should be made in.
///
/// Screen math uses Web Mercator pixels (256 * 2^zoom across the world);
/// `crs` only decides how bounding boxes are encoded for the server.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    /// Container size in pixels, also the WMS `width`/`height`
    pub size: Point,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// CRS of the map; `None` forces every layer to bring its own
    pub crs: Option<Arc<dyn Crs>>,
}

impl Viewport {
    /// Creates a new viewport in EPSG:3857
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM),
            size,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            crs: Some(Arc::new(Epsg3857)),
        }
    }

    pub fn with_crs(mut self, crs: Option<Arc<dyn Crs>>) -> Self {
        self.crs = crs;
        self
    }

    /// Sets the center of the viewport, clamped to the world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        );
    }

    /// Zoom clamped to `[min_zoom, max_zoom]`
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// World pixel of `lat_lng` at `zoom`, or at the current zoom
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let world = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let meters = lat_lng.to_mercator();
        let half = PI * EARTH_RADIUS;

        Point::new(
            (meters.x + half) / (2.0 * half) * world,
            (half - meters.y) / (2.0 * half) * world,
        )
    }

    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let world = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let half = PI * EARTH_RADIUS;

        LatLng::from_mercator(Point::new(
            pixel.x / world * 2.0 * half - half,
            half - pixel.y / world * 2.0 * half,
        ))
    }

    /// Pixel origin of the layer coordinate space
    pub fn get_pixel_origin(&self) -> Point {
        self.project(&self.center, None).floor()
    }

    /// Container pixel of a position, (0, 0) being the top-left corner
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let layer_point = self.lat_lng_to_layer_point(lat_lng);
        self.layer_point_to_container_point(&layer_point)
    }

    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let layer_point = self.container_point_to_layer_point(pixel);
        self.layer_point_to_lat_lng(&layer_point)
    }

    pub fn lat_lng_to_layer_point(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.get_pixel_origin())
    }

    pub fn layer_point_to_lat_lng(&self, point: &Point) -> LatLng {
        self.unproject(&point.add(&self.get_pixel_origin()), None)
    }

    pub fn layer_point_to_container_point(&self, point: &Point) -> Point {
        point.add(&self.size.multiply(0.5))
    }

    pub fn container_point_to_layer_point(&self, point: &Point) -> Point {
        point.subtract(&self.size.multiply(0.5))
    }

    /// Moves the center by `delta` screen pixels
    pub fn pan(&mut self, delta: Point) {
        let center = self.lat_lng_to_layer_point(&self.center).add(&delta);
        let center = self.layer_point_to_lat_lng(&center);
        self.set_center(center);
    }

    /// Geographic extent of the container
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::from_coords(se.lat, nw.lng, nw.lat, se.lng)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

impl MapView for Viewport {
    fn bounds(&self) -> LatLngBounds {
        Viewport::bounds(self)
    }

    fn size(&self) -> Point {
        self.size
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn crs(&self) -> Option<Arc<dyn Crs>> {
        self.crs.clone()
    }
}
