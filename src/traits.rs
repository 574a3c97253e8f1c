//! Host collaborator interfaces
//!
//! The engine never draws anything. It reads the map state through
//! [`MapView`], places images through [`ImageSurface`] and tile grids
//! through [`TileSurface`]. The host reports load completions, view changes
//! and clicks back as [`MapEvent`](crate::input::events::MapEvent)s.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::config::OverlayOptions;
use crate::core::crs::Crs;
use crate::core::geo::{LatLngBounds, Point};
use crate::tiles::TileSource;
use crate::Result;

/// Host-issued identifier of an image placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageHandle(pub u64);

/// Host-issued identifier of a tile grid placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileLayerHandle(pub u64);

/// Read access to the map's current state
pub trait MapView {
    fn bounds(&self) -> LatLngBounds;

    /// Container size in pixels
    fn size(&self) -> Point;

    fn zoom(&self) -> f64;

    /// The map's CRS, if it has one
    fn crs(&self) -> Option<Arc<dyn Crs>>;
}

/// Image overlays the host renders above its base layers.
///
/// `add_image` starts loading asynchronously; the host later reports
/// `ImageLoaded` or `ImageFailed` for the returned handle.
pub trait ImageSurface {
    fn add_image(&mut self, url: &str, bounds: &LatLngBounds, opacity: f32) -> ImageHandle;
    fn remove_image(&mut self, image: ImageHandle);
    fn set_image_opacity(&mut self, image: ImageHandle, opacity: f32);
    fn bring_image_to_front(&mut self, image: ImageHandle);
    fn bring_image_to_back(&mut self, image: ImageHandle);
}

/// Tile grids the host fetches and composites itself
pub trait TileSurface {
    fn add_tile_layer(
        &mut self,
        source: Arc<dyn TileSource>,
        options: &OverlayOptions,
    ) -> TileLayerHandle;

    /// Swap the URL builder, e.g. after parameters changed; the host
    /// should reload visible tiles
    fn set_tile_source(&mut self, layer: TileLayerHandle, source: Arc<dyn TileSource>);
    fn remove_tile_layer(&mut self, layer: TileLayerHandle);
    fn set_tile_opacity(&mut self, layer: TileLayerHandle, opacity: f32);
    fn bring_tiles_to_front(&mut self, layer: TileLayerHandle);
    fn bring_tiles_to_back(&mut self, layer: TileLayerHandle);
}

/// Everything a WMS layer needs from the host map
pub trait MapHost: MapView + ImageSurface + TileSurface {}

impl<T: MapView + ImageSurface + TileSurface> MapHost for T {}

/// Layers that refresh themselves when the map view settles
pub trait ViewportAware {
    fn on_viewport_changed(&mut self, map: &mut dyn MapHost) -> Result<()>;
}
