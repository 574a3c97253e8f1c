//! # maplet-wms
//!
//! WMS overlays for maplet-style interactive maps, modelled on Leaflet's
//! WMS plugins.
//!
//! A [`Source`] manages one WMS endpoint. Any number of [`Layer`] handles
//! toggle sub-layers of that endpoint, and the Source renders every active
//! sub-layer through a single request per map view, either as one
//! dynamically refreshed image ([`Overlay`]) or as a WMS tile grid
//! ([`WmsTileLayer`]). Clicks on the map can be turned into GetFeatureInfo
//! queries against the same endpoint.
//!
//! The host map is reached through the traits in [`traits`]; the engine
//! never renders anything itself.

pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub mod traits;
pub mod ui;
pub mod wms;
pub use crate::core::constants;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public API
pub use core::{
    config::{OverlayOptions, SourceOptions, ZOrder},
    crs::{crs_from_code, Crs, Crs84, Epsg3857, Epsg4326},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    viewport::Viewport,
};

pub use input::events::MapEvent;

pub use layers::{
    layer::Layer,
    overlay::Overlay,
    registry::SourceRegistry,
    source::{IdentifyTask, Renderer, SharedSource, Source},
    tile::{WmsTileLayer, WmsTileSource},
};

pub use tiles::TileSource;

pub use traits::{
    ImageHandle, ImageSurface, MapHost, MapView, TileLayerHandle, TileSurface, ViewportAware,
};

pub use ui::popup::{CursorStyle, Popup, PopupDisplay};

pub use wms::{
    feature_info::{FeatureInfo, FeatureInfoDisplay, FeatureInfoParser, FeatureInfoRequest},
    fetch::{FetchClient, FetchFailure, FetchOutcome, ReqwestFetchClient},
    params::WmsParams,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that reach the caller synchronously.
///
/// Network failures are not errors here: they come back as
/// [`FetchOutcome::Failure`] and are degraded to a fallback.
#[derive(Debug, thiserror::Error)]
pub enum WmsError {
    #[error("No CRS available: set the crs option or give the map a CRS")]
    MissingCrs,

    #[error("Unknown CRS code: {0}")]
    UnknownCrs(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = WmsError;
