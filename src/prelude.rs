//! Prelude module for common maplet-wms types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_wms::prelude::*;`

pub use crate::core::{
    config::{OverlayOptions, SourceOptions, ZOrder},
    crs::{crs_from_code, Crs, Crs84, Epsg3857, Epsg4326},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    viewport::Viewport,
};

pub use crate::input::events::MapEvent;

pub use crate::layers::{
    IdentifyTask, Layer, Overlay, Renderer, SharedSource, Source, SourceRegistry, WmsTileLayer,
    WmsTileSource,
};

pub use crate::tiles::TileSource;

pub use crate::traits::{
    ImageHandle, ImageSurface, MapHost, MapView, TileLayerHandle, TileSurface, ViewportAware,
};

pub use crate::ui::popup::{CursorStyle, Popup, PopupDisplay};

pub use crate::wms::{
    FeatureInfo, FeatureInfoDisplay, FeatureInfoParser, FeatureInfoRequest, FetchClient,
    FetchFailure, FetchOutcome, ReqwestFetchClient, WmsParams,
};

pub use crate::{Error as WmsError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
