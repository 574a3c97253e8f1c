//! Option structs for WMS sources and the layers they render through
//!
//! Options can be built in code with the chainable setters or read from a
//! JSON object in the flat shape Leaflet users write: known keys configure
//! the source and its renderer, every other key becomes a WMS parameter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, TILE_SIZE};
use crate::core::crs::{crs_from_code, Crs};
use crate::wms::params::WmsParams;
use crate::{Result, WmsError};

/// Where a renderer is stacked relative to the host's other overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZOrder {
    #[default]
    Front,
    Back,
}

/// Presentation options shared by the untiled overlay and the tile layer
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// CRS for requests; falls back to the map's CRS when unset
    pub crs: Option<Arc<dyn Crs>>,
    /// Send parameter names in upper case
    pub uppercase: bool,
    pub attribution: Option<String>,
    pub opacity: f32,
    pub z_order: ZOrder,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Tile edge in pixels, tiled mode only
    pub tile_size: u32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            crs: None,
            uppercase: false,
            attribution: None,
            opacity: 1.0,
            z_order: ZOrder::Front,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            tile_size: TILE_SIZE,
        }
    }
}

impl OverlayOptions {
    pub fn with_crs(mut self, crs: Arc<dyn Crs>) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }

    pub fn attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn z_order(mut self, z_order: ZOrder) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Whether a request may be issued at this zoom level
    pub fn zoom_in_range(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom && zoom <= self.max_zoom
    }
}

/// Options for a [`Source`](crate::layers::source::Source)
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Render through one image per view instead of a tile grid
    pub untiled: bool,
    /// Answer map clicks with GetFeatureInfo
    pub identify: bool,
    /// Layers queried on identify; defaults to the active sub-layers
    pub identify_layers: Option<Vec<String>>,
    pub overlay: OverlayOptions,
    /// Extra WMS parameters merged over the protocol defaults
    pub params: WmsParams,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            untiled: true,
            identify: true,
            identify_layers: None,
            overlay: OverlayOptions::default(),
            params: WmsParams::new(),
        }
    }
}

impl SourceOptions {
    pub fn tiled(mut self, tiled: bool) -> Self {
        self.untiled = !tiled;
        self
    }

    pub fn identify(mut self, identify: bool) -> Self {
        self.identify = identify;
        self
    }

    pub fn identify_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identify_layers = Some(layers.into_iter().map(Into::into).collect());
        self
    }

    pub fn overlay(mut self, overlay: OverlayOptions) -> Self {
        self.overlay = overlay;
        self
    }

    /// Adds a WMS parameter such as `format` or `transparent`
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Reads options from a flat JSON object.
    ///
    /// Scalar values of unknown keys become WMS parameters (`true` becomes
    /// `"true"`, numbers use their JSON text); `null` values are ignored.
    pub fn from_json(value: Value) -> Result<Self> {
        let raw: RawOptions = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    /// Same as [`from_json`](Self::from_json) for an options string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawOptions = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawOptions) -> Result<Self> {
        let defaults = OverlayOptions::default();
        let z_order = match raw.is_back {
            Some(true) => ZOrder::Back,
            _ => ZOrder::Front,
        };

        let overlay = OverlayOptions {
            crs: raw.crs.as_deref().map(crs_from_code).transpose()?,
            uppercase: raw.uppercase.unwrap_or(defaults.uppercase),
            attribution: raw.attribution,
            opacity: raw.opacity.unwrap_or(defaults.opacity).clamp(0.0, 1.0),
            z_order,
            min_zoom: raw.min_zoom.unwrap_or(defaults.min_zoom),
            max_zoom: raw.max_zoom.unwrap_or(defaults.max_zoom),
            tile_size: raw.tile_size.unwrap_or(defaults.tile_size),
        };

        let mut params = WmsParams::new();
        for (key, value) in raw.params {
            if let Some(value) = param_value(&key, &value)? {
                params.set(key, value);
            }
        }

        let untiled = match raw.tiled {
            Some(true) => false,
            _ => raw.untiled.unwrap_or(true),
        };

        Ok(Self {
            untiled,
            identify: raw.identify.unwrap_or(true),
            identify_layers: raw.identify_layers,
            overlay,
            params,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawOptions {
    untiled: Option<bool>,
    tiled: Option<bool>,
    identify: Option<bool>,
    identify_layers: Option<Vec<String>>,
    crs: Option<String>,
    uppercase: Option<bool>,
    attribution: Option<String>,
    opacity: Option<f32>,
    is_back: Option<bool>,
    min_zoom: Option<f64>,
    max_zoom: Option<f64>,
    tile_size: Option<u32>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

fn param_value(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(WmsError::InvalidOption(format!(
            "WMS parameter '{key}' must be a string, number or boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = SourceOptions::default();
        assert!(options.untiled);
        assert!(options.identify);
        assert!(options.identify_layers.is_none());
        assert_eq!(options.overlay.opacity, 1.0);
        assert_eq!(options.overlay.z_order, ZOrder::Front);
        assert!(options.params.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let options = SourceOptions::default()
            .tiled(true)
            .identify(false)
            .identify_layers(["roads"])
            .param("format", "image/png")
            .overlay(OverlayOptions::default().opacity(2.0).z_order(ZOrder::Back));

        assert!(!options.untiled);
        assert!(!options.identify);
        assert_eq!(options.identify_layers, Some(vec!["roads".to_string()]));
        assert_eq!(options.params.get("format"), Some("image/png"));
        assert_eq!(options.overlay.opacity, 1.0);
        assert_eq!(options.overlay.z_order, ZOrder::Back);
    }

    #[test]
    fn test_from_json_splits_options_and_params() {
        let options = SourceOptions::from_json(json!({
            "format": "image/png",
            "transparent": true,
            "version": "1.3.0",
            "info_format": "text/html",
            "tiled": true,
            "crs": "EPSG:4326",
            "opacity": 0.5,
            "is_back": true,
            "attribution": "Weather data © NOAA",
            "max_zoom": 12,
            "dpi": 96,
            "time": null
        }))
        .unwrap();

        assert!(!options.untiled);
        assert_eq!(options.overlay.crs.as_ref().map(|c| c.code()), Some("EPSG:4326"));
        assert_eq!(options.overlay.opacity, 0.5);
        assert_eq!(options.overlay.z_order, ZOrder::Back);
        assert_eq!(options.overlay.max_zoom, 12.0);
        assert_eq!(options.overlay.attribution.as_deref(), Some("Weather data © NOAA"));

        assert_eq!(options.params.get("format"), Some("image/png"));
        assert_eq!(options.params.get("transparent"), Some("true"));
        assert_eq!(options.params.get("version"), Some("1.3.0"));
        assert_eq!(options.params.get("info_format"), Some("text/html"));
        assert_eq!(options.params.get("dpi"), Some("96"));
        assert_eq!(options.params.get("time"), None);
        assert_eq!(options.params.get("opacity"), None);
        assert_eq!(options.params.get("tiled"), None);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            SourceOptions::from_json(json!({ "crs": "EPSG:999999" })),
            Err(WmsError::UnknownCrs(_))
        ));
        assert!(matches!(
            SourceOptions::from_json(json!({ "styles": ["a", "b"] })),
            Err(WmsError::InvalidOption(_))
        ));
        assert!(matches!(
            SourceOptions::from_json_str("{ not json"),
            Err(WmsError::Serialization(_))
        ));
    }

    #[test]
    fn test_zoom_in_range_is_inclusive() {
        let options = OverlayOptions::default().zoom_range(3.0, 10.0);
        assert!(options.zoom_in_range(3.0));
        assert!(options.zoom_in_range(10.0));
        assert!(!options.zoom_in_range(2.9));
        assert!(!options.zoom_in_range(10.5));
    }
}
