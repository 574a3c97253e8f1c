//! Core constants derived from the WMS 1.1.1/1.3.0 conventions and Leaflet's
//! layer defaults. Keeping them in a single place makes the defaults easy to
//! audit against a server's capabilities document.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Zoom range an overlay renders in unless configured otherwise.
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 18.0;

/// Protocol version requested when the caller does not pick one.
pub const DEFAULT_WMS_VERSION: &str = "1.1.1";

/// Image format requested when the caller does not pick one.
pub const DEFAULT_FORMAT: &str = "image/jpeg";

/// From this version on the projection parameter is `crs` (not `srs`) and
/// geographic CRSs use lat/lon axis order in `bbox`.
pub const AXIS_ORDER_VERSION: f64 = 1.3;

/// User agent sent with GetFeatureInfo requests.
pub const USER_AGENT: &str = concat!("maplet-wms/", env!("CARGO_PKG_VERSION"));
