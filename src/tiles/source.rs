use std::fmt;

use crate::core::geo::TileCoord;

/// Anything that can produce tile URLs for a given coordinate.
///
/// The host's tile grid owns fetching, caching and placement; it only asks
/// the source where each tile lives.
pub trait TileSource: Send + Sync + fmt::Debug {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}
