//! WMS request parameters: defaults, version handling, `bbox` encoding and
//! query-string assembly.

use std::sync::Arc;

use reqwest::Url;

use crate::core::constants::{AXIS_ORDER_VERSION, DEFAULT_FORMAT, DEFAULT_WMS_VERSION};
use crate::core::crs::Crs;
use crate::core::geo::{LatLngBounds, Point};
use crate::{Result, WmsError};

/// An insertion-ordered WMS parameter map.
///
/// Setting an existing key replaces its value in place, so the order of the
/// query string is stable across updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmsParams {
    entries: Vec<(String, String)>,
}

impl WmsParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// GetMap defaults every request starts from
    pub fn defaults() -> Self {
        [
            ("service", "WMS"),
            ("request", "GetMap"),
            ("version", DEFAULT_WMS_VERSION),
            ("layers", ""),
            ("styles", ""),
            ("format", DEFAULT_FORMAT),
            ("transparent", "false"),
        ]
        .into_iter()
        .collect()
    }

    /// Defaults with `overrides` merged on top
    pub fn with_overrides(overrides: &WmsParams) -> Self {
        let mut params = Self::defaults();
        params.extend(overrides);
        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Shallow merge, later values win
    pub fn extend(&mut self, other: &WmsParams) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numeric protocol version, see [`parse_version`]
    pub fn version(&self) -> f64 {
        parse_version(self.get("version").unwrap_or(DEFAULT_WMS_VERSION))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WmsParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Reads the leading decimal number of a version string, so `"1.3.0"` is
/// 1.3 and `"1.1.1"` is 1.1. Returns NaN when there is no leading number.
pub fn parse_version(version: &str) -> f64 {
    let mut seen_dot = false;
    let prefix: String = version
        .trim_start()
        .chars()
        .take_while(|c| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect();

    prefix.trim_end_matches('.').parse().unwrap_or(f64::NAN)
}

/// Name of the projection parameter for a protocol version
pub fn projection_key(version: f64) -> &'static str {
    if version >= AXIS_ORDER_VERSION {
        "crs"
    } else {
        "srs"
    }
}

/// `bbox` corner values in the order the server expects
pub fn bbox_values(bounds: &LatLngBounds, version: f64, crs: &dyn Crs) -> [f64; 4] {
    let nw = crs.project(&bounds.north_west());
    let se = crs.project(&bounds.south_east());

    if version >= AXIS_ORDER_VERSION && crs.is_lat_lon() {
        [se.y, nw.x, nw.y, se.x]
    } else {
        [nw.x, se.y, se.x, nw.y]
    }
}

/// The view-dependent GetMap parameters: `width`, `height`, `srs`/`crs`
/// and `bbox`
pub fn build_map_params(
    bounds: &LatLngBounds,
    size: Point,
    version: f64,
    crs: &dyn Crs,
) -> WmsParams {
    let bbox = bbox_values(bounds, version, crs)
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut params = WmsParams::new();
    params.set("width", pixel_dimension(size.x));
    params.set("height", pixel_dimension(size.y));
    params.set(projection_key(version), crs.code());
    params.set("bbox", bbox);
    params
}

fn pixel_dimension(value: f64) -> String {
    (value.round().max(0.0) as u64).to_string()
}

/// Picks the layer's own CRS, then the map's
pub fn resolve_crs(
    configured: Option<&Arc<dyn Crs>>,
    map_crs: Option<Arc<dyn Crs>>,
) -> Result<Arc<dyn Crs>> {
    configured.cloned().or(map_crs).ok_or(WmsError::MissingCrs)
}

pub fn parse_base_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| WmsError::InvalidUrl(format!("{url}: {err}")))
}

/// Appends `params` to `base` as a query string
pub fn append_params(base: &Url, params: &WmsParams, uppercase: bool) -> String {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params.iter() {
            if uppercase {
                query.append_pair(&key.to_uppercase(), value);
            } else {
                query.append_pair(key, value);
            }
        }
    }
    url.into()
}

/// Base URL plus encoded parameters
pub fn request_url(base: &str, params: &WmsParams, uppercase: bool) -> Result<String> {
    Ok(append_params(&parse_base_url(base)?, params, uppercase))
}
