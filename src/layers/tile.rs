//! Tiled WMS rendering. The host's tile grid does the fetching and placing;
//! this module only turns tile coordinates into GetMap URLs.

use std::sync::Arc;

use reqwest::Url;

use crate::core::config::{OverlayOptions, ZOrder};
use crate::core::crs::Crs;
use crate::core::geo::{Point, TileCoord};
use crate::tiles::TileSource;
use crate::traits::{MapHost, MapView, TileLayerHandle};
use crate::wms::params::{
    append_params, build_map_params, parse_base_url, resolve_crs, WmsParams,
};
use crate::Result;

/// Snapshot of a tile layer's parameters that builds one GetMap URL per tile
#[derive(Debug, Clone)]
pub struct WmsTileSource {
    base: Url,
    params: WmsParams,
    crs: Arc<dyn Crs>,
    tile_size: u32,
    uppercase: bool,
}

impl WmsTileSource {
    pub fn params(&self) -> &WmsParams {
        &self.params
    }

    pub fn crs(&self) -> &dyn Crs {
        self.crs.as_ref()
    }

    /// Parameters for one tile: the layer parameters framed to the tile
    pub fn tile_params(&self, coord: TileCoord) -> WmsParams {
        let bounds = self.crs.tile_bounds(coord);
        let size = Point::new(self.tile_size as f64, self.tile_size as f64);

        let mut params = self.params.clone();
        let framing = build_map_params(&bounds, size, params.version(), self.crs.as_ref());
        params.extend(&framing);
        params
    }
}

impl TileSource for WmsTileSource {
    fn url(&self, coord: TileCoord) -> String {
        append_params(&self.base, &self.tile_params(coord), self.uppercase)
    }
}

#[derive(Debug)]
pub struct WmsTileLayer {
    url: String,
    base: Url,
    options: OverlayOptions,
    wms_params: WmsParams,
    handle: Option<TileLayerHandle>,
}

impl WmsTileLayer {
    pub fn new(url: &str, options: OverlayOptions, params: &WmsParams) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            base: parse_base_url(url)?,
            options,
            wms_params: WmsParams::with_overrides(params),
            handle: None,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    pub fn wms_params(&self) -> &WmsParams {
        &self.wms_params
    }

    pub fn attribution(&self) -> Option<&str> {
        self.options.attribution.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<TileLayerHandle> {
        self.handle
    }

    /// URL builder for the current parameters
    pub fn tile_source<V: MapView + ?Sized>(&self, view: &V) -> Result<WmsTileSource> {
        Ok(WmsTileSource {
            base: self.base.clone(),
            params: self.wms_params.clone(),
            crs: resolve_crs(self.options.crs.as_ref(), view.crs())?,
            tile_size: self.options.tile_size,
            uppercase: self.options.uppercase,
        })
    }

    pub fn on_add(&mut self, map: &mut dyn MapHost) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let source = self.tile_source(&*map)?;
        let handle = map.add_tile_layer(Arc::new(source), &self.options);
        match self.options.z_order {
            ZOrder::Front => map.bring_tiles_to_front(handle),
            ZOrder::Back => map.bring_tiles_to_back(handle),
        }
        log::debug!("added WMS tile layer {:?} for {}", handle, self.url);
        self.handle = Some(handle);
        Ok(())
    }

    pub fn on_remove(&mut self, map: &mut dyn MapHost) {
        if let Some(handle) = self.handle.take() {
            map.remove_tile_layer(handle);
        }
    }

    /// Merges `params`; an attached grid gets a new URL builder
    pub fn set_params(&mut self, params: &WmsParams, map: &mut dyn MapHost) -> Result<()> {
        self.wms_params.extend(params);
        if let Some(handle) = self.handle {
            let source = self.tile_source(&*map)?;
            map.set_tile_source(handle, Arc::new(source));
        }
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f32, map: &mut dyn MapHost) {
        self.options.opacity = opacity.clamp(0.0, 1.0);
        if let Some(handle) = self.handle {
            map.set_tile_opacity(handle, self.options.opacity);
        }
    }

    pub fn bring_to_front(&mut self, map: &mut dyn MapHost) {
        self.options.z_order = ZOrder::Front;
        if let Some(handle) = self.handle {
            map.bring_tiles_to_front(handle);
        }
    }

    pub fn bring_to_back(&mut self, map: &mut dyn MapHost) {
        self.options.z_order = ZOrder::Back;
        if let Some(handle) = self.handle {
            map.bring_tiles_to_back(handle);
        }
    }
}
