//! In-memory collaborators for unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;

use crate::core::config::OverlayOptions;
use crate::core::crs::Crs;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::Viewport;
use crate::tiles::TileSource;
use crate::traits::{ImageHandle, ImageSurface, MapView, TileLayerHandle, TileSurface};
use crate::wms::feature_info::{FeatureInfo, FeatureInfoDisplay};
use crate::wms::fetch::{FetchClient, FetchOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AddImage(ImageHandle),
    RemoveImage(ImageHandle),
    ImageOpacity(ImageHandle, f32),
    ImageToFront(ImageHandle),
    ImageToBack(ImageHandle),
    AddTiles(TileLayerHandle),
    SetTileSource(TileLayerHandle),
    RemoveTiles(TileLayerHandle),
    TileOpacity(TileLayerHandle, f32),
    TilesToFront(TileLayerHandle),
    TilesToBack(TileLayerHandle),
}

/// Map host that records every surface call
pub struct RecordingHost {
    pub viewport: Viewport,
    pub calls: Vec<SurfaceCall>,
    images: Vec<(ImageHandle, String, f32)>,
    tile_sources: Vec<(TileLayerHandle, Arc<dyn TileSource>)>,
    next_handle: u64,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(LatLng::new(45.0, -93.2), 6.0, Point::new(800.0, 600.0)),
            calls: Vec::new(),
            images: Vec::new(),
            tile_sources: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn requested_urls(&self) -> Vec<&str> {
        self.images.iter().map(|(_, url, _)| url.as_str()).collect()
    }

    pub fn last_image(&self) -> Option<ImageHandle> {
        self.images.last().map(|(image, _, _)| *image)
    }

    pub fn url_of(&self, image: ImageHandle) -> Option<&str> {
        self.images
            .iter()
            .find(|(handle, _, _)| *handle == image)
            .map(|(_, url, _)| url.as_str())
    }

    pub fn opacity_at_add(&self, image: ImageHandle) -> Option<f32> {
        self.images
            .iter()
            .find(|(handle, _, _)| *handle == image)
            .map(|(_, _, opacity)| *opacity)
    }

    /// Images added and not yet removed, in insertion order
    pub fn live_images(&self) -> Vec<ImageHandle> {
        let mut live = Vec::new();
        for call in &self.calls {
            match call {
                SurfaceCall::AddImage(image) => live.push(*image),
                SurfaceCall::RemoveImage(image) => live.retain(|i| i != image),
                _ => {}
            }
        }
        live
    }

    pub fn was_removed(&self, image: ImageHandle) -> bool {
        self.calls.contains(&SurfaceCall::RemoveImage(image))
    }

    pub fn live_tile_layers(&self) -> Vec<TileLayerHandle> {
        let mut live = Vec::new();
        for call in &self.calls {
            match call {
                SurfaceCall::AddTiles(layer) => live.push(*layer),
                SurfaceCall::RemoveTiles(layer) => live.retain(|l| l != layer),
                _ => {}
            }
        }
        live
    }

    /// The latest URL builder given for a tile layer
    pub fn tile_source(&self, layer: TileLayerHandle) -> Option<Arc<dyn TileSource>> {
        self.tile_sources
            .iter()
            .rev()
            .find(|(handle, _)| *handle == layer)
            .map(|(_, source)| source.clone())
    }

    fn next(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

impl MapView for RecordingHost {
    fn bounds(&self) -> LatLngBounds {
        self.viewport.bounds()
    }

    fn size(&self) -> Point {
        self.viewport.size
    }

    fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    fn crs(&self) -> Option<Arc<dyn Crs>> {
        self.viewport.crs.clone()
    }
}

impl ImageSurface for RecordingHost {
    fn add_image(&mut self, url: &str, _bounds: &LatLngBounds, opacity: f32) -> ImageHandle {
        let image = ImageHandle(self.next());
        self.images.push((image, url.to_string(), opacity));
        self.calls.push(SurfaceCall::AddImage(image));
        image
    }

    fn remove_image(&mut self, image: ImageHandle) {
        self.calls.push(SurfaceCall::RemoveImage(image));
    }

    fn set_image_opacity(&mut self, image: ImageHandle, opacity: f32) {
        self.calls.push(SurfaceCall::ImageOpacity(image, opacity));
    }

    fn bring_image_to_front(&mut self, image: ImageHandle) {
        self.calls.push(SurfaceCall::ImageToFront(image));
    }

    fn bring_image_to_back(&mut self, image: ImageHandle) {
        self.calls.push(SurfaceCall::ImageToBack(image));
    }
}

impl TileSurface for RecordingHost {
    fn add_tile_layer(
        &mut self,
        source: Arc<dyn TileSource>,
        _options: &OverlayOptions,
    ) -> TileLayerHandle {
        let layer = TileLayerHandle(self.next());
        self.tile_sources.push((layer, source));
        self.calls.push(SurfaceCall::AddTiles(layer));
        layer
    }

    fn set_tile_source(&mut self, layer: TileLayerHandle, source: Arc<dyn TileSource>) {
        self.tile_sources.push((layer, source));
        self.calls.push(SurfaceCall::SetTileSource(layer));
    }

    fn remove_tile_layer(&mut self, layer: TileLayerHandle) {
        self.calls.push(SurfaceCall::RemoveTiles(layer));
    }

    fn set_tile_opacity(&mut self, layer: TileLayerHandle, opacity: f32) {
        self.calls.push(SurfaceCall::TileOpacity(layer, opacity));
    }

    fn bring_tiles_to_front(&mut self, layer: TileLayerHandle) {
        self.calls.push(SurfaceCall::TilesToFront(layer));
    }

    fn bring_tiles_to_back(&mut self, layer: TileLayerHandle) {
        self.calls.push(SurfaceCall::TilesToBack(layer));
    }
}

/// Display that logs what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl FeatureInfoDisplay for RecordingDisplay {
    fn show_waiting(&self) {
        self.push("show_waiting".to_string());
    }

    fn hide_waiting(&self) {
        self.push("hide_waiting".to_string());
    }

    fn show_feature_info(&self, info: &FeatureInfo) {
        self.push(format!("show:{}", info.content));
    }
}

/// Fetch client with a canned answer
#[derive(Debug)]
pub struct ScriptedFetch {
    answer: Option<FetchOutcome>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetch {
    pub fn always(outcome: FetchOutcome) -> Self {
        Self {
            answer: Some(outcome),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Never completes
    pub fn pending() -> Self {
        Self {
            answer: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchClient for ScriptedFetch {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requested.lock().unwrap().push(url.to_string());
        match &self.answer {
            Some(outcome) => outcome.clone(),
            None => futures::future::pending().await,
        }
    }
}

/// Decoded query pairs of a URL
pub fn query(url: &str) -> Vec<(String, String)> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub fn query_value(url: &str, key: &str) -> Option<String> {
    query(url).into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}
