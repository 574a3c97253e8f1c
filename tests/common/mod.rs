//! Shared test doubles: an in-memory map host and scripted collaborators

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use maplet_wms::prelude::*;
use reqwest::Url;

#[derive(Debug, Clone)]
pub struct HostImage {
    pub handle: ImageHandle,
    pub url: String,
    pub opacity: f32,
    pub removed: bool,
}

/// A headless map: keeps a viewport, hands out handles and records what
/// the layers asked for
pub struct MockMap {
    pub viewport: Viewport,
    pub images: Vec<HostImage>,
    pub stacking: Vec<String>,
    pub tile_layers: Vec<(TileLayerHandle, Arc<dyn TileSource>, bool)>,
    next: u64,
}

impl MockMap {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(LatLng::new(44.98, -93.27), 7.0, Point::new(1024.0, 768.0)),
            images: Vec::new(),
            stacking: Vec::new(),
            tile_layers: Vec::new(),
            next: 100,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.images.iter().map(|image| image.url.clone()).collect()
    }

    pub fn last_request(&self) -> Option<ImageHandle> {
        self.images.last().map(|image| image.handle)
    }

    pub fn visible(&self) -> Vec<ImageHandle> {
        self.images
            .iter()
            .filter(|image| !image.removed)
            .map(|image| image.handle)
            .collect()
    }

    pub fn image(&self, handle: ImageHandle) -> Option<&HostImage> {
        self.images.iter().find(|image| image.handle == handle)
    }

    pub fn live_tile_layers(&self) -> Vec<TileLayerHandle> {
        self.tile_layers
            .iter()
            .filter(|(_, _, removed)| !removed)
            .map(|(handle, _, _)| *handle)
            .collect()
    }

    pub fn tile_source(&self, handle: TileLayerHandle) -> Option<Arc<dyn TileSource>> {
        self.tile_layers
            .iter()
            .find(|(h, _, _)| *h == handle)
            .map(|(_, source, _)| source.clone())
    }

    fn handle(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl MapView for MockMap {
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

impl ImageSurface for MockMap {
    fn add_image(&mut self, url: &str, _bounds: &LatLngBounds, opacity: f32) -> ImageHandle {
        let handle = ImageHandle(self.handle());
        self.images.push(HostImage {
            handle,
            url: url.to_string(),
            opacity,
            removed: false,
        });
        handle
    }

    fn remove_image(&mut self, image: ImageHandle) {
        if let Some(entry) = self.images.iter_mut().find(|i| i.handle == image) {
            entry.removed = true;
        }
    }

    fn set_image_opacity(&mut self, image: ImageHandle, opacity: f32) {
        if let Some(entry) = self.images.iter_mut().find(|i| i.handle == image) {
            entry.opacity = opacity;
        }
    }

    fn bring_image_to_front(&mut self, image: ImageHandle) {
        self.stacking.push(format!("front:{}", image.0));
    }

    fn bring_image_to_back(&mut self, image: ImageHandle) {
        self.stacking.push(format!("back:{}", image.0));
    }
}

impl TileSurface for MockMap {
    fn add_tile_layer(
        &mut self,
        source: Arc<dyn TileSource>,
        _options: &OverlayOptions,
    ) -> TileLayerHandle {
        let handle = TileLayerHandle(self.handle());
        self.tile_layers.push((handle, source, false));
        handle
    }

    fn set_tile_source(&mut self, layer: TileLayerHandle, source: Arc<dyn TileSource>) {
        if let Some(entry) = self.tile_layers.iter_mut().find(|(h, _, _)| *h == layer) {
            entry.1 = source;
        }
    }

    fn remove_tile_layer(&mut self, layer: TileLayerHandle) {
        if let Some(entry) = self.tile_layers.iter_mut().find(|(h, _, _)| *h == layer) {
            entry.2 = true;
        }
    }

    fn set_tile_opacity(&mut self, _layer: TileLayerHandle, _opacity: f32) {}

    fn bring_tiles_to_front(&mut self, layer: TileLayerHandle) {
        self.stacking.push(format!("tiles-front:{}", layer.0));
    }

    fn bring_tiles_to_back(&mut self, layer: TileLayerHandle) {
        self.stacking.push(format!("tiles-back:{}", layer.0));
    }
}

/// Fetch client answering from a queue, then with the fallback answer
pub struct QueueFetch {
    answers: Mutex<VecDeque<FetchOutcome>>,
    fallback: FetchOutcome,
    pub seen: Mutex<Vec<String>>,
}

impl QueueFetch {
    pub fn new(fallback: FetchOutcome) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, outcome: FetchOutcome) -> Self {
        self.answers.lock().unwrap().push_back(outcome);
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchClient for QueueFetch {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.seen.lock().unwrap().push(url.to_string());
        tokio::task::yield_now().await;
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Display recording the waiting indicator and shown results
#[derive(Default)]
pub struct CountingDisplay {
    pub waiting_shown: Mutex<u32>,
    pub waiting_hidden: Mutex<u32>,
    pub shown: Mutex<Vec<FeatureInfo>>,
}

impl FeatureInfoDisplay for CountingDisplay {
    fn show_waiting(&self) {
        *self.waiting_shown.lock().unwrap() += 1;
    }

    fn hide_waiting(&self) {
        *self.waiting_hidden.lock().unwrap() += 1;
    }

    fn show_feature_info(&self, info: &FeatureInfo) {
        self.shown.lock().unwrap().push(info.clone());
    }
}

impl CountingDisplay {
    pub fn counts(&self) -> (u32, u32) {
        (
            *self.waiting_shown.lock().unwrap(),
            *self.waiting_hidden.lock().unwrap(),
        )
    }
}

pub fn query_value(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
