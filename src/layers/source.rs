//! A WMS endpoint shared by any number of [`Layer`](super::layer::Layer)
//! handles. The Source tracks which sub-layers are active and renders all
//! of them through a single renderer, so one map view costs one request
//! no matter how many layers are switched on.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;

use crate::core::config::{SourceOptions, ZOrder};
use crate::core::geo::{LatLng, Point};
use crate::input::events::MapEvent;
use crate::layers::layer::Layer;
use crate::layers::overlay::Overlay;
use crate::layers::tile::WmsTileLayer;
use crate::traits::{ImageHandle, MapHost, MapView, ViewportAware};
use crate::ui::popup::PopupDisplay;
use crate::wms::feature_info::{
    default_parser, fetch_feature_info, FeatureInfo, FeatureInfoDisplay, FeatureInfoParser,
    FeatureInfoRequest,
};
use crate::wms::fetch::{FetchClient, FetchOutcome, ReqwestFetchClient};
use crate::wms::params::{append_params, build_map_params, parse_base_url, resolve_crs, WmsParams};
use crate::Result;

/// A pending identify: resolves once the feature info has been fetched,
/// parsed and shown. Run it on any executor.
pub type IdentifyTask = BoxFuture<'static, FeatureInfo>;

/// How a Source puts its image on the map
#[derive(Debug)]
pub enum Renderer {
    Untiled(Overlay),
    Tiled(WmsTileLayer),
}

impl Renderer {
    pub fn wms_params(&self) -> &WmsParams {
        match self {
            Renderer::Untiled(overlay) => overlay.wms_params(),
            Renderer::Tiled(tiles) => tiles.wms_params(),
        }
    }

    pub fn is_attached(&self) -> bool {
        match self {
            Renderer::Untiled(overlay) => overlay.is_attached(),
            Renderer::Tiled(tiles) => tiles.is_attached(),
        }
    }

    pub fn attribution(&self) -> Option<&str> {
        match self {
            Renderer::Untiled(overlay) => overlay.attribution(),
            Renderer::Tiled(tiles) => tiles.attribution(),
        }
    }

    pub fn as_overlay(&self) -> Option<&Overlay> {
        match self {
            Renderer::Untiled(overlay) => Some(overlay),
            Renderer::Tiled(_) => None,
        }
    }

    pub fn as_tile_layer(&self) -> Option<&WmsTileLayer> {
        match self {
            Renderer::Tiled(tiles) => Some(tiles),
            Renderer::Untiled(_) => None,
        }
    }

    pub fn on_add(&mut self, map: &mut dyn MapHost) -> Result<()> {
        match self {
            Renderer::Untiled(overlay) => overlay.on_add(map),
            Renderer::Tiled(tiles) => tiles.on_add(map),
        }
    }

    pub fn on_remove(&mut self, map: &mut dyn MapHost) {
        match self {
            Renderer::Untiled(overlay) => overlay.on_remove(map),
            Renderer::Tiled(tiles) => tiles.on_remove(map),
        }
    }

    pub fn set_params(&mut self, params: &WmsParams, map: &mut dyn MapHost) -> Result<()> {
        match self {
            Renderer::Untiled(overlay) => overlay.set_params(params, map),
            Renderer::Tiled(tiles) => tiles.set_params(params, map),
        }
    }

    /// Refresh after the view settled. Tile grids follow the view on
    /// their own.
    pub fn update(&mut self, map: &mut dyn MapHost) -> Result<()> {
        match self {
            Renderer::Untiled(overlay) => overlay.update(map),
            Renderer::Tiled(_) => Ok(()),
        }
    }

    pub fn handle_image_loaded(&mut self, image: ImageHandle, map: &mut dyn MapHost) -> bool {
        match self {
            Renderer::Untiled(overlay) => overlay.handle_image_loaded(image, map),
            Renderer::Tiled(_) => false,
        }
    }

    pub fn handle_image_failed(&mut self, image: ImageHandle, map: &mut dyn MapHost) -> bool {
        match self {
            Renderer::Untiled(overlay) => overlay.handle_image_failed(image, map),
            Renderer::Tiled(_) => false,
        }
    }

    pub fn set_opacity(&mut self, opacity: f32, map: &mut dyn MapHost) {
        match self {
            Renderer::Untiled(overlay) => overlay.set_opacity(opacity, map),
            Renderer::Tiled(tiles) => tiles.set_opacity(opacity, map),
        }
    }

    pub fn bring_to_front(&mut self, map: &mut dyn MapHost) {
        match self {
            Renderer::Untiled(overlay) => overlay.bring_to_front(map),
            Renderer::Tiled(tiles) => tiles.bring_to_front(map),
        }
    }

    pub fn bring_to_back(&mut self, map: &mut dyn MapHost) {
        match self {
            Renderer::Untiled(overlay) => overlay.bring_to_back(map),
            Renderer::Tiled(tiles) => tiles.bring_to_back(map),
        }
    }
}

pub struct Source {
    url: String,
    base: Url,
    options: SourceOptions,
    sub_layers: BTreeSet<String>,
    renderer: Renderer,
    attached: bool,
    fetch_client: Arc<dyn FetchClient>,
    parser: FeatureInfoParser,
    display: Arc<dyn FeatureInfoDisplay>,
}

impl Source {
    /// Creates a detached Source with the reqwest client, the default
    /// parser and a [`PopupDisplay`]
    pub fn new(url: impl Into<String>, options: SourceOptions) -> Result<Self> {
        let url = url.into();
        let base = parse_base_url(&url)?;
        let renderer = Self::build_renderer(&url, &options, options.untiled)?;

        Ok(Self {
            url,
            base,
            options,
            sub_layers: BTreeSet::new(),
            renderer,
            attached: false,
            fetch_client: Arc::new(ReqwestFetchClient::new()),
            parser: default_parser(),
            display: Arc::new(PopupDisplay::new()),
        })
    }

    pub fn with_fetch_client(mut self, client: Arc<dyn FetchClient>) -> Self {
        self.fetch_client = client;
        self
    }

    /// Replaces how fetch outcomes become display content
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&FetchOutcome, &str) -> String + Send + Sync + 'static,
    {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_display(mut self, display: Arc<dyn FeatureInfoDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn into_shared(self) -> SharedSource {
        SharedSource::new(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn display(&self) -> Arc<dyn FeatureInfoDisplay> {
        self.display.clone()
    }

    pub fn attribution(&self) -> Option<&str> {
        self.renderer.attribution()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Active sub-layers in request order
    pub fn sub_layers(&self) -> impl Iterator<Item = &str> {
        self.sub_layers.iter().map(String::as_str)
    }

    pub fn has_sub_layer(&self, name: &str) -> bool {
        self.sub_layers.contains(name)
    }

    /// The `layers` value for the active sub-layers
    pub fn layers_param(&self) -> String {
        self.sub_layers().collect::<Vec<_>>().join(",")
    }

    /// Builds a fresh renderer from the current options
    pub fn create_overlay(&self, untiled: bool) -> Result<Renderer> {
        Self::build_renderer(&self.url, &self.options, untiled)
    }

    fn build_renderer(url: &str, options: &SourceOptions, untiled: bool) -> Result<Renderer> {
        let overlay = options.overlay.clone();
        if untiled {
            Ok(Renderer::Untiled(Overlay::new(url, overlay, &options.params)?))
        } else {
            Ok(Renderer::Tiled(WmsTileLayer::new(url, overlay, &options.params)?))
        }
    }

    /// Attaches and renders the active sub-layers. On failure the Source is
    /// left detached.
    pub fn on_add(&mut self, map: &mut dyn MapHost) -> Result<()> {
        self.attached = true;
        if let Err(err) = self.refresh_overlay(map) {
            self.on_remove(map);
            return Err(err);
        }
        Ok(())
    }

    pub fn on_remove(&mut self, map: &mut dyn MapHost) {
        self.attached = false;
        self.renderer.on_remove(map);
    }

    /// Switches `name` on. A name that fails to render is switched off again.
    pub fn add_sub_layer(&mut self, name: &str, map: &mut dyn MapHost) -> Result<()> {
        let inserted = self.sub_layers.insert(name.to_string());
        let refreshed = self.refresh_overlay(map);
        if refreshed.is_err() && inserted {
            self.sub_layers.remove(name);
            if self.sub_layers.is_empty() {
                self.renderer.on_remove(map);
            }
        }
        refreshed
    }

    pub fn remove_sub_layer(&mut self, name: &str, map: &mut dyn MapHost) -> Result<()> {
        self.sub_layers.remove(name);
        self.refresh_overlay(map)
    }

    /// Pushes the active sub-layers to the renderer and shows or hides it.
    /// Does nothing while the Source is detached.
    pub fn refresh_overlay(&mut self, map: &mut dyn MapHost) -> Result<()> {
        if !self.attached {
            return Ok(());
        }

        if self.sub_layers.is_empty() {
            self.renderer.on_remove(map);
            return Ok(());
        }

        let layers = WmsParams::from_iter([("layers", self.layers_param())]);
        self.renderer.set_params(&layers, map)?;
        self.renderer.on_add(map)
    }

    pub fn set_opacity(&mut self, opacity: f32, map: &mut dyn MapHost) {
        self.options.overlay.opacity = opacity.clamp(0.0, 1.0);
        self.renderer.set_opacity(opacity, map);
    }

    pub fn bring_to_front(&mut self, map: &mut dyn MapHost) {
        self.options.overlay.z_order = ZOrder::Front;
        self.renderer.bring_to_front(map);
    }

    pub fn bring_to_back(&mut self, map: &mut dyn MapHost) {
        self.options.overlay.z_order = ZOrder::Back;
        self.renderer.bring_to_back(map);
    }

    /// Routes a host event. A click with identify enabled yields the
    /// identify task for the caller to run.
    pub fn handle_event(
        &mut self,
        event: &MapEvent,
        map: &mut dyn MapHost,
    ) -> Result<Option<IdentifyTask>> {
        match event {
            MapEvent::ViewChanged => {
                self.renderer.update(map)?;
                Ok(None)
            }
            MapEvent::ImageLoaded(image) => {
                self.renderer.handle_image_loaded(*image, map);
                Ok(None)
            }
            MapEvent::ImageFailed(image) => {
                self.renderer.handle_image_failed(*image, map);
                Ok(None)
            }
            MapEvent::Click {
                container_point,
                lat_lng,
            } => {
                if !self.attached || !self.options.identify {
                    return Ok(None);
                }
                self.identify(*container_point, *lat_lng, &*map)
            }
        }
    }

    /// Layers queried on identify
    pub fn identify_layers(&self) -> Vec<String> {
        match &self.options.identify_layers {
            Some(layers) => layers.clone(),
            None => self.sub_layers.iter().cloned().collect(),
        }
    }

    /// Starts a GetFeatureInfo lookup for a click. Returns `None` when
    /// there is nothing to query.
    pub fn identify<V: MapView + ?Sized>(
        &self,
        point: Point,
        lat_lng: LatLng,
        view: &V,
    ) -> Result<Option<IdentifyTask>> {
        let layers = self.identify_layers();
        if layers.is_empty() {
            log::debug!("identify at {:?}: no layers to query", lat_lng);
            return Ok(None);
        }

        let request = self.feature_info_request(point, lat_lng, &layers, view)?;
        log::debug!("identify {:?} at {:?}", layers, lat_lng);

        let display = self.display.clone();
        let lookup = self.get_feature_info(request);
        Ok(Some(
            async move {
                let info = lookup.await;
                display.show_feature_info(&info);
                info
            }
            .boxed(),
        ))
    }

    /// GetFeatureInfo parameters for a click on `layers`, framed to the
    /// whole map view even when rendering tiles
    pub fn feature_info_params<V: MapView + ?Sized>(
        &self,
        point: Point,
        layers: &[String],
        view: &V,
    ) -> Result<WmsParams> {
        let mut params = match &self.renderer {
            Renderer::Untiled(overlay) => overlay.wms_params().clone(),
            Renderer::Tiled(_) => WmsParams::with_overrides(&self.options.params),
        };

        let crs = resolve_crs(self.options.overlay.crs.as_ref(), view.crs())?;
        let framing = build_map_params(&view.bounds(), view.size(), params.version(), crs.as_ref());
        params.extend(&framing);

        let layers = layers.join(",");
        let pixel = point.round();
        params.set("layers", layers.clone());
        params.set("query_layers", layers);
        params.set("request", "GetFeatureInfo");
        params.set("X", (pixel.x as i64).to_string());
        params.set("Y", (pixel.y as i64).to_string());
        Ok(params)
    }

    pub fn feature_info_request<V: MapView + ?Sized>(
        &self,
        point: Point,
        lat_lng: LatLng,
        layers: &[String],
        view: &V,
    ) -> Result<FeatureInfoRequest> {
        let params = self.feature_info_params(point, layers, view)?;
        let url = append_params(&self.base, &params, self.options.overlay.uppercase);
        Ok(FeatureInfoRequest {
            point,
            lat_lng,
            layers: layers.to_vec(),
            params,
            url,
        })
    }

    /// Fetches and parses a request with the waiting indicator shown.
    /// The returned future owns everything it needs.
    pub fn get_feature_info(
        &self,
        request: FeatureInfoRequest,
    ) -> impl Future<Output = FeatureInfo> + Send + 'static {
        fetch_feature_info(
            request,
            self.fetch_client.clone(),
            self.parser.clone(),
            self.display.clone(),
        )
    }
}

impl ViewportAware for Source {
    fn on_viewport_changed(&mut self, map: &mut dyn MapHost) -> Result<()> {
        self.renderer.update(map)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("url", &self.url)
            .field("sub_layers", &self.sub_layers)
            .field("attached", &self.attached)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

/// A Source shared between layer handles on the map's thread
#[derive(Clone)]
pub struct SharedSource(Rc<RefCell<Source>>);

impl SharedSource {
    pub fn new(source: Source) -> Self {
        Self(Rc::new(RefCell::new(source)))
    }

    pub fn borrow(&self) -> Ref<'_, Source> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Source> {
        self.0.borrow_mut()
    }

    /// A handle for one named sub-layer of this Source
    pub fn layer(&self, name: impl Into<String>) -> Layer {
        Layer::new(self.clone(), name)
    }

    pub fn ptr_eq(&self, other: &SharedSource) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Convenience for [`Source::handle_event`]
    pub fn handle_event(
        &self,
        event: &MapEvent,
        map: &mut dyn MapHost,
    ) -> Result<Option<IdentifyTask>> {
        self.0.borrow_mut().handle_event(event, map)
    }
}

impl fmt::Debug for SharedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(source) => f.debug_tuple("SharedSource").field(&source.url).finish(),
            Err(_) => f.debug_tuple("SharedSource").field(&"<borrowed>").finish(),
        }
    }
}
