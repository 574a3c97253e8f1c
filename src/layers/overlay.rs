//! Untiled WMS rendering: one image covering the whole map view, refreshed
//! whenever the view settles.
//!
//! A new image is loaded invisibly next to the one on screen and only
//! swapped in once it has loaded, so panning never flashes an empty map.
//! Every request is stamped with a generation number; a load that arrives
//! after a newer request was issued is discarded instead of displayed.

use reqwest::Url;

use crate::core::config::{OverlayOptions, ZOrder};
use crate::prelude::HashMap;
use crate::traits::{ImageHandle, MapHost, MapView, ViewportAware};
use crate::wms::params::{
    append_params, build_map_params, parse_base_url, resolve_crs, WmsParams,
};
use crate::Result;

#[derive(Debug)]
pub struct Overlay {
    url: String,
    base: Url,
    options: OverlayOptions,
    wms_params: WmsParams,
    attached: bool,
    /// URL of the latest issued request
    current_url: Option<String>,
    /// Image on screen
    current_image: Option<ImageHandle>,
    generation: u64,
    /// Requested images still loading, with the generation they belong to
    pending: HashMap<ImageHandle, u64>,
}

impl Overlay {
    pub fn new(url: &str, options: OverlayOptions, params: &WmsParams) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            base: parse_base_url(url)?,
            options,
            wms_params: WmsParams::with_overrides(params),
            attached: false,
            current_url: None,
            current_image: None,
            generation: 0,
            pending: HashMap::default(),
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
        self.attached
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn current_image(&self) -> Option<ImageHandle> {
        self.current_image
    }

    /// Generation of the latest request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_images(&self) -> usize {
        self.pending.len()
    }

    pub fn on_add(&mut self, map: &mut dyn MapHost) -> Result<()> {
        if self.attached {
            return Ok(());
        }
        self.attached = true;
        self.update(map)
    }

    /// Takes the image off the map. Loads still in flight become stale and
    /// are discarded when they arrive.
    pub fn on_remove(&mut self, map: &mut dyn MapHost) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.generation += 1;
        self.current_url = None;
        if let Some(image) = self.current_image.take() {
            map.remove_image(image);
        }
    }

    /// Merges `params` and refreshes the image if attached
    pub fn set_params(&mut self, params: &WmsParams, map: &mut dyn MapHost) -> Result<()> {
        self.wms_params.extend(params);
        self.update(map)
    }

    /// Recomputes size, projection and bounding box from the map view
    pub fn update_wms_params<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        let crs = resolve_crs(self.options.crs.as_ref(), view.crs())?;
        let geometry = build_map_params(
            &view.bounds(),
            view.size(),
            self.wms_params.version(),
            crs.as_ref(),
        );
        self.wms_params.extend(&geometry);
        Ok(())
    }

    /// GetMap URL for the current parameters
    pub fn image_url(&self) -> String {
        append_params(&self.base, &self.wms_params, self.options.uppercase)
    }

    /// Requests a fresh image for the current view unless the URL is
    /// unchanged. Outside the zoom range nothing is requested and the
    /// displayed image is taken down.
    pub fn update(&mut self, map: &mut dyn MapHost) -> Result<()> {
        if !self.attached {
            return Ok(());
        }

        self.update_wms_params(&*map)?;
        let url = self.image_url();
        if self.current_url.as_deref() == Some(url.as_str()) {
            log::trace!("WMS image unchanged: {}", url);
            return Ok(());
        }

        self.generation += 1;

        let zoom = map.zoom();
        if !self.options.zoom_in_range(zoom) {
            log::debug!(
                "zoom {} outside [{}, {}], hiding {}",
                zoom,
                self.options.min_zoom,
                self.options.max_zoom,
                self.url
            );
            self.current_url = None;
            if let Some(image) = self.current_image.take() {
                map.remove_image(image);
            }
            return Ok(());
        }

        let bounds = map.bounds();
        let image = map.add_image(&url, &bounds, 0.0);
        log::debug!(
            "requesting WMS image {:?} (generation {}): {}",
            image,
            self.generation,
            url
        );
        self.pending.insert(image, self.generation);
        self.current_url = Some(url);
        Ok(())
    }

    /// Swaps a freshly loaded image in, or discards it if a newer request
    /// has been issued since. Returns false for images this overlay did not
    /// request.
    pub fn handle_image_loaded(&mut self, image: ImageHandle, map: &mut dyn MapHost) -> bool {
        let Some(generation) = self.pending.remove(&image) else {
            return false;
        };

        if !self.attached || generation != self.generation {
            log::debug!(
                "discarding stale WMS image {:?} (generation {}, latest {})",
                image,
                generation,
                self.generation
            );
            map.remove_image(image);
            return true;
        }

        if let Some(previous) = self.current_image.replace(image) {
            map.remove_image(previous);
        }
        map.set_image_opacity(image, self.options.opacity);
        match self.options.z_order {
            ZOrder::Front => map.bring_image_to_front(image),
            ZOrder::Back => map.bring_image_to_back(image),
        }
        true
    }

    /// Drops a failed image. The image on screen stays; if the failure was
    /// the latest request, the next update requests it again.
    pub fn handle_image_failed(&mut self, image: ImageHandle, map: &mut dyn MapHost) -> bool {
        let Some(generation) = self.pending.remove(&image) else {
            return false;
        };

        map.remove_image(image);
        if generation == self.generation {
            log::warn!(
                "WMS image {:?} failed to load, keeping previous image: {}",
                image,
                self.current_url.as_deref().unwrap_or_default()
            );
            self.current_url = None;
        }
        true
    }

    pub fn set_opacity(&mut self, opacity: f32, map: &mut dyn MapHost) {
        self.options.opacity = opacity.clamp(0.0, 1.0);
        if let Some(image) = self.current_image {
            map.set_image_opacity(image, self.options.opacity);
        }
    }

    pub fn bring_to_front(&mut self, map: &mut dyn MapHost) {
        self.options.z_order = ZOrder::Front;
        if let Some(image) = self.current_image {
            map.bring_image_to_front(image);
        }
    }

    pub fn bring_to_back(&mut self, map: &mut dyn MapHost) {
        self.options.z_order = ZOrder::Back;
        if let Some(image) = self.current_image {
            map.bring_image_to_back(image);
        }
    }
}

impl ViewportAware for Overlay {
    fn on_viewport_changed(&mut self, map: &mut dyn MapHost) -> Result<()> {
        self.update(map)
    }
}
