use async_trait::async_trait;
use futures::executor::block_on;
use maplet_wms::prelude::*;

/// Answers every GetFeatureInfo request with a small canned table
struct CannedFetch;

#[async_trait]
impl FetchClient for CannedFetch {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        if url.contains("query_layers=broken") {
            return FetchOutcome::Failure(FetchFailure::Status(502));
        }
        FetchOutcome::Success("<table><tr><td>STATE_NAME</td><td>Minnesota</td></tr></table>".into())
    }
}

/// Map without a screen: loads every requested image straight away
struct HeadlessMap {
    viewport: Viewport,
    next: u64,
    pending: Vec<ImageHandle>,
}

impl MapView for HeadlessMap {
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

impl ImageSurface for HeadlessMap {
    fn add_image(&mut self, url: &str, _bounds: &LatLngBounds, _opacity: f32) -> ImageHandle {
        self.next += 1;
        let image = ImageHandle(self.next);
        println!("   🖼️  image {} requested: {}", image.0, url);
        self.pending.push(image);
        image
    }

    fn remove_image(&mut self, image: ImageHandle) {
        println!("   🗑️  image {} removed", image.0);
    }

    fn set_image_opacity(&mut self, _image: ImageHandle, _opacity: f32) {}

    fn bring_image_to_front(&mut self, image: ImageHandle) {
        println!("   ✅ image {} displayed", image.0);
    }

    fn bring_image_to_back(&mut self, image: ImageHandle) {
        println!("   ✅ image {} displayed behind", image.0);
    }
}

impl TileSurface for HeadlessMap {
    fn add_tile_layer(
        &mut self,
        source: Arc<dyn TileSource>,
        _options: &OverlayOptions,
    ) -> TileLayerHandle {
        self.next += 1;
        println!("   🧱 tile grid, e.g. {}", source.url(TileCoord::new(0, 0, 1)));
        TileLayerHandle(self.next)
    }

    fn set_tile_source(&mut self, _layer: TileLayerHandle, source: Arc<dyn TileSource>) {
        println!("   🧱 tile grid now {}", source.url(TileCoord::new(0, 0, 1)));
    }

    fn remove_tile_layer(&mut self, _layer: TileLayerHandle) {}

    fn set_tile_opacity(&mut self, _layer: TileLayerHandle, _opacity: f32) {}

    fn bring_tiles_to_front(&mut self, _layer: TileLayerHandle) {}

    fn bring_tiles_to_back(&mut self, _layer: TileLayerHandle) {}
}

impl HeadlessMap {
    /// Delivers load events for everything requested so far
    fn settle(&mut self, source: &SharedSource) -> maplet_wms::Result<()> {
        for image in std::mem::take(&mut self.pending) {
            source.handle_event(&MapEvent::ImageLoaded(image), self)?;
        }
        Ok(())
    }
}

/// Drives WMS layers against a headless map
fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("🗺️ maplet-wms headless example");
    println!("==============================");

    let mut map = HeadlessMap {
        viewport: Viewport::new(LatLng::new(46.0, -94.0), 6.0, Point::new(800.0, 600.0)),
        next: 0,
        pending: Vec::new(),
    };

    let mut registry = SourceRegistry::new()
        .with_fetch_client(Arc::new(CannedFetch))
        .with_display(Arc::new(PopupDisplay::new()));

    let url = "https://demo.example/geoserver/wms";
    let options = SourceOptions::from_json_str(
        r#"{ "format": "image/png", "transparent": true, "attribution": "Demo WMS" }"#,
    )?;

    let mut states = Layer::from_url(&mut registry, url, "topp:states", options.clone())?;
    let mut roads = Layer::from_url(&mut registry, url, "tiger:roads", options)?;
    let source = states.source().clone();

    println!("\n📚 Adding layers:");
    states.on_add(&mut map)?;
    roads.on_add(&mut map)?;
    map.settle(&source)?;
    println!("   layers = {}", source.borrow().layers_param());

    println!("\n🚀 Panning twice before the first image arrives:");
    map.viewport.pan(Point::new(150.0, 0.0));
    source.handle_event(&MapEvent::ViewChanged, &mut map)?;
    map.viewport.pan(Point::new(0.0, 90.0));
    source.handle_event(&MapEvent::ViewChanged, &mut map)?;
    // Deliver the newest load first; the older one is discarded
    map.pending.reverse();
    map.settle(&source)?;

    println!("\n🔍 Identify:");
    let click = MapEvent::Click {
        container_point: Point::new(400.0, 300.0),
        lat_lng: LatLng::new(46.0, -94.0),
    };
    if let Some(task) = source.handle_event(&click, &mut map)? {
        let info = block_on(task);
        println!("   fetched: {}  content: {}", info.fetched, info.content);
    }

    println!("\n📉 Removing layers:");
    roads.on_remove(&mut map)?;
    states.on_remove(&mut map)?;
    println!("   overlay attached: {}", source.borrow().renderer().is_attached());

    println!("\n🧱 Tiled source:");
    let tiled = Source::new(
        "https://tiles.example/wms",
        SourceOptions::default().tiled(true).param("format", "image/png"),
    )?
    .with_fetch_client(Arc::new(CannedFetch))
    .into_shared();
    let mut broken = tiled.layer("broken");
    broken.on_add(&mut map)?;
    let info = tiled
        .borrow()
        .identify(Point::new(10.0, 10.0), LatLng::new(45.0, -93.0), &map)?
        .map(block_on);
    if let Some(info) = info {
        println!("   fetched: {}  fallback: {}", info.fetched, info.content);
    }

    println!("\n✨ Done");
    Ok(())
}
