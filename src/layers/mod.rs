pub mod layer;
pub mod overlay;
pub mod registry;
pub mod source;
pub mod tile;

pub use layer::Layer;
pub use overlay::Overlay;
pub use registry::SourceRegistry;
pub use source::{IdentifyTask, Renderer, SharedSource, Source};
pub use tile::{WmsTileLayer, WmsTileSource};
