use crate::core::config::SourceOptions;
use crate::layers::registry::SourceRegistry;
use crate::layers::source::SharedSource;
use crate::traits::MapHost;
use crate::Result;

/// A single named sub-layer of a WMS [`Source`](super::source::Source).
///
/// Adding a Layer to the map attaches its Source (once) and switches the
/// sub-layer on; removing it switches the sub-layer off. The Source and its
/// image outlive the handle, so call [`Layer::on_remove`] before dropping an
/// attached Layer.
///
/// Sub-layer names are a set, not reference counted: with two attached
/// Layers of the same name on one Source, removing either one switches the
/// name off for both.
#[derive(Debug)]
pub struct Layer {
    source: SharedSource,
    name: String,
    attached: bool,
}

impl Layer {
    pub fn new(source: SharedSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            attached: false,
        }
    }

    /// Layer on the registry's Source for `url`, creating it with `options`
    /// if this is the first use of the URL
    pub fn from_url(
        registry: &mut SourceRegistry,
        url: &str,
        name: impl Into<String>,
        options: SourceOptions,
    ) -> Result<Self> {
        let source = registry.get_or_create(url, options)?;
        Ok(Self::new(source, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Switches the sub-layer on, attaching the Source first if needed. On
    /// error neither the Layer nor its name stays active.
    pub fn on_add(&mut self, map: &mut dyn MapHost) -> Result<()> {
        let mut source = self.source.borrow_mut();
        let newly_active = !source.has_sub_layer(&self.name);
        // A detached Source only records the name; attaching issues the request.
        source.add_sub_layer(&self.name, map)?;
        if !source.is_attached() {
            if let Err(err) = source.on_add(map) {
                if newly_active {
                    source.remove_sub_layer(&self.name, map)?;
                }
                return Err(err);
            }
        }
        self.attached = true;
        Ok(())
    }

    pub fn on_remove(&mut self, map: &mut dyn MapHost) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.source.borrow_mut().remove_sub_layer(&self.name, map)?;
        self.attached = false;
        Ok(())
    }

    /// Opacity of the shared image, so it affects every layer of the Source
    pub fn set_opacity(&self, opacity: f32, map: &mut dyn MapHost) {
        self.source.borrow_mut().set_opacity(opacity, map);
    }

    pub fn bring_to_front(&self, map: &mut dyn MapHost) {
        self.source.borrow_mut().bring_to_front(map);
    }

    pub fn bring_to_back(&self, map: &mut dyn MapHost) {
        self.source.borrow_mut().bring_to_back(map);
    }
}
