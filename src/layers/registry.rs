use std::sync::Arc;

use crate::core::config::SourceOptions;
use crate::layers::source::{SharedSource, Source};
use crate::prelude::HashMap;
use crate::wms::feature_info::FeatureInfoDisplay;
use crate::wms::fetch::FetchClient;
use crate::Result;

/// Keeps one [`Source`] per service URL so layers created from the same URL
/// share a single overlay. Owned by the application; sources live as long
/// as the registry or any layer holding them.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, SharedSource>,
    fetch_client: Option<Arc<dyn FetchClient>>,
    display: Option<Arc<dyn FeatureInfoDisplay>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch client given to every Source this registry creates
    pub fn with_fetch_client(mut self, client: Arc<dyn FetchClient>) -> Self {
        self.fetch_client = Some(client);
        self
    }

    /// Display given to every Source this registry creates
    pub fn with_display(mut self, display: Arc<dyn FeatureInfoDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    /// The Source for `url`, created with `options` on first use. Options
    /// passed for an already known URL are ignored.
    pub fn get_or_create(&mut self, url: &str, options: SourceOptions) -> Result<SharedSource> {
        if let Some(source) = self.sources.get(url) {
            log::trace!("reusing WMS source for {}", url);
            return Ok(source.clone());
        }

        let mut source = Source::new(url, options)?;
        if let Some(client) = &self.fetch_client {
            source = source.with_fetch_client(client.clone());
        }
        if let Some(display) = &self.display {
            source = source.with_display(display.clone());
        }

        log::debug!("created WMS source for {}", url);
        let shared = source.into_shared();
        self.sources.insert(url.to_string(), shared.clone());
        Ok(shared)
    }

    pub fn get(&self, url: &str) -> Option<SharedSource> {
        self.sources.get(url).cloned()
    }

    /// Forgets the Source for `url`; layers already holding it keep it
    pub fn remove(&mut self, url: &str) -> Option<SharedSource> {
        self.sources.remove(url)
    }

    pub fn sources(&self) -> impl Iterator<Item = &SharedSource> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingDisplay, ScriptedFetch};
    use crate::wms::fetch::FetchOutcome;
    use crate::WmsError;

    #[test]
    fn test_same_url_same_source() {
        let mut registry = SourceRegistry::new();
        let a = registry.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();
        let b = registry
            .get_or_create("https://a.example/wms", SourceOptions::default().tiled(true))
            .unwrap();
        let c = registry.get_or_create("https://b.example/wms", SourceOptions::default()).unwrap();

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(registry.len(), 2);
        // First options win
        assert!(b.borrow().options().untiled);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = SourceRegistry::new();
        let mut second = SourceRegistry::new();
        let a = first.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();
        let b = second.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();

        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_invalid_url_is_not_cached() {
        let mut registry = SourceRegistry::new();
        assert!(matches!(
            registry.get_or_create("::nope::", SourceOptions::default()),
            Err(WmsError::InvalidUrl(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_keeps_held_sources_alive() {
        let mut registry = SourceRegistry::new();
        let held = registry.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();
        registry.remove("https://a.example/wms");

        assert!(registry.get("https://a.example/wms").is_none());
        assert_eq!(held.borrow().url(), "https://a.example/wms");

        let fresh = registry.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();
        assert!(!held.ptr_eq(&fresh));
    }

    #[test]
    fn test_injected_collaborators_reach_sources() {
        let display = Arc::new(RecordingDisplay::default());
        let mut registry = SourceRegistry::new()
            .with_fetch_client(Arc::new(ScriptedFetch::always(FetchOutcome::Success("x".into()))))
            .with_display(display.clone());

        let source = registry.get_or_create("https://a.example/wms", SourceOptions::default()).unwrap();
        source.borrow().display().show_waiting();
        assert_eq!(display.events(), ["show_waiting"]);
        assert_eq!(registry.sources().count(), 1);
    }
}
