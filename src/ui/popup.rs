use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::core::geo::LatLng;
use crate::wms::feature_info::{FeatureInfo, FeatureInfoDisplay};

/// Cursor the host should show over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// A GetFeatureInfo request is in flight
    Progress,
}

/// Content anchored at a map position, as the host should present it
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub id: String,
    pub position: LatLng,
    pub content: String,
    pub visible: bool,
    pub created_at: Instant,
    pub auto_close_duration: Option<Duration>,
}

impl Popup {
    pub fn new(id: String, position: LatLng, content: String) -> Self {
        Self {
            id,
            position,
            content,
            visible: false,
            created_at: Instant::now(),
            auto_close_duration: None,
        }
    }

    pub fn with_auto_close(mut self, duration: Duration) -> Self {
        self.auto_close_duration = Some(duration);
        self
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.created_at = Instant::now();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn should_auto_close(&self) -> bool {
        match self.auto_close_duration {
            Some(duration) => self.created_at.elapsed() > duration,
            None => false,
        }
    }
}

/// Default identify display: keeps the latest result as an open popup and
/// tracks the cursor the host should show. Hosts poll it after events.
#[derive(Debug, Default)]
pub struct PopupDisplay {
    popup: Mutex<Option<Popup>>,
    cursor: Mutex<CursorStyle>,
    auto_close: Option<Duration>,
    next_id: AtomicU64,
}

impl PopupDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_close(mut self, duration: Duration) -> Self {
        self.auto_close = Some(duration);
        self
    }

    /// The open popup, if any; expired auto-close popups are dropped
    pub fn popup(&self) -> Option<Popup> {
        let mut popup = self.popup.lock().ok()?;
        if popup.as_ref().is_some_and(Popup::should_auto_close) {
            *popup = None;
        }
        popup.clone()
    }

    pub fn close_popup(&self) {
        if let Ok(mut popup) = self.popup.lock() {
            *popup = None;
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor.lock().map(|cursor| *cursor).unwrap_or_default()
    }

    fn set_cursor(&self, style: CursorStyle) {
        if let Ok(mut cursor) = self.cursor.lock() {
            *cursor = style;
        }
    }
}

impl FeatureInfoDisplay for PopupDisplay {
    fn show_waiting(&self) {
        self.set_cursor(CursorStyle::Progress);
    }

    fn hide_waiting(&self) {
        self.set_cursor(CursorStyle::Default);
    }

    fn show_feature_info(&self, info: &FeatureInfo) {
        let id = format!("feature-info-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut popup = Popup::new(id, info.lat_lng, info.content.clone());
        if let Some(duration) = self.auto_close {
            popup = popup.with_auto_close(duration);
        }
        popup.show();

        log::debug!("opening {} at {:?}", popup.id, popup.position);
        if let Ok(mut slot) = self.popup.lock() {
            *slot = Some(popup);
        }
    }
}
