//! Headless presentation state for identify results

pub mod popup;

pub use popup::{CursorStyle, Popup, PopupDisplay};
