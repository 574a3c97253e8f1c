use crate::core::geo::{LatLng, Point};
use crate::traits::ImageHandle;
use serde::{Deserialize, Serialize};

/// Events the host forwards to WMS sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// The view settled after a pan, zoom or resize
    ViewChanged,
    /// An image from `add_image` finished loading
    ImageLoaded(ImageHandle),
    /// An image from `add_image` could not be loaded
    ImageFailed(ImageHandle),
    /// Single click/tap
    Click {
        /// Pixel position relative to the map container
        container_point: Point,
        lat_lng: LatLng,
    },
}

impl MapEvent {
    /// Which image a load notification refers to
    pub fn image(&self) -> Option<ImageHandle> {
        match self {
            MapEvent::ImageLoaded(handle) | MapEvent::ImageFailed(handle) => Some(*handle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_accessor() {
        assert_eq!(MapEvent::ImageLoaded(ImageHandle(3)).image(), Some(ImageHandle(3)));
        assert_eq!(MapEvent::ImageFailed(ImageHandle(4)).image(), Some(ImageHandle(4)));
        assert_eq!(MapEvent::ViewChanged.image(), None);
    }

    #[test]
    fn test_events_serialize() {
        let click = MapEvent::Click {
            container_point: Point::new(5.0, 7.0),
            lat_lng: LatLng::new(1.0, 2.0),
        };
        let json = serde_json::to_string(&click).unwrap();
        let back: MapEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, click);
    }
}
