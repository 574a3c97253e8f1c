//! GetFeatureInfo: turning a map click into a query, fetching it and
//! handing the parsed result to a display.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::geo::{LatLng, Point};
use crate::wms::fetch::{FetchClient, FetchOutcome};
use crate::wms::params::WmsParams;

/// A fully built GetFeatureInfo query
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoRequest {
    /// Clicked pixel in map container coordinates
    pub point: Point,
    pub lat_lng: LatLng,
    /// Layers being queried
    pub layers: Vec<String>,
    pub params: WmsParams,
    pub url: String,
}

/// What identify produced for one click
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub lat_lng: LatLng,
    /// Parsed content, usually HTML
    pub content: String,
    /// The URL that was queried
    pub url: String,
    /// False when the fetch failed and `content` is a fallback
    pub fetched: bool,
}

/// Turns a fetch outcome (and the URL it came from) into display content
pub type FeatureInfoParser = Arc<dyn Fn(&FetchOutcome, &str) -> String + Send + Sync>;

pub fn default_parser() -> FeatureInfoParser {
    Arc::new(parse_feature_info)
}

/// Uses the response body as-is. A failed fetch degrades to an inline
/// frame pointing at the query, so the browser can retry it directly.
pub fn parse_feature_info(outcome: &FetchOutcome, url: &str) -> String {
    match outcome {
        FetchOutcome::Success(body) => body.clone(),
        FetchOutcome::Failure(_) => fallback_content(url),
    }
}

pub fn fallback_content(url: &str) -> String {
    format!("<iframe src='{}' style='border:none'>", url)
}

/// Where identify results and the waiting indicator go
pub trait FeatureInfoDisplay: Send + Sync {
    fn show_waiting(&self);
    fn hide_waiting(&self);
    fn show_feature_info(&self, info: &FeatureInfo);
}

/// Shows the waiting indicator on creation and hides it on drop, so it is
/// hidden exactly once even if the fetch future is abandoned.
pub(crate) struct WaitingGuard {
    display: Arc<dyn FeatureInfoDisplay>,
}

impl WaitingGuard {
    pub(crate) fn show(display: Arc<dyn FeatureInfoDisplay>) -> Self {
        display.show_waiting();
        Self { display }
    }
}

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        self.display.hide_waiting();
    }
}

impl fmt::Debug for WaitingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitingGuard").finish_non_exhaustive()
    }
}

/// Fetches `request` with the waiting indicator up, then parses the outcome
pub async fn fetch_feature_info(
    request: FeatureInfoRequest,
    client: Arc<dyn FetchClient>,
    parser: FeatureInfoParser,
    display: Arc<dyn FeatureInfoDisplay>,
) -> FeatureInfo {
    let outcome = {
        let _waiting = WaitingGuard::show(display);
        client.fetch(&request.url).await
    };

    if let FetchOutcome::Failure(failure) = &outcome {
        log::warn!(
            "GetFeatureInfo for {:?} failed ({}), showing fallback",
            request.layers,
            failure
        );
    }

    FeatureInfo {
        lat_lng: request.lat_lng,
        content: parser(&outcome, &request.url),
        fetched: outcome.is_success(),
        url: request.url,
    }
}
