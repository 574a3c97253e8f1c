//! WMS protocol plumbing: request parameters, HTTP fetching and
//! GetFeatureInfo handling.

pub mod feature_info;
pub mod fetch;
pub mod params;

pub use feature_info::{
    default_parser, FeatureInfo, FeatureInfoDisplay, FeatureInfoParser, FeatureInfoRequest,
};
pub use fetch::{FetchClient, FetchFailure, FetchOutcome, ReqwestFetchClient};
pub use params::WmsParams;
