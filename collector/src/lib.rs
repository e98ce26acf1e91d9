pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod transcript;
pub mod utils;
pub mod youtube;

pub use collector::{Collector, CollectorSettings, CollectorState, Phase};
pub use error::{FetchError, Policy, Stage};
pub use models::{SearchPage, SearchQuery, VideoRecord};
