pub mod collector;
pub mod endpoint;
pub mod key;
pub mod percentile;
pub mod resource;

pub use collector::Collector;
pub use endpoint::{EndpointSnapshot, EndpointStats};
pub use key::normalize_endpoint;
pub use percentile::{DurationSummary, percentile, percentile_sorted};
pub use resource::{ResourceSnapshot, ResourceStats};
