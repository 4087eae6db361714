mod auth_extractor;
mod body_limit;
mod metrics_layer;
mod rate_limit;
mod security_headers;
mod timeout;
mod tracing_layer;

pub use auth_extractor::*;
pub use body_limit::*;
pub use metrics_layer::*;
pub use rate_limit::*;
pub use security_headers::*;
pub use timeout::*;
pub use tracing_layer::*;
