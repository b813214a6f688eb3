mod content_type;
mod error_handler;
mod rate_limit;

pub use content_type::{require_json, require_json_or_multipart};
pub use error_handler::log_errors;
pub use rate_limit::rate_limit;
