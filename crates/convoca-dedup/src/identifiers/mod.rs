pub mod extract;
pub mod registry_code;

pub use extract::extract_registry_code;
pub use registry_code::{normalize_registry_code, normalize_registry_code_str};
