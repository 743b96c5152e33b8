//! HTTP protocol layer module
//!
//! Response builders shared by the dispatcher and the endpoint handlers.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_json_response, build_text_response,
};
