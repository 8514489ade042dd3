// AI gateway: provider abstraction, the Gemini adapter and output parsing

pub mod provider;
pub mod gemini;
pub mod json;
pub mod lenient;

pub use provider::*;
pub use json::{parse_json, parse_record};
