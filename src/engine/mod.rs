pub mod http;
pub mod prompt;
pub mod traits;

pub use http::HttpSummaryEngine;
pub use prompt::{build_prompt, INSTRUCTIONS};
pub use traits::{Availability, SummaryEngine, UnavailableEngine};
