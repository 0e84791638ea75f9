pub mod tabnews;
pub mod traits;

pub use tabnews::{parse_target, TabNewsSource};
pub use traits::ContentSource;
