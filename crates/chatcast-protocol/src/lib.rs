pub mod frames;

pub use frames::{ChatMessage, ErrorBody};
