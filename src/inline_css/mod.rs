//! Image inlining for stylesheets

pub mod image_inliner;
pub mod search_paths;

pub use image_inliner::inline_images;
pub use search_paths::{SearchPath, search_paths};
