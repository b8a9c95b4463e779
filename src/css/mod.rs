//! CSS toolkit shared by the pipeline stages
//!
//! `url(...)` rewriting for the image inliner and asset path rewriter works on
//! cssparser tokens so the rest of the text is left byte for byte. Merging,
//! filtering and minification parse full stylesheets with lightningcss.

pub mod stylesheet;
pub mod urls;

pub use stylesheet::{minify, parse_stylesheet, print_stylesheet};
pub use urls::{collect_css_urls, map_css_urls};
