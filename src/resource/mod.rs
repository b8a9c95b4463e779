//! Resource Locator
//!
//! Documents and stylesheets arrive as literal content, local paths or
//! remote URLs. The locator materializes each of them as a [`Resource`]
//! carrying its content, where it came from and the base against which the
//! references inside it resolve.

pub mod downloaders;
pub mod locator;
pub mod types;

pub use downloaders::{Downloaded, FetchOptions, TooLarge};
pub use locator::ResourceLocator;
pub use types::{Location, Resource, ResourceBase};
