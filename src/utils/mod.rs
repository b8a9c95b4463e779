pub mod constants;
pub mod mime;
pub mod url_utils;

pub use constants::*;
pub use mime::{content_type_for, image_content_type};
pub use url_utils::{
    basic_auth_token, dedupe_preserving_order, is_external, normalize_path, resolve_url,
    split_url_suffix, url_directory,
};
