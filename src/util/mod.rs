//! Utility functions for common operations.
//!
//! - **URL validation**: the submit-time feed URL policy and the check applied
//!   before handing a post link to the system browser
//! - **Text processing**: sanitizing feed-supplied text for the terminal and
//!   width-aware truncation

mod text;
mod url_validator;

pub use text::{sanitize_line, truncate_to_width};
pub use url_validator::{validate_feed_url, validate_url_for_open, ValidationError};
