//! Serving constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Number of memory pages a single bounded read may return.
pub const READ_CAP_PAGES: usize = 16;

/// Content type used when the MIME table has no entry for an extension.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for plain JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for JSONP-wrapped responses.
pub const JSONP_CONTENT_TYPE: &str = "text/javascript";

/// Upper bound, in bytes, on the data returned by one bounded read.
///
/// Sixteen pages of the platform page size (64 KiB with 4 KiB pages).
pub fn max_read_length() -> u64 {
    (rustix::param::page_size() * READ_CAP_PAGES) as u64
}
