//! # pathgate-files
//!
//! Expose host directories under short virtual names and serve them:
//! directory listings, bounded reads for paging and tailing, and whole-file
//! downloads.
//!
//! - [`PathRegistry`] - virtual name → canonical real path
//! - [`resolve()`] - longest-prefix resolution with containment checks
//! - [`list_directory`], [`read_range`], [`prepare_download`] - serving
//! - [`FilesHandle`] - serialized access through a single actor task
//! - [`routes`] - transport-agnostic browse/read/download/debug surface
//!
//! Resolution never yields a path outside the attachment it matched:
//! symlinks and `..` segments are followed, then the canonical result is
//! checked against the canonical attachment root.
//!
//! Unix only: listings, access checks and reads use unix metadata and
//! syscalls.

pub mod actor;
pub mod config;
pub mod constants;
pub mod download;
mod error;
pub mod listing;
pub mod mime;
pub mod range;
pub mod registry;
pub mod resolve;
pub mod routes;
#[cfg(test)]
mod test_support;
mod types;

pub use actor::{FilesHandle, spawn_files};
pub use config::{AttachConfig, ConfigError, FilesConfig};
pub use download::prepare_download;
pub use error::{FilesError, FilesResult};
pub use listing::list_directory;
pub use mime::MimeTypes;
pub use range::read_range;
pub use registry::PathRegistry;
pub use resolve::resolve;
pub use routes::{Body, Request, Response, Route, dispatch};
pub use types::{Download, FileInfo, ReadChunk, ReadWindow, ResolvedPath};
