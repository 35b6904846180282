//! Request surface: browse, read, download and debug.
//!
//! Transport-agnostic. A transport hands in a route name and the query
//! parameters of a request, and gets back a [`Response`] with a status code,
//! headers and a body. File downloads come back as [`Body::Path`] so the
//! transport can stream the file instead of buffering it.
//!
//! Query parameters:
//!
//! | route           | required | optional                     |
//! |-----------------|----------|------------------------------|
//! | `/browse.json`  | `path`   | `jsonp`                      |
//! | `/read.json`    | `path`   | `offset`, `length`, `jsonp`  |
//! | `/download.json`| `path`   |                              |
//! | `/debug.json`   |          | `jsonp`                      |

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::actor::FilesHandle;
use crate::constants::{JSON_CONTENT_TYPE, JSONP_CONTENT_TYPE};
use crate::error::{FilesError, FilesResult};
use crate::types::ReadWindow;

/// Request endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum Route {
    #[strum(serialize = "/browse.json")]
    Browse,
    #[strum(serialize = "/read.json")]
    Read,
    #[strum(serialize = "/download.json")]
    Download,
    #[strum(serialize = "/debug.json")]
    Debug,
}

/// Incoming request: query parameters only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub query: BTreeMap<String, String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The required, non-empty `path` parameter.
    fn path(&self) -> FilesResult<&str> {
        match self.get("path") {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(FilesError::invalid_request(
                "Expecting 'path=value' in query",
            )),
        }
    }

    /// An optional unsigned integer parameter.
    fn number(&self, key: &str) -> FilesResult<Option<u64>> {
        self.get(key)
            .map(|value| {
                value.parse::<u64>().map_err(|e| {
                    FilesError::invalid_request(format!("Failed to parse {key}: {e}"))
                })
            })
            .transpose()
    }

    fn jsonp(&self) -> Option<&str> {
        self.get("jsonp")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Request {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            query: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
    /// Stream the file at this path.
    Path(PathBuf),
}

/// Outgoing response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Body,
}

impl Response {
    fn new(status: u16, body: Body) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// 200 with a JSON body, JSONP-wrapped when a callback is given.
    pub fn json(value: serde_json::Value, jsonp: Option<&str>) -> Self {
        match jsonp {
            Some(callback) => Self::new(200, Body::Text(format!("{callback}({value});")))
                .with_header("Content-Type", JSONP_CONTENT_TYPE),
            None => Self::new(200, Body::Json(value)).with_header("Content-Type", JSON_CONTENT_TYPE),
        }
    }

    /// Serialize `value` into a JSON response.
    fn serialized<T: Serialize>(value: &T, jsonp: Option<&str>) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::json(value, jsonp),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                Self::new(500, Body::Text(format!("Failed to serialize response: {e}.\n")))
            }
        }
    }

    /// Error response: status from the error class, short text body.
    ///
    /// Not-found responses never echo the path, so absent attachments and
    /// file-as-directory mistakes look the same. Client errors are logged at
    /// `debug`, everything else at `warn`.
    pub fn error(err: &FilesError) -> Self {
        let status = err.status_code();
        if err.is_client_error() {
            tracing::debug!(status, error = %err, "rejected request");
        } else {
            tracing::warn!(status, error = %err, "request failed");
        }

        match err {
            FilesError::NotFound(_) => Self::not_found(),
            _ => Self::new(status, Body::Text(format!("{err}.\n"))),
        }
    }

    pub fn not_found() -> Self {
        Self::new(404, Body::Text("Not found.\n".to_string()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

impl From<FilesResult<Response>> for Response {
    fn from(result: FilesResult<Response>) -> Self {
        result.unwrap_or_else(|e| Response::error(&e))
    }
}

/// Dispatch a request by route name. Unknown routes are 404.
pub async fn dispatch(files: &FilesHandle, route: &str, request: &Request) -> Response {
    match route.parse::<Route>() {
        Ok(route) => handle(files, route, request).await,
        Err(_) => {
            tracing::debug!(route, "unknown route");
            Response::not_found()
        }
    }
}

/// Handle a request for a known route.
pub async fn handle(files: &FilesHandle, route: Route, request: &Request) -> Response {
    let result = match route {
        Route::Browse => browse(files, request).await,
        Route::Read => read(files, request).await,
        Route::Download => download(files, request).await,
        Route::Debug => debug(files, request).await,
    };
    result.into()
}

/// Sorted listing: `[{"name", "path", "dir", "size", ...}, ...]`.
async fn browse(files: &FilesHandle, request: &Request) -> FilesResult<Response> {
    let path = request.path()?;
    let listing = files.browse(path).await?;
    Ok(Response::serialized(&listing, request.jsonp()))
}

/// `{"offset": n, "data": "..."}`. See [`crate::range`] for window semantics.
async fn read(files: &FilesHandle, request: &Request) -> FilesResult<Response> {
    let path = request.path()?;
    let window = ReadWindow {
        offset: request.number("offset")?,
        length: request.number("length")?,
    };
    let chunk = files.read(path, window).await?;
    Ok(Response::json(chunk.to_json(), request.jsonp()))
}

async fn download(files: &FilesHandle, request: &Request) -> FilesResult<Response> {
    let path = request.path()?;
    let download = files.download(path).await?;
    Ok(Response::new(200, Body::Path(download.path.clone()))
        .with_header("Content-Type", download.content_type.clone())
        .with_header("Content-Disposition", download.content_disposition()))
}

/// `{"<name>": "<real path>", ...}`.
async fn debug(files: &FilesHandle, request: &Request) -> FilesResult<Response> {
    let paths = files.debug().await?;
    Ok(Response::serialized(&paths, request.jsonp()))
}
