//! Serialized access to the attachment registry.
//!
//! A [`FilesHandle`] is a cheap `Send + Sync` handle to a single
//! `FilesActor` task that owns the [`PathRegistry`]. Commands are processed
//! one at a time, in arrival order, so attach/detach never race resolution.
//!
//! ```text
//!   FilesHandle (Clone)         mpsc       FilesActor (tokio task)
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────────┐
//!   │ .attach() .detach() │             │ PathRegistry (owned)         │
//!   │ .browse() .read()   │  ◀────────  │ resolve inline, then spawn   │
//!   │ .download()         │   oneshot   │ the I/O and reply from there │
//!   └─────────────────────┘             └──────────────────────────────┘
//! ```
//!
//! Browse, read and download resolve their path inside the actor, then hand
//! the filesystem I/O to a spawned task that sends the reply. The actor
//! moves on to the next command while that I/O is pending.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::download::prepare_download;
use crate::error::{FilesError, FilesResult};
use crate::listing::list_directory;
use crate::mime::MimeTypes;
use crate::range::read_range;
use crate::registry::PathRegistry;
use crate::resolve::{resolve, resolve_existing};
use crate::types::{Download, FileInfo, ReadChunk, ReadWindow, ResolvedPath};

type Reply<T> = oneshot::Sender<FilesResult<T>>;

/// Internal command sent from FilesHandle → FilesActor via mpsc.
enum FilesCommand {
    Attach {
        host_path: PathBuf,
        name: String,
        reply: Reply<PathBuf>,
    },
    Detach {
        name: String,
    },
    Resolve {
        path: String,
        reply: Reply<Option<ResolvedPath>>,
    },
    Browse {
        path: String,
        reply: Reply<Vec<FileInfo>>,
    },
    Read {
        path: String,
        window: ReadWindow,
        reply: Reply<ReadChunk>,
    },
    Download {
        path: String,
        reply: Reply<Download>,
    },
    Debug {
        reply: Reply<BTreeMap<String, PathBuf>>,
    },
}

/// Handle to a running files actor.
///
/// Each method sends a command and awaits the reply. The handle can be
/// cloned and shared across tasks; the actor stops once every handle has
/// been dropped.
#[derive(Clone, Debug)]
pub struct FilesHandle {
    tx: mpsc::UnboundedSender<FilesCommand>,
}

impl FilesHandle {
    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> FilesCommand) -> FilesResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| FilesError::Shutdown)?;
        rx.await.map_err(|_| FilesError::Shutdown)?
    }

    /// Attach `host_path` under the virtual `name`, replacing any previous
    /// attachment with that name. Returns the canonical real path.
    #[tracing::instrument(skip(self, host_path), fields(host_path = %host_path.as_ref().display()))]
    pub async fn attach(&self, host_path: impl AsRef<Path>, name: &str) -> FilesResult<PathBuf> {
        let host_path = host_path.as_ref().to_path_buf();
        let name = name.to_string();
        self.request(|reply| FilesCommand::Attach {
            host_path,
            name,
            reply,
        })
        .await
    }

    /// Remove the attachment for `name`, if any.
    ///
    /// Does not wait for the actor; later requests on any handle still
    /// observe the removal because commands are processed in order.
    pub fn detach(&self, name: &str) {
        let command = FilesCommand::Detach {
            name: name.to_string(),
        };
        if self.tx.send(command).is_err() {
            tracing::debug!(name, "detach after files actor shut down");
        }
    }

    /// Resolve a virtual path without touching the file it names.
    pub async fn resolve(&self, path: &str) -> FilesResult<Option<ResolvedPath>> {
        let path = path.to_string();
        self.request(|reply| FilesCommand::Resolve { path, reply })
            .await
    }

    /// List the directory named by a virtual path.
    #[tracing::instrument(skip(self))]
    pub async fn browse(&self, path: &str) -> FilesResult<Vec<FileInfo>> {
        let path = path.to_string();
        self.request(|reply| FilesCommand::Browse { path, reply })
            .await
    }

    /// Bounded read of the file named by a virtual path.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, path: &str, window: ReadWindow) -> FilesResult<ReadChunk> {
        let path = path.to_string();
        self.request(|reply| FilesCommand::Read {
            path,
            window,
            reply,
        })
        .await
    }

    /// Prepare the file named by a virtual path for streaming.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, path: &str) -> FilesResult<Download> {
        let path = path.to_string();
        self.request(|reply| FilesCommand::Download { path, reply })
            .await
    }

    /// Snapshot of every attachment: name → real path.
    pub async fn debug(&self) -> FilesResult<BTreeMap<String, PathBuf>> {
        self.request(|reply| FilesCommand::Debug { reply }).await
    }
}

/// Owns the registry and processes commands sequentially.
struct FilesActor {
    registry: PathRegistry,
    mime: Arc<MimeTypes>,
}

impl FilesActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<FilesCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle_command(command);
        }
        tracing::debug!("files actor shutting down: channel closed");
    }

    fn handle_command(&mut self, command: FilesCommand) {
        match command {
            FilesCommand::Attach {
                host_path,
                name,
                reply,
            } => {
                let _ = reply.send(self.registry.attach(&host_path, &name));
            }
            FilesCommand::Detach { name } => {
                self.registry.detach(&name);
            }
            FilesCommand::Resolve { path, reply } => {
                let _ = reply.send(resolve(&self.registry, &path));
            }
            FilesCommand::Debug { reply } => {
                let _ = reply.send(Ok(self.registry.snapshot()));
            }
            FilesCommand::Browse { path, reply } => {
                let Some((resolved, reply)) = self.resolve_or_reply(&path, reply) else {
                    return;
                };
                tokio::spawn(async move {
                    let result = if resolved.is_dir {
                        list_directory(&resolved.path, &path).await
                    } else {
                        Ok(Vec::new())
                    };
                    let _ = reply.send(result);
                });
            }
            FilesCommand::Read {
                path,
                window,
                reply,
            } => {
                let Some((resolved, reply)) = self.resolve_or_reply(&path, reply) else {
                    return;
                };
                if resolved.is_dir {
                    let _ = reply.send(Err(FilesError::IsADirectory("read")));
                    return;
                }
                tokio::spawn(async move {
                    let _ = reply.send(read_range(&resolved.path, window).await);
                });
            }
            FilesCommand::Download { path, reply } => {
                let Some((resolved, reply)) = self.resolve_or_reply(&path, reply) else {
                    return;
                };
                let mime = Arc::clone(&self.mime);
                tokio::spawn(async move {
                    let _ = reply.send(prepare_download(&resolved, &mime).await);
                });
            }
        }
    }

    /// Resolve `path`, or send the failure on `reply` and return `None`.
    fn resolve_or_reply<T>(&self, path: &str, reply: Reply<T>) -> Option<(ResolvedPath, Reply<T>)> {
        match resolve_existing(&self.registry, path) {
            Ok(resolved) => Some((resolved, reply)),
            Err(e) => {
                tracing::debug!(path, error = %e, "resolution failed");
                let _ = reply.send(Err(e));
                None
            }
        }
    }
}

/// Spawn a files actor on the current tokio runtime.
///
/// Must be called from within a runtime context.
pub fn spawn_files(mime: MimeTypes) -> FilesHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = FilesActor {
        registry: PathRegistry::new(),
        mime: Arc::new(mime),
    };
    tokio::spawn(actor.run(rx));
    FilesHandle { tx }
}
