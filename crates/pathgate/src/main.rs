//! pathgate: browse, read and download files through virtual attachments.
//!
//! Usage:
//!   # List a directory attached as "sandbox"
//!   pathgate -a sandbox=/var/task/7 browse sandbox
//!
//!   # Read 5 bytes from the start of a file
//!   pathgate -a sandbox=/var/task/7 read sandbox/stdout --offset 0 --length 5
//!
//!   # Follow a growing file until Ctrl-C
//!   pathgate -a sandbox=/var/task/7 read sandbox/stdout --follow
//!
//!   # Attachments from a config file
//!   pathgate --config ~/.config/pathgate.toml debug

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, fmt};

use pathgate_files::routes::handle;
use pathgate_files::{
    Body, FilesConfig, FilesHandle, ReadWindow, Request, Response, Route, spawn_files,
};

/// Serve attached host directories under virtual names.
#[derive(Parser, Debug)]
#[command(name = "pathgate")]
#[command(about = "Browse, read and download files through virtual attachments")]
struct Args {
    /// TOML config with [[attach]] entries and [mime] overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Attach a host path: NAME=PATH (repeatable, applied after the config)
    #[arg(short, long = "attach", value_name = "NAME=PATH", value_parser = parse_attach)]
    attach: Vec<(String, PathBuf)>,

    /// Wrap JSON output in this JSONP callback
    #[arg(long)]
    jsonp: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Browse { path: String },

    /// Read a bounded window of a file
    Read {
        path: String,

        /// Start offset; defaults to the end of the file
        #[arg(long)]
        offset: Option<u64>,

        /// Maximum bytes to read
        #[arg(long)]
        length: Option<u64>,

        /// Keep reading new data as the file grows, until Ctrl-C
        #[arg(short, long, conflicts_with = "length")]
        follow: bool,

        /// Poll interval for --follow
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Stream a whole file
    Download {
        path: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print every attachment
    Debug,
}

fn parse_attach(s: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{s}'"))?;
    if path.is_empty() {
        return Err(format!("empty path in '{s}'"));
    }
    Ok((
        name.to_string(),
        PathBuf::from(shellexpand::tilde(path).as_ref()),
    ))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // stdout carries file data, logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FilesConfig::load(path)?,
        None => FilesConfig::default(),
    };

    let files = spawn_files(config.mime_types());

    let attachments = config
        .attach
        .iter()
        .map(|entry| (entry.name.clone(), entry.expanded_path()))
        .chain(args.attach.iter().cloned());
    for (name, path) in attachments {
        let real = files
            .attach(&path, &name)
            .await
            .with_context(|| format!("failed to attach {} as '{name}'", path.display()))?;
        tracing::info!(name = %name, path = %real.display(), "attached");
    }

    let (route, request, output) = match args.command {
        Command::Read {
            path,
            offset,
            follow: true,
            interval_ms,
            ..
        } => {
            follow(&files, &path, offset, Duration::from_millis(interval_ms)).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Browse { path } => (Route::Browse, Request::new().with("path", path), None),
        Command::Read {
            path,
            offset,
            length,
            ..
        } => {
            let mut request = Request::new().with("path", path);
            if let Some(offset) = offset {
                request = request.with("offset", offset.to_string());
            }
            if let Some(length) = length {
                request = request.with("length", length.to_string());
            }
            (Route::Read, request, None)
        }
        Command::Download { path, output } => {
            (Route::Download, Request::new().with("path", path), output)
        }
        Command::Debug => (Route::Debug, Request::new(), None),
    };

    let request = match args.jsonp {
        Some(callback) => request.with("jsonp", callback),
        None => request,
    };

    let response = handle(&files, route, &request).await;
    render(response, output).await
}

/// Write a response to stdout (or `output` for downloads).
async fn render(response: Response, output: Option<PathBuf>) -> Result<ExitCode> {
    let success = response.is_success();

    match response.body {
        Body::Json(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Body::Text(text) if success => print!("{text}"),
        Body::Text(text) => eprint!("{}: {text}", response.status),
        Body::Path(path) => {
            let mut file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            let copied = match output {
                Some(output) => {
                    let mut out = tokio::fs::File::create(&output)
                        .await
                        .with_context(|| format!("failed to create {}", output.display()))?;
                    tokio::io::copy(&mut file, &mut out).await?
                }
                None => {
                    let mut out = tokio::io::stdout();
                    let copied = tokio::io::copy(&mut file, &mut out).await?;
                    out.flush().await?;
                    copied
                }
            };
            tracing::debug!(
                path = %path.display(),
                bytes = copied,
                content_type = response.headers.get("Content-Type").map(String::as_str),
                "download complete"
            );
        }
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Page through a growing file, starting at `offset` or at its current end.
async fn follow(
    files: &FilesHandle,
    path: &str,
    offset: Option<u64>,
    interval: Duration,
) -> Result<()> {
    let mut next = match offset {
        Some(offset) => offset,
        None => files.read(path, ReadWindow::tail()).await?.offset,
    };
    let mut stdout = tokio::io::stdout();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let chunk = files.read(path, ReadWindow::from_offset(next)).await?;
        if chunk.offset < next {
            tracing::warn!(path, from = next, to = chunk.offset, "file shrank, restarting from its end");
        }
        next = chunk.next_offset();
        if !chunk.data.is_empty() {
            stdout.write_all(&chunk.data).await?;
            stdout.flush().await?;
            // More may already be waiting past the read cap.
            continue;
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::debug!(path, offset = next, "follow interrupted");
                return Ok(());
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
