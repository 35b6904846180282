//! End-to-end tests through the files actor and the request surface.

use std::path::Path;

use pathgate_files::constants::max_read_length;
use pathgate_files::{
    Body, FilesError, FilesHandle, MimeTypes, ReadWindow, Request, dispatch, spawn_files,
};
use tempfile::TempDir;

// ============================================================================
// Shared test setup
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A task sandbox with a few children, attached as `sandbox`.
async fn setup_sandbox() -> (FilesHandle, TempDir) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let sandbox = dir.path().join("task");
    std::fs::create_dir_all(sandbox.join("logs")).unwrap();
    std::fs::write(sandbox.join("stdout"), "hello world").unwrap();
    std::fs::write(sandbox.join("stderr"), "").unwrap();
    std::fs::write(sandbox.join("result.json"), "{}").unwrap();

    let files = spawn_files(MimeTypes::default());
    files.attach(&sandbox, "sandbox").await.unwrap();
    (files, dir)
}

fn body_json(body: &Body) -> &serde_json::Value {
    match body {
        Body::Json(value) => value,
        other => panic!("expected JSON body, got {other:?}"),
    }
}

fn canonical(path: &Path) -> std::path::PathBuf {
    std::fs::canonicalize(path).unwrap()
}

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn test_sandbox_scenario() {
    let (files, dir) = setup_sandbox().await;

    // Browse lists every child under its virtual path, sorted by real path.
    let request = Request::new().with("path", "sandbox");
    let response = dispatch(&files, "/browse.json", &request).await;
    assert_eq!(response.status, 200);
    let listing = body_json(&response.body).as_array().unwrap();
    let paths: Vec<_> = listing
        .iter()
        .map(|entry| entry["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        paths,
        vec![
            "sandbox/logs",
            "sandbox/result.json",
            "sandbox/stderr",
            "sandbox/stdout"
        ]
    );
    assert_eq!(listing[0]["dir"], true);
    assert_eq!(listing[3]["size"], 11);
    assert_eq!(listing[3]["name"], "stdout");

    // Paged read.
    let request = Request::new()
        .with("path", "sandbox/stdout")
        .with("offset", "0")
        .with("length", "5");
    let response = dispatch(&files, "/read.json", &request).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        body_json(&response.body),
        &serde_json::json!({"offset": 0, "data": "hello"})
    );

    // Download by reference.
    let request = Request::new().with("path", "sandbox/stdout");
    let response = dispatch(&files, "/download.json", &request).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("Content-Type"),
        Some("application/octet-stream")
    );
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=stdout")
    );
    assert_eq!(
        response.body,
        Body::Path(canonical(&dir.path().join("task/stdout")))
    );
}

#[tokio::test]
async fn test_download_content_type_from_extension() {
    let (files, _dir) = setup_sandbox().await;

    let request = Request::new().with("path", "sandbox/result.json");
    let response = dispatch(&files, "/download.json", &request).await;
    assert_eq!(response.header("Content-Type"), Some("application/json"));
}

// ============================================================================
// Resolution properties
// ============================================================================

#[tokio::test]
async fn test_attach_resolve_round_trip() {
    let (files, dir) = setup_sandbox().await;

    let resolved = files.resolve("sandbox/stdout").await.unwrap().unwrap();
    assert_eq!(resolved.path, canonical(&dir.path().join("task/stdout")));
    assert!(!resolved.is_dir);
}

#[tokio::test]
async fn test_longest_prefix_through_actor() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    std::fs::create_dir_all(dir.path().join("other")).unwrap();
    std::fs::write(dir.path().join("a/b/c"), "from a").unwrap();
    std::fs::write(dir.path().join("other/c"), "from a/b").unwrap();

    let files = spawn_files(MimeTypes::default());
    files.attach(dir.path().join("a"), "a").await.unwrap();
    files.attach(dir.path().join("other"), "a/b").await.unwrap();

    let chunk = files
        .read("a/b/c", ReadWindow::from_offset(0))
        .await
        .unwrap();
    assert_eq!(chunk.data, b"from a/b");
}

#[tokio::test]
async fn test_symlink_escape_is_server_error() {
    let (files, dir) = setup_sandbox().await;
    let outside = TempDir::new().unwrap();
    std::fs::write(outside.path().join("secret"), "s").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("task/escape")).unwrap();

    let result = files.resolve("sandbox/escape/secret").await;
    assert!(matches!(result, Err(FilesError::Inaccessible(_))));

    for route in ["/browse.json", "/read.json", "/download.json"] {
        let request = Request::new().with("path", "sandbox/escape/secret");
        let response = dispatch(&files, route, &request).await;
        assert_eq!(response.status, 500, "{route}");
        match response.body {
            Body::Text(text) => assert!(text.contains("is inaccessible"), "{text}"),
            other => panic!("unexpected body {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_file_attachment_as_directory_is_not_found() {
    let (files, dir) = setup_sandbox().await;
    files
        .attach(dir.path().join("task/stdout"), "out")
        .await
        .unwrap();

    assert_eq!(files.resolve("out/extra").await.unwrap(), None);

    let request = Request::new().with("path", "out/extra");
    let response = dispatch(&files, "/read.json", &request).await;
    assert_eq!(response.status, 404);

    // The attachment itself is readable.
    let request = Request::new().with("path", "out").with("offset", "6");
    let response = dispatch(&files, "/read.json", &request).await;
    assert_eq!(body_json(&response.body)["data"], "world");
}

#[tokio::test]
async fn test_detach_is_idempotent_and_ordered() {
    let (files, dir) = setup_sandbox().await;
    files.attach(dir.path(), "root").await.unwrap();

    files.detach("never-attached");
    files.detach("never-attached");
    files.detach("root");

    let paths = files.debug().await.unwrap();
    assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["sandbox"]);
    assert_eq!(files.resolve("root/task").await.unwrap(), None);
}

#[tokio::test]
async fn test_reattach_replaces() {
    let (files, _dir) = setup_sandbox().await;
    let other = TempDir::new().unwrap();
    std::fs::write(other.path().join("stdout"), "replaced").unwrap();

    files.attach(other.path(), "sandbox").await.unwrap();

    let chunk = files
        .read("sandbox/stdout", ReadWindow::from_offset(0))
        .await
        .unwrap();
    assert_eq!(chunk.data, b"replaced");
}

#[tokio::test]
async fn test_attach_failures() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let files = spawn_files(MimeTypes::default());

    let missing = files.attach(dir.path().join("missing"), "x").await;
    assert!(matches!(missing, Err(FilesError::Io { .. })));

    let empty = files.attach(dir.path(), "/").await;
    assert!(matches!(empty, Err(FilesError::InvalidName(_))));

    assert!(files.debug().await.unwrap().is_empty());
}

// ============================================================================
// Read properties
// ============================================================================

#[tokio::test]
async fn test_read_bounds() {
    let (files, _dir) = setup_sandbox().await;

    for query in [None, Some("11"), Some("500")] {
        let mut request = Request::new().with("path", "sandbox/stdout");
        if let Some(offset) = query {
            request = request.with("offset", offset);
        }
        let response = dispatch(&files, "/read.json", &request).await;
        assert_eq!(
            body_json(&response.body),
            &serde_json::json!({"offset": 11, "data": ""}),
            "offset {query:?}"
        );
    }
}

#[tokio::test]
async fn test_read_returns_only_available_bytes() {
    let (files, _dir) = setup_sandbox().await;

    let request = Request::new()
        .with("path", "sandbox/stdout")
        .with("offset", "6")
        .with("length", "100");
    let response = dispatch(&files, "/read.json", &request).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        body_json(&response.body),
        &serde_json::json!({"offset": 6, "data": "world"})
    );
}

#[tokio::test]
async fn test_read_length_capped() {
    let (files, dir) = setup_sandbox().await;
    let cap = max_read_length() as usize;
    std::fs::write(dir.path().join("task/big"), vec![b'a'; cap * 3]).unwrap();

    let chunk = files
        .read("sandbox/big", ReadWindow::new(0, (cap * 3) as u64))
        .await
        .unwrap();
    assert_eq!(chunk.offset, 0);
    assert!(!chunk.data.is_empty());
    assert!(chunk.data.len() <= cap);

    let request = Request::new()
        .with("path", "sandbox/big")
        .with("offset", "10")
        .with("length", "999999999");
    let response = dispatch(&files, "/read.json", &request).await;
    let value = body_json(&response.body);
    assert_eq!(value["offset"], 10);
    assert!(value["data"].as_str().unwrap().len() <= cap);
}

#[tokio::test]
async fn test_read_bad_requests() {
    let (files, _dir) = setup_sandbox().await;

    let cases = [
        (Request::new(), "Expecting 'path=value' in query.\n"),
        (
            Request::new().with("path", ""),
            "Expecting 'path=value' in query.\n",
        ),
        (
            Request::new().with("path", "sandbox/stdout").with("offset", "abc"),
            "Failed to parse offset",
        ),
        (
            Request::new().with("path", "sandbox/stdout").with("length", "1.5"),
            "Failed to parse length",
        ),
        (
            Request::new().with("path", "sandbox/logs"),
            "Cannot read a directory.\n",
        ),
    ];

    for (request, expected) in cases {
        let response = dispatch(&files, "/read.json", &request).await;
        assert_eq!(response.status, 400, "{request:?}");
        match response.body {
            Body::Text(text) => assert!(text.starts_with(expected), "{text}"),
            other => panic!("unexpected body {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_download_directory_rejected() {
    let (files, _dir) = setup_sandbox().await;

    let request = Request::new().with("path", "sandbox/logs");
    let response = dispatch(&files, "/download.json", &request).await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        Body::Text("Cannot download a directory.\n".to_string())
    );
}

#[tokio::test]
async fn test_tail_polling() {
    let (files, dir) = setup_sandbox().await;
    let log = dir.path().join("task/logs/app.log");
    std::fs::write(&log, "boot\n").unwrap();

    let start = files
        .read("sandbox/logs/app.log", ReadWindow::tail())
        .await
        .unwrap();
    assert_eq!(start.offset, 5);
    assert!(start.data.is_empty());

    std::fs::write(&log, "boot\nready\n").unwrap();

    let chunk = files
        .read("sandbox/logs/app.log", ReadWindow::from_offset(start.offset))
        .await
        .unwrap();
    assert_eq!(chunk.offset, 5);
    assert_eq!(chunk.data, b"ready\n");
}

// ============================================================================
// Browse, debug, routing
// ============================================================================

#[tokio::test]
async fn test_browse_errors() {
    let (files, _dir) = setup_sandbox().await;

    let response = dispatch(&files, "/browse.json", &Request::new()).await;
    assert_eq!(response.status, 400);

    let request = Request::new().with("path", "nowhere");
    let response = dispatch(&files, "/browse.json", &request).await;
    assert_eq!(response.status, 404);

    let request = Request::new().with("path", "sandbox/missing");
    let response = dispatch(&files, "/browse.json", &request).await;
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_browse_listing_order() {
    let (files, dir) = setup_sandbox().await;
    for name in ["b", "a", "c2", "c10"] {
        std::fs::write(dir.path().join("task/logs").join(name), name).unwrap();
    }

    let listing = files.browse("sandbox/logs/").await.unwrap();
    let names: Vec<_> = listing.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c10", "c2"]);
    assert_eq!(listing[0].path, "sandbox/logs/a");
}

#[tokio::test]
async fn test_debug_and_jsonp() {
    let (files, dir) = setup_sandbox().await;

    let response = dispatch(&files, "/debug.json", &Request::new()).await;
    assert_eq!(response.status, 200);
    let expected = canonical(&dir.path().join("task"));
    assert_eq!(
        body_json(&response.body),
        &serde_json::json!({"sandbox": expected})
    );

    let request = Request::new().with("jsonp", "show");
    let response = dispatch(&files, "/debug.json", &request).await;
    assert_eq!(response.header("Content-Type"), Some("text/javascript"));
    match response.body {
        Body::Text(text) => {
            assert!(text.starts_with("show({\"sandbox\":"), "{text}");
            assert!(text.ends_with(");"), "{text}");
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let (files, _dir) = setup_sandbox().await;

    let response = dispatch(&files, "/write.json", &Request::new()).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_concurrent_handles() {
    let (files, _dir) = setup_sandbox().await;

    let mut tasks = Vec::new();
    for i in 0..16u64 {
        let files = files.clone();
        tasks.push(tokio::spawn(async move {
            files
                .read("sandbox/stdout", ReadWindow::new(i % 11, 1))
                .await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let chunk = task.await.unwrap().unwrap();
        let offset = i as u64 % 11;
        assert_eq!(chunk.offset, offset);
        assert_eq!(chunk.data, &b"hello world"[offset as usize..offset as usize + 1]);
    }
}
