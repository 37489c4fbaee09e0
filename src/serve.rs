//! Development server with live reload support.
//!
//! A lightweight HTTP server for local development, built on `tiny_http`:
//!
//! - Static file serving from the build output directory
//! - Automatic `index.html` resolution for directories
//! - Live-reload client injection into HTML responses
//! - File watching and auto-rebuild (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │   Main Thread   │   │  Watcher Thread  │   │ Reload Acceptor │
//! │  (HTTP Server)  │   │  (File Monitor)  │   │   (WebSocket)   │
//! └────────┬────────┘   └────────┬─────────┘   └────────┬────────┘
//!          │                     │                      │
//!          ▼                     ▼                      ▼
//!    Serve files           Re-run tasks           Push inject/
//!    from output           on change              reload signals
//! ```

use crate::{
    build,
    config::ProjectConfig,
    log,
    reload::LiveReload,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Cursor,
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Live-reload client script (embedded at compile time)
const LIVERELOAD_TEMPLATE: &str = include_str!("embed/serve/livereload.js");

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Build once, then serve the output directory with watch + live reload.
///
/// This function:
/// 1. Binds the HTTP server (with auto-retry on port conflict) and the
///    live-reload WebSocket on the next port up
/// 2. Runs the full build once, logging any per-task failures
/// 3. Spawns the file watcher thread (if enabled)
/// 4. Enters the main request handling loop
///
/// The server blocks until Ctrl+C is received.
pub fn serve_project(config: &'static ProjectConfig) -> Result<()> {
    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let base_port = config.serve.port;

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let reload = LiveReload::start(interface, addr.port() + 1)?;

    // Initial build; compile failures are logged per-task and do not end
    // the session.
    let reports = build::build_all(config, Some(reload.as_ref()))?;
    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        log!("serve"; "{failed} task(s) failed, watching for fixes");
    }

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    // Spawn file watcher thread
    if config.serve.watch {
        let watcher_reload = Arc::clone(&reload);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config, &watcher_reload) {
                log!("watch"; "{err}");
            }
        });
    }

    let snippet = reload_snippet(reload.port());

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config, &snippet) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Render the live-reload client with the WebSocket port filled in.
fn reload_snippet(port: u16) -> String {
    format!(
        "<script>{}</script>",
        LIVERELOAD_TEMPLATE.replace("{port}", &port.to_string())
    )
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset * 2);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                // Last attempt failed
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Request resolution order:
/// 1. Exact file match → serve file
/// 2. Directory with index.html → serve index.html
/// 3. Nothing found → 404
fn handle_request(request: Request, config: &ProjectConfig, snippet: &str) -> Result<()> {
    let serve_root = &config.build.output;

    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path.
    // This is important for cache-busting URLs like "style.min.css?t=123"
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');
    let local_path = serve_root.join(request_path);

    // Try to serve the file directly
    if local_path.is_file() {
        return serve_file(request, &local_path, snippet);
    }

    // If it's a directory, try index.html
    if local_path.is_dir() {
        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return serve_file(request, &index_path, snippet);
        }
    }

    // 404 Not Found
    serve_not_found(request)
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with appropriate content type.
///
/// HTML responses get the live-reload client injected.
fn serve_file(request: Request, path: &Path, snippet: &str) -> Result<()> {
    let content_type = guess_content_type(path);

    let content = if is_html(path) {
        let page =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        inject_snippet(&page, snippet).into_bytes()
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());

    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "htm")
    )
}

/// Insert the live-reload client before `</body>`, or append when the page
/// has no closing body tag.
fn inject_snippet(page: &str, snippet: &str) -> String {
    let lower = page.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(page.len() + snippet.len());
            out.push_str(&page[..idx]);
            out.push_str(snippet);
            out.push_str(&page[idx..]);
            out
        }
        None => {
            let mut out = String::with_capacity(page.len() + snippet.len());
            out.push_str(page);
            out.push_str(snippet);
            out
        }
    }
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("txt") => "text/plain; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(
            guess_content_type(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(Path::new("assets/css/style.min.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(Path::new("assets/js/main.min.js")),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("a.woff2")), "font/woff2");
        assert_eq!(
            guess_content_type(Path::new("unknown.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_inject_snippet_before_body_close() {
        let page = "<html><body><p>hi</p></body></html>";
        let out = inject_snippet(page, "<script>x</script>");

        assert_eq!(out, "<html><body><p>hi</p><script>x</script></body></html>");
    }

    #[test]
    fn test_inject_snippet_case_insensitive() {
        let page = "<HTML><BODY></BODY></HTML>";
        let out = inject_snippet(page, "<script>x</script>");

        assert!(out.contains("<script>x</script></BODY>"));
    }

    #[test]
    fn test_inject_snippet_without_body() {
        let page = "<p>fragment</p>";
        let out = inject_snippet(page, "<script>x</script>");

        assert_eq!(out, "<p>fragment</p><script>x</script>");
    }

    #[test]
    fn test_reload_snippet_fills_port() {
        let snippet = reload_snippet(3001);

        assert!(snippet.starts_with("<script>"));
        assert!(snippet.contains(":3001"));
        assert!(!snippet.contains("{port}"));
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(Path::new("index.html")));
        assert!(is_html(Path::new("about.htm")));
        assert!(!is_html(Path::new("style.css")));
    }
}
