//! Embedded web dashboard for gridcast.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: login, prediction form, results, stats, history
//! - JSON API endpoints backed by the shared [`App`] context
//!
//! Launched via `gridcast web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::app::App;
use crate::config::schema::GridcastConfig;

pub use api::Reply;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Requests are handled sequentially against one
/// [`App`], so at most one prediction is ever outstanding.
pub fn serve(config: GridcastConfig, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
    let mut app = App::open(config);

    println!("gridcast dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");
    app.events().info("web.started", addr);

    let url = format!("http://{addr}");
    let _ = open_browser(&url);

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = match dispatch(&mut app, &method, &url, body.as_deref()) {
            Ok(reply) => reply,
            Err(e) => {
                app.events().error("web.handler_failed", format!("{method} {url}: {e}"));
                Reply::error(500, e.to_string())
            }
        };
        let status = reply.status();
        let _ = request.respond(into_response(reply));
        app.events().debug("web.request", format!("{method} {url} {status}"));

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(app: &mut App, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Ok(Reply::Html(frontend::INDEX_HTML))
        }

        // API — Session
        (&Method::Get, "/api/session") => Ok(api::get_session(app)),
        (&Method::Post, "/api/login") => api::post_login(app, body.unwrap_or("{}")),
        (&Method::Post, "/api/logout") => Ok(api::post_logout(app)),

        // API — Predictions
        (&Method::Get, "/api/options") => Ok(api::get_options()),
        (&Method::Post, "/api/predict") => api::post_predict(app, body.unwrap_or("{}")),

        // API — History
        (&Method::Get, "/api/history") => Ok(api::get_history(app)),
        (&Method::Delete, "/api/history") => Ok(api::delete_history(app, url)),
        (&Method::Get, "/api/stats") => Ok(api::get_stats(app)),
        (&Method::Get, "/api/export") => Ok(api::get_export(app, url)),

        // 404
        _ => Ok(Reply::error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn into_response(reply: Reply) -> Response<Cursor<Vec<u8>>> {
    match reply {
        Reply::Html(html) => Response::from_data(html.as_bytes().to_vec())
            .with_header(content_type_html())
            .with_status_code(StatusCode(200)),
        Reply::Json { status, body } => Response::from_data(body.to_string().into_bytes())
            .with_header(content_type_json())
            .with_status_code(StatusCode(status)),
        Reply::Download {
            file_name,
            contents,
        } => {
            let mut resp = Response::from_data(contents.into_bytes())
                .with_header(content_type_text())
                .with_status_code(StatusCode(200));
            let disposition = format!("attachment; filename=\"{file_name}\"");
            if let Ok(header) = Header::from_bytes("Content-Disposition", disposition.as_bytes()) {
                resp.add_header(header);
            }
            resp
        }
    }
}

fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

fn content_type_text() -> Header {
    Header::from_bytes("Content-Type", "text/plain; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
