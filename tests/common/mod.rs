//! Shared fixtures for integration tests: a scripted prediction service and
//! throwaway storage directories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use gridcast::app::App;
use gridcast::config::GridcastConfig;
use gridcast::storage::FileStore;
use tiny_http::{Header, Response, Server, StatusCode};

/// A local HTTP server that answers `POST`s with scripted responses, in order.
pub struct MockPredictor {
    pub url: String,
    requests: Receiver<String>,
}

impl MockPredictor {
    /// Serve each `(status, body)` once, then stop accepting.
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock predictor");
        let port = server
            .server_addr()
            .to_ip()
            .expect("mock predictor listens on TCP")
            .port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok(mut request) = server.recv() else {
                    return;
                };
                let mut received = String::new();
                let _ = request.as_reader().read_to_string(&mut received);
                let _ = tx.send(received);

                let header = Header::from_bytes("Content-Type", "application/json").unwrap();
                let response = Response::from_string(body)
                    .with_header(header)
                    .with_status_code(StatusCode(status));
                let _ = request.respond(response);
            }
        });

        Self {
            url: format!("http://127.0.0.1:{port}/predict"),
            requests: rx,
        }
    }

    /// Request bodies received so far.
    pub fn received(&self) -> Vec<String> {
        self.requests.try_iter().collect()
    }
}

/// Fresh empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gridcast-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Config pointing at `predictor_url`, with no login delay and no event log.
pub fn test_config(predictor_url: &str) -> GridcastConfig {
    let mut config = GridcastConfig::default();
    config.predictor.url = predictor_url.to_string();
    config.session.login_delay_ms = 0;
    config.logging.enabled = false;
    config
}

/// App backed by a file store in `dir`.
pub fn file_app(config: GridcastConfig, dir: &Path) -> App {
    App::with_store(config, Box::new(FileStore::new(dir)))
}
