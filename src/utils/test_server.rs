//! Canned-response HTTP server for exercising the real clients
//!
//! Each route is an exact path (query string ignored) with a status and a
//! body. Unknown paths answer 404. Every request is recorded.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

pub fn route(path: &'static str, status: u16, body: impl Into<String>) -> Route {
    Route {
        path,
        status,
        body: body.into(),
    }
}

/// A request as received: target (path plus query) and the raw head
#[derive(Debug, Clone)]
pub struct Hit {
    pub target: String,
    pub head: String,
}

impl Hit {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("/")
    }
}

pub struct TestServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl TestServer {
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                serve(stream, &routes, &recorded);
            }
        });

        Self { base_url, hits }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn was_hit(&self, path: &str) -> bool {
        self.hits().iter().any(|h| h.path() == path)
    }
}

fn serve(mut stream: TcpStream, routes: &[Route], hits: &Mutex<Vec<Hit>>) {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&raw).to_string();
    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let hit = Hit { target, head };

    let (status, body) = routes
        .iter()
        .find(|r| r.path == hit.path())
        .map(|r| (r.status, r.body.as_str()))
        .unwrap_or((404, "not found"));
    hits.lock().unwrap().push(hit);

    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
