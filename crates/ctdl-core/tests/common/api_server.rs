//! Minimal HTTP/1.1 server standing in for the source API in integration tests.
//!
//! Replies are scripted per `address` query parameter; once a script runs out
//! its last reply repeats. Unknown addresses get the fallback reply.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// `(status code, body)`
pub type Reply = (u16, String);

pub struct ApiServer {
    pub url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl ApiServer {
    /// Requests seen for `address` so far.
    pub fn hits(&self, address: &str) -> usize {
        self.hits.lock().unwrap().get(address).copied().unwrap_or(0)
    }
}

/// Starts the server in a background thread; it runs until the process exits.
pub fn start(script: HashMap<String, Vec<Reply>>, fallback: Reply) -> ApiServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();
    let script = Arc::new(script);
    let fallback = Arc::new(fallback);
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let script = Arc::clone(&script);
            let fallback = Arc::clone(&fallback);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &script, &fallback, &hits));
        }
    });
    ApiServer {
        url: format!("http://127.0.0.1:{}/api", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    script: &HashMap<String, Vec<Reply>>,
    fallback: &Reply,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let address = address_param(request).unwrap_or_default();

    let count = {
        let mut hits = hits.lock().unwrap();
        let c = hits.entry(address.clone()).or_insert(0);
        *c += 1;
        *c
    };
    let (code, body) = match script.get(&address) {
        Some(replies) if !replies.is_empty() => &replies[(count - 1).min(replies.len() - 1)],
        _ => fallback,
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reason(*code),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// `address` query parameter from the request line.
fn address_param(request: &str) -> Option<String> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("address="))
        .map(str::to_string)
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "Bad Request",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
