#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// A one-shot HTTP responder: answers the given responses in order, one per
/// connection, and records every request body it saw.
pub struct MockServer {
    pub url: String,
    handle: JoinHandle<Vec<String>>,
}

impl MockServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v2/check", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut bodies = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).unwrap();
                bodies.push(String::from_utf8(request_body).unwrap());

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            bodies
        });

        Self { url, handle }
    }

    /// Wait for every scripted response to be served; returns the request bodies.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

pub const THS_RESPONSE: &str = r#"{
    "language": {"name": "English (US)", "code": "en-US"},
    "matches": [{
        "message": "Possible spelling mistake found.",
        "shortMessage": "Spelling mistake",
        "offset": 0,
        "length": 3,
        "replacements": [{"value": "This"}, {"value": "The"}],
        "rule": {
            "id": "MORFOLOGIK_RULE_EN_US",
            "description": "Possible spelling mistake",
            "category": {"id": "TYPOS", "name": "Possible Typo"}
        }
    }]
}"#;
