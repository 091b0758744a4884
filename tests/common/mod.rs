#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use hostprobe::core::models::{HardFailure, ProbeOutcome};
use hostprobe::core::scanner::runner::{CommandOutput, CommandRunner};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Script = dyn Fn(&str, &[String]) -> ProbeOutcome<CommandOutput> + Send + Sync;

/// Answers commands from a closure instead of spawning processes.
#[derive(Clone)]
pub struct ScriptedRunner {
    script: Arc<Script>,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&str, &[String]) -> ProbeOutcome<CommandOutput> + Send + Sync + 'static) -> Self {
        Self { script: Arc::new(script) }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> ProbeOutcome<CommandOutput> {
        (self.script)(program, args)
    }
}

pub fn stdout(text: &str) -> ProbeOutcome<CommandOutput> {
    Ok(Some(CommandOutput::new(text, "")))
}

pub fn stderr(text: &str) -> ProbeOutcome<CommandOutput> {
    Ok(Some(CommandOutput::new("", text)))
}

pub fn missing(program: &str) -> ProbeOutcome<CommandOutput> {
    Err(HardFailure::new(program))
}

/// An `nslookup` answer listing `addresses`.
pub fn nslookup_answer(host: &str, addresses: &[&str]) -> String {
    let mut out = String::from("Server:\t\t8.8.8.8\nAddress:\t8.8.8.8#53\n\nNon-authoritative answer:\n");
    for a in addresses {
        out.push_str(&format!("Name:\t{host}\nAddress: {a}\n"));
    }
    out.push('\n');
    out
}

pub const NXDOMAIN: &str = "Server:\t\t8.8.8.8\nAddress:\t8.8.8.8#53\n\n** server can't find nope.invalid: NXDOMAIN\n\n";

/// Serves canned HTTP responses keyed by request path, one per connection.
pub async fn serve(routes: Vec<(&str, &str)>) -> SocketAddr {
    let routes: HashMap<String, String> = routes
        .into_iter()
        .map(|(path, response)| (path.to_string(), response.to_string()))
        .collect();
    let routes = Arc::new(routes);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let response = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".into());
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn response(status: &str, headers: &[(&str, &str)]) -> String {
    let mut out = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("Content-Length: 0\r\nConnection: close\r\n\r\n");
    out
}
