//! Common test utilities and helpers
//!
//! Temporary workspaces with a project tree and private state paths, scripted
//! chat backends, and a one-shot HTTP responder for adapter wire tests.

#![allow(dead_code)]

use async_trait::async_trait;
use codewalker::backend::{
    BackendError, BackendRouter, ChatBackend, ChatMessage, Generation, TokenUsage,
};
use codewalker::core::config::Config;
use codewalker::pipeline::prompts::REWRITE_INSTRUCTION_PREFIX;
use codewalker::store::Store;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SUMMARY_JSON: &str = r#"{"file_purpose": "fixture", "risks": []}"#;
pub const REWRITE_REPLY: &str = "Sure.\n```python\nprint('rewritten')\n```\n";

/// A project tree plus database and lock paths outside of it
pub struct Workspace {
    _dir: TempDir,
    state: PathBuf,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        let state = dir.path().join("state");
        fs::create_dir_all(&root).unwrap();
        Self {
            root: root.canonicalize().unwrap(),
            state,
            _dir: dir,
        }
    }

    /// Write a file below the project root, creating directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn state_path(&self, name: &str) -> PathBuf {
        self.state.join(name)
    }

    /// Validated defaults pointed at this workspace
    pub fn config(&self) -> Config {
        self.config_with(|_| {})
    }

    pub fn config_with(&self, adjust: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config {
            root: self.root.clone(),
            db_path: self.state_path("codewalker.db"),
            lockfile: self.state_path("codewalker.lock"),
            exclude_files: Vec::new(),
            ..Config::default()
        };
        adjust(&mut config);
        config.validate().unwrap()
    }

    pub fn store(&self) -> Store {
        Store::open(&self.state_path("codewalker.db")).unwrap()
    }
}

/// Chat backend with canned answers.
///
/// Rewrite requests (recognized by their system message) get `rewrite`,
/// everything else gets `summary`. Every user message is recorded.
#[derive(Clone)]
pub struct MockBackend {
    name: &'static str,
    fail: bool,
    summary: String,
    rewrite: String,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn answering(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            summary: SUMMARY_JSON.to_string(),
            rewrite: REWRITE_REPLY.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::answering(name)
        }
    }

    pub fn with_summary(mut self, text: &str) -> Self {
        self.summary = text.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        _model: &str,
    ) -> Result<Generation, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = messages.last() {
            self.prompts.lock().unwrap().push(user.content.clone());
        }

        if self.fail {
            return Err(BackendError::Status {
                backend: self.name.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let is_rewrite = messages
            .first()
            .map(|m| m.content.starts_with(REWRITE_INSTRUCTION_PREFIX))
            .unwrap_or(false);
        Ok(Generation {
            text: if is_rewrite {
                self.rewrite.clone()
            } else {
                self.summary.clone()
            },
            backend: self.name.to_string(),
            usage: TokenUsage::from_counts(Some(12), Some(34)),
        })
    }
}

/// Router over clones of the given mocks; the originals keep their counters
pub fn router(backends: &[MockBackend]) -> BackendRouter {
    BackendRouter::new(
        backends
            .iter()
            .cloned()
            .map(|b| Box::new(b) as Box<dyn ChatBackend>)
            .collect(),
    )
}

pub fn file_path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Serve one HTTP response and hand back the raw request text
pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
