//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use umlcraft::{ProviderClient, ProviderConfig, ProviderError, ProviderRequest, RenderBackend, RenderError, Theme};

/// Deterministic backend: wraps the source in a fake SVG
#[derive(Default)]
pub struct FakeBackend {
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn format(&self) -> &'static str {
        "svg"
    }

    async fn render(&self, source: &str, theme: Theme) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if source.contains("!!invalid") {
            return Err(RenderError::new("Parse error on line 1"));
        }
        Ok(format!("<svg data-theme=\"{}\">{}</svg>", theme, source))
    }
}

/// Backend whose renders complete when the test releases them
pub struct GatedBackend {
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl GatedBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for GatedBackend {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn format(&self) -> &'static str {
        "svg"
    }

    async fn render(&self, source: &str, theme: Theme) -> Result<String, RenderError> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(format!("<svg data-theme=\"{}\">{}</svg>", theme, source))
    }
}

/// A backend holding its first `count` renders until released, in call order
pub fn gated(count: usize) -> (Arc<GatedBackend>, Vec<oneshot::Sender<()>>) {
    let mut senders = Vec::new();
    let mut receivers = VecDeque::new();
    for _ in 0..count {
        let (tx, rx) = oneshot::channel();
        senders.push(tx);
        receivers.push_back(rx);
    }
    let backend = Arc::new(GatedBackend {
        gates: Mutex::new(receivers),
        calls: AtomicUsize::new(0),
    });
    (backend, senders)
}

pub async fn wait_for_renders(backend: &GatedBackend, calls: usize) {
    while backend.calls() < calls {
        tokio::task::yield_now().await;
    }
}

/// Answers every request with the same text and records prompts
pub struct ScriptedProvider {
    response: Result<String, ProviderError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());
        self.response.clone()
    }
}

/// Each call waits for the next gate; the test decides when it resolves
pub struct GatedProvider {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<String, ProviderError>>>>,
    calls: AtomicUsize,
}

impl GatedProvider {
    pub fn new(gates: Vec<oneshot::Receiver<Result<String, ProviderError>>>) -> Self {
        Self {
            gates: Mutex::new(gates.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for GatedProvider {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn complete(&self, _request: &ProviderRequest) -> Result<String, ProviderError> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(ProviderError::transport("gate dropped"))),
            None => Err(ProviderError::transport("no gate left")),
        }
    }
}

pub fn usable_config() -> ProviderConfig {
    ProviderConfig::default().with_api_key("test-key")
}

pub fn fenced(source: &str) -> String {
    format!("Here is your diagram:\n```mermaid\n{}\n```\nEnjoy!", source)
}
