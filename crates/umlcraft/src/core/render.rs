//! Render lifecycle for diagram sources
//!
//! [`RenderEngine`] owns the viewer state for "the current diagram". The
//! grammar itself belongs to a [`RenderBackend`]; the engine handles the
//! empty-source check, stale completions and theming.
//!
//! Every call to [`RenderEngine::render`] takes a new ticket. A backend
//! completion only updates the engine state when its ticket is still the
//! latest, so a slow render for an old source can never overwrite the state
//! of a newer one regardless of completion order.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, span, warn, Instrument, Level};

use super::detector::{detect, DiagramKind};
use super::error::RenderError;

/// Rendering theme; not part of diagram identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Name of the matching built-in mermaid theme
    pub fn mermaid_theme(&self) -> &'static str {
        match self {
            Theme::Light => "default",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" | "default" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// A rendered diagram, keyed to the exact source it was produced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub source: String,
    pub theme: Theme,
    pub kind: Option<DiagramKind>,
    /// Document format reported by the backend, e.g. `svg`
    pub format: &'static str,
    pub document: String,
}

/// Viewer state for the current diagram source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Pending,
    Rendered {
        artifact: Artifact,
    },
    RenderError {
        message: String,
    },
}

/// External diagramming library seam
///
/// Implementations turn diagram source into a document and report failures
/// as values; they must not panic.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Get the output document format
    fn format(&self) -> &'static str;

    async fn render(&self, source: &str, theme: Theme) -> Result<String, RenderError>;
}

struct Current {
    ticket: u64,
    source: Option<String>,
    theme: Theme,
}

/// Theme-aware render lifecycle over a backend
pub struct RenderEngine {
    backend: Arc<dyn RenderBackend>,
    current: Mutex<Current>,
    state: watch::Sender<RenderState>,
}

impl RenderEngine {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        let (state, _) = watch::channel(RenderState::Pending);
        Self {
            backend,
            current: Mutex::new(Current {
                ticket: 0,
                source: None,
                theme: Theme::default(),
            }),
            state,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Snapshot of the state for the current source
    pub fn state(&self) -> RenderState {
        self.state.borrow().clone()
    }

    /// Receive every state change of the engine
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.state.subscribe()
    }

    pub fn current_source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    pub fn current_theme(&self) -> Theme {
        self.lock().theme
    }

    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Render `source` with `theme`, making it the current diagram
    pub async fn render(&self, source: &str, theme: Theme) -> Result<Artifact, RenderError> {
        let ticket = {
            let mut current = self.lock();

            // Same source, same theme, already rendered: nothing to redo
            if current.source.as_deref() == Some(source) && current.theme == theme {
                if let RenderState::Rendered { artifact } = &*self.state.borrow() {
                    debug!(ticket = current.ticket, "Reusing rendered artifact");
                    return Ok(artifact.clone());
                }
            }

            current.ticket += 1;
            current.source = Some(source.to_string());
            current.theme = theme;

            if source.trim().is_empty() {
                let error = RenderError::empty_source();
                warn!(ticket = current.ticket, "Rejected empty diagram source");
                self.state.send_replace(RenderState::RenderError {
                    message: error.message.clone(),
                });
                return Err(error);
            }

            self.state.send_replace(RenderState::Pending);
            current.ticket
        };

        let render_span = span!(
            Level::INFO,
            "render",
            ticket,
            backend = self.backend.name(),
            theme = %theme,
            source_len = source.len()
        );

        let result = async {
            let outcome = self.backend.render(source, theme).await;
            match &outcome {
                Ok(document) => info!(document_len = document.len(), "Render succeeded"),
                Err(e) => warn!(error = %e, "Render failed"),
            }
            outcome
        }
        .instrument(render_span)
        .await
        .map(|document| Artifact {
            source: source.to_string(),
            theme,
            kind: detect(source),
            format: self.backend.format(),
            document,
        });

        let current = self.lock();
        if current.ticket == ticket {
            self.state.send_replace(match &result {
                Ok(artifact) => RenderState::Rendered {
                    artifact: artifact.clone(),
                },
                Err(e) => RenderState::RenderError {
                    message: e.message.clone(),
                },
            });
        } else {
            debug!(ticket, latest = current.ticket, "Discarding stale render");
        }

        result
    }

    /// Re-render the current source under a new theme
    ///
    /// Returns `None` when no source has been rendered yet.
    pub async fn restyle(&self, theme: Theme) -> Option<Result<Artifact, RenderError>> {
        let source = self.current_source()?;
        Some(self.render(&source, theme).await)
    }
}
