//! Generation attempt state machine
//!
//! ```text
//! Idle -> Validating -> Requesting -> Extracting -> Rendering -> Succeeded
//!              \              \                         \
//!               `-------------`------------------------`---> Failed
//! ```
//!
//! Each call to [`GenerationOrchestrator::generate`] is one attempt with its
//! own sequence number. Starting an attempt supersedes every older one: their
//! transitions are no longer published and their `generate` futures resolve
//! to `None`. The check and the publish happen under one lock, so a late
//! response can never overwrite a newer attempt's state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, info_span, warn, Instrument};

use super::catalog::TypeRegistry;
use super::config::ProviderConfig;
use super::error::{ErrorKind, RenderError};
use super::extract::ResponseExtractor;
use super::provider::{ProviderClient, ProviderRequest};
use super::render::{Artifact, RenderBackend, RenderEngine, Theme};

const EVENT_CAPACITY: usize = 64;

/// Inputs of one generation attempt, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    category_id: String,
    description: String,
    config: ProviderConfig,
}

impl GenerationRequest {
    /// `config` is a snapshot; later edits to the caller's copy are not seen
    pub fn new(
        category_id: impl Into<String>,
        description: impl Into<String>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            description: description.into(),
            config,
        }
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Outcome of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success {
        diagram_source: String,
        artifact: Artifact,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// The verbatim diagram source, for copy or export
    pub fn diagram_source(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { diagram_source, .. } => Some(diagram_source),
            GenerationResult::Failure { .. } => None,
        }
    }
}

/// States of the attempt state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Validating,
    Requesting,
    Extracting,
    Rendering,
    Succeeded {
        diagram_source: String,
        artifact: Artifact,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl GenerationState {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Validating => "validating",
            GenerationState::Requesting => "requesting",
            GenerationState::Extracting => "extracting",
            GenerationState::Rendering => "rendering",
            GenerationState::Succeeded { .. } => "succeeded",
            GenerationState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationState::Succeeded { .. } | GenerationState::Failed { .. }
        )
    }

    /// Anything between Validating and Rendering
    pub fn is_in_progress(&self) -> bool {
        !self.is_terminal() && *self != GenerationState::Idle
    }
}

/// A published state change, tagged with the attempt that produced it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub attempt: u64,
    pub state: GenerationState,
}

/// Drives generation attempts from request to rendered artifact
pub struct GenerationOrchestrator {
    registry: TypeRegistry,
    extractor: ResponseExtractor,
    provider: Arc<dyn ProviderClient>,
    renderer: RenderEngine,
    theme: Mutex<Theme>,
    latest_attempt: Mutex<u64>,
    state: watch::Sender<Transition>,
    events: broadcast::Sender<Transition>,
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn ProviderClient>, backend: Arc<dyn RenderBackend>) -> Self {
        let (state, _) = watch::channel(Transition::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            registry: TypeRegistry::new(),
            extractor: ResponseExtractor::default(),
            provider,
            renderer: RenderEngine::new(backend),
            theme: Mutex::new(Theme::default()),
            latest_attempt: Mutex::new(0),
            state,
            events,
        }
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        self.set_theme(theme);
        self
    }

    pub fn with_extractor(mut self, extractor: ResponseExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &RenderEngine {
        &self.renderer
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Theme for subsequent renders; see [`Self::restyle`] for the current one
    pub fn set_theme(&self, theme: Theme) {
        *self.theme.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = theme;
    }

    /// Latest published transition
    pub fn state(&self) -> Transition {
        self.state.borrow().clone()
    }

    /// Watch the latest transition
    pub fn subscribe(&self) -> watch::Receiver<Transition> {
        self.state.subscribe()
    }

    /// Receive every published transition in order
    pub fn events(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }

    fn lock_attempts(&self) -> MutexGuard<'_, u64> {
        self.latest_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, transition: Transition) {
        debug!(attempt = transition.attempt, state = transition.state.name(), "Transition");
        self.state.send_replace(transition.clone());
        // No event subscribers is fine
        let _ = self.events.send(transition);
    }

    /// Start a new attempt; everything older is superseded from here on
    fn begin(&self) -> u64 {
        let mut latest = self.lock_attempts();
        *latest += 1;
        let attempt = *latest;
        self.send(Transition {
            attempt,
            state: GenerationState::Validating,
        });
        attempt
    }

    /// Publish `state` for `attempt` if it is still the latest
    fn publish(&self, attempt: u64, state: GenerationState) -> bool {
        let latest = self.lock_attempts();
        if *latest != attempt {
            debug!(attempt, latest = *latest, state = state.name(), "Dropping superseded transition");
            return false;
        }
        self.send(Transition { attempt, state });
        true
    }

    fn fail(&self, attempt: u64, kind: ErrorKind, message: String) -> Option<GenerationResult> {
        let published = self.publish(
            attempt,
            GenerationState::Failed {
                kind,
                message: message.clone(),
            },
        );
        if published {
            warn!(attempt, kind = %kind, message = %message, "Generation failed");
        } else {
            debug!(attempt, kind = %kind, message = %message, "Superseded attempt failed");
        }
        published.then_some(GenerationResult::Failure { kind, message })
    }

    /// Run one attempt to completion
    ///
    /// Returns `None` when a newer attempt superseded this one before it
    /// finished; its outcome is discarded.
    pub async fn generate(&self, request: GenerationRequest) -> Option<GenerationResult> {
        let attempt = self.begin();
        let attempt_span = info_span!(
            "generation",
            attempt,
            category = %request.category_id(),
            provider = %request.config().provider(),
            model = request.config().model()
        );
        self.run(attempt, request).instrument(attempt_span).await
    }

    async fn run(&self, attempt: u64, request: GenerationRequest) -> Option<GenerationResult> {
        info!("Starting generation attempt");

        let config = request.config();
        if !config.is_usable() {
            return self.fail(
                attempt,
                ErrorKind::MissingCredential,
                "API key missing: configure your AI provider settings first".to_string(),
            );
        }

        if request.description().trim().is_empty() {
            return self.fail(
                attempt,
                ErrorKind::EmptyInput,
                "Description required: enter a system description to generate the diagram"
                    .to_string(),
            );
        }

        let category = match self.registry.lookup(request.category_id()) {
            Ok(category) => category,
            Err(e) => return self.fail(attempt, ErrorKind::UnknownCategory, e.to_string()),
        };

        let provider_request =
            ProviderRequest::new(config, category.prompt_for(request.description()));
        if !self.publish(attempt, GenerationState::Requesting) {
            return None;
        }

        debug!(client = self.provider.name(), "Dispatching provider request");
        let raw = match self.provider.complete(&provider_request).await {
            Ok(raw) => raw,
            Err(e) => return self.fail(attempt, ErrorKind::ProviderError, e.to_string()),
        };
        debug!(response_len = raw.len(), "Provider responded");

        if !self.publish(attempt, GenerationState::Extracting) {
            return None;
        }
        let diagram_source = self.extractor.extract(&raw);

        if !self.publish(attempt, GenerationState::Rendering) {
            return None;
        }
        let mut artifact = match self.renderer.render(&diagram_source, self.theme()).await {
            Ok(artifact) => artifact,
            Err(e) => return self.fail(attempt, ErrorKind::RenderFailure, e.message),
        };
        // A restyle may have switched the theme while this render ran
        while artifact.theme != self.theme() {
            debug!(rendered = %artifact.theme, wanted = %self.theme(), "Theme changed during render");
            artifact = match self.renderer.render(&diagram_source, self.theme()).await {
                Ok(artifact) => artifact,
                Err(e) => return self.fail(attempt, ErrorKind::RenderFailure, e.message),
            };
        }

        let published = self.publish(
            attempt,
            GenerationState::Succeeded {
                diagram_source: diagram_source.clone(),
                artifact: artifact.clone(),
            },
        );
        if published {
            info!(source_len = diagram_source.len(), "Generation succeeded");
        }
        published.then_some(GenerationResult::Success {
            diagram_source,
            artifact,
        })
    }

    /// Switch theme and re-render the current diagram under it
    ///
    /// A `Succeeded` state for the same source is republished with the
    /// restyled artifact under its original attempt number.
    pub async fn restyle(&self, theme: Theme) -> Option<Result<Artifact, RenderError>> {
        self.set_theme(theme);
        let result = self.renderer.restyle(theme).await?;

        if let Ok(artifact) = &result {
            let _latest = self.lock_attempts();
            let current = self.state();
            if let GenerationState::Succeeded { diagram_source, .. } = &current.state {
                if *diagram_source == artifact.source {
                    self.send(Transition {
                        attempt: current.attempt,
                        state: GenerationState::Succeeded {
                            diagram_source: diagram_source.clone(),
                            artifact: artifact.clone(),
                        },
                    });
                }
            }
        }

        Some(result)
    }
}
