//! umlcraft - Generate UML diagrams from free-text descriptions
//!
//! Picks a diagram category, asks a generative text provider for Mermaid
//! source, extracts the fenced block from the answer and renders it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use umlcraft::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileConfigStore::at_default_location()?;
//! let config = load(&store);
//!
//! let orchestrator = umlcraft::default_orchestrator()?;
//! let request = GenerationRequest::new("class", "An online shop with orders", config);
//!
//! match orchestrator.generate(request).await {
//!     Some(GenerationResult::Success { diagram_source, artifact }) => {
//!         println!("{}", diagram_source);
//!         std::fs::write("diagram.svg", artifact.document)?;
//!     }
//!     Some(GenerationResult::Failure { kind, message }) => eprintln!("{}: {}", kind, message),
//!     None => {}
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Advanced Usage
//!
//! The provider and the renderer are trait objects, so tests and embedders
//! can swap them:
//!
//! ```rust
//! use std::sync::Arc;
//! use umlcraft::prelude::*;
//! use umlcraft::plugins::{MermaidCliBackend, PlaceholderProvider};
//!
//! let orchestrator = GenerationOrchestrator::new(
//!     Arc::new(PlaceholderProvider::new()),
//!     Arc::new(MermaidCliBackend::new("mmdc")),
//! )
//! .with_theme(Theme::Dark);
//! assert_eq!(orchestrator.state().state, GenerationState::Idle);
//! ```

pub mod core;
pub mod plugins;

use std::sync::Arc;

pub use crate::core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        extract, load, save, Artifact, ConfigStore, DiagramCategory, ErrorKind,
        FileConfigStore, GenerationOrchestrator, GenerationRequest, GenerationResult,
        GenerationState, MemoryConfigStore, Provider, ProviderClient, ProviderConfig,
        RenderBackend, RenderEngine, RenderError, RenderState, Theme, Transition, TypeRegistry,
    };
}

/// Orchestrator wired to the real provider client and mermaid-cli
///
/// Fails when `mmdc` cannot be found on `PATH`.
pub fn default_orchestrator() -> Result<GenerationOrchestrator, RenderError> {
    let backend = plugins::MermaidCliBackend::locate()?;
    Ok(GenerationOrchestrator::new(
        Arc::new(plugins::LlmProviderClient::new()),
        Arc::new(backend),
    ))
}

/// Render Mermaid source to SVG with mermaid-cli
///
/// Fenced provider output is accepted too; the first `mermaid` block is used.
pub async fn render(input: &str, theme: Theme) -> Result<Artifact, RenderError> {
    let backend = plugins::MermaidCliBackend::locate()?;
    RenderEngine::new(Arc::new(backend))
        .render(&extract(input), theme)
        .await
}
