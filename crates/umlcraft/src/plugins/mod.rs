//! Concrete collaborators for the core pipeline
//!
//! Provider clients implement [`crate::core::ProviderClient`]; render
//! backends implement [`crate::core::RenderBackend`].

pub mod llm_client;
pub mod mermaid_cli;
pub mod placeholder;

pub use llm_client::*;
pub use mermaid_cli::*;
pub use placeholder::*;
