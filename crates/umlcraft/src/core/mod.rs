//! Core generation-and-rendering pipeline
//!
//! Catalog lookup, provider configuration, response extraction, the render
//! lifecycle and the orchestrator that strings them together. Concrete
//! provider clients and render backends live in `plugins`.

mod catalog;
mod config;
mod detector;
mod error;
mod extract;
pub mod logging;
mod orchestrator;
mod provider;
mod render;
mod store;

pub use catalog::*;
pub use config::*;
pub use detector::*;
pub use error::*;
pub use extract::*;
pub use logging::*;
pub use orchestrator::*;
pub use provider::*;
pub use render::*;
pub use store::*;
