//! Render backend that shells out to mermaid-cli (`mmdc`)
//!
//! The source is written to a temporary `.mmd` file and rendered to SVG with
//! the mermaid theme matching the requested [`Theme`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::core::{RenderBackend, RenderError, Theme};

pub const DEFAULT_PROGRAM: &str = "mmdc";

const MAX_ERROR_LINES: usize = 6;

/// Renders diagram source to SVG through mermaid-cli
#[derive(Debug, Clone)]
pub struct MermaidCliBackend {
    program: PathBuf,
    background: String,
    puppeteer_config: Option<PathBuf>,
}

impl MermaidCliBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            background: "transparent".to_string(),
            puppeteer_config: None,
        }
    }

    /// Find `mmdc` on `PATH`
    pub fn locate() -> Result<Self, RenderError> {
        which::which(DEFAULT_PROGRAM)
            .map(Self::new)
            .map_err(|e| {
                RenderError::new(format!(
                    "mermaid-cli ({}) not found on PATH: {}",
                    DEFAULT_PROGRAM, e
                ))
            })
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Puppeteer settings file passed through with `-p`
    pub fn with_puppeteer_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.puppeteer_config = Some(path.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn args(&self, input: &Path, output: &Path, theme: Theme) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--quiet".into(),
            "-i".into(),
            input.into(),
            "-o".into(),
            output.into(),
            "-t".into(),
            theme.mermaid_theme().into(),
            "-b".into(),
            self.background.clone().into(),
        ];
        if let Some(config) = &self.puppeteer_config {
            args.push("-p".into());
            args.push(config.into());
        }
        args
    }
}

/// Keep the useful head of mermaid-cli's stderr
fn summarize_stderr(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .take(MAX_ERROR_LINES)
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[async_trait]
impl RenderBackend for MermaidCliBackend {
    fn name(&self) -> &'static str {
        "mermaid-cli"
    }

    fn format(&self) -> &'static str {
        "svg"
    }

    async fn render(&self, source: &str, theme: Theme) -> Result<String, RenderError> {
        let workdir = tempfile::tempdir()
            .map_err(|e| RenderError::new(format!("Could not create a work directory: {}", e)))?;
        let input = workdir.path().join("diagram.mmd");
        let output = workdir.path().join("diagram.svg");

        tokio::fs::write(&input, source)
            .await
            .map_err(|e| RenderError::new(format!("Could not write diagram source: {}", e)))?;

        let args = self.args(&input, &output, theme);
        trace!(program = %self.program.display(), ?args, "Running mermaid-cli");

        let result = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RenderError::new(format!("Failed to run {}: {}", self.program.display(), e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            debug!(status = %result.status, "mermaid-cli failed");
            return Err(RenderError::new(summarize_stderr(&stderr).unwrap_or_else(|| {
                format!("mermaid-cli exited with {}", result.status)
            })));
        }

        tokio::fs::read_to_string(&output)
            .await
            .map_err(|e| RenderError::new(format!("mermaid-cli produced no output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_follow_theme() {
        let backend = MermaidCliBackend::new("mmdc");
        let args = backend.args(Path::new("in.mmd"), Path::new("out.svg"), Theme::Dark);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["--quiet", "-i", "in.mmd", "-o", "out.svg", "-t", "dark", "-b", "transparent"]
        );
    }

    #[test]
    fn test_args_with_puppeteer_config() {
        let backend = MermaidCliBackend::new("mmdc")
            .with_background("white")
            .with_puppeteer_config("/etc/puppeteer.json");
        let args = backend.args(Path::new("in.mmd"), Path::new("out.svg"), Theme::Light);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"default".to_string()));
        assert!(args.contains(&"white".to_string()));
        assert_eq!(&args[args.len() - 2..], ["-p", "/etc/puppeteer.json"]);
    }

    #[test]
    fn test_summarize_stderr() {
        let stderr = "\nError: Parse error on line 2:\n...A-->\n-----^\nExpecting 'NODE_STRING'\n";
        let summary = summarize_stderr(stderr).unwrap();
        assert!(summary.starts_with("Error: Parse error on line 2:"));
        assert_eq!(summary.lines().count(), 4);
        assert_eq!(summarize_stderr("  \n \n"), None);
    }

    #[tokio::test]
    async fn test_missing_program_is_a_render_error() {
        let backend = MermaidCliBackend::new("/nonexistent/umlcraft-mmdc");
        let err = backend.render("graph TD; A-->B", Theme::Light).await.unwrap_err();
        assert!(err.message.contains("Failed to run"));
    }
}
