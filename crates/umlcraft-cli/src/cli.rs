//! Command-line interface for the umlcraft utility
//!
//! Generates UML diagrams from free-text descriptions, renders existing
//! Mermaid source and manages the stored provider settings.

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::output::{aligned_rows, format_transition, stderr_is_colorful};
use umlcraft::core::logging::init_logging;
use umlcraft::plugins::{LlmProviderClient, MermaidCliBackend, PlaceholderProvider, DEFAULT_PROGRAM};
use umlcraft::{
    detect, extract, load, save, FileConfigStore, GenerationOrchestrator, GenerationRequest,
    GenerationResult, Provider, ProviderClient, ProviderConfig, RenderEngine, Theme, Transition,
    TypeRegistry,
};

/// umlcraft - Generate UML diagrams from free-text descriptions
#[derive(Parser)]
#[command(name = "umlcraft")]
#[command(about = "Generate and render UML diagrams from free-text descriptions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to <config dir>/umlcraft/settings.json)
    #[arg(long, global = true, env = "UMLCRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Rendering theme
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ThemeChoice {
    #[default]
    Light,
    Dark,
}

impl From<ThemeChoice> for Theme {
    fn from(value: ThemeChoice) -> Self {
        match value {
            ThemeChoice::Light => Theme::Light,
            ThemeChoice::Dark => Theme::Dark,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the diagram categories that can be generated
    Types {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate a diagram from a description
    Generate(GenerateArgs),

    /// Render existing Mermaid source (fenced provider output is accepted)
    Render {
        /// Input file containing the diagram (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the rendered document (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ThemeChoice::Light)]
        theme: ThemeChoice,

        /// Path to the mermaid-cli executable
        #[arg(long, env = "UMLCRAFT_MMDC")]
        mmdc: Option<PathBuf>,
    },

    /// Detect the Mermaid diagram kind of the input
    Detect {
        /// Input file to analyze (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show or edit the stored provider settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List the models available for a provider
    Models {
        /// mistral, gemini or custom; all providers when omitted
        provider: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Diagram category id (see `umlcraft types`)
    pub category: String,

    /// System description; read from --input when omitted
    pub description: Vec<String>,

    /// File holding the description (use - for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file for the rendered document (use - for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ThemeChoice::Light)]
    pub theme: ThemeChoice,

    /// Use built-in example diagrams instead of calling a provider
    #[arg(long)]
    pub offline: bool,

    /// API key for this run only; the stored settings are not changed
    #[arg(long, env = "UMLCRAFT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the extracted diagram source to stderr
    #[arg(long)]
    pub show_source: bool,

    /// Path to the mermaid-cli executable
    #[arg(long, env = "UMLCRAFT_MMDC")]
    pub mmdc: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the stored settings with the key masked
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Switch provider; the model resets to the provider's default
    SetProvider { provider: String },
    SetModel { model: String },
    SetKey { key: String },
    /// Sampling temperature in [0, 1]
    SetTemperature {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Endpoint for the custom provider; omit to clear
    SetEndpoint { url: Option<String> },
    /// Restore the default settings
    Reset,
}

/// Main CLI application
pub struct UmlcraftApp {
    store: FileConfigStore,
}

impl UmlcraftApp {
    /// Create an application over the settings file at `config`, or the
    /// per-user default location
    pub fn new(config: Option<PathBuf>) -> Result<Self> {
        let store = match config {
            Some(path) => FileConfigStore::new(path),
            None => FileConfigStore::at_default_location()?,
        };
        Ok(Self::with_store(store))
    }

    pub fn with_store(store: FileConfigStore) -> Self {
        Self { store }
    }

    pub fn settings_path(&self) -> &Path {
        self.store.path()
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over CLI flags
        let log_level_str = std::env::var("UMLCRAFT_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("UMLCRAFT_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("umlcraft v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("Settings: {}", self.settings_path().display());
        }

        match cli.command {
            Commands::Types { json } => self.types_command(json),
            Commands::Generate(args) => self.generate_command(args, cli.verbose),
            Commands::Render {
                input,
                output,
                theme,
                mmdc,
            } => self.render_command(input, output, theme, mmdc, cli.verbose),
            Commands::Detect { input } => self.detect_command(input),
            Commands::Config { action } => self.config_command(action),
            Commands::Models { provider } => self.models_command(provider.as_deref()),
        }
    }

    /// Handle the types command
    fn types_command(&self, json: bool) -> Result<()> {
        let registry = TypeRegistry::new();

        if json {
            let types = serde_json::json!({
                "types": registry.all(),
                "total": registry.len(),
            });
            println!("{}", serde_json::to_string_pretty(&types)?);
        } else {
            let rows: Vec<(String, String)> = registry
                .all()
                .iter()
                .map(|category| (category.id.to_string(), category.title.to_string()))
                .collect();
            println!("Supported diagram categories:");
            println!("{}", aligned_rows(&rows, "  - "));
            println!();
            println!("Total: {} diagram categories", registry.len());
        }

        Ok(())
    }

    /// Handle the generate command
    fn generate_command(&self, args: GenerateArgs, verbose: bool) -> Result<()> {
        let mut description = args.description.join(" ");
        if description.trim().is_empty() && args.input.is_some() {
            description = self.read_input(args.input.clone())?;
        }

        let mut config = load(&self.store);
        if let Some(key) = &args.api_key {
            config = config.with_api_key(key.clone());
        }

        let provider: Arc<dyn ProviderClient> = if args.offline {
            if !config.is_usable() {
                config = config.with_api_key("offline");
            }
            Arc::new(PlaceholderProvider::new())
        } else {
            Arc::new(LlmProviderClient::new())
        };

        if verbose {
            eprintln!(
                "Using {} ({}) at temperature {}",
                config.provider(),
                config.model(),
                config.temperature()
            );
        }

        let orchestrator =
            GenerationOrchestrator::new(provider, Arc::new(Self::backend(args.mmdc.as_deref())))
                .with_theme(args.theme.into());
        let events = orchestrator.events();
        let request = GenerationRequest::new(args.category, description, config);

        let result = runtime()?.block_on(async {
            let (result, ()) = tokio::join!(
                orchestrator.generate(request),
                report_progress(events, stderr_is_colorful())
            );
            result
        });

        match result {
            Some(GenerationResult::Success {
                diagram_source,
                artifact,
            }) => {
                if args.show_source {
                    eprintln!("{}", diagram_source);
                }
                self.write_output(args.output, &artifact.document)
            }
            Some(GenerationResult::Failure { kind, message }) => {
                Err(anyhow!("{}: {}", kind, message))
            }
            None => Err(anyhow!("Generation was superseded")),
        }
    }

    /// Handle the render command
    fn render_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        theme: ThemeChoice,
        mmdc: Option<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let source = extract(&content);
        let engine = RenderEngine::new(Arc::new(Self::backend(mmdc.as_deref())));
        let artifact = runtime()?
            .block_on(engine.render(&source, theme.into()))
            .map_err(|e| anyhow!("Render failed: {}", e))?;

        if verbose {
            eprintln!("Rendered {} bytes of {}", artifact.document.len(), artifact.format);
        }

        self.write_output(output, &artifact.document)
    }

    /// Handle the detect command
    fn detect_command(&self, input: Option<PathBuf>) -> Result<()> {
        let content = self.read_input(input)?;

        match detect(&extract(&content)) {
            Some(kind) => {
                println!("{}", kind.as_str());
                Ok(())
            }
            None => Err(anyhow!("Could not detect diagram type")),
        }
    }

    /// Handle the config subcommands
    fn config_command(&self, action: ConfigAction) -> Result<()> {
        let current = load(&self.store);

        let updated = match action {
            ConfigAction::Show { json } => return self.show_config(&current, json),
            ConfigAction::SetProvider { provider } => current.set_provider(provider.parse()?),
            ConfigAction::SetModel { model } => current.with_model(&model)?,
            ConfigAction::SetKey { key } => current.with_api_key(key),
            ConfigAction::SetTemperature { value } => current.with_temperature(value)?,
            ConfigAction::SetEndpoint { url } => current.with_custom_endpoint(url),
            ConfigAction::Reset => ProviderConfig::default(),
        };

        debug!(?updated, "Updating settings");
        save(&self.store, &updated);
        self.show_config(&updated, false)
    }

    fn show_config(&self, config: &ProviderConfig, json: bool) -> Result<()> {
        if json {
            let shown = serde_json::json!({
                "provider": config.provider(),
                "model": config.model(),
                "temperature": config.temperature(),
                "apiKey": config.masked_api_key(),
                "customEndpoint": config.custom_endpoint(),
                "path": self.settings_path(),
            });
            println!("{}", serde_json::to_string_pretty(&shown)?);
            return Ok(());
        }

        let api_key = if config.is_usable() {
            config.masked_api_key()
        } else {
            "(not set)".to_string()
        };
        let rows = vec![
            ("provider".to_string(), config.provider().to_string()),
            ("model".to_string(), config.model().to_string()),
            ("temperature".to_string(), config.temperature().to_string()),
            ("api key".to_string(), api_key),
            (
                "endpoint".to_string(),
                config.custom_endpoint().unwrap_or("(none)").to_string(),
            ),
            ("file".to_string(), self.settings_path().display().to_string()),
        ];
        println!("{}", aligned_rows(&rows, " : "));
        Ok(())
    }

    /// Handle the models command
    fn models_command(&self, provider: Option<&str>) -> Result<()> {
        let providers = match provider {
            Some(name) => vec![name.parse::<Provider>()?],
            None => Provider::ALL.to_vec(),
        };

        for provider in providers {
            println!("{}:", provider);
            for model in provider.models() {
                if *model == provider.default_model() {
                    println!("  {} (default)", model);
                } else {
                    println!("  {}", model);
                }
            }
        }
        Ok(())
    }

    /// mermaid-cli at `program`, or found on `PATH`
    fn backend(program: Option<&Path>) -> MermaidCliBackend {
        match program {
            Some(path) => MermaidCliBackend::new(path),
            None => MermaidCliBackend::locate().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to bare program name");
                MermaidCliBackend::new(DEFAULT_PROGRAM)
            }),
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        let stdout_content = if content.is_empty() || content.ends_with('\n') {
            content.to_string()
        } else {
            format!("{}\n", content)
        };

        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                print!("{}", stdout_content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

/// Print transitions to stderr until the attempt reaches a terminal state
async fn report_progress(mut events: broadcast::Receiver<Transition>, colored: bool) {
    loop {
        match events.recv().await {
            Ok(transition) => {
                eprintln!("{}", format_transition(&transition, colored));
                if transition.state.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Progress output lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
