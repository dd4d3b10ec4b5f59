//! umlcraft CLI - Generate UML diagrams from free-text descriptions

mod cli;
mod output;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    let app = match cli::UmlcraftApp::new(cli_args.config.clone()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
