use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use verifai::{cli, config::AnalysisConfig, output};

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load the configuration file if given, then apply command-line overrides
fn load_config(args: &cli::Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let Some(input) = args.input.clone() else {
        eprintln!("{}", cli::usage());
        std::process::exit(1);
    };

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let outcome = output::run(&input, &config)
        .with_context(|| format!("Analysis of {} failed", input.display()))?;

    print!("{}", outcome.console);
    Ok(())
}
