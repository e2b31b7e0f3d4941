//! Parley CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use parley::cli::{CheckArgs, Cli, Commands, RunArgs};
use parley::config::AppConfig;
use parley::engine::EngineEvent;
use parley::output::FileOutputSink;
use parley::session::{self, SessionOptions};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Check(args) => handle_check(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(&args.config)?;
    config.override_max_iterations(args.max_iterations);
    let run_config = config.run_config()?;
    let provider = Arc::new(config.build_provider()?);
    let sink = FileOutputSink::new(&config.output_dir)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current turn");
            ctrl_c.cancel();
        }
    });

    let mut options = SessionOptions {
        event_sink: None,
        cancel: Some(cancel),
    };
    if !args.quiet {
        options.event_sink = Some(Arc::new(|event: EngineEvent| {
            if let EngineEvent::TurnAppended { turn, .. } = event {
                println!("{}\n", turn.render());
            }
        }));
    }

    let report = session::run_session(&run_config, provider, &sink, options).await?;

    if let Some(ref path) = report.transcript_path {
        println!("Transcript: {}", path.display());
    }
    if let Some(ref path) = report.takeaways_path {
        println!("Takeaways:  {}", path.display());
    }
    match report.into_error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn handle_check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&args.config)?;
    let run_config = config.run_config()?;
    config.resolve_api_key()?;

    println!("Configuration OK: {}", args.config.display());
    println!("  model:          {}", run_config.model_id);
    println!("  iterations:     {}", run_config.max_iterations);
    println!("  output dir:     {}", config.output_dir.display());
    println!(
        "  seed history:   {}",
        match run_config.seed_history {
            Some(ref seed) => format!("{} bytes", seed.len()),
            None => "none".to_string(),
        }
    );
    for spec in [&run_config.user_agent_spec, &run_config.expert_agent_spec] {
        println!("  {} agent: {} ({})", spec.role, spec.name, spec.description);
    }
    Ok(())
}
