use clap::{Args, Parser, Subcommand};
use collector::HttpSource;
use sheets::MemoryBackend;
use sheetsync::config::{Config, ConfigError};
use sheetsync::logging;
use sheetsync::pipeline::{BackendConnector, GoogleConnector, Pipeline};
use sheetsync::trigger::{self, TriggerService};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(about = "Collects facility status reports and appends them to spreadsheets")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run one synchronization and exit
    Run(RunArgs),
    /// Serve the HTTP trigger
    Serve(ConfigArgs),
    /// Validate the configuration file and exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Write to an in-memory spreadsheet instead of the configured documents
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();

    let (config_path, dry_run) = match &cli.command {
        CliCommand::Run(args) => (&args.config.config, args.dry_run),
        CliCommand::Serve(args) | CliCommand::CheckConfig(args) => (&args.config, false),
    };

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", config_path.display());
            process::exit(1);
        }
    };

    if let CliCommand::CheckConfig(_) = cli.command {
        println!("{}: ok", config_path.display());
        return;
    }

    let _sentry = logging::init_logging(&config.logging);
    if let Some(metrics) = &config.metrics {
        if let Err(e) = logging::init_metrics(metrics) {
            tracing::warn!(error = %e, "Metrics disabled");
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Could not start the runtime");
            process::exit(1);
        }
    };

    let serve = matches!(cli.command, CliCommand::Serve(_));
    if let Err(e) = runtime.block_on(run(config, serve, dry_run)) {
        tracing::error!(error = %e, "Exiting");
        process::exit(1);
    }
}

fn load_config(path: &std::path::Path) -> Result<Config, ConfigError> {
    let config = Config::from_file(path)?;
    config.validate()?;
    Ok(config)
}

async fn run(
    config: Config,
    serve: bool,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let job = config.sync_job()?;
    let source = HttpSource::new(config.source_timeout_secs.map(Duration::from_secs))?;

    let memory = dry_run.then(|| Arc::new(MemoryBackend::new()));
    let connector: Arc<dyn BackendConnector> = match &memory {
        Some(backend) => Arc::new(backend.clone()),
        None => Arc::new(GoogleConnector::new(config.api_url()?)),
    };
    let pipeline = Pipeline::new(Arc::new(source), connector);

    if serve {
        let service = TriggerService::new(pipeline, job);
        shared::http::run_http_service(&config.listener.host, config.listener.port, service)
            .await?;
        return Ok(());
    }

    let report = pipeline.run_now(&job).await?;
    for target in &report.targets {
        tracing::info!(
            document_id = %target.document_id,
            sheet_name = %target.sheet_name,
            sheet = ?target.sheet,
            records = target.appended.map_or(0, |summary| summary.records),
            "Target synchronized"
        );
    }
    match memory {
        Some(backend) => tracing::info!(
            writes = backend.writes().len(),
            "Dry run finished, nothing was written to the configured documents"
        ),
        None => println!("{}", trigger::SUCCESS_MESSAGE.trim_end()),
    }

    Ok(())
}
