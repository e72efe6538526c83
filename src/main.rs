use anyhow::Context;
use clap::Parser;
use netsweep::checkpoint::CheckpointStore;
use netsweep::cli::Args;
use netsweep::orchestrator::ScanOrchestrator;
use netsweep::output;
use netsweep::progress::{
    BarsReporter, LineReporter, ProgressMode, ProgressReporter, ReporterLog, TerminalReporter,
};
use netsweep::scanner::{limits, TcpConnector};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Local subnet could not be determined.
const EXIT_NO_SUBNET: u8 = 2;
/// At least one host scan aborted.
const EXIT_HOST_FAILED: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Install the log subscriber. While a reporter owns the screen, log lines go
/// through it; otherwise they go to stderr.
fn init_tracing(verbose: bool, screen: Option<Arc<dyn ProgressReporter>>) {
    let default = if verbose { "netsweep=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let writer = match screen {
        Some(reporter) => BoxMakeWriter::new(ReporterLog::new(reporter)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
}

/// The reporter for `mode`, and whether it draws bars in place.
fn build_reporter(mode: ProgressMode) -> (Arc<dyn ProgressReporter>, bool) {
    match mode {
        ProgressMode::Rows if console::Term::stdout().is_term() => {
            (Arc::new(TerminalReporter::new()), true)
        }
        ProgressMode::Bars => (Arc::new(BarsReporter::new()), true),
        ProgressMode::Rows | ProgressMode::None => (Arc::new(LineReporter::new()), false),
    }
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let settings = args.load_settings().context("failed to load settings")?;
    let settings = args.apply(settings).context("invalid settings")?;

    if args.save_settings {
        let path = args.save(&settings).context("failed to save settings")?;
        output::print_info(&format!("Settings written to {}", path.display()));
        return Ok(ExitCode::SUCCESS);
    }

    let (reporter, owns_screen) = build_reporter(settings.progress);
    init_tracing(args.verbose, owns_screen.then(|| Arc::clone(&reporter)));

    let mut config = args.sweep_config(&settings)?;
    config.concurrency = limits::effective_concurrency(config.concurrency);

    let store = CheckpointStore::new(config.output_dir.clone())
        .context("failed to prepare the output directory")?;

    let orchestrator = ScanOrchestrator::new(
        config,
        settings.probe.build(),
        Arc::new(TcpConnector::new()),
        reporter,
        Arc::new(store),
    );

    let summary = match orchestrator.run().await {
        Ok(summary) => summary,
        Err(e) => {
            output::print_error(&format!("could not determine the local subnet: {}", e));
            output::print_info("use --subnet or --interface to pick one");
            return Ok(ExitCode::from(EXIT_NO_SUBNET));
        }
    };

    output::print_summary(&summary, args.summary)?;

    if summary.failed_hosts() > 0 {
        output::print_warning(&format!(
            "{} host scan(s) aborted; run again to resume",
            summary.failed_hosts()
        ));
        return Ok(ExitCode::from(EXIT_HOST_FAILED));
    }

    Ok(ExitCode::SUCCESS)
}
