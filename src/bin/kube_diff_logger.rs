//! kube-diff-logger - logs semantic diffs for watched Kubernetes objects.
//!
//! Reads a recorded watch stream (JSON lines, the shape `kubectl get
//! --watch -o json` emits) and runs one dispatcher per configured
//! resource type, each on its own thread.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kube_diff_logger::config::{load_config, Config, DifferConfig};
use kube_diff_logger::differ::{Differ, NameFilter, OutputFormat, StreamOutput};
use kube_diff_logger::watch::{ReplaySource, StopSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Format {
    Text,
    #[default]
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "kube-diff-logger", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long)]
    config: PathBuf,

    /// Recorded watch stream to replay. Use '-' for stdin.
    #[arg(short, long, default_value = "-")]
    events: String,

    /// Output rendering.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Also log when objects are added.
    #[arg(long)]
    log_added: bool,

    /// Also log when objects are deleted.
    #[arg(long)]
    log_deleted: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;

    let stream = read_events(&cli.events)?;
    let stop = StopSignal::new();

    let mut handles = Vec::new();
    for differ_config in &config.differs {
        let resource = differ_config.group_kind.qualified();

        let mut source = match ReplaySource::from_reader(stream.as_slice()) {
            Ok(source) => source,
            Err(err) => {
                // Setup failure is fatal to this resource type only.
                error!(resource = %resource, error = %err, "skipping differ, failed to build watch source");
                continue;
            }
        };
        source.retain_kind(&differ_config.group_kind.kind);
        info!(resource = %resource, events = source.len(), "starting differ");

        let differ = build_differ(&cli, &config, differ_config, &resource);
        let stop = stop.clone();
        handles.push(thread::spawn(move || {
            if let Err(err) = differ.run(&mut source, &stop) {
                error!(error = %err, "differ stopped with error");
            }
        }));
    }

    for handle in handles {
        // A panicking differ thread already logged through the dispatcher
        // boundary; joining collects whatever is left.
        let _ = handle.join();
    }

    Ok(())
}

fn build_differ(
    cli: &Cli,
    config: &Config,
    differ_config: &DifferConfig,
    resource: &str,
) -> Differ {
    let filter = NameFilter::new(
        config.filter_style,
        differ_config.match_pattern.clone(),
        differ_config.ignore_pattern.clone(),
    );
    let output = Arc::new(StreamOutput::stdout(
        cli.format.into(),
        cli.log_added,
        cli.log_deleted,
    ));

    Differ::new(
        resource,
        filter,
        config.common_label_config.clone(),
        config.common_annotation_config.clone(),
        output,
    )
}

fn read_events(events: &str) -> Result<Vec<u8>, io::Error> {
    let mut buffer = Vec::new();
    if events == "-" {
        io::stdin().lock().read_to_end(&mut buffer)?;
    } else {
        BufReader::new(File::open(events)?).read_to_end(&mut buffer)?;
    }
    Ok(buffer)
}
