//! Collect startup features from the command line.
//!
//! Usage:
//!   startup-signals --name "Acme AI" --domain acme.ai
//!   startup-signals --domain acme.ai --source-mode synthetic --no-save

use anyhow::{Context, Result};
use clap::Parser;
use startup_signals::collector::run_from_config;
use startup_signals::config::{RuntimeConfig, SourceMode};
use startup_signals::query::Query;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Parser, Debug)]
#[command(name = "startup-signals")]
#[command(about = "Collect prediction, founder and market features for one startup", long_about = None)]
struct Cli {
    /// Startup name
    #[arg(long)]
    name: Option<String>,
    /// Primary website domain
    #[arg(long)]
    domain: Option<String>,
    /// JSON file merged before any fetched data
    #[arg(long)]
    profile_path: Option<PathBuf>,
    #[arg(long, default_value = "AI")]
    industry: String,
    #[arg(long, default_value = "seed")]
    stage: String,
    #[arg(long, default_value = "US")]
    region: String,
    /// Overrides OUTPUT_DIR
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// auto, live or synthetic
    #[arg(long)]
    source_mode: Option<SourceMode>,
    /// Print features without writing files
    #[arg(long)]
    no_save: bool,
}

/// Stderr logging with a filter that can be swapped once the config is loaded
fn build_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));
    (subscriber, handle)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("startup_signals=info"));
    let (subscriber, filter_handle) = build_subscriber(filter, std::io::stderr);
    subscriber.init();

    let mut config = RuntimeConfig::load().context("Failed to load configuration")?;
    match EnvFilter::try_new(&config.log_level) {
        Ok(level) => filter_handle
            .reload(level)
            .context("Failed to apply configured log level")?,
        Err(e) => warn!("Ignoring invalid log level {:?}: {}", config.log_level, e),
    }

    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(mode) = cli.source_mode {
        config.source_mode = mode;
    }
    info!(
        "Source mode {:?} (resolved {:?})",
        config.source_mode,
        config.effective_source_mode()
    );

    let query = Query {
        name: cli.name,
        domain: cli.domain,
        profile_path: cli.profile_path,
        industry: cli.industry,
        stage: cli.stage,
        region: cli.region,
    };
    let features = run_from_config(&config, &query, !cli.no_save)?;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn config_warnings_reach_the_startup_subscriber() {
        let captured = Captured::default();
        let sink = captured.clone();
        let (subscriber, _handle) =
            build_subscriber(EnvFilter::new("startup_signals=info"), move || sink.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mut config = RuntimeConfig {
                max_concurrency: 0,
                ..Default::default()
            };
            config.validate().unwrap();
            assert_eq!(config.max_concurrency, 1);
        });
        assert!(captured.text().contains("MAX_CONCURRENCY 0 is invalid, clamping to 1"));
    }
}
