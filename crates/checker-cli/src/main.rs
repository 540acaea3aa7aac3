mod config;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use checker_core::{
    normalize, CheckSummary, Checker, CheckerConfig, HttpLoader, ItemReport, ItemStatus,
    PlaylistInput, ProcessRunner, UrlCache,
};

/// Check the streams of IPTV playlists with ffprobe.
#[derive(Parser)]
#[command(name = "stream-checker", version, about)]
struct Cli {
    /// Playlist sources: file paths or http(s) URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Directory to write online/offline/duplicates playlists into.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Probe timeout per item in milliseconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Number of probes to run at once.
    #[arg(short, long)]
    parallel: Option<usize>,

    /// Default user agent for items that do not set one.
    #[arg(short = 'a', long)]
    user_agent: Option<String>,

    /// Path to the ffprobe binary.
    #[arg(long)]
    ffprobe: Option<String>,

    /// Path to TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log probe commands and other debug output.
    #[arg(short = 'D', long, default_value_t = false)]
    debug: bool,
}

impl Cli {
    fn checker_config(&self, base: CheckerConfig) -> CheckerConfig {
        let mut c = base;
        if let Some(t) = self.timeout {
            c = c.with_timeout(t);
        }
        if let Some(p) = self.parallel {
            c = c.with_max_concurrent_checks(p);
        }
        if let Some(ref ua) = self.user_agent {
            c = c.with_user_agent(ua.clone());
        }
        if let Some(ref path) = self.ffprobe {
            c = c.with_probe_path(path.clone());
        }
        c
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match cli.config {
        Some(ref path) => match config::AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.log.format, cli.debug);
                tracing::info!(path = %path.display(), "Loaded config file");
                c
            }
            Err(e) => {
                init_tracing("pretty", cli.debug);
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            init_tracing("pretty", cli.debug);
            config::AppConfig::default()
        }
    };

    let checker_config = cli.checker_config(app_config.checker.to_checker_config());
    let output_root = cli
        .output
        .clone()
        .unwrap_or_else(|| app_config.output.dir.clone());

    let loader = match HttpLoader::from_config(&checker_config) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };
    let checker = Checker::new(checker_config, Arc::new(ProcessRunner));
    let cache = UrlCache::new();

    println!(
        "{} {}",
        style("stream-checker").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!(
        "  {} {}ms",
        style("timeout: ").dim(),
        checker.config().timeout.as_millis()
    );
    println!(
        "  {} {}",
        style("parallel:").dim(),
        checker.config().max_concurrent_checks
    );
    println!("  {} {}", style("output:  ").dim(), output_root.display());
    println!();

    let mut output_dirs = report::OutputDirs::new(output_root);
    let mut failed_inputs = 0usize;
    let mut total = CheckSummary::default();

    for (position, input) in cli.inputs.iter().enumerate() {
        let playlist = match normalize(PlaylistInput::from(input.as_str()), &loader).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(input = %input, error = %e, "Failed to load playlist");
                failed_inputs += 1;
                continue;
            }
        };

        println!(
            "{} {} ({} items)",
            style("Checking").bold(),
            input,
            playlist.len()
        );

        let bar = ProgressBar::new(playlist.len() as u64).with_style(
            ProgressStyle::with_template("  [{bar:40}] {pos}/{len} {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let reports = checker
            .check_playlist_with_progress(&playlist, &cache, |r| {
                bar.println(format_report(r));
                bar.inc(1);
            })
            .await;
        bar.finish_and_clear();

        let dir = output_dirs.assign(input, position);
        if let Err(e) = report::write_reports(&dir, &playlist, &reports) {
            tracing::error!(dir = %dir.display(), error = %e, "Failed to write reports");
            failed_inputs += 1;
        } else {
            tracing::info!(dir = %dir.display(), "Reports written");
        }

        let summary = CheckSummary::from_reports(&reports);
        print_summary(&summary);
        total.total += summary.total;
        total.online += summary.online;
        total.offline += summary.offline;
        total.duplicates += summary.duplicates;
    }

    if cli.inputs.len() > 1 {
        println!("{}", style("All playlists").bold());
        print_summary(&total);
    }

    if failed_inputs > 0 {
        std::process::exit(1);
    }
}

fn format_report(r: &ItemReport) -> String {
    let ts = r.checked_at.format("%H:%M:%S");
    let name = if r.item.name.is_empty() {
        r.item.url.as_str()
    } else {
        r.item.name.as_str()
    };
    match &r.status {
        ItemStatus::Online { metadata } => {
            let streams: Vec<String> = metadata.streams.iter().map(|s| s.summary()).collect();
            format!(
                "  {}  {} {}  {}",
                style(ts).dim(),
                style(format!("{:<9}", "ONLINE")).green(),
                name,
                style(streams.join(", ")).dim()
            )
        }
        ItemStatus::Offline { reason } => format!(
            "  {}  {} {}  {}",
            style(ts).dim(),
            style(format!("{:<9}", "OFFLINE")).red().bold(),
            name,
            style(reason).red()
        ),
        ItemStatus::Duplicate => format!(
            "  {}  {} {}",
            style(ts).dim(),
            style(format!("{:<9}", "DUPLICATE")).yellow(),
            name
        ),
    }
}

fn print_summary(s: &CheckSummary) {
    println!(
        "  {} {}  {} {}  {} {}  {} {}\n",
        style("total").dim(),
        s.total,
        style("online").green(),
        s.online,
        style("offline").red(),
        s.offline,
        style("duplicates").yellow(),
        s.duplicates
    );
}

fn init_tracing(log_format: &str, debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
