use std::fs::File;
use std::future::Future;
use std::path::{Path, PathBuf};

use aegis_scan_rs::actions::ActionError;
use aegis_scan_rs::config::{build_actions, ModelArgs, ProbeArgs, StorageArgs};
use aegis_scan_rs::history::KeyValueStore;
use aegis_scan_rs::progress::{ProgressProfile, ProgressSimulator};
use aegis_scan_rs::risk::RiskBand;
use aegis_scan_rs::server::{self, AppState};
use aegis_scan_rs::types::{PenTestReport, ScanHistoryItem, VulnerabilityReport};

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use time::macros::format_description;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// aegis-scan-rs: AI-generated vulnerability reports and simulated pen tests with a tiny embedded web UI.
#[derive(Debug, Parser)]
#[command(
    name = "aegis-scan-rs",
    version,
    about = "AI-generated vulnerability reports and simulated pen tests with a tiny embedded web UI.",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API and embedded UI.
    Serve {
        /// Address to bind.
        #[arg(long, env = "AEGIS_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
        /// Directory with the static UI.
        #[arg(long = "ui-dir", default_value = "ui")]
        ui_dir: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        probe: ProbeArgs,
        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Generate a vulnerability report for a URL and record it in history.
    Scan {
        url: String,
        /// Write the report as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Run a simulated penetration test against a URL.
    PenTest {
        url: String,
        /// Write the report as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Ask whether authenticated areas of a URL can be tested.
    AuthCheck {
        url: String,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// List past scans, or show one report by id.
    History {
        id: Option<String>,
        #[command(flatten)]
        storage: StorageArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Serve {
            bind,
            ui_dir,
            model,
            probe,
            storage,
        } => {
            println!("aegis-scan-rs configuration:");
            println!("  bind         : {}", bind);
            println!("  ui_dir       : {}", ui_dir.display());
            println!("  model        : {}", model.model);
            println!("  probe_policy : {:?}", probe.policy);
            println!("  data_dir     : {}", storage.data_dir.display());

            let actions = build_actions(&model, Some(&probe))?;
            let storage: Box<dyn KeyValueStore> = Box::new(storage.file_storage());
            let state = AppState::new(actions, storage);

            let shutdown = CancellationToken::new();
            let on_ctrl_c = shutdown.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
                on_ctrl_c.cancel();
            });

            println!("UI server starting at http://{} (Ctrl+C to stop)", bind);
            server::serve(&bind, state, &ui_dir, shutdown).await?;
        }
        Command::Scan {
            url,
            output,
            model,
            storage,
        } => {
            let actions = build_actions(&model, None)?;
            let report = with_progress(
                ProgressProfile::SCAN,
                "Analyzing target...",
                actions.perform_scan(&url),
            )
            .await?;
            let item = ScanHistoryItem::from_report(&url, report);
            print_vulnerability_report(&item);
            write_output(output.as_deref(), &item.report);
            storage.open_history().add_scan(item);
        }
        Command::PenTest {
            url,
            output,
            model,
            probe,
        } => {
            let actions = build_actions(&model, Some(&probe))?;
            let report = with_progress(
                ProgressProfile::PEN_TEST,
                "Simulating attack vectors...",
                actions.perform_pen_test(&url),
            )
            .await?;
            print_pen_test_report(&report);
            write_output(output.as_deref(), &report);
        }
        Command::AuthCheck { url, model } => {
            let actions = build_actions(&model, None)?;
            let report = actions.check_authentication(&url).await?;
            println!(
                "Authenticated areas reachable: {}",
                if report.can_access_authenticated_areas { "yes" } else { "no" }
            );
            println!("{}", report.feedback);
        }
        Command::History { id, storage } => {
            let mut history = storage.open_history();
            match id {
                Some(id) => match history.get_scan_by_id(&id) {
                    Some(item) => print_vulnerability_report(&item),
                    None => anyhow::bail!("Scan report not found: {id}"),
                },
                None => print_history_table(&history.items()),
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Await `action` while a cosmetic progress bar ticks on its own schedule.
async fn with_progress<T, F>(profile: ProgressProfile, label: &'static str, action: F) -> Result<T, ActionError>
where
    F: Future<Output = Result<T, ActionError>>,
{
    let sim = ProgressSimulator::start(profile);
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(label);

    let mut rx = sim.subscribe();
    bar.set_position(u64::from(*rx.borrow()));
    let drive = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let pos = *rx.borrow_and_update();
                bar.set_position(u64::from(pos));
            }
        })
    };

    let res = action.await;
    drive.abort();
    match &res {
        Ok(_) => {
            bar.set_position(u64::from(sim.finish()));
            bar.finish_with_message("done");
        }
        Err(_) => {
            bar.set_position(u64::from(sim.abort()));
            bar.abandon_with_message("failed");
        }
    }
    res
}

fn print_vulnerability_report(item: &ScanHistoryItem) {
    println!("\nTarget     : {}", item.target_url);
    println!("Scanned    : {}", format_date(item));
    println!(
        "Risk score : {} ({})",
        item.risk_score,
        RiskBand::from_score(item.risk_score).as_str()
    );
    print_vulnerabilities(&item.report);
    println!("Report id  : {}", item.id);
}

fn print_vulnerabilities(report: &VulnerabilityReport) {
    if report.vulnerabilities.is_empty() {
        println!("\nNo vulnerabilities reported.");
        return;
    }
    println!("\nVulnerabilities: {}", report.vulnerabilities.len());
    for (i, v) in report.vulnerabilities.iter().enumerate() {
        println!("\n{}. [{}] {}", i + 1, v.severity, v.name);
        println!("   {}", v.description);
        println!("   Remediation: {}", v.remediation);
    }
}

fn print_pen_test_report(report: &PenTestReport) {
    println!("\nExecutive summary:\n{}", report.executive_summary);
    println!("\nAttack narrative:\n{}", report.attack_narrative);
    println!(
        "\nAttack vectors: {} ({} exploited)",
        report.simulated_attack_vectors.len(),
        report.exploited_count()
    );
    for v in &report.simulated_attack_vectors {
        let mark = if v.exploited { "EXPLOITED" } else { "blocked" };
        match &v.cve {
            Some(cve) => println!("  - {} [{}] {}", v.vector, mark, cve),
            None => println!("  - {} [{}]", v.vector, mark),
        }
        println!("    {}", v.description);
        if let Some(poc) = &v.poc {
            println!("    PoC: {}", poc);
        }
        if let Some(fix) = &v.remediation {
            println!("    Remediation: {}", fix);
        }
    }
}

fn print_history_table(items: &[ScanHistoryItem]) {
    if items.is_empty() {
        println!("No scans found. Run `aegis-scan-rs scan <url>` to create one.");
        return;
    }
    let mut url_w = "target_url".len();
    for item in items {
        url_w = url_w.max(item.target_url.chars().count().min(60));
    }
    let date_w = 16usize;
    let risk_w = "risk".len();
    let band_w = "Critical".len();

    println!(
        "{:<url_w$}  {:<date_w$}  {:>risk_w$}  {:<band_w$}  id",
        "target_url", "date", "risk", "band",
    );
    println!(
        "{:-<url_w$}  {:-<date_w$}  {:-<risk_w$}  {:-<band_w$}  {:-<36}",
        "", "", "", "", "",
    );
    for item in items {
        let url: String = item.target_url.chars().take(60).collect();
        println!(
            "{:<url_w$}  {:<date_w$}  {:>risk_w$}  {:<band_w$}  {}",
            url,
            format_date(item),
            item.risk_score,
            RiskBand::from_score(item.risk_score).as_str(),
            item.id,
        );
    }
}

fn format_date(item: &ScanHistoryItem) -> String {
    item.scan_date
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| item.scan_date.to_string())
}

fn write_output<T: Serialize>(path: Option<&Path>, report: &T) {
    let Some(path) = path else { return };
    if let Err(e) = write_json(path, report) {
        eprintln!("Failed to write JSON to {}: {}", path.display(), e);
    } else {
        println!("Wrote JSON report to {}", path.display());
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
