use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use console::style;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use costctl::audit::{run_audit, AuditOptions, AuditSummary};
use costctl::config::{init_config, Config};
use costctl::window::MetricWindow;

#[derive(Parser)]
#[command(name = "costctl")]
#[command(
    about = "AWS cost audit CLI for EC2, EBS, and Elastic IP resources",
    long_about = "costctl audits an AWS account across multiple regions and writes CSV reports of cost-saving opportunities.\n\nReports:\n  - ec2_cpu_metrics.csv       CPU utilization per instance\n  - ebs_volume_metrics.csv    read/write ops per volume\n  - unused_ebs_snapshots.csv  snapshots of unattached volumes\n  - unused_eips.csv           Elastic IPs with no association\n\nCredentials come from the default AWS provider chain (environment, shared config, instance profile)."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the multi-region audit and write the four CSV reports
    #[command(alias = "run")]
    Audit {
        /// Directory to write reports into (defaults to config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Regions to audit, comma separated (defaults to config)
        #[arg(long, value_delimiter = ',')]
        regions: Vec<String>,

        /// Metric lookback window in days (defaults to config)
        #[arg(long)]
        lookback_days: Option<i64>,
    },
    /// List the regions the audit will visit
    Regions,
    /// Initialize audit configuration
    Init {
        /// Path for the new config file
        #[arg(short, long, default_value = ".costctl.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging - suppress INFO by default, only show warnings and errors
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config
    let config = Config::load(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Audit {
            output_dir,
            regions,
            lookback_days,
        } => {
            let regions = if regions.is_empty() {
                config.audit.regions.clone()
            } else {
                regions
            };
            let lookback_days = lookback_days.unwrap_or(config.audit.lookback_days);
            let options = AuditOptions {
                regions,
                output_dir: output_dir.unwrap_or_else(|| config.reports.output_dir.clone()),
                window: MetricWindow::lookback(lookback_days, config.audit.period_secs),
            };

            let summary = run_audit(&options).await.map_err(anyhow::Error::from)?;
            print_summary(&summary, &options.output_dir, &cli.output)?;

            if summary.failed_regions() > 0 {
                anyhow::bail!(
                    "{} of {} regions failed; reports contain rows collected before each failure",
                    summary.failed_regions(),
                    summary.regions.len()
                );
            }
        }
        Commands::Regions => {
            if cli.output == "json" {
                println!("{}", serde_json::to_string_pretty(&config.audit.regions)?);
            } else {
                for region in &config.audit.regions {
                    println!("{}", region);
                }
            }
        }
        Commands::Init { path } => {
            init_config(&path)?;
        }
    }

    Ok(())
}

fn print_summary(summary: &AuditSummary, output_dir: &std::path::Path, output_format: &str) -> Result<()> {
    if output_format == "json" {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Region",
        "Instances",
        "CPU rows",
        "Volumes",
        "Vol rows",
        "Unused vols",
        "Snap rows",
        "Unused EIPs",
        "Status",
    ]);

    for region in &summary.regions {
        let status_cell = match &region.error {
            Some(e) => Cell::new(format!("FAILED: {}", e)).fg(comfy_table::Color::Red),
            None => Cell::new("ok").fg(comfy_table::Color::Green),
        };
        table.add_row(vec![
            Cell::new(&region.region),
            Cell::new(region.instances),
            Cell::new(region.cpu_rows),
            Cell::new(region.volumes),
            Cell::new(region.volume_metric_rows),
            Cell::new(region.unused_volumes),
            Cell::new(region.snapshot_rows),
            Cell::new(region.unused_eips),
            status_cell,
        ]);
    }

    println!("{}", table);
    println!(
        "\n  {} {} rows across {} regions ({} failed)",
        style("Total:").bold(),
        summary.total_rows(),
        summary.regions.len(),
        summary.failed_regions()
    );
    println!(
        "  {} {} .. {}",
        style("Window:").dim(),
        summary.window_start,
        summary.window_end
    );
    println!(
        "  {} {}",
        style("Reports:").dim(),
        output_dir.display()
    );

    Ok(())
}
