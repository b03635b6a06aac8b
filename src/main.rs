//! E-commerce Analytics Dashboard
//!
//! Opens the dashboard window, or prints and exports the views headless.

use anyhow::Context;
use clap::Parser;
use ecommerce_dashboard::cli::{format_summary, Cli, Command, FilterArgs};
use ecommerce_dashboard::config::DashboardConfig;
use ecommerce_dashboard::data::{DataLoader, LoadedTables, TableCache};
use ecommerce_dashboard::gui::DashboardApp;
use ecommerce_dashboard::pipeline::compute_views_with_limit;
use ecommerce_dashboard::report::PptGenerator;
use eframe::egui;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Exit status when the data files cannot be loaded.
const EXIT_LOAD_FAILED: u8 = 2;

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "ecommerce_dashboard=debug"
    } else {
        "ecommerce_dashboard=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_gui(config: DashboardConfig) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("E-commerce Analytics Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "E-commerce Analytics Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}

/// Load the tables for a headless command, or the exit status for a failed load.
fn load_tables(config: &DashboardConfig) -> Result<Arc<LoadedTables>, ExitCode> {
    let mut cache = TableCache::new(DataLoader::new(config.clone()));
    cache.get_or_load().map_err(|e| {
        eprintln!("Error: {e}");
        ExitCode::from(EXIT_LOAD_FAILED)
    })
}

fn run_summary(
    filters: &FilterArgs,
    json: bool,
    pretty: bool,
    config: &DashboardConfig,
    tables: &LoadedTables,
) -> anyhow::Result<()> {
    let spec = filters.to_spec();
    let views = compute_views_with_limit(&tables.transactions, &spec, config.top_products_limit)?;
    if json {
        let text = if pretty {
            serde_json::to_string_pretty(&views)?
        } else {
            serde_json::to_string(&views)?
        };
        println!("{text}");
    } else {
        print!("{}", format_summary(&views, &spec, config.revenue_target));
    }
    Ok(())
}

fn run_export(
    output: &Path,
    filters: &FilterArgs,
    open: bool,
    config: &DashboardConfig,
    tables: &LoadedTables,
) -> anyhow::Result<()> {
    let spec = filters.to_spec();
    let views = compute_views_with_limit(&tables.transactions, &spec, config.top_products_limit)?;
    let summary = PptGenerator::export_views(&views, &spec, config.revenue_target, output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {} slides to {}", summary.slides, output.display());
    if open {
        open::that(output).with_context(|| format!("opening {}", output.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(data_dir = %config.data_dir.display(), "starting");

    let result = match cli.command() {
        // The window reports load errors itself
        Command::Gui => run_gui(config),
        Command::Summary {
            filters,
            json,
            pretty,
        } => match load_tables(&config) {
            Ok(tables) => run_summary(&filters, json, pretty, &config, &tables),
            Err(code) => return code,
        },
        Command::Export {
            output,
            filters,
            open,
        } => match load_tables(&config) {
            Ok(tables) => run_export(&output, &filters, open, &config, &tables),
            Err(code) => return code,
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
