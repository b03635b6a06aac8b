//! Dashboard Main Application
//! Main window with the filter panel and the dashboard body.

use crate::config::DashboardConfig;
use crate::data::{DataLoader, LoadedTables, TableCache};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, ViewerContent};
use crate::pipeline::{compute_views_with_limit, FilterOptions, FilterSpec, Views};
use crate::report::{ExportSummary, PptGenerator, ReportError};
use egui::{Color32, RichText, SidePanel};
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How often the resource files are checked for changes on disk.
const STALE_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Export result from background thread
enum ExportResult {
    Complete(PathBuf, ExportSummary),
    Error(ReportError),
}

/// What the central panel currently shows.
enum DashboardState {
    Ready {
        tables: Arc<LoadedTables>,
        views: Views,
        preview: Option<DataFrame>,
    },
    LoadFailed(String),
    ComputeFailed(String),
}

/// Main application window.
pub struct DashboardApp {
    cache: TableCache,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    state: DashboardState,

    stale: bool,
    last_stale_check: Instant,

    // Async export
    export_rx: Option<Receiver<ExportResult>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            cache: TableCache::new(DataLoader::new(config)),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            state: DashboardState::LoadFailed("Not loaded".to_string()),
            stale: false,
            last_stale_check: Instant::now(),
            export_rx: None,
        };
        app.load(false);
        app
    }

    fn config(&self) -> &DashboardConfig {
        self.cache.loader().config()
    }

    /// Load (or reload) the tables, refresh the selectors and recompute.
    fn load(&mut self, force: bool) {
        let result = if force {
            self.cache.reload()
        } else {
            self.cache.get_or_load()
        };
        self.stale = false;

        let tables = match result {
            Ok(tables) => tables,
            Err(e) => {
                self.control_panel.set_status(format!("Error: {}", e));
                self.state = DashboardState::LoadFailed(e.to_string());
                return;
            }
        };

        match FilterOptions::from_transactions(&tables.transactions) {
            Ok(options) => self.control_panel.update_options(options),
            Err(e) => warn!(error = %e, "could not list filter values"),
        }
        self.control_panel.set_status(format!(
            "Loaded {} transactions",
            tables.transactions.height()
        ));
        self.recompute(tables);
    }

    fn recompute(&mut self, tables: Arc<LoadedTables>) {
        let spec = self.control_panel.spec();
        let config = self.config();
        let (limit, preview_rows) = (config.top_products_limit, config.preview_rows);

        self.state = match compute_views_with_limit(&tables.transactions, &spec, limit) {
            Ok(views) => {
                let preview = views
                    .preview(preview_rows)
                    .map_err(|e| warn!(error = %e, "could not build data preview"))
                    .ok();
                DashboardState::Ready {
                    tables,
                    views,
                    preview,
                }
            }
            Err(e) => {
                error!(error = %e, "view computation failed");
                DashboardState::ComputeFailed(e.to_string())
            }
        };
    }

    fn handle_filter_changed(&mut self) {
        let tables = match &self.state {
            DashboardState::Ready { tables, .. } => Arc::clone(tables),
            _ => match self.cache.get() {
                Some(tables) => tables,
                None => return,
            },
        };
        self.recompute(tables);
    }

    fn handle_choose_data_dir(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config().data_dir)
            .pick_folder()
        else {
            return;
        };

        info!(data_dir = %dir.display(), "switching data directory");
        let config = DashboardConfig {
            data_dir: dir,
            ..self.config().clone()
        };
        self.cache = TableCache::new(DataLoader::new(config));
        self.load(false);
    }

    fn handle_export_ppt(&mut self) {
        if self.export_rx.is_some() {
            return;
        }
        let DashboardState::Ready { views, .. } = &self.state else {
            self.control_panel.set_status("Nothing to export");
            return;
        };

        let Some(output_path) = rfd::FileDialog::new()
            .add_filter("PowerPoint", &["pptx"])
            .set_file_name("ecommerce_report.pptx")
            .save_file()
        else {
            return;
        };

        let views = views.clone();
        let spec = self.control_panel.spec();
        let target = self.config().revenue_target;
        let (tx, rx) = channel();
        self.export_rx = Some(rx);
        self.control_panel.set_status("Rendering charts...");

        thread::spawn(move || {
            let result = match PptGenerator::export_views(&views, &spec, target, &output_path) {
                Ok(summary) => ExportResult::Complete(output_path, summary),
                Err(e) => ExportResult::Error(e),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for export results
    fn check_export_results(&mut self) {
        let Some(rx) = self.export_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(ExportResult::Complete(path, summary)) => {
                self.control_panel
                    .set_status(format!("PPT exported: {} slides", summary.slides));
                if let Err(e) = open::that(&path) {
                    warn!(error = %e, path = %path.display(), "could not open exported report");
                }
            }
            Ok(ExportResult::Error(e)) => {
                error!(error = %e, "report export failed");
                self.control_panel.set_status(format!("Error: {}", e));
            }
            Err(TryRecvError::Empty) => self.export_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.control_panel.set_status("Error: export stopped unexpectedly");
            }
        }
    }

    fn check_stale(&mut self) {
        if self.last_stale_check.elapsed() < STALE_CHECK_INTERVAL {
            return;
        }
        self.last_stale_check = Instant::now();
        self.stale = self.cache.is_stale();
    }

    fn draw_error(ui: &mut egui::Ui, title: &str, message: &str) -> bool {
        let mut retry = false;
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new(format!("❌ {}", title))
                    .size(20.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
            ui.add_space(10.0);
            ui.label(message);
            ui.add_space(15.0);
            if ui.button("🔄 Retry").clicked() {
                retry = true;
            }
        });
        retry
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_export_results();
        self.check_stale();

        if self.export_rx.is_some() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(STALE_CHECK_INTERVAL);
        }

        let shown_rows = match &self.state {
            DashboardState::Ready { views, .. } => Some(views.filtered.height()),
            _ => None,
        };
        let data_dir = self.config().data_dir.clone();

        // Left panel - filters
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui, &data_dir, shown_rows) {
                        ControlPanelAction::FilterChanged => self.handle_filter_changed(),
                        ControlPanelAction::Reload => self.load(true),
                        ControlPanelAction::ChooseDataDir => self.handle_choose_data_dir(),
                        ControlPanelAction::ExportPpt => self.handle_export_ppt(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        if self.stale {
            egui::TopBottomPanel::top("stale_notice").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("⚠ The data files changed on disk.")
                            .color(Color32::from_rgb(243, 156, 18)),
                    );
                    if ui.button("Reload").clicked() {
                        self.load(true);
                    }
                });
            });
        }

        // Central panel - dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            let retry = match &self.state {
                DashboardState::Ready {
                    tables,
                    views,
                    preview,
                } => {
                    let content = ViewerContent {
                        views,
                        revenue_target: self.cache.loader().config().revenue_target,
                        preview: preview.as_ref(),
                        top_customers: Some(&tables.customers),
                    };
                    self.chart_viewer.show(ui, &content);
                    false
                }
                DashboardState::LoadFailed(message) => {
                    Self::draw_error(ui, "Data could not be loaded", message)
                }
                DashboardState::ComputeFailed(message) => {
                    Self::draw_error(ui, "Dashboard could not be computed", message)
                }
            };
            if retry {
                self.load(true);
            }
        });
    }
}
