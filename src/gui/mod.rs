//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::DashboardApp;
pub use chart_viewer::{cell_text, ChartViewer, ViewerContent};
pub use control_panel::{parse_date_field, ControlPanel, ControlPanelAction};
