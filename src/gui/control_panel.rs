//! Control Panel Widget
//! Left side panel with the filter selectors and data actions.

use crate::pipeline::{DateRange, FilterOptions, FilterSpec};
use chrono::NaiveDate;
use egui::{Color32, ComboBox, RichText};
use std::path::Path;

const ALL: &str = "All";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date text field. Blank means no bound.
pub fn parse_date_field(text: &str) -> Result<Option<NaiveDate>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", text))
}

/// Left side control panel with the filter selection.
pub struct ControlPanel {
    pub options: FilterOptions,
    pub country: Option<String>,
    pub category: Option<String>,
    pub from_text: String,
    pub to_text: String,
    date_warning: Option<String>,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            options: FilterOptions::default(),
            country: None,
            category: None,
            from_text: String::new(),
            to_text: String::new(),
            date_warning: None,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selector values.
    ///
    /// A selected country or category that no longer exists is cleared. The
    /// period starts as the full data range and afterwards keeps the user's
    /// dates, except fields that no longer parse.
    pub fn update_options(&mut self, options: FilterOptions) {
        if self
            .country
            .as_ref()
            .is_some_and(|c| !options.countries.contains(c))
        {
            self.country = None;
        }
        if self
            .category
            .as_ref()
            .is_some_and(|c| !options.categories.contains(c))
        {
            self.category = None;
        }

        let first_load = self.options == FilterOptions::default();
        let range = options.full_range();
        for (text, bound) in [
            (&mut self.from_text, range.start),
            (&mut self.to_text, range.end),
        ] {
            if first_load || parse_date_field(text).is_err() {
                *text = bound.map(|d| d.to_string()).unwrap_or_default();
            }
        }
        self.date_warning = None;
        self.options = options;
    }

    /// Current selection. An unparsable date leaves that bound unset.
    pub fn spec(&mut self) -> FilterSpec {
        let mut warnings = Vec::new();
        let mut bound = |text: &str| {
            parse_date_field(text).unwrap_or_else(|e| {
                warnings.push(e);
                None
            })
        };
        let range = DateRange::new(bound(&self.from_text), bound(&self.to_text));

        self.date_warning = (!warnings.is_empty()).then(|| warnings.join("; "));

        FilterSpec {
            country: self.country.clone(),
            category: self.category.clone(),
            date_range: range,
        }
    }

    pub fn date_warning(&self) -> Option<&str> {
        self.date_warning.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn selector(
        ui: &mut egui::Ui,
        id: &str,
        label: &str,
        values: &[String],
        selected: &mut Option<String>,
    ) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.add_sized([80.0, 20.0], egui::Label::new(label));
            ComboBox::from_id_salt(id)
                .width(170.0)
                .selected_text(selected.as_deref().unwrap_or(ALL))
                .show_ui(ui, |ui| {
                    if ui.selectable_label(selected.is_none(), ALL).clicked() {
                        *selected = None;
                        changed = true;
                    }
                    for value in values {
                        let is_selected = selected.as_deref() == Some(value.as_str());
                        if ui.selectable_label(is_selected, value).clicked() {
                            *selected = Some(value.clone());
                            changed = true;
                        }
                    }
                });
        });
        changed
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        data_dir: &Path,
        shown_rows: Option<usize>,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🛒 E-commerce Analytics")
                    .size(20.0)
                    .color(Color32::from_rgb(31, 119, 180)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(data_dir.display().to_string()).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::ChooseDataDir;
                        }
                    });
                });
            });

        ui.add_space(5.0);
        if ui.button("🔄 Reload data").clicked() {
            action = ControlPanelAction::Reload;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters =====
        ui.label(RichText::new("🔎 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let mut changed = Self::selector(
            ui,
            "country",
            "Country:",
            &self.options.countries,
            &mut self.country,
        );
        ui.add_space(5.0);
        changed |= Self::selector(
            ui,
            "category",
            "Category:",
            &self.options.categories,
            &mut self.category,
        );
        ui.add_space(10.0);

        for (label, text) in [("From:", &mut self.from_text), ("To:", &mut self.to_text)] {
            ui.horizontal(|ui| {
                ui.add_sized([80.0, 20.0], egui::Label::new(label));
                let response = ui.add(
                    egui::TextEdit::singleline(text)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(170.0),
                );
                if response.lost_focus() {
                    changed = true;
                }
            });
            ui.add_space(5.0);
        }

        if ui.small_button("Full period").clicked() {
            let range = self.options.full_range();
            self.from_text = range.start.map(|d| d.to_string()).unwrap_or_default();
            self.to_text = range.end.map(|d| d.to_string()).unwrap_or_default();
            changed = true;
        }

        if let Some(warning) = &self.date_warning {
            ui.label(
                RichText::new(format!("⚠ {}", warning))
                    .size(11.0)
                    .color(Color32::from_rgb(243, 156, 18)),
            );
        }

        if changed {
            action = ControlPanelAction::FilterChanged;
        }

        ui.add_space(8.0);
        if let Some(rows) = shown_rows {
            ui.label(
                RichText::new(format!("{} transactions shown", rows))
                    .size(12.0)
                    .color(Color32::GRAY),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(shown_rows.is_some(), |ui| {
                let button = egui::Button::new(RichText::new("📄 Export PPT").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPpt;
                }
            });
        });

        ui.add_space(10.0);
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    FilterChanged,
    Reload,
    ChooseDataDir,
    ExportPpt,
}
