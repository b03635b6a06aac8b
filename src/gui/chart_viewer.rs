//! Chart Viewer Widget
//! Central scrollable panel with the KPI cards, the chart sections and the data tables.

use crate::charts::{format_amount, format_attainment, ChartPlotter};
use crate::pipeline::Views;
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::*;

const CHART_HEIGHT: f32 = 320.0;
const CARD_SPACING: f32 = 12.0;
const TOP_CUSTOMERS_SHOWN: usize = 10;

/// Text shown for one table cell.
pub fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) => format!("{:.2}", v),
        AnyValue::Float32(v) => format!("{:.2}", v),
        other => other.to_string(),
    }
}

/// Everything the viewer needs for one frame.
pub struct ViewerContent<'a> {
    pub views: &'a Views,
    pub revenue_target: f64,
    pub preview: Option<&'a DataFrame>,
    pub top_customers: Option<&'a DataFrame>,
}

/// Scrollable dashboard body.
#[derive(Default)]
pub struct ChartViewer {
    pub show_raw_data: bool,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, content: &ViewerContent<'_>) {
        let views = content.views;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("E-commerce Analytics Dashboard");
                ui.add_space(CARD_SPACING);

                Self::draw_kpi_cards(ui, views, content.revenue_target);
                ui.add_space(CARD_SPACING);

                if views.is_empty() {
                    egui::Frame::none()
                        .fill(Color32::from_rgb(217, 237, 247))
                        .rounding(5.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new("ℹ No transactions match the selected filters.")
                                    .color(Color32::from_rgb(49, 112, 143)),
                            );
                        });
                    ui.add_space(CARD_SPACING);
                }

                Self::section(
                    ui,
                    "📈 Sales over time",
                    ("Monthly revenue", ChartPlotter::draw_monthly_chart),
                    ("Revenue by day of week", ChartPlotter::draw_weekday_chart),
                    views,
                );
                Self::section(
                    ui,
                    "📦 Products",
                    ("Top products", ChartPlotter::draw_top_products_chart),
                    ("Category shares", ChartPlotter::draw_category_chart),
                    views,
                );
                Self::section(
                    ui,
                    "👥 Customers",
                    ("Revenue by country", ChartPlotter::draw_country_chart),
                    ("Revenue by segment", ChartPlotter::draw_segment_chart),
                    views,
                );

                if let Some(customers) = content.top_customers {
                    ui.label(RichText::new("🏆 Top customers (all time)").size(16.0).strong());
                    ui.add_space(5.0);
                    Self::draw_table(ui, "top_customers", &customers.head(Some(TOP_CUSTOMERS_SHOWN)));
                    ui.add_space(CARD_SPACING);
                }

                ui.checkbox(&mut self.show_raw_data, "Show raw data");
                if self.show_raw_data {
                    match content.preview {
                        Some(preview) => Self::draw_table(ui, "raw_data", preview),
                        None => {
                            ui.label(RichText::new("Preview unavailable").color(Color32::GRAY));
                        }
                    }
                }
            });
    }

    fn draw_kpi_cards(ui: &mut egui::Ui, views: &Views, revenue_target: f64) {
        let kpis = &views.kpis;
        let attainment = kpis.target_attainment_pct(revenue_target);

        let cards = [
            (
                "💰 Revenue",
                format_amount(kpis.total_revenue),
                format_attainment(attainment),
            ),
            (
                "🧾 Orders",
                format_amount(kpis.order_count as f64),
                String::new(),
            ),
            (
                "🛍 Average basket",
                format!("{:.2}", kpis.average_order_value),
                String::new(),
            ),
            (
                "👤 Unique customers",
                format_amount(kpis.unique_customers as f64),
                format!("{:.2} orders / customer", kpis.orders_per_customer),
            ),
        ];

        ui.columns(cards.len(), |columns| {
            for (ui, (title, value, detail)) in columns.iter_mut().zip(cards) {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new(title).size(13.0).color(Color32::GRAY));
                        ui.label(RichText::new(value).size(24.0).strong());
                        if !detail.is_empty() {
                            ui.label(RichText::new(detail).size(11.0));
                        }
                    });
            }
        });
    }

    /// Titled section with two charts side by side.
    fn section(
        ui: &mut egui::Ui,
        title: &str,
        left: (&str, fn(&mut egui::Ui, &Views, f32)),
        right: (&str, fn(&mut egui::Ui, &Views, f32)),
        views: &Views,
    ) {
        ui.label(RichText::new(title).size(16.0).strong());
        ui.add_space(5.0);
        ui.columns(2, |columns| {
            for (ui, (subtitle, draw)) in columns.iter_mut().zip([left, right]) {
                egui::Frame::none()
                    .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
                    .rounding(8.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(subtitle).size(14.0).strong());
                        draw(ui, views, CHART_HEIGHT);
                    });
            }
        });
        ui.add_space(CARD_SPACING);
    }

    fn draw_table(ui: &mut egui::Ui, id: &str, df: &DataFrame) {
        let columns = df.get_columns();
        ScrollArea::horizontal().id_salt(id).show(ui, |ui| {
            egui::Grid::new(id).striped(true).show(ui, |ui| {
                for column in columns {
                    ui.label(RichText::new(column.name().as_str()).strong());
                }
                ui.end_row();

                for row in 0..df.height() {
                    for column in columns {
                        let text = column.get(row).map(|v| cell_text(&v)).unwrap_or_default();
                        ui.label(text);
                    }
                    ui.end_row();
                }
            });
        });
        ui.add_space(CARD_SPACING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_shown_without_quotes() {
        assert_eq!(cell_text(&AnyValue::String("FR")), "FR");
        assert_eq!(cell_text(&AnyValue::Float64(12.5)), "12.50");
        assert_eq!(cell_text(&AnyValue::Int64(3)), "3");
        assert_eq!(cell_text(&AnyValue::Null), "");
    }
}
