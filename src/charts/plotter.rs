//! Chart Plotter Module
//! Creates the interactive dashboard charts using egui_plot.

use crate::charts::{format_amount, palette_color, segment_color, PRIMARY};
use crate::pipeline::Views;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};
use std::ops::RangeInclusive;

fn color((r, g, b): (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Axis formatter showing `labels[i]` at integer positions only.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn amount_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    format_amount(mark.value)
}

/// Creates the dashboard charts from computed [`Views`].
pub struct ChartPlotter;

impl ChartPlotter {
    fn base_plot(id: &str, height: f32) -> Plot {
        Plot::new(id)
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
    }

    fn no_data(ui: &mut egui::Ui, height: f32) {
        ui.allocate_ui(egui::vec2(ui.available_width(), height), |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data").color(Color32::GRAY));
            });
        });
    }

    /// Monthly revenue line with markers.
    pub fn draw_monthly_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        if views.monthly.is_empty() {
            return Self::no_data(ui, height);
        }

        let labels: Vec<String> = views.monthly.iter().map(|p| p.month.to_string()).collect();
        let points: Vec<[f64; 2]> = views
            .monthly
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.revenue])
            .collect();

        Self::base_plot("monthly_revenue", height)
            .x_axis_label("Month")
            .y_axis_label("Revenue")
            .x_axis_formatter(category_formatter(labels))
            .y_axis_formatter(amount_formatter)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(color(PRIMARY))
                        .width(3.0)
                        .name("Revenue"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(4.0)
                        .color(color(PRIMARY)),
                );
            });
    }

    /// Revenue per weekday, Monday first. Darker bars for higher revenue.
    pub fn draw_weekday_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        let max = views
            .weekday
            .iter()
            .map(|w| w.revenue)
            .fold(0.0_f64, f64::max);
        let labels: Vec<String> = views.weekday.iter().map(|w| w.day[..3].to_string()).collect();

        let bars: Vec<Bar> = views
            .weekday
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let intensity = if max > 0.0 { w.revenue / max } else { 0.0 };
                Bar::new(i as f64, w.revenue)
                    .name(w.day)
                    .width(0.7)
                    .fill(color(PRIMARY).gamma_multiply(0.35 + 0.65 * intensity as f32))
            })
            .collect();

        Self::base_plot("weekday_revenue", height)
            .x_axis_label("Day")
            .y_axis_label("Revenue")
            .x_axis_formatter(category_formatter(labels))
            .y_axis_formatter(amount_formatter)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Horizontal bars, best product on top.
    pub fn draw_top_products_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        if views.top_products.is_empty() {
            return Self::no_data(ui, height);
        }

        // Plot y grows upwards, so reverse to put the best seller at the top
        let ordered: Vec<_> = views.top_products.iter().rev().collect();
        let labels: Vec<String> = ordered.iter().map(|p| p.product.clone()).collect();
        let bars: Vec<Bar> = ordered
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Bar::new(i as f64, p.revenue)
                    .name(&p.product)
                    .width(0.7)
                    .fill(color(palette_color(ordered.len() - 1 - i)))
            })
            .collect();

        Self::base_plot("top_products", height)
            .x_axis_label("Revenue")
            .x_axis_formatter(amount_formatter)
            .y_axis_formatter(category_formatter(labels))
            .y_axis_min_width(120.0)
            .include_x(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Category shares as percentage bars with a legend.
    pub fn draw_category_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        if views.categories.is_empty() {
            return Self::no_data(ui, height);
        }

        let labels: Vec<String> = views.categories.iter().map(|c| c.category.clone()).collect();

        Self::base_plot("category_shares", height)
            .legend(Legend::default())
            .y_axis_label("Share of revenue (%)")
            .x_axis_formatter(category_formatter(labels))
            .include_y(0.0)
            .include_y(100.0)
            .show(ui, |plot_ui| {
                for (i, share) in views.categories.iter().enumerate() {
                    let bar = Bar::new(i as f64, share.share * 100.0)
                        .name(format!("{} ({})", share.category, format_amount(share.revenue)))
                        .width(0.7);
                    plot_ui.bar_chart(
                        BarChart::new(vec![bar])
                            .color(color(palette_color(i)))
                            .name(format!("{} {:.1}%", share.category, share.share * 100.0)),
                    );
                }
            });
    }

    /// Horizontal revenue bars per country, highest first.
    pub fn draw_country_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        if views.countries.is_empty() {
            return Self::no_data(ui, height);
        }

        let ordered: Vec<_> = views.countries.iter().rev().collect();
        let max = ordered.iter().map(|c| c.revenue).fold(0.0_f64, f64::max);
        let labels: Vec<String> = ordered.iter().map(|c| c.key.clone()).collect();
        let bars: Vec<Bar> = ordered
            .iter()
            .enumerate()
            .map(|(i, c)| {
                // Red to green by relative revenue
                let t = if max > 0.0 { (c.revenue / max) as f32 } else { 0.0 };
                let fill = Color32::from_rgb(
                    (215.0 * (1.0 - t) + 26.0 * t) as u8,
                    (48.0 * (1.0 - t) + 150.0 * t) as u8,
                    (39.0 * (1.0 - t) + 65.0 * t) as u8,
                );
                Bar::new(i as f64, c.revenue)
                    .name(format!("{} ({} customers)", c.key, c.customers))
                    .width(0.7)
                    .fill(fill)
            })
            .collect();

        Self::base_plot("country_revenue", height)
            .x_axis_label("Revenue")
            .x_axis_formatter(amount_formatter)
            .y_axis_formatter(category_formatter(labels))
            .y_axis_min_width(60.0)
            .include_x(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Revenue bars per customer segment.
    pub fn draw_segment_chart(ui: &mut egui::Ui, views: &Views, height: f32) {
        if views.segments.is_empty() {
            return Self::no_data(ui, height);
        }

        let labels: Vec<String> = views.segments.iter().map(|s| s.key.clone()).collect();

        Self::base_plot("segment_revenue", height)
            .legend(Legend::default())
            .x_axis_label("Segment")
            .y_axis_label("Revenue")
            .x_axis_formatter(category_formatter(labels))
            .y_axis_formatter(amount_formatter)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                for (i, segment) in views.segments.iter().enumerate() {
                    let bar = Bar::new(i as f64, segment.revenue)
                        .name(format!("{} customers", segment.customers))
                        .width(0.6);
                    plot_ui.bar_chart(
                        BarChart::new(vec![bar])
                            .color(color(segment_color(&segment.key, i)))
                            .name(&segment.key),
                    );
                }
            });
    }
}
