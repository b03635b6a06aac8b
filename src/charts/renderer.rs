//! Static Chart Renderer
//! Renders the dashboard charts to PNG images with plotters, for the report export.
//!
//! One image per [`ChartKind`]:
//! 1. KPI overview card
//! 2. Monthly revenue line
//! 3. Weekday revenue bars
//! 4. Top products (horizontal bars)
//! 5. Category shares (donut)
//! 6. Country revenue (horizontal bars)
//! 7. Segment revenue bars

use crate::charts::{format_amount, palette_color, segment_color, ChartKind, PRIMARY};
use crate::pipeline::Views;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use rayon::prelude::*;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// A horizontal or vertical bar with its label and color.
struct BarSpec {
    label: String,
    value: f64,
    color: RGBColor,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart in [`ChartKind::ALL`] order, in parallel.
    pub fn render_all(
        views: &Views,
        revenue_target: f64,
        width: u32,
        height: u32,
    ) -> Result<Vec<Vec<u8>>, RenderError> {
        ChartKind::ALL
            .par_iter()
            .map(|&kind| Self::render_png(kind, views, revenue_target, width, height))
            .collect()
    }

    /// Render one chart and encode it as PNG bytes.
    pub fn render_png(
        kind: ChartKind,
        views: &Views,
        revenue_target: f64,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            match kind {
                ChartKind::Kpis => Self::draw_kpi_card(&root, views, revenue_target)?,
                ChartKind::Monthly => Self::draw_monthly(&root, views)?,
                ChartKind::Weekday => {
                    let max = views.weekday.iter().map(|w| w.revenue).fold(0.0_f64, f64::max);
                    let bars = views
                        .weekday
                        .iter()
                        .map(|w| BarSpec {
                            label: w.day[..3].to_string(),
                            value: w.revenue,
                            color: Self::blues(if max > 0.0 { w.revenue / max } else { 0.0 }),
                        })
                        .collect();
                    Self::draw_vertical_bars(&root, kind.title(), bars)?
                }
                ChartKind::TopProducts => {
                    let bars = views
                        .top_products
                        .iter()
                        .enumerate()
                        .map(|(i, p)| BarSpec {
                            label: p.product.clone(),
                            value: p.revenue,
                            color: rgb(palette_color(i)),
                        })
                        .collect();
                    Self::draw_horizontal_bars(&root, kind.title(), bars)?
                }
                ChartKind::Categories => Self::draw_category_donut(&root, views)?,
                ChartKind::Countries => {
                    let bars = views
                        .countries
                        .iter()
                        .map(|c| BarSpec {
                            label: c.key.clone(),
                            value: c.revenue,
                            color: rgb(PRIMARY),
                        })
                        .collect();
                    Self::draw_horizontal_bars(&root, kind.title(), bars)?
                }
                ChartKind::Segments => {
                    let bars = views
                        .segments
                        .iter()
                        .enumerate()
                        .map(|(i, s)| BarSpec {
                            label: s.key.clone(),
                            value: s.revenue,
                            color: rgb(segment_color(&s.key, i)),
                        })
                        .collect();
                    Self::draw_vertical_bars(&root, kind.title(), bars)?
                }
            }

            root.present().map_err(draw_err)?;
        }

        debug!(chart = kind.title(), width, height, "rendered chart image");
        Self::encode_png(buffer, width, height)
    }

    fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("bitmap size mismatch".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }

    /// Light to dark blue by `t` in 0..=1.
    fn blues(t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        RGBColor(
            (198.0 - 190.0 * t) as u8,
            (219.0 - 171.0 * t) as u8,
            (239.0 - 132.0 * t) as u8,
        )
    }

    /// Upper bound of a value axis, never zero.
    fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.fold(0.0_f64, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    fn draw_no_data(root: &Area<'_>, title: &str) -> Result<(), RenderError> {
        let (w, h) = root.dim_in_pixel();
        root.draw(&Text::new(title.to_string(), (20, 20), (FONT, 28).into_font()))
            .map_err(draw_err)?;
        root.draw(&Text::new(
            "No data for the selected filters".to_string(),
            (w as i32 / 2 - 160, h as i32 / 2),
            (FONT, 22).into_font().color(&RGBColor(128, 128, 128)),
        ))
        .map_err(draw_err)
    }

    fn draw_kpi_card(
        root: &Area<'_>,
        views: &Views,
        revenue_target: f64,
    ) -> Result<(), RenderError> {
        let kpis = &views.kpis;
        let lines = [
            ("Revenue", format!("{} €", format_amount(kpis.total_revenue))),
            (
                "vs objective",
                format!("{:.1}%", kpis.target_attainment_pct(revenue_target)),
            ),
            ("Orders", format_amount(kpis.order_count as f64)),
            ("Average basket", format!("{:.2} €", kpis.average_order_value)),
            ("Unique customers", kpis.unique_customers.to_string()),
            ("Orders per customer", format!("{:.1}", kpis.orders_per_customer)),
        ];

        root.draw(&Text::new(
            ChartKind::Kpis.title().to_string(),
            (40, 30),
            (FONT, 36).into_font().color(&rgb(PRIMARY)),
        ))
        .map_err(draw_err)?;

        for (i, (label, value)) in lines.iter().enumerate() {
            let y = 110 + i as i32 * 60;
            root.draw(&Text::new(
                label.to_string(),
                (60, y),
                (FONT, 26).into_font().color(&RGBColor(90, 90, 90)),
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(value.clone(), (420, y), (FONT, 30).into_font().color(&BLACK)))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw_monthly(root: &Area<'_>, views: &Views) -> Result<(), RenderError> {
        let title = ChartKind::Monthly.title();
        if views.monthly.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let labels: Vec<String> = views.monthly.iter().map(|p| p.month.to_string()).collect();
        let n = labels.len();
        let y_max = Self::axis_max(views.monthly.iter().map(|p| p.revenue));

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 30))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(n.min(12))
            .x_label_formatter(&|x| Self::label_at(&labels, *x))
            .y_label_formatter(&|y| format_amount(*y))
            .y_desc("Revenue")
            .draw()
            .map_err(draw_err)?;

        let points: Vec<(f64, f64)> = views
            .monthly
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.revenue))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), rgb(PRIMARY).stroke_width(3)))
            .map_err(draw_err)?;
        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|p| Circle::new(p, 5, rgb(PRIMARY).filled())),
            )
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_vertical_bars(
        root: &Area<'_>,
        title: &str,
        bars: Vec<BarSpec>,
    ) -> Result<(), RenderError> {
        if bars.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let n = bars.len();
        let y_max = Self::axis_max(bars.iter().map(|b| b.value));

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 30))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| Self::label_at(&labels, *x))
            .y_label_formatter(&|y| format_amount(*y))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let x = i as f64;
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, bar.value)], bar.color.filled())
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    /// First bar is drawn at the top.
    fn draw_horizontal_bars(
        root: &Area<'_>,
        title: &str,
        bars: Vec<BarSpec>,
    ) -> Result<(), RenderError> {
        if bars.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let n = bars.len();
        // Row 0 sits at the top of the chart
        let labels: Vec<String> = bars.iter().rev().map(|b| b.label.clone()).collect();
        let x_max = Self::axis_max(bars.iter().map(|b| b.value));

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 30))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(180)
            .build_cartesian_2d(0.0..x_max, -0.5..(n as f64 - 0.5))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|y| Self::label_at(&labels, *y))
            .x_label_formatter(&|x| format_amount(*x))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let y = (n - 1 - i) as f64;
                Rectangle::new([(0.0, y - 0.35), (bar.value, y + 0.35)], bar.color.filled())
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_category_donut(root: &Area<'_>, views: &Views) -> Result<(), RenderError> {
        let title = ChartKind::Categories.title();
        let positive: Vec<_> = views.categories.iter().filter(|c| c.revenue > 0.0).collect();
        if positive.is_empty() {
            return Self::draw_no_data(root, title);
        }

        root.draw(&Text::new(title.to_string(), (20, 20), (FONT, 30).into_font()))
            .map_err(draw_err)?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2 + 20);
        let radius = (w.min(h) as f64) * 0.32;
        let sizes: Vec<f64> = positive.iter().map(|c| c.revenue).collect();
        let colors: Vec<RGBColor> = (0..positive.len()).map(|i| rgb(palette_color(i))).collect();
        let labels: Vec<String> = positive
            .iter()
            .map(|c| format!("{} ({:.1}%)", c.category, c.share * 100.0))
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.donut_hole(radius * 0.4);
        pie.label_style((FONT, 20).into_font());
        root.draw(&pie).map_err(draw_err)
    }

    /// `labels[x]` when `x` is an integer position.
    fn label_at(labels: &[String], x: f64) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_only_at_integer_positions() {
        let labels = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(StaticChartRenderer::label_at(&labels, 1.0), "Tue");
        assert_eq!(StaticChartRenderer::label_at(&labels, 0.5), "");
        assert_eq!(StaticChartRenderer::label_at(&labels, 2.0), "");
        assert_eq!(StaticChartRenderer::label_at(&labels, -1.0), "");
    }

    #[test]
    fn empty_axes_still_have_a_range() {
        assert_eq!(StaticChartRenderer::axis_max(std::iter::empty()), 1.0);
        assert!((StaticChartRenderer::axis_max([10.0, 5.0].into_iter()) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn bitmap_is_encoded_as_png() {
        let png = StaticChartRenderer::encode_png(vec![255u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
