//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};

/// Color palette shared by the interactive and static charts (RGB)
pub const PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),  // Blue
    (231, 76, 60),   // Red
    (46, 204, 113),  // Green
    (155, 89, 182),  // Purple
    (243, 156, 18),  // Orange
    (26, 188, 156),  // Teal
    (233, 30, 99),   // Pink
    (0, 188, 212),   // Cyan
    (121, 85, 72),   // Brown
    (96, 125, 139),  // Blue Grey
];

/// Primary series color
pub const PRIMARY: (u8, u8, u8) = PALETTE[0];

pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

/// Gold / silver / bronze for the known segments, palette otherwise.
pub fn segment_color(segment: &str, index: usize) -> (u8, u8, u8) {
    match segment {
        "VIP" => (255, 215, 0),
        "Premium" => (192, 192, 192),
        "Standard" => (205, 127, 50),
        _ => palette_color(index),
    }
}

/// Charts of the dashboard, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Kpis,
    Monthly,
    Weekday,
    TopProducts,
    Categories,
    Countries,
    Segments,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Kpis,
        ChartKind::Monthly,
        ChartKind::Weekday,
        ChartKind::TopProducts,
        ChartKind::Categories,
        ChartKind::Countries,
        ChartKind::Segments,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Kpis => "Overview",
            ChartKind::Monthly => "Monthly Revenue",
            ChartKind::Weekday => "Sales by Day of Week",
            ChartKind::TopProducts => "Top 10 Products by Revenue",
            ChartKind::Categories => "Revenue by Category",
            ChartKind::Countries => "Revenue by Country",
            ChartKind::Segments => "Revenue by Customer Segment",
        }
    }
}

/// Format an amount with thousands separators and no decimals, e.g. `1,234,567`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Revenue attainment next to the revenue KPI, e.g. `+7.0% vs objective`.
pub fn format_attainment(attainment_pct: f64) -> String {
    format!("+{:.1}% vs objective", attainment_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.4), "999");
        assert_eq!(format_amount(1234.5), "1,235");
        assert_eq!(format_amount(5_000_000.0), "5,000,000");
        assert_eq!(format_amount(-12_345.0), "-12,345");
    }

    #[test]
    fn attainment_shows_share_of_objective() {
        let kpis = crate::pipeline::Kpis {
            total_revenue: 350_000.0,
            ..Default::default()
        };
        assert_eq!(
            format_attainment(kpis.target_attainment_pct(5_000_000.0)),
            "+7.0% vs objective"
        );
    }

    #[test]
    fn known_segments_have_fixed_colors() {
        assert_eq!(segment_color("VIP", 3), (255, 215, 0));
        assert_eq!(segment_color("Gold", 1), PALETTE[1]);
    }
}
