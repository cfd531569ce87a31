//! Chart rendering
//!
//! Renders a compiled table as an SVG line chart: keyword categories along
//! the x-axis, one series per period, category means on the y-axis. Cells
//! that are absent in a period leave a gap in that series instead of
//! dropping to zero.

use crate::table::CompiledTable;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 90.0;
const Y_TICKS: usize = 5;

// default matplotlib cycle, which the analysts' old charts used
const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a compiled table as an SVG document
pub fn render_line_chart(table: &CompiledTable, title: &str) -> String {
    let categories = table.categories();
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    // y range over every present cell, padded so lines stay off the frame
    let mut values = Vec::new();
    for category in &categories {
        for period in &table.periods {
            if let Some(v) = table.get(category, period) {
                values.push(v);
            }
        }
    }
    let (mut y_min, mut y_max) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), v| (lo.min(*v), hi.max(*v)),
    );
    if values.is_empty() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if (y_max - y_min).abs() < 1e-9 {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = (y_max - y_min) * 0.08;
    let y_min = y_min - pad;
    let y_max = y_max + pad;

    let x_pos = |idx: usize| -> f64 {
        let n = categories.len().max(1) as f64;
        MARGIN_LEFT + (idx as f64 + 0.5) * plot_w / n
    };
    let y_pos = |value: f64| -> f64 {
        MARGIN_TOP + (y_max - value) / (y_max - y_min) * plot_h
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
         viewBox=\"0 0 {} {}\" font-family=\"sans-serif\">\n",
        WIDTH, HEIGHT, WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\">{}</text>\n",
        WIDTH / 2.0,
        xml_escape(title)
    ));

    // frame
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#cccccc\"/>\n",
        MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h
    ));

    // horizontal gridlines and y tick labels
    for tick in 0..=Y_TICKS {
        let value = y_min + (y_max - y_min) * tick as f64 / Y_TICKS as f64;
        let y = y_pos(value);
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#eeeeee\"/>\n",
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_w,
            y
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{:.2}</text>\n",
            MARGIN_LEFT - 8.0,
            y + 4.0,
            value
        ));
    }

    // rotated category labels
    for (idx, category) in categories.iter().enumerate() {
        let x = x_pos(idx);
        let y = MARGIN_TOP + plot_h + 16.0;
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" \
             transform=\"rotate(-40 {:.1} {:.1})\">{}</text>\n",
            x,
            y,
            x,
            y,
            xml_escape(category)
        ));
    }

    // one series per period; absent cells break the line
    for (series_idx, period) in table.periods.iter().enumerate() {
        let color = PALETTE[series_idx % PALETTE.len()];
        let mut segment: Vec<String> = Vec::new();
        let mut markers = String::new();

        let flush_segment = |segment: &mut Vec<String>, svg: &mut String| {
            if segment.len() > 1 {
                svg.push_str(&format!(
                    "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
                    segment.join(" "),
                    color
                ));
            }
            segment.clear();
        };

        for (idx, category) in categories.iter().enumerate() {
            match table.get(category, period) {
                Some(value) => {
                    let x = x_pos(idx);
                    let y = y_pos(value);
                    segment.push(format!("{:.1},{:.1}", x, y));
                    markers.push_str(&format!(
                        "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>\n",
                        x, y, color
                    ));
                }
                None => flush_segment(&mut segment, &mut svg),
            }
        }
        flush_segment(&mut segment, &mut svg);
        svg.push_str(&markers);

        // legend entry
        let legend_x = MARGIN_LEFT + plot_w + 18.0;
        let legend_y = MARGIN_TOP + 14.0 + series_idx as f64 * 20.0;
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            legend_x,
            legend_y,
            legend_x + 22.0,
            legend_y,
            color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">{}</text>\n",
            legend_x + 28.0,
            legend_y + 4.0,
            xml_escape(period)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CompiledTable {
        let mut table = CompiledTable::new(
            "Sentiment",
            vec!["Q1".to_string(), "Q2".to_string()],
        );
        table.set("Growth", "Q1", 0.8);
        table.set("Margins", "Q1", 0.1);
        table.set("Risk", "Q1", -0.3);
        table.set("Growth", "Q2", 0.6);
        table.set("Risk", "Q2", -0.5);
        table
    }

    #[test]
    fn test_renders_valid_svg_shell() {
        let svg = render_line_chart(&sample_table(), "Average Sentiment Scores");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Average Sentiment Scores"));
    }

    #[test]
    fn test_one_legend_entry_per_period() {
        let svg = render_line_chart(&sample_table(), "t");
        assert_eq!(svg.matches(">Q1</text>").count(), 1);
        assert_eq!(svg.matches(">Q2</text>").count(), 1);
    }

    #[test]
    fn test_absent_cell_breaks_series() {
        // Q2 misses the middle category, so its line splits and Q2 keeps
        // fewer markers than Q1
        let svg = render_line_chart(&sample_table(), "t");
        let q1_markers = svg.matches("#1f77b4\"/>").count();
        let q2_markers = svg.matches("#ff7f0e\"/>").count();
        assert_eq!(q1_markers, 3);
        assert_eq!(q2_markers, 2);
    }

    #[test]
    fn test_escapes_labels() {
        let mut table = CompiledTable::new("Sentiment", vec!["Q1 <&>".to_string()]);
        table.set("R&D", "Q1 <&>", 0.5);
        let svg = render_line_chart(&table, "Scores & Trends");
        assert!(svg.contains("Scores &amp; Trends"));
        assert!(svg.contains("R&amp;D"));
        assert!(!svg.contains("Q1 <&>"));
    }

    #[test]
    fn test_empty_table_still_renders() {
        let table = CompiledTable::new("Magnitude", vec![]);
        let svg = render_line_chart(&table, "empty");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
