//! Plain-text and markdown ride reports. Both are rendered from the same
//! list of formatted values so the two never disagree.

use model::GearMax;
use std::fmt::{self, Write};
use std::time::Duration;

use crate::Statistics;

/// Link to a chart image rendered next to the markdown report.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartLink {
    pub caption: String,
    pub file_name: String,
}

/// Collapses runs of whitespace in the title to single spaces.
pub fn clean_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rule under each word of `text`, keeping the gaps between words.
fn underline(text: &str, ch: char) -> String {
    text.split_whitespace()
        .map(|w| ch.to_string().repeat(w.chars().count()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `H:MM:SS`, hours unbounded.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Label/value pairs shared by both report formats.
pub fn summary_rows(stats: &Statistics) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Max engine speed", format!("{} rpm", stats.max_engine_rpm)),
        ("Max wheel speed", format!("{} km/h", stats.max_wheel_speed)),
        ("Max water temp", format!("{} ℃", stats.max_water_temperature)),
        (
            "Avg idle speed",
            match stats.avg_idle_speed {
                Some(rpm) => format!("{rpm} rpm"),
                None => "Unknown".to_string(),
            },
        ),
    ];
    if let Some(kmh) = stats.avg_speed {
        rows.push(("Avg speed", format!("{kmh} km/h")));
    }
    rows.push(("Total time", format_elapsed(stats.elapsed_time)));
    rows.push(("Distance", format!("{:.2} km", stats.distance_km)));
    rows.push(("Starting point", stats.start.sexagesimal()));
    rows.push(("Ending point", stats.end.sexagesimal()));
    rows
}

const GEAR_HEADERS: [&str; 3] = ["Gear", "rpm", "km/h"];
const GEARS_SECTION: &str = "Max for each gear";

fn gear_cells(g: &GearMax) -> [String; 3] {
    [g.gear.clone(), g.rpm.to_string(), g.kmh.to_string()]
}

fn pad_row(cells: [&str; 3], widths: [usize; 3]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:>w$}"))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Fixed-width report, as written to `{base}_report.txt`.
pub fn render_text(title: &str, stats: &Statistics) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, &clean_title(title), stats);
    out
}

fn write_text(out: &mut String, title: &str, stats: &Statistics) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", underline(title, '='))?;
    writeln!(out)?;

    for (label, value) in summary_rows(stats) {
        writeln!(out, "{:<18}{value}", format!("{label}:"))?;
    }

    writeln!(out)?;
    writeln!(out, "{GEARS_SECTION}")?;
    writeln!(out, "{}", underline(GEARS_SECTION, '-'))?;
    writeln!(out)?;

    let cells: Vec<[String; 3]> = stats.max_for_each_gear.iter().map(gear_cells).collect();
    let mut widths = GEAR_HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }
    writeln!(out, "{}", pad_row(GEAR_HEADERS, widths))?;
    for row in &cells {
        writeln!(out, "{}", pad_row([row[0].as_str(), row[1].as_str(), row[2].as_str()], widths))?;
    }
    Ok(())
}

/// Markdown report, as written to `{base}_report.md` next to its charts.
pub fn render_markdown(title: &str, stats: &Statistics, charts: &[ChartLink]) -> String {
    let mut out = String::new();
    let _ = write_markdown(&mut out, &clean_title(title), stats, charts);
    out
}

fn write_markdown(out: &mut String, title: &str, stats: &Statistics, charts: &[ChartLink]) -> fmt::Result {
    writeln!(out, "# {title}")?;
    writeln!(out)?;
    writeln!(out, "| | |")?;
    writeln!(out, "|:--|:--|")?;
    for (label, value) in summary_rows(stats) {
        writeln!(out, "| {label} | {value} |")?;
    }

    writeln!(out)?;
    writeln!(out, "## {GEARS_SECTION}")?;
    writeln!(out)?;
    writeln!(out, "| {} |", GEAR_HEADERS.join(" | "))?;
    writeln!(out, "|--:|--:|--:|")?;
    for g in &stats.max_for_each_gear {
        writeln!(out, "| {} |", gear_cells(g).join(" | "))?;
    }

    if !charts.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Charts")?;
        for chart in charts {
            writeln!(out)?;
            writeln!(out, "![{}]({})", chart.caption, chart.file_name)?;
        }
    }
    Ok(())
}
