//! CLI output formatting for the bot's commands.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 003 Springfield, Lane County, Oregon
//!     Coordinates: 44.0462, -123.022
//!     Primary: 2048x2048, 1.2 MB
//!     Zoom: 2048x2048, 1.1 MB
//!     Saved: out/primary.jpg, out/zoom.jpg
//!     Post: 1445880548472328192
//!     Reply: 1445880551316066305
//! Remaining: 41203 cities
//! ```
//!
//! A dry run prints `Dry run: not marked, not posted` in place of the post lines.
//!
//! ## Check
//!
//! ```text
//! Dataset: cities.csv (41205 cities)
//! Used: used.txt (2 ids)
//! Remaining: 41203 cities
//! ```
//!
//! ## Preview
//!
//! ```text
//! Primary: preview/primary.jpg (2048x2048, 1.2 MB)
//! Zoom: preview/zoom.jpg (2048x2048, 1.1 MB)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::{DerivedPair, EncodedImage};
use crate::publish::caption;
use crate::run::RunReport;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count with one decimal above 1 KB.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

fn image_summary(image: &EncodedImage) -> String {
    format!(
        "{}x{}, {}",
        image.width,
        image.height,
        format_bytes(image.bytes.len())
    )
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

// ============================================================================
// run
// ============================================================================

/// Format the outcome of one run.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let i = indent(1);
    let city = &report.city;
    let mut lines = vec![
        format!("{:0>3} {}", city.id, caption(city)),
        format!("{i}Coordinates: {}, {}", city.latitude, city.longitude),
        format!("{i}Primary: {}", image_summary(&report.images.primary)),
        format!("{i}Zoom: {}", image_summary(&report.images.zoom)),
    ];

    if let Some((primary, zoom)) = &report.saved {
        lines.push(format!(
            "{i}Saved: {}, {}",
            primary.display(),
            zoom.display()
        ));
    }

    match &report.published {
        Some(published) => {
            lines.push(format!("{i}Post: {}", published.primary_post_id));
            lines.push(format!("{i}Reply: {}", published.reply_post_id));
        }
        None => lines.push(format!("{i}Dry run: not marked, not posted")),
    }

    lines.push(format!(
        "Remaining: {}",
        plural(report.remaining, "city", "cities")
    ));
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format dataset and used-id totals.
pub fn format_check(
    dataset: &Path,
    total: usize,
    used_ids: &Path,
    used: usize,
    remaining: usize,
) -> Vec<String> {
    vec![
        format!(
            "Dataset: {} ({})",
            dataset.display(),
            plural(total, "city", "cities")
        ),
        format!("Used: {} ({})", used_ids.display(), plural(used, "id", "ids")),
        format!("Remaining: {}", plural(remaining, "city", "cities")),
    ]
}

pub fn print_check(dataset: &Path, total: usize, used_ids: &Path, used: usize, remaining: usize) {
    for line in format_check(dataset, total, used_ids, used, remaining) {
        println!("{}", line);
    }
}

// ============================================================================
// preview
// ============================================================================

/// Format the files written by `preview`.
pub fn format_preview(pair: &DerivedPair, primary_path: &Path, zoom_path: &Path) -> Vec<String> {
    vec![
        format!(
            "Primary: {} ({})",
            primary_path.display(),
            image_summary(&pair.primary)
        ),
        format!(
            "Zoom: {} ({})",
            zoom_path.display(),
            image_summary(&pair.zoom)
        ),
    ]
}

pub fn print_preview(pair: &DerivedPair, primary_path: &Path, zoom_path: &Path) {
    for line in format_preview(pair, primary_path, zoom_path) {
        println!("{}", line);
    }
}
