//! Plain-text tables for terminal output.

use std::{borrow::Cow, fmt::Write as _};

use crate::{
    config::CompatibilityReport,
    contamination::ContaminationReport,
    mapping::Mapping,
    matcher::DatasetProfile,
};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// One row per target. Entries below `review_cutoff` are flagged.
pub fn render_mapping(mapping: &Mapping, review_cutoff: f64) -> String {
    let rows = mapping
        .entries()
        .iter()
        .map(|entry| {
            vec![
                entry.target.clone(),
                entry.source.clone().unwrap_or_else(|| "-".to_string()),
                if entry.is_mapped() {
                    format!("{:.0}%", entry.confidence * 100.0)
                } else {
                    "-".to_string()
                },
                entry.basis.to_string(),
                if entry.needs_review(review_cutoff) {
                    "review".to_string()
                } else {
                    String::new()
                },
            ]
        })
        .collect::<Vec<_>>();
    let mut output = render_table(
        &headers(&["target", "source", "confidence", "basis", ""]),
        &rows,
    );
    let quality = mapping.quality();
    let _ = writeln!(
        output,
        "\n{} of {} mapped ({:.1}%), average confidence {:.1}%, {} high confidence",
        quality.successful_mappings,
        quality.total_mappings,
        quality.completeness,
        quality.average_confidence * 100.0,
        quality.high_confidence_mappings
    );
    output
}

pub fn render_contamination(report: &ContaminationReport) -> String {
    if report.is_empty() {
        return "No overlapping column values detected.\n".to_string();
    }
    let rows = report
        .pairs()
        .into_iter()
        .map(|(left, right, percentage)| {
            vec![left.to_string(), right.to_string(), format!("{percentage}%")]
        })
        .collect::<Vec<_>>();
    render_table(&headers(&["column", "overlaps with", "shared"]), &rows)
}

pub fn render_profile(profile: &DatasetProfile) -> String {
    let rows = profile
        .columns
        .iter()
        .map(|column| {
            vec![
                column.column.clone(),
                column.pattern.to_string(),
                column.non_null.to_string(),
                column.distinct.to_string(),
                format!("{:.2}", column.uniqueness),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = render_table(
        &headers(&["column", "pattern", "non-null", "distinct", "uniqueness"]),
        &rows,
    );
    let _ = writeln!(
        output,
        "\n{} row(s), {:.1}% complete\n",
        profile.rows, profile.completeness
    );
    output.push_str(&render_contamination(&profile.contamination));
    output
}

pub fn render_compatibility(report: &CompatibilityReport) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    format!(
        "Source structure matches: {}\nTemplate structure matches: {}\nCan reuse mappings: {}\n{}\n",
        yes_no(report.source_matches),
        yes_no(report.template_matches),
        yes_no(report.can_reuse_mappings),
        report.recommendation
    )
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (value, width) in values.iter().zip(widths) {
        let sanitized = sanitize_cell(value);
        let padding = width.saturating_sub(display_width(sanitized.as_ref()));
        let mut cell = sanitized.into_owned();
        cell.push_str(&" ".repeat(padding));
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
