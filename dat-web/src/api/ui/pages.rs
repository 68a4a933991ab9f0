//! HTML page rendering
//!
//! Every value that originates from an uploaded file goes through
//! [`escape_html`].

use std::fmt::Write;

use dat_common::scoring::NOT_ENOUGH_WORDS;
use dat_common::{ScoreReport, TablePreview};

use crate::api::form::{MIN_WORD_COUNT_RANGE, SKIP_ROWS_RANGE};

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/dat_score_app.css">
</head>
<body>
    <header><h1>{title}</h1></header>
    <div class="container">
{body}
    </div>
</body>
</html>
"#
    )
}

/// Landing page with the upload form
pub fn upload_page() -> String {
    let (skip_min, skip_max) = SKIP_ROWS_RANGE;
    let body = format!(
        r#"        <div class="card">
            <h2>Upload CSV File</h2>
            <form method="post" action="/" enctype="multipart/form-data">
                <label for="file">CSV file (first row is the header):</label>
                <input type="file" name="file" id="file" accept=".csv" required>
                <label for="skip_rows">Rows to skip before scoring:</label>
                <input type="number" name="skip_rows" id="skip_rows" value="0" min="{skip_min}" max="{skip_max}">
                <div><input type="submit" value="Upload"></div>
            </form>
        </div>"#
    );
    layout("DAT Score Calculator", &body)
}

/// Column picker plus preview window
///
/// `selected` columns are pre-selected so a preview refresh keeps the
/// user's choice.
pub fn selection_page(preview: &TablePreview, selected: &[String], min_word_count: usize) -> String {
    let (min_min, min_max) = MIN_WORD_COUNT_RANGE;
    let (skip_min, skip_max) = SKIP_ROWS_RANGE;

    let mut options = String::new();
    for column in &preview.header {
        let marker = if selected.contains(column) { " selected" } else { "" };
        let column = escape_html(column);
        let _ = writeln!(
            options,
            r#"                    <option value="{column}"{marker}>{column}</option>"#
        );
    }

    let first = preview.skip_count.min(preview.total_rows);
    let summary = if preview.rows.is_empty() {
        format!("No rows to show ({} rows in file).", preview.total_rows)
    } else {
        format!(
            "Showing rows {} to {} of {}.",
            first + 1,
            first + preview.rows.len(),
            preview.total_rows
        )
    };

    let body = format!(
        r#"        <div class="card">
            <h2>Select Columns for DAT Calculation</h2>
            <form method="post" action="/select">
                <label for="columns">Columns to use as words (hold Ctrl to select multiple):</label>
                <select name="columns" id="columns" multiple size="10">
{options}                </select>
                <label for="min_word_count">Minimum word count:</label>
                <input type="number" name="min_word_count" id="min_word_count" value="{min_word_count}" min="{min_min}" max="{min_max}">
                <label for="skip_rows">Rows to skip before scoring:</label>
                <input type="number" name="skip_rows" id="skip_rows" value="{skip}" min="{skip_min}" max="{skip_max}">
                <div>
                    <button type="submit" name="action" value="preview" class="secondary">Update Preview</button>
                    <button type="submit" name="action" value="compute">Calculate Score</button>
                </div>
            </form>
        </div>
        <div class="card">
            <h2>Preview of Uploaded Data</h2>
            <p class="summary">{summary}</p>
{table}
        </div>"#,
        skip = preview.skip_count,
        table = render_table(&preview.header, None, preview.rows.iter().map(|r| (r, None))),
    );
    layout("Select Columns", &body)
}

/// Scored rows projected to the selected columns
pub fn results_page(report: &ScoreReport) -> String {
    let summary = format!(
        "{} rows scored, {} rows passed through unscored, {} rows failed.",
        report.scored_rows(),
        report.skipped_rows,
        report.failed_rows
    );

    let body = format!(
        r#"        <div class="card">
            <form method="get" action="/download">
                <button type="submit">Download Results as CSV</button>
                <a href="/">Upload another file</a>
            </form>
            <p class="summary">{summary}</p>
        </div>
        <div class="card">
{table}
        </div>"#,
        table = render_table(
            &report.columns,
            Some(report.score_column.as_str()),
            report.rows.iter().map(|r| (&r.cells, Some(r.score.as_str()))),
        ),
    );
    layout("DAT Score Results", &body)
}

fn render_table<'a>(
    header: &[String],
    score_column: Option<&str>,
    rows: impl Iterator<Item = (&'a Vec<String>, Option<&'a str>)>,
) -> String {
    let mut html = String::from("            <table>\n                <tr>");
    for column in header {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    if let Some(score_column) = score_column {
        let _ = write!(html, "<th>{}</th>", escape_html(score_column));
    }
    html.push_str("</tr>\n");

    for (cells, score) in rows {
        html.push_str("                <tr>");
        for cell in cells {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        if let Some(score) = score {
            let _ = write!(
                html,
                r#"<td class="{}">{}</td>"#,
                score_class(score),
                escape_html(score)
            );
        }
        html.push_str("</tr>\n");
    }

    html.push_str("            </table>");
    html
}

fn score_class(score: &str) -> &'static str {
    if score == NOT_ENOUGH_WORDS {
        "score-insufficient"
    } else if score.starts_with("error: ") {
        "score-error"
    } else {
        "score"
    }
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
