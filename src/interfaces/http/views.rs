//! Server-rendered HTML pages.

use crate::application::{ProcessingState, ProcessorSnapshot};
use crate::domain::csv::Table;
use crate::infrastructure::storage::ScriptListing;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7fb; color: #1f2430; }
main { max-width: 1100px; margin: 0 auto; padding: 24px; }
nav { display: flex; gap: 12px; justify-content: flex-end; align-items: center; }
nav form { margin: 0; }
.card { background: #fff; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,.08); padding: 20px; margin: 20px 0; }
.muted { color: #6b7280; }
.alert { border: 1px solid #dc2626; background: #fef2f2; color: #991b1b; padding: 12px 16px; border-radius: 8px; }
.notice { border: 1px solid #d97706; background: #fffbeb; padding: 8px 12px; border-radius: 8px; }
.scroll { overflow-x: auto; }
table { border-collapse: collapse; width: 100%; font-size: 14px; }
th, td { padding: 8px 12px; border-bottom: 1px solid #e5e7eb; white-space: nowrap; text-align: left; }
th { background: #f3f4f6; position: sticky; top: 0; }
button, .button { background: #4f46e5; color: #fff; border: 0; border-radius: 6px; padding: 8px 16px; cursor: pointer; text-decoration: none; display: inline-block; }
button[disabled] { opacity: .5; cursor: not-allowed; }
code { background: #f3f4f6; padding: 2px 6px; border-radius: 4px; }
"#;

const PROCESS_SCRIPT: &str = r#"
async function submitPdf(request) {
  const buttons = document.querySelectorAll('.process');
  buttons.forEach(b => b.disabled = true);
  document.getElementById('status').textContent = 'Processing...';
  try {
    const response = await request();
    if (!response.ok) {
      const body = await response.json().catch(() => ({ error: response.statusText }));
      document.getElementById('status').textContent = body.error || 'Request failed';
    } else {
      window.location.reload();
    }
  } finally {
    buttons.forEach(b => b.disabled = false);
  }
}
document.getElementById('upload-form').addEventListener('submit', (event) => {
  event.preventDefault();
  const file = document.getElementById('pdf-file').files[0];
  if (!file) { document.getElementById('status').textContent = 'Please select a PDF file.'; return; }
  submitPdf(() => fetch('/api/process/upload?filename=' + encodeURIComponent(file.name), {
    method: 'POST', headers: { 'Content-Type': file.type || 'application/pdf' }, body: file,
  }));
});
document.getElementById('url-form').addEventListener('submit', (event) => {
  event.preventDefault();
  const url = document.getElementById('pdf-url').value;
  submitPdf(() => fetch('/api/process/url', {
    method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ url }),
  }));
});
"#;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// "college_name" → "College Name"
pub fn format_header(header: &str) -> String {
    let mut formatted = String::with_capacity(header.len());
    let mut in_word = false;
    for c in header.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_alphanumeric();
        if is_word && !in_word {
            formatted.extend(c.to_uppercase());
        } else {
            formatted.push(c);
        }
        in_word = is_word;
    }
    formatted
}

fn layout(title: &str, nav: bool, body: &str) -> String {
    let nav = if nav {
        r#"<nav>
  <a href="/">Home</a>
  <a href="/scripts">Helper scripts</a>
  <form method="post" action="/logout" onsubmit="return confirm('Are you sure you want to log out?');"><button type="submit">Logout</button></form>
</nav>"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<main>
{nav}
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let error = error
        .map(|message| format!(r#"<p class="alert">Login Failed: {}</p>"#, escape_html(message)))
        .unwrap_or_default();
    let body = format!(
        r#"<section class="card" style="max-width: 380px; margin: 80px auto;">
  <h1>PDF Scraper Pro</h1>
  <p class="muted">Please enter the password to access the application.</p>
  {error}
  <form method="post" action="/login">
    <p><input type="password" name="password" placeholder="Password" required autofocus style="width: 100%; padding: 8px;"></p>
    <button type="submit">Login</button>
  </form>
</section>"#
    );
    layout("Login - PDF Scraper Pro", false, &body)
}

pub fn render_table(table: &Table) -> String {
    let mut html = String::from("<div class=\"scroll\"><table><thead><tr>");
    for header in table.headers().iter() {
        html.push_str(&format!("<th>{}</th>", escape_html(&format_header(header))));
    }
    html.push_str("</tr></thead><tbody>");
    for row in table.rows() {
        html.push_str("<tr>");
        for value in row.values() {
            html.push_str(&format!("<td>{}</td>", escape_html(value)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}

fn result_section(snapshot: &ProcessorSnapshot) -> String {
    match snapshot.state {
        ProcessingState::Idle => r#"<section class="card muted">Your extracted PDF data will appear here once processed.</section>"#.to_string(),
        ProcessingState::Submitting => format!(
            r#"<meta http-equiv="refresh" content="3">
<section class="card muted">Extracting data from {}... This may take a moment for large or complex PDFs.</section>"#,
            escape_html(snapshot.source_name.as_deref().unwrap_or("your PDF"))
        ),
        ProcessingState::ParseFailed | ProcessingState::CollaboratorFailed => format!(
            r#"<section class="card"><div class="alert"><strong>Extraction Failed</strong><br>{}</div></section>"#,
            escape_html(snapshot.error.as_deref().unwrap_or("An unknown error occurred during PDF processing."))
        ),
        ProcessingState::Success => {
            let Some(table) = snapshot.table.as_deref().filter(|table| !table.is_empty()) else {
                return r#"<section class="card"><h2>Extracted Data</h2><p class="muted">No tabular data was found in the PDF.</p></section>"#.to_string();
            };
            let notice = if snapshot.diagnostics.is_empty() {
                String::new()
            } else {
                let items: String = snapshot
                    .diagnostics
                    .iter()
                    .map(|d| format!("<li>{}</li>", escape_html(&d.to_string())))
                    .collect();
                format!(
                    r#"<details class="notice"><summary>{} line(s) of the model output needed repair</summary><ul>{}</ul></details>"#,
                    snapshot.diagnostics.len(),
                    items
                )
            };
            format!(
                r#"<section class="card">
  <h2>Extracted Data <small class="muted">({rows} rows from {source})</small></h2>
  <p><a class="button" href="/api/export">Download CSV</a></p>
  {notice}
  {table}
</section>"#,
                rows = table.len(),
                source = escape_html(snapshot.source_name.as_deref().unwrap_or("PDF")),
                table = render_table(table),
            )
        }
    }
}

pub fn index_page(snapshot: &ProcessorSnapshot, max_upload_bytes: usize) -> String {
    let disabled = if snapshot.state == ProcessingState::Submitting {
        " disabled"
    } else {
        ""
    };
    let body = format!(
        r#"<header><h1>PDF Scraper Pro</h1><p class="muted">Extract tables from PDF documents and download them as CSV.</p></header>
<section class="card">
  <h2>Upload or Link PDF</h2>
  <p class="muted">Choose a PDF file from your device or provide a direct public URL to a PDF document. Max file size: {max_mb}MB.</p>
  <form id="upload-form">
    <input id="pdf-file" type="file" accept="application/pdf">
    <button class="process" type="submit"{disabled}>Process PDF</button>
  </form>
  <p class="muted">or</p>
  <form id="url-form">
    <input id="pdf-url" type="text" placeholder="https://example.com/document.pdf" style="width: 60%;">
    <button class="process" type="submit"{disabled}>Process URL</button>
  </form>
  <p class="muted">Must be a publicly accessible URL (http/https) or a Base64 data URI.</p>
  <p id="status" class="muted"></p>
</section>
{result}
<script>{PROCESS_SCRIPT}</script>"#,
        max_mb = max_upload_bytes / (1024 * 1024),
        result = result_section(snapshot),
    );
    layout("PDF Scraper Pro", true, &body)
}

pub fn scripts_page(scripts: &[ScriptListing]) -> String {
    let cards: String = scripts
        .iter()
        .map(|script| {
            let usage: String = script
                .info
                .usage
                .iter()
                .map(|step| format!("<li>{}</li>", escape_html(step)))
                .collect();
            let download = if script.available {
                format!(
                    r#"<a class="button" href="/scripts/{name}" download="{name}">Download {title} Script</a>"#,
                    name = escape_html(script.info.file_name),
                    title = escape_html(script.info.title),
                )
            } else {
                r#"<span class="muted">Currently unavailable.</span>"#.to_string()
            };
            format!(
                r#"<section class="card">
  <h2>{title}</h2>
  <p>{description}</p>
  <h4>Dependencies</h4>
  <p><code>{install}</code></p>
  <h4>Usage</h4>
  <ul>{usage}</ul>
  {download}
</section>"#,
                title = escape_html(script.info.title),
                description = escape_html(script.info.description),
                install = escape_html(script.info.install),
            )
        })
        .collect();

    let body = format!(
        r#"<header><h1>Python Helper Scripts</h1><p class="muted">Download these Python scripts to help prepare your PDFs for better data extraction.</p></header>
{cards}"#
    );
    layout("Helper Scripts - PDF Scraper Pro", true, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::csv::HeaderSet;
    use std::sync::Arc;

    #[test]
    fn test_format_header() {
        assert_eq!(format_header("college_name"), "College Name");
        assert_eq!(format_header("SM"), "SM");
        assert_eq!(format_header("phase 1_a"), "Phase 1 A");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_index_distinguishes_empty_result_from_failure() {
        let mut snapshot = ProcessorSnapshot::default();
        snapshot.state = ProcessingState::Success;
        snapshot.table = Some(Arc::new(Table::new(HeaderSet::new(vec!["A".to_string()]))));
        let page = index_page(&snapshot, 10 * 1024 * 1024);
        assert!(page.contains("No tabular data was found in the PDF."));
        assert!(!page.contains("Extraction Failed"));
        assert!(!page.contains("/api/export"));

        snapshot.state = ProcessingState::CollaboratorFailed;
        snapshot.table = None;
        snapshot.error = Some("Processing timed out.".to_string());
        let page = index_page(&snapshot, 10 * 1024 * 1024);
        assert!(page.contains("Extraction Failed"));
        assert!(page.contains("Processing timed out."));
    }

    #[test]
    fn test_rendered_table_escapes_cells() {
        let mut table = Table::new(HeaderSet::new(vec!["college_name".to_string()]));
        table.push_row(vec!["<script>".to_string()]);

        let html = render_table(&table);
        assert!(html.contains("<th>College Name</th>"));
        assert!(html.contains("<td>&lt;script&gt;</td>"));
    }
}
