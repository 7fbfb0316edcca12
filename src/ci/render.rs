//! HTML pages. Deliberately bare: a title, a list, a badge and a `<pre>`.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::models::BuildState;
use super::status::ProjectStatus;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>{} - forge-ci</title></head><body>\n{}</body></html>\n",
        escape_html(title),
        body
    )
}

pub fn index_page<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut body = String::from("<p>Projects:</p>\n<ul>\n");
    for name in names {
        let name = escape_html(name);
        let _ = writeln!(body, "<li><a href=\"/projects/{name}\">{name}</a></li>");
    }
    body.push_str("</ul>\n");
    page("index", &body)
}

/// Status page for `name`. `status` is `None` for unknown projects, which
/// get the badge and nothing else.
pub fn status_page(name: &str, status: Option<&ProjectStatus>) -> String {
    let escaped = escape_html(name);
    let mut body = format!(
        "<h1>{escaped}</h1>\n<p><img src=\"/projects/{escaped}/badge\" alt=\"build status\" /></p>\n"
    );

    if let Some(status) = status {
        match (status.state, &status.last_build_time) {
            (BuildState::Pending, _) | (_, None) => {
                body.push_str("<p>No completed build yet.</p>\n");
            }
            (_, Some(time)) => {
                let _ = writeln!(body, "<p>Last built: {}</p>", format_time(time));
                if let Some(error) = &status.error {
                    let _ = writeln!(body, "<p>Error:</p>\n<pre>{}</pre>", escape_html(error));
                }
                let _ = writeln!(
                    body,
                    "<p>Output:</p>\n<pre>{}</pre>",
                    escape_html(&status.output)
                );
            }
        }
    }

    page(name, &body)
}
