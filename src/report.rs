use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::expenses::hierarchy::AggregateNode;
use crate::expenses::series::MonthlySeriesRow;

const TEMPLATE: &str = include_str!("report/dashboard.html");

pub const DEFAULT_TITLE: &str = "Dashboard de Custos";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot encode report data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the dashboard page needs. Numbers are embedded raw, the page
/// formats them for display.
pub struct Report<'a> {
    title: &'a str,
    source_name: &'a str,
    nodes: &'a [AggregateNode],
    series: &'a [MonthlySeriesRow],
}

impl<'a> Report<'a> {
    pub fn new(
        title: &'a str,
        source_name: &'a str,
        nodes: &'a [AggregateNode],
        series: &'a [MonthlySeriesRow],
    ) -> Report<'a> {
        Report {
            title,
            source_name,
            nodes,
            series,
        }
    }

    pub fn render(&self) -> Result<String, ReportError> {
        let title = escape_html(self.title);
        let source_name = escape_html(self.source_name);
        let nodes = script_json(self.nodes)?;
        let series = script_json(self.series)?;

        Ok(fill_template(
            TEMPLATE,
            &[
                ("__TITLE__", title.as_str()),
                ("__SOURCE__", source_name.as_str()),
                ("__NODES__", nodes.as_str()),
                ("__SERIES__", series.as_str()),
            ],
        ))
    }

    /// Renders fully before touching the file system, so a failed run never
    /// leaves a partial report behind.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let html = self.render()?;
        fs::write(path, html)?;
        info!("report written to {}", path.display());

        Ok(())
    }
}

/// Substitutes every marker in a single left-to-right scan, so inserted
/// values are never searched for markers themselves.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len() + values.iter().map(|(_, value)| value.len()).sum::<usize>());
    let mut rest = template;

    while let Some((at, marker, value)) = values
        .iter()
        .filter_map(|(marker, value)| rest.find(marker).map(|at| (at, *marker, *value)))
        .min_by_key(|(at, _, _)| *at)
    {
        filled.push_str(&rest[..at]);
        filled.push_str(value);
        rest = &rest[at + marker.len()..];
    }
    filled.push_str(rest);

    filled
}

/// JSON safe to paste inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/").replace("<!--", "<\\!--"))
}

fn escape_html(text: &str) -> String {
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
