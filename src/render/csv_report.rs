use super::{panel_title, Renderer};
use crate::aggregation::Panel;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// One line of the CSV report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub panel: &'static str,
    pub label: String,
    pub value: f64,
}

/// Errors raised while writing a report.
#[derive(Debug)]
pub enum ReportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Csv(e) => write!(f, "CSV error: {}", e),
            ReportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Writes panels as `panel,label,value` CSV rows for the script front end.
///
/// Rendering a panel yields the number of rows it wrote.
pub struct CsvReportRenderer<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvReportRenderer<W> {
    /// Creates a renderer writing to `inner`. The header row is written with
    /// the first data row.
    pub fn new(inner: W) -> Self {
        CsvReportRenderer {
            writer: csv::Writer::from_writer(inner),
        }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, ReportError> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }

    fn rows(panel: &Panel) -> Vec<ReportRow> {
        let name = panel.kind().as_str();
        match panel {
            Panel::DailyActiveUsers(points) => points
                .iter()
                .map(|p| ReportRow {
                    panel: name,
                    label: p.date.format("%Y-%m-%d").to_string(),
                    value: p.active_users as f64,
                })
                .collect(),
            Panel::Countries(counts) => counts
                .iter()
                .map(|c| ReportRow {
                    panel: name,
                    label: c.label().to_string(),
                    value: c.users as f64,
                })
                .collect(),
            Panel::FeatureAdoption(rates) => rates
                .iter()
                .map(|r| ReportRow {
                    panel: name,
                    label: r.feature.label().to_string(),
                    value: r.rate,
                })
                .collect(),
        }
    }
}

impl<W: Write> Renderer for CsvReportRenderer<W> {
    type Output = usize;
    type Error = ReportError;

    fn render(&mut self, panel: &Panel) -> Result<usize, ReportError> {
        if panel.is_empty() {
            log::info!("{}: no data available", panel_title(panel.kind()));
            return Ok(0);
        }

        let rows = Self::rows(panel);
        for row in &rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{CountryCount, DashboardView};

    #[test]
    fn writes_header_and_rows() {
        let mut renderer = CsvReportRenderer::new(Vec::new());
        let written = renderer
            .render(&Panel::Countries(vec![
                CountryCount::new(Some("US"), 2),
                CountryCount::new(None, 1),
            ]))
            .unwrap();
        assert_eq!(written, 2);

        let output = String::from_utf8(renderer.into_inner().unwrap()).unwrap();
        assert_eq!(
            output,
            "panel,label,value\ncountries,US,2.0\ncountries,Unknown,1.0\n"
        );
    }

    #[test]
    fn empty_view_writes_nothing() {
        let mut renderer = CsvReportRenderer::new(Vec::new());
        let counts = renderer.render_all(&DashboardView::compute(&[])).unwrap();
        assert_eq!(counts, vec![0, 0, 0]);
        assert!(renderer.into_inner().unwrap().is_empty());
    }
}
