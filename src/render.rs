//! Presentation adapters.
//!
//! The aggregation core stops at ordered value pairs. Everything visual
//! (titles, chart kinds, axis formats) is decided here, behind one
//! [`Renderer`] capability shared by the HTTP and report front ends.

pub mod csv_report;
pub mod figure;

pub use csv_report::{CsvReportRenderer, ReportError, ReportRow};
pub use figure::{ChartKind, Figure, FigureRenderer};

use crate::aggregation::{DashboardView, Panel, PanelKind};

/// Title shown above the dashboard.
pub const DASHBOARD_TITLE: &str = "Career Services User Behavior Analytics";

/// Chart title for a panel.
pub fn panel_title(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::Dau => "Daily Active Users",
        PanelKind::Countries => "Users by Country",
        PanelKind::Adoption => "Feature Adoption Rates",
    }
}

/// Turns derived panels into something a front end can show.
pub trait Renderer {
    type Output;
    type Error;

    /// Renders one panel. Empty panels must render a "no data" state, not fail.
    fn render(&mut self, panel: &Panel) -> Result<Self::Output, Self::Error>;

    /// Renders every panel of `view` in layout order.
    fn render_all(&mut self, view: &DashboardView) -> Result<Vec<Self::Output>, Self::Error> {
        view.panels()
            .into_iter()
            .map(|panel| self.render(panel))
            .collect()
    }
}
