use super::{panel_title, Renderer};
use crate::aggregation::{Panel, PanelKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Chart type of a figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

/// Chart definition consumed by the browser dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// DOM id of the graph container
    pub id: String,
    pub panel: PanelKind,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    /// Axis tick format, e.g. `.0%` for rates
    pub y_tick_format: Option<String>,
    /// True when there is no data to plot
    pub empty: bool,
}

impl Figure {
    fn for_panel(kind: PanelKind) -> Self {
        let (id, chart, x_label, y_label, y_tick_format) = match kind {
            PanelKind::Dau => ("dau-graph", ChartKind::Line, "Date", "DAU", None),
            PanelKind::Countries => ("country-graph", ChartKind::Bar, "Country", "Users", None),
            PanelKind::Adoption => (
                "feature-adoption-graph",
                ChartKind::Bar,
                "Feature",
                "Adoption Rate",
                Some(".0%"),
            ),
        };
        Figure {
            id: id.to_string(),
            panel: kind,
            title: panel_title(kind).to_string(),
            kind: chart,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            x: Vec::new(),
            y: Vec::new(),
            y_tick_format: y_tick_format.map(str::to_string),
            empty: true,
        }
    }

    fn with_points(mut self, points: impl Iterator<Item = (String, f64)>) -> Self {
        for (x, y) in points {
            self.x.push(x);
            self.y.push(y);
        }
        self.empty = self.x.is_empty();
        self
    }
}

/// Renders panels as [`Figure`]s for the callback-driven web front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct FigureRenderer;

impl FigureRenderer {
    pub fn new() -> Self {
        FigureRenderer
    }

    /// Infallible shorthand for [`Renderer::render`].
    pub fn figure(&self, panel: &Panel) -> Figure {
        let base = Figure::for_panel(panel.kind());
        match panel {
            Panel::DailyActiveUsers(points) => base.with_points(
                points
                    .iter()
                    .map(|p| (p.date.format("%Y-%m-%d").to_string(), p.active_users as f64)),
            ),
            Panel::Countries(counts) => base.with_points(
                counts
                    .iter()
                    .map(|c| (c.label().to_string(), c.users as f64)),
            ),
            Panel::FeatureAdoption(rates) => base.with_points(
                rates
                    .iter()
                    .map(|r| (r.feature.label().to_string(), r.rate)),
            ),
        }
    }
}

impl Renderer for FigureRenderer {
    type Output = Figure;
    type Error = Infallible;

    fn render(&mut self, panel: &Panel) -> Result<Figure, Infallible> {
        Ok(self.figure(panel))
    }
}
