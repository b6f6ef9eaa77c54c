//! The three dashboard derivations over a joined record set.
//!
//! Each derivation is a pure function of `&[UnifiedRecord]`. An empty record
//! set is a valid "no data" state and yields an empty series, never an error.

pub mod adoption;
pub mod daily_active;
pub mod geography;

pub use adoption::{adoption_rates, AdoptionRate};
pub use daily_active::{daily_active_users, DauPoint};
pub use geography::{country_distribution, CountryCount, UNKNOWN_COUNTRY};

use crate::records::UnifiedRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one dashboard chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Dau,
    Countries,
    Adoption,
}

impl PanelKind {
    /// All panels in dashboard layout order.
    pub const ALL: [PanelKind; 3] = [PanelKind::Dau, PanelKind::Countries, PanelKind::Adoption];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Dau => "dau",
            PanelKind::Countries => "countries",
            PanelKind::Adoption => "adoption",
        }
    }

    /// Runs this panel's derivation.
    pub fn compute(&self, records: &[UnifiedRecord]) -> Panel {
        match self {
            PanelKind::Dau => Panel::DailyActiveUsers(daily_active_users(records)),
            PanelKind::Countries => Panel::Countries(country_distribution(records)),
            PanelKind::Adoption => Panel::FeatureAdoption(adoption_rates(records)),
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a panel name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPanel(pub String);

impl fmt::Display for UnknownPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown chart '{}' (expected one of: dau, countries, adoption)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPanel {}

impl FromStr for PanelKind {
    type Err = UnknownPanel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dau" => Ok(PanelKind::Dau),
            "countries" | "country" => Ok(PanelKind::Countries),
            "adoption" | "features" => Ok(PanelKind::Adoption),
            _ => Err(UnknownPanel(s.to_string())),
        }
    }
}

/// The derived series of one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "panel", content = "series", rename_all = "snake_case")]
pub enum Panel {
    DailyActiveUsers(Vec<DauPoint>),
    Countries(Vec<CountryCount>),
    FeatureAdoption(Vec<AdoptionRate>),
}

impl Panel {
    pub fn kind(&self) -> PanelKind {
        match self {
            Panel::DailyActiveUsers(_) => PanelKind::Dau,
            Panel::Countries(_) => PanelKind::Countries,
            Panel::FeatureAdoption(_) => PanelKind::Adoption,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Panel::DailyActiveUsers(points) => points.len(),
            Panel::Countries(counts) => counts.len(),
            Panel::FeatureAdoption(rates) => rates.len(),
        }
    }

    /// True when the panel has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All three panels computed from the same record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub dau: Panel,
    pub countries: Panel,
    pub adoption: Panel,
}

impl DashboardView {
    /// Computes every panel. The derivations only read `records`, so they run
    /// in parallel on the rayon pool.
    pub fn compute(records: &[UnifiedRecord]) -> Self {
        let (dau, (countries, adoption)) = rayon::join(
            || PanelKind::Dau.compute(records),
            || {
                rayon::join(
                    || PanelKind::Countries.compute(records),
                    || PanelKind::Adoption.compute(records),
                )
            },
        );

        tracing::debug!(
            records = records.len(),
            dau_points = dau.len(),
            countries = countries.len(),
            features = adoption.len(),
            "computed dashboard view"
        );

        DashboardView {
            dau,
            countries,
            adoption,
        }
    }

    /// Panels in layout order.
    pub fn panels(&self) -> [&Panel; 3] {
        [&self.dau, &self.countries, &self.adoption]
    }
}
