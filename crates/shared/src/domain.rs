use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(DepartmentId);
id_newtype!(KpiId);

/// Organizational-unit scope applied to the KPI list view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DepartmentFilter {
    #[default]
    All,
    Department(String),
}

impl DepartmentFilter {
    /// `""` and `"all"` both select the unfiltered view.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "all" => DepartmentFilter::All,
            department => DepartmentFilter::Department(department.to_string()),
        }
    }

    /// Query value for the list request; `None` means no constraint.
    pub fn department_id(&self) -> Option<&str> {
        match self {
            DepartmentFilter::All => None,
            DepartmentFilter::Department(id) => Some(id),
        }
    }
}

impl fmt::Display for DepartmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartmentFilter::All => f.write_str("all"),
            DepartmentFilter::Department(id) => f.write_str(id),
        }
    }
}

/// Categorical position of a reading relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Above,
    Below,
    Target,
}

impl PerformanceBand {
    /// Total mapping: every unrecognized label falls back to `Target`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Above Target" => PerformanceBand::Above,
            "Below Target" => PerformanceBand::Below,
            _ => PerformanceBand::Target,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            PerformanceBand::Above => "above",
            PerformanceBand::Below => "below",
            PerformanceBand::Target => "target",
        }
    }
}
