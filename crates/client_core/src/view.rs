//! View-tree anchor points and the loading/error state machine.

use std::collections::HashMap;

/// Fetch lifecycle state driving which view fragment is visible.
///
/// There is no automatic transition out of `Error`; only the next
/// refresh attempt (manual or scheduled) leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Loading,
    Success,
    Error(String),
}

impl ViewState {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifiers of the view regions the controller may write into.
///
/// Every anchor is optional in the hosting markup; a tree built without
/// one simply ignores writes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewAnchor {
    TotalDepartments,
    TotalKpis,
    TotalDataPoints,
    RecentKpis,
    KpiList,
    StatusBanner,
}

impl ViewAnchor {
    pub const ALL: [ViewAnchor; 6] = [
        ViewAnchor::TotalDepartments,
        ViewAnchor::TotalKpis,
        ViewAnchor::TotalDataPoints,
        ViewAnchor::RecentKpis,
        ViewAnchor::KpiList,
        ViewAnchor::StatusBanner,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            ViewAnchor::TotalDepartments => "total-departments",
            ViewAnchor::TotalKpis => "total-kpis",
            ViewAnchor::TotalDataPoints => "total-data-points",
            ViewAnchor::RecentKpis => "recent-kpis-tbody",
            ViewAnchor::KpiList => "kpi-list",
            ViewAnchor::StatusBanner => "status-banner",
        }
    }
}

/// The set of present anchors and their current fragment.
#[derive(Debug, Clone, Default)]
pub struct ViewTree {
    regions: HashMap<ViewAnchor, String>,
}

impl ViewTree {
    /// A tree with every anchor present.
    pub fn full() -> Self {
        Self::with_anchors(ViewAnchor::ALL)
    }

    pub fn with_anchors(anchors: impl IntoIterator<Item = ViewAnchor>) -> Self {
        Self {
            regions: anchors
                .into_iter()
                .map(|anchor| (anchor, String::new()))
                .collect(),
        }
    }

    /// Replaces the whole fragment under `anchor`, discarding whatever
    /// was rendered there before. Writing to an absent anchor is a
    /// no-op; the return value says whether anything changed.
    pub fn replace(&mut self, anchor: ViewAnchor, fragment: String) -> bool {
        match self.regions.get_mut(&anchor) {
            Some(slot) => {
                *slot = fragment;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, anchor: ViewAnchor) -> bool {
        self.regions.contains_key(&anchor)
    }

    pub fn content(&self, anchor: ViewAnchor) -> Option<&str> {
        self.regions.get(&anchor).map(String::as_str)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
