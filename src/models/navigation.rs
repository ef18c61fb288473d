use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A screen the user can be on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    Dashboard,
    TextGeneration,
    ImageUpload,
    Results,
    ProjectList,
    UpgradeRequired,
}

impl Destination {
    pub const ALL: [Destination; 6] = [
        Destination::Dashboard,
        Destination::TextGeneration,
        Destination::ImageUpload,
        Destination::Results,
        Destination::ProjectList,
        Destination::UpgradeRequired,
    ];

    /// Entering these screens requires remaining generation allowance
    pub fn is_quota_gated(self) -> bool {
        matches!(self, Destination::TextGeneration | Destination::ImageUpload)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Dashboard => "dashboard",
            Destination::TextGeneration => "textGeneration",
            Destination::ImageUpload => "imageUpload",
            Destination::Results => "results",
            Destination::ProjectList => "projectList",
            Destination::UpgradeRequired => "upgradeRequired",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Destination::Dashboard => "Dashboard",
            Destination::TextGeneration => "Text Generation",
            Destination::ImageUpload => "Image Upload",
            Destination::Results => "Results",
            Destination::ProjectList => "Projects",
            Destination::UpgradeRequired => "Upgrade Required",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Destination::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown destination: {}", s))
    }
}

/// Ordered destinations with a permanent dashboard root.
///
/// Never empty; the first entry is always `Dashboard` and the last is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NavigationStack {
    entries: Vec<Destination>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self {
            entries: vec![Destination::Dashboard],
        }
    }

    /// Rebuild from persisted entries, `None` if they break the root invariant
    pub fn from_entries(entries: Vec<Destination>) -> Option<Self> {
        match entries.first() {
            Some(Destination::Dashboard) => Some(Self { entries }),
            _ => None,
        }
    }

    pub fn push(&mut self, destination: Destination) {
        self.entries.push(destination);
    }

    /// Remove the visible destination; the root is never removed
    pub fn pop(&mut self) -> Option<Destination> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.entries.truncate(1);
    }

    pub fn current(&self) -> Destination {
        self.entries
            .last()
            .copied()
            .unwrap_or(Destination::Dashboard)
    }

    /// Most recent first, at most `limit` entries
    pub fn history(&self, limit: usize) -> Vec<Destination> {
        self.entries.iter().rev().take(limit).copied().collect()
    }

    pub fn entries(&self) -> &[Destination] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}
