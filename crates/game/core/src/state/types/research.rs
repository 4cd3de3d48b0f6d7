//! Tech-tree nodes and per-player research progress.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorSeverity, GameError};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResearchId(pub String);

impl From<&str> for ResearchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ResearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tech-tree node: completing it takes `cost` progress increments once all
/// prerequisites are completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    pub id: ResearchId,
    pub prerequisites: BTreeSet<ResearchId>,
    pub cost: u32,
}

impl Research {
    pub fn new(id: impl Into<ResearchId>, cost: u32) -> Self {
        Self {
            id: id.into(),
            prerequisites: BTreeSet::new(),
            cost,
        }
    }

    #[must_use]
    pub fn requires(mut self, prerequisite: impl Into<ResearchId>) -> Self {
        self.prerequisites.insert(prerequisite.into());
        self
    }
}

/// Why a research node cannot advance for a player.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResearchError {
    #[error("research {0} is already completed")]
    AlreadyCompleted(ResearchId),

    #[error("research {research} requires {missing} first")]
    MissingPrerequisite {
        research: ResearchId,
        missing: ResearchId,
    },

    #[error("research {0} has no cost")]
    ZeroCost(ResearchId),
}

impl GameError for ResearchError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            ResearchError::AlreadyCompleted(_) => "RESEARCH_ALREADY_COMPLETED",
            ResearchError::MissingPrerequisite { .. } => "RESEARCH_MISSING_PREREQUISITE",
            ResearchError::ZeroCost(_) => "RESEARCH_ZERO_COST",
        }
    }
}

/// Research a player has started or finished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchProgress {
    in_progress: BTreeMap<ResearchId, u32>,
    completed: BTreeSet<ResearchId>,
}

impl ResearchProgress {
    /// Progress towards `id`; zero when not started, `None` once completed.
    pub fn progress(&self, id: &ResearchId) -> Option<u32> {
        if self.completed.contains(id) {
            return None;
        }
        Some(self.in_progress.get(id).copied().unwrap_or(0))
    }

    pub fn is_completed(&self, id: &ResearchId) -> bool {
        self.completed.contains(id)
    }

    pub fn completed(&self) -> impl Iterator<Item = &ResearchId> {
        self.completed.iter()
    }

    pub fn in_progress(&self) -> impl Iterator<Item = (&ResearchId, u32)> {
        self.in_progress.iter().map(|(id, progress)| (id, *progress))
    }

    /// Checks prerequisite and cost gating for one more increment.
    pub fn check(&self, research: &Research) -> Result<(), ResearchError> {
        if research.cost == 0 {
            return Err(ResearchError::ZeroCost(research.id.clone()));
        }
        if self.is_completed(&research.id) {
            return Err(ResearchError::AlreadyCompleted(research.id.clone()));
        }
        if let Some(missing) = research
            .prerequisites
            .iter()
            .find(|prerequisite| !self.is_completed(prerequisite))
        {
            return Err(ResearchError::MissingPrerequisite {
                research: research.id.clone(),
                missing: missing.clone(),
            });
        }
        Ok(())
    }

    /// Advances `research` by one unit. Returns true when this increment
    /// completed it, moving it out of the in-progress set.
    ///
    /// Callers run [`ResearchProgress::check`] first.
    pub fn advance(&mut self, research: &Research) -> bool {
        let progress = self.in_progress.entry(research.id.clone()).or_insert(0);
        *progress += 1;
        if *progress >= research.cost {
            self.in_progress.remove(&research.id);
            self.completed.insert(research.id.clone());
            return true;
        }
        false
    }
}
