use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ResearchProgress, ResourceAmount};

/// Unique identity key of a participant within one game instance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(pub String);

impl PlayerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A participant. Never removed mid-game, only marked defeated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: PlayerName,
    pub nickname: String,
    pub resources: ResourceAmount,
    #[serde(default)]
    pub research: ResearchProgress,
    #[serde(default)]
    pub defeated: bool,
}

impl Player {
    pub fn new(name: impl Into<PlayerName>, nickname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nickname: nickname.into(),
            resources: ResourceAmount::default(),
            research: ResearchProgress::default(),
            defeated: false,
        }
    }

    #[must_use]
    pub fn with_resources(mut self, resources: ResourceAmount) -> Self {
        self.resources = resources;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.defeated
    }
}
