//! Core types shared across the gitport workspace

use serde::{Deserialize, Serialize};

/// Reference to the project being imported
///
/// `id` is the local project id, `source_identifier` is the path of the
/// project on the source provider (e.g. "octo-org/octo-repo").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub source_identifier: String,
}

impl Project {
    pub fn new(id: i64, source_identifier: impl Into<String>) -> Self {
        Self {
            id,
            source_identifier: source_identifier.into(),
        }
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.source_identifier)
    }
}

/// One logical category of remote objects being migrated
///
/// Collections are identified by name in cache keys and in the strategy
/// registry, so the name must stay stable across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(String);

impl Collection {
    pub const ISSUES: &'static str = "issues";
    pub const PULL_REQUESTS: &'static str = "pull_requests";
    pub const COMMENTS: &'static str = "comments";
    pub const LABELS: &'static str = "labels";
    pub const MILESTONES: &'static str = "milestones";
    pub const EVENTS: &'static str = "events";
    pub const USERS: &'static str = "users";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Collection {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Kind of entity tracked by the object counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Issue,
    PullRequest,
    Comment,
    Label,
    Milestone,
    Event,
    User,
}

impl EntityKind {
    /// All kinds a project summary reports on
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Issue,
        EntityKind::PullRequest,
        EntityKind::Comment,
        EntityKind::Label,
        EntityKind::Milestone,
        EntityKind::Event,
        EntityKind::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Issue => "issue",
            EntityKind::PullRequest => "pull_request",
            EntityKind::Comment => "comment",
            EntityKind::Label => "label",
            EntityKind::Milestone => "milestone",
            EntityKind::Event => "event",
            EntityKind::User => "user",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(EntityKind::Issue),
            "pull_request" => Ok(EntityKind::PullRequest),
            "comment" => Ok(EntityKind::Comment),
            "label" => Ok(EntityKind::Label),
            "milestone" => Ok(EntityKind::Milestone),
            "event" => Ok(EntityKind::Event),
            "user" => Ok(EntityKind::User),
            _ => Err(anyhow::anyhow!("Unknown entity kind: {}", s)),
        }
    }
}

/// Phase a counted object is in
///
/// `Fetched` is counted when the scheduler yields an object off a page,
/// `Imported` when the per-entity importer reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Fetched,
    Imported,
}

impl ImportPhase {
    pub const ALL: [ImportPhase; 2] = [ImportPhase::Fetched, ImportPhase::Imported];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPhase::Fetched => "fetched",
            ImportPhase::Imported => "imported",
        }
    }
}

impl std::fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImportPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetched" => Ok(ImportPhase::Fetched),
            "imported" => Ok(ImportPhase::Imported),
            _ => Err(anyhow::anyhow!("Unknown import phase: {}", s)),
        }
    }
}
