use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An error as reported by the Bugsnag data access API. Only the fields the
/// exporter aggregates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorRecord {
    #[serde(default)]
    pub events: u64,
    #[serde(default)]
    pub release_stages: Vec<String>,
}
