use compact_str::CompactString;
use serde::{Deserialize, Deserializer};

use crate::result::{HeraldError, Result};

/// Upstream-assigned issue identifier.
///
/// Globally unique and monotonically assigned, but unrelated to the order in
/// which the issues endpoint lists issues.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct IssueId {
    value: u64,
}

/// Human-facing issue number (`#123`), unique within one repository.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct IssueNumber {
    value: u64,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RepositoryId {
    owner: CompactString,
    name: CompactString,
}

impl IssueId {
    pub const MIN: IssueId = IssueId { value: u64::MIN };

    pub const fn new(id: u64) -> Self {
        Self { value: id }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl IssueNumber {
    pub const fn new(number: u64) -> Self {
        Self { value: number }
    }
}

impl RepositoryId {
    pub fn new(owner: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    /// Parse `owner/repo` or a `https://github.com/owner/repo[/issues]` URL.
    pub fn parse(input: &str) -> Result<Self> {
        let mut path = input.trim();
        path = path.strip_suffix('/').unwrap_or(path);
        path = path.strip_suffix("/issues").unwrap_or(path);
        path = path.strip_prefix("https://github.com/").unwrap_or(path);

        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != 2 {
            return Err(HeraldError::invalid_repository(
                input,
                "expected 'owner/repo' or 'https://github.com/owner/repo'",
            ));
        }

        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(HeraldError::invalid_repository(
                input,
                "owner and repo cannot be empty",
            ));
        }

        Ok(Self::new(parts[0], parts[1]))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'de> Deserialize<'de> for IssueId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<IssueId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(IssueId::new(id))
    }
}

impl<'de> Deserialize<'de> for IssueNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<IssueNumber, D::Error>
    where
        D: Deserializer<'de>,
    {
        let number = u64::deserialize(deserializer)?;
        Ok(IssueNumber::new(number))
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
