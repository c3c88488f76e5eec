//! Conventional commit classification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::specifier::SemverBump;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<breaking>!)?:\s+(?P<subject>.+)$")
        .expect("conventional commit header regex is valid")
});

static BREAKING_FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^BREAKING[ -]CHANGE:\s").expect("breaking change footer regex is valid")
});

/// A commit as returned by the version control client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub hash: String,
    pub message: String,
}

impl RawCommit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }
}

/// A commit whose header follows the conventional commits format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub commit_type: String,
    pub scope: Option<String>,
    pub subject: String,
    pub breaking: bool,
}

impl ConventionalCommit {
    /// Parses a full commit message. Returns `None` for non-conventional headers.
    pub fn parse(message: &str) -> Option<Self> {
        let header = message.lines().next()?.trim();
        let captures = HEADER.captures(header)?;

        Some(Self {
            commit_type: captures["type"].to_lowercase(),
            scope: captures
                .name("scope")
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty()),
            subject: captures["subject"].to_string(),
            breaking: captures.name("breaking").is_some() || BREAKING_FOOTER.is_match(message),
        })
    }

    /// The bump this commit calls for, if any.
    pub fn bump(&self) -> Option<SemverBump> {
        if self.breaking {
            return Some(SemverBump::Major);
        }
        match self.commit_type.as_str() {
            "feat" => Some(SemverBump::Minor),
            "fix" | "perf" => Some(SemverBump::Patch),
            _ => None,
        }
    }
}

fn rank(bump: SemverBump) -> u8 {
    match bump {
        SemverBump::Major => 3,
        SemverBump::Minor => 2,
        _ => 1,
    }
}

/// Classifies commits into the highest bump level they call for.
///
/// Returns `None` when no commit warrants a release.
pub fn classify_commits(commits: &[RawCommit]) -> Option<SemverBump> {
    commits
        .iter()
        .filter_map(|commit| ConventionalCommit::parse(&commit.message))
        .filter_map(|commit| commit.bump())
        .max_by_key(|bump| rank(*bump))
}
