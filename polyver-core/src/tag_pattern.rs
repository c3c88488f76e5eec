//! Release tag patterns such as `{projectName}@{version}` or `v{version}`.

use regex::Regex;
use semver::Version;

use crate::specifier::parse_version;

const VERSION_TOKEN: &str = "{version}";
const PROJECT_TOKEN: &str = "{projectName}";
const GROUP_TOKEN: &str = "{releaseGroupName}";

/// Default pattern for independently versioned projects.
pub const DEFAULT_INDEPENDENT_PATTERN: &str = "{projectName}@{version}";
/// Default pattern for fixed release groups.
pub const DEFAULT_FIXED_PATTERN: &str = "v{version}";

/// A git tag matching a release pattern, with the version it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingTag {
    pub tag: String,
    pub extracted_version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pattern: String,
}

impl TagPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Renders the tag name for a concrete release.
    pub fn interpolate(&self, project_name: &str, group_name: &str, version: &str) -> String {
        self.pattern
            .replace(PROJECT_TOKEN, project_name)
            .replace(GROUP_TOKEN, group_name)
            .replace(VERSION_TOKEN, version)
    }

    /// Extracts the version from `tag` if it matches this pattern for the
    /// given project. Tags whose version part is not valid semver never match.
    pub fn extract(&self, tag: &str, project_name: &str, group_name: &str) -> Option<Version> {
        self.matcher(project_name, group_name)?.extract(tag)
    }

    /// Builds a [`MatchingTag`] if `tag` matches.
    pub fn match_tag(&self, tag: &str, project_name: &str, group_name: &str) -> Option<MatchingTag> {
        self.matcher(project_name, group_name)?.match_tag(tag)
    }

    /// Compiles this pattern for one project so many tags can be tested
    /// against it. Returns `None` when the pattern has no `{version}` token.
    pub fn matcher(&self, project_name: &str, group_name: &str) -> Option<TagMatcher> {
        let fixed = self
            .pattern
            .replace(PROJECT_TOKEN, project_name)
            .replace(GROUP_TOKEN, group_name);

        let mut parts = fixed.splitn(2, VERSION_TOKEN);
        let prefix = regex::escape(parts.next().unwrap_or_default());
        let suffix = parts.next()?;
        let suffix = regex::escape(suffix);

        let regex = Regex::new(&format!("^{}(?P<version>.+?){}$", prefix, suffix)).ok()?;
        Some(TagMatcher { regex })
    }
}

/// A [`TagPattern`] compiled for a single project and group.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    regex: Regex,
}

impl TagMatcher {
    pub fn extract(&self, tag: &str) -> Option<Version> {
        let captures = self.regex.captures(tag)?;
        let version = captures.name("version")?.as_str();
        parse_version(version).ok()
    }

    pub fn match_tag(&self, tag: &str) -> Option<MatchingTag> {
        self.extract(tag).map(|extracted_version| MatchingTag {
            tag: tag.to_string(),
            extracted_version,
        })
    }
}
