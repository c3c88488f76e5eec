//! Git history access backed by libgit2.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{DiffOptions, Oid, Repository, Sort};
use polyver_core::clients::GitClient;
use polyver_core::conventional::RawCommit;
use polyver_core::error::{Error, Result};
use polyver_core::tag_pattern::{MatchingTag, TagPattern};
use tracing::debug;

/// Reads tags and commits from the repository containing a workspace.
///
/// Every call opens the repository on a blocking thread; paths passed to
/// [`GitClient::commits_since`] are relative to the workspace root.
#[derive(Debug, Clone)]
pub struct Git2Client {
    workspace_root: PathBuf,
}

impl Git2Client {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    async fn with_repo<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository, &Path) -> std::result::Result<T, git2::Error> + Send + 'static,
    {
        let workspace_root = self.workspace_root.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::discover(&workspace_root).map_err(git_error)?;
            let prefix = workspace_prefix(&repo, &workspace_root);
            f(&repo, &prefix).map_err(git_error)
        })
        .await
        .map_err(|e| Error::Git(format!("git task failed: {}", e)))?
    }
}

#[async_trait]
impl GitClient for Git2Client {
    async fn latest_tag_for_pattern(
        &self,
        pattern: &TagPattern,
        project_name: &str,
        group_name: &str,
    ) -> Result<Option<MatchingTag>> {
        let Some(matcher) = pattern.matcher(project_name, group_name) else {
            debug!("Tag pattern {} has no version placeholder", pattern.as_str());
            return Ok(None);
        };
        self.with_repo(move |repo, _| {
            let names = repo.tag_names(None)?;
            let mut newest: Option<(i64, MatchingTag)> = None;
            for name in names.iter().flatten() {
                let Some(matching) = matcher.match_tag(name) else {
                    continue;
                };
                let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
                let time = reference.peel_to_commit()?.time().seconds();
                let is_newer = match &newest {
                    None => true,
                    Some((best_time, best)) => {
                        time > *best_time
                            || (time == *best_time
                                && matching.extracted_version > best.extracted_version)
                    }
                };
                if is_newer {
                    newest = Some((time, matching));
                }
            }
            Ok(newest.map(|(_, tag)| tag))
        })
        .await
    }

    async fn first_commit(&self) -> Result<String> {
        self.with_repo(|repo, _| {
            let mut revwalk = repo.revwalk()?;
            revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
            revwalk.push_head()?;
            match revwalk.next() {
                Some(oid) => Ok(oid?.to_string()),
                None => Err(git2::Error::from_str("repository has no commits")),
            }
        })
        .await
    }

    async fn commits_since(&self, from: &str, paths: &[PathBuf]) -> Result<Vec<RawCommit>> {
        let from = from.to_string();
        let paths = paths.to_vec();
        self.with_repo(move |repo, prefix| {
            let mut revwalk = repo.revwalk()?;
            revwalk.set_sorting(Sort::TOPOLOGICAL)?;
            revwalk.push_head()?;
            revwalk.hide(resolve_commit(repo, &from)?)?;

            let pathspecs: Vec<String> = paths
                .iter()
                .map(|p| prefix.join(p).to_string_lossy().replace('\\', "/"))
                .collect();

            let mut commits = Vec::new();
            for oid in revwalk {
                let oid = oid?;
                if !pathspecs.is_empty() && !touches_paths(repo, oid, &pathspecs)? {
                    continue;
                }
                let commit = repo.find_commit(oid)?;
                let message = commit.message().unwrap_or_default().to_string();
                commits.push(RawCommit::new(oid.to_string(), message));
            }
            debug!("Found {} commits since {}", commits.len(), from);
            Ok(commits)
        })
        .await
    }
}

/// Tag names are looked up directly since `@` has a meaning in revspecs.
fn resolve_commit(repo: &Repository, reference: &str) -> std::result::Result<Oid, git2::Error> {
    if let Ok(tag) = repo.find_reference(&format!("refs/tags/{}", reference)) {
        return Ok(tag.peel_to_commit()?.id());
    }
    Ok(repo.revparse_single(reference)?.peel_to_commit()?.id())
}

fn touches_paths(
    repo: &Repository,
    oid: Oid,
    pathspecs: &[String],
) -> std::result::Result<bool, git2::Error> {
    let commit = repo.find_commit(oid)?;
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };

    let mut options = DiffOptions::new();
    for spec in pathspecs {
        options.pathspec(spec);
    }
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
    Ok(diff.deltas().len() > 0)
}

fn workspace_prefix(repo: &Repository, workspace_root: &Path) -> PathBuf {
    let Some(workdir) = repo.workdir() else {
        return PathBuf::new();
    };
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let root = workspace_root
        .canonicalize()
        .unwrap_or_else(|_| workspace_root.to_path_buf());
    root.strip_prefix(&workdir)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn git_error(e: git2::Error) -> Error {
    Error::Git(e.message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, path: &str, content: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap();
        let absolute = workdir.join(path);
        fs::create_dir_all(absolute.parent().unwrap()).unwrap();
        fs::write(&absolute, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();
        let parents: Vec<_> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )
        .unwrap()
    }

    fn tag(repo: &Repository, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    #[tokio::test]
    async fn test_commits_since_tag_filtered_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        let root = commit_file(&repo, "packages/lib/a.py", "a", "chore: init");
        tag(&repo, "lib@1.0.0", root);
        commit_file(&repo, "packages/lib/a.py", "b", "feat: new api");
        commit_file(&repo, "packages/app/main.py", "c", "fix: app crash");

        let client = Git2Client::new(temp_dir.path());
        let latest = client
            .latest_tag_for_pattern(&TagPattern::new("{projectName}@{version}"), "lib", "__default__")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.tag, "lib@1.0.0");

        let commits = client
            .commits_since("lib@1.0.0", &[PathBuf::from("packages/lib")])
            .await
            .unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message.trim(), "feat: new api");

        let all = client.commits_since("lib@1.0.0", &[]).await.unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(client.first_commit().await.unwrap(), root.to_string());
    }

    #[tokio::test]
    async fn test_no_matching_tag() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        let oid = commit_file(&repo, "README.md", "hi", "chore: init");
        tag(&repo, "other@1.0.0", oid);

        let client = Git2Client::new(temp_dir.path());
        let latest = client
            .latest_tag_for_pattern(&TagPattern::new("{projectName}@{version}"), "lib", "__default__")
            .await
            .unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_newest_of_several_matching_tags() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        let first = commit_file(&repo, "README.md", "a", "chore: init");
        tag(&repo, "lib@1.0.0", first);
        tag(&repo, "lib@1.0.1", first);
        tag(&repo, "app@9.0.0", first);

        let client = Git2Client::new(temp_dir.path());
        let latest = client
            .latest_tag_for_pattern(&TagPattern::new("{projectName}@{version}"), "lib", "__default__")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.tag, "lib@1.0.1");

        let none = client
            .latest_tag_for_pattern(&TagPattern::new("latest"), "lib", "__default__")
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
