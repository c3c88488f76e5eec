#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use polyver_core::{
    DependencyCollection, Error, GitClient, LockfileUpdater, LogLine, MatchingTag,
    MemoryManifestStore, ProjectColor, ProjectGraph, ProjectNode, Prompter, RawCommit,
    RegistryClient, Result, TagPattern, VersionPlan, VersionPlanStore, VersionReporter,
};

pub fn manifest_path(project: &str) -> PathBuf {
    PathBuf::from(format!("packages/{}/pyproject.toml", project))
}

struct TestProject {
    name: String,
    version: String,
    dependencies: Vec<(String, String)>,
}

/// Builds an in-memory Poetry workspace under `packages/<name>`.
#[derive(Default)]
pub struct WorkspaceBuilder {
    projects: Vec<TestProject>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, name: &str, version: &str) -> Self {
        self.projects.push(TestProject {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: Vec::new(),
        });
        self
    }

    /// `name` gets a path dependency on `target` with the given requirement.
    pub fn depends_on(mut self, name: &str, target: &str, requirement: &str) -> Self {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.name == name)
            .expect("project declared before its dependencies");
        project
            .dependencies
            .push((target.to_string(), requirement.to_string()));
        self
    }

    pub fn build(self) -> (ProjectGraph, MemoryManifestStore) {
        let mut store = MemoryManifestStore::new();
        let mut nodes = Vec::new();

        for project in &self.projects {
            let mut content = format!(
                "[tool.poetry]\nname = \"{}\"\nversion = \"{}\"\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\n",
                project.name, project.version
            );
            for (target, requirement) in &project.dependencies {
                content.push_str(&format!(
                    "{} = {{ path = \"../{}\", develop = true, version = \"{}\" }}\n",
                    target, target, requirement
                ));
            }
            store.insert(manifest_path(&project.name), &content).unwrap();
            nodes.push(ProjectNode::new(
                project.name.clone(),
                format!("packages/{}", project.name),
                project.dependencies.iter().map(|(t, _)| t.clone()).collect(),
            ));
        }

        let graph = ProjectGraph::new("/workspace", nodes).unwrap();
        (graph, store)
    }
}

pub fn version_of(store: &MemoryManifestStore, project: &str) -> String {
    store
        .get(&manifest_path(project))
        .unwrap()
        .version()
        .unwrap()
        .to_string()
}

pub fn requirement_of(store: &MemoryManifestStore, project: &str, dependency: &str) -> String {
    store
        .get(&manifest_path(project))
        .unwrap()
        .dependency(DependencyCollection::Main, None, dependency)
        .unwrap()
        .version()
        .unwrap()
        .to_string()
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Git double: tags are listed newest first, commits are keyed by path.
#[derive(Default)]
pub struct FakeGit {
    pub tags: Vec<String>,
    pub first_commit: String,
    pub commits: HashMap<PathBuf, Vec<RawCommit>>,
    pub requested_refs: Arc<Mutex<Vec<String>>>,
}

impl FakeGit {
    pub fn with_tags(tags: &[&str]) -> Self {
        Self {
            tags: names(tags),
            first_commit: "0000000".to_string(),
            ..Default::default()
        }
    }

    pub fn commit(mut self, path: &str, message: &str) -> Self {
        let commits = self.commits.entry(PathBuf::from(path)).or_default();
        let hash = format!("{:07}", commits.len() + 1);
        commits.push(RawCommit::new(hash, message));
        self
    }
}

#[async_trait]
impl GitClient for FakeGit {
    async fn latest_tag_for_pattern(
        &self,
        pattern: &TagPattern,
        project_name: &str,
        group_name: &str,
    ) -> Result<Option<MatchingTag>> {
        Ok(self
            .tags
            .iter()
            .find_map(|tag| pattern.match_tag(tag, project_name, group_name)))
    }

    async fn first_commit(&self) -> Result<String> {
        Ok(self.first_commit.clone())
    }

    async fn commits_since(&self, from: &str, paths: &[PathBuf]) -> Result<Vec<RawCommit>> {
        self.requested_refs.lock().unwrap().push(from.to_string());
        let mut result = Vec::new();
        for path in paths {
            if let Some(commits) = self.commits.get(path) {
                result.extend(commits.iter().cloned());
            }
        }
        Ok(result)
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    pub versions: HashMap<String, String>,
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn current_published_version(&self, package: &str, _registry: &str) -> Result<String> {
        self.versions
            .get(package)
            .cloned()
            .ok_or_else(|| Error::Registry {
                package: package.to_string(),
                message: "404 Not Found".to_string(),
            })
    }
}

/// Answers prompts from a script and records the questions.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub selections: Mutex<VecDeque<Option<usize>>>,
    pub inputs: Mutex<VecDeque<String>>,
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn selecting(selections: &[Option<usize>]) -> Self {
        Self {
            selections: Mutex::new(selections.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn typing(mut self, input: &str) -> Self {
        self.inputs.get_mut().unwrap().push_back(input.to_string());
        self
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn select(&self, message: &str, _items: &[String]) -> Result<Option<usize>> {
        self.messages.lock().unwrap().push(message.to_string());
        self.selections
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Prompt("no scripted selection left".to_string()))
    }

    async fn input(&self, message: &str) -> Result<String> {
        self.messages.lock().unwrap().push(message.to_string());
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Prompt("no scripted input left".to_string()))
    }
}

#[derive(Default, Clone)]
pub struct RecordingLockfile {
    pub calls: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl LockfileUpdater for RecordingLockfile {
    async fn regenerate(&self, cwd: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(cwd.to_path_buf());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryPlanStore {
    pub plans: Vec<VersionPlan>,
    pub deleted: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryPlanStore {
    pub fn independent(mut self, file: &str, bumps: &[(&str, &str)]) -> Self {
        self.plans.push(VersionPlan {
            absolute_path: PathBuf::from(format!("/workspace/.polyver/version-plans/{}", file)),
            relative_path: format!(".polyver/version-plans/{}", file),
            project_version_bumps: Some(
                bumps
                    .iter()
                    .map(|(p, b)| (p.to_string(), b.to_string()))
                    .collect(),
            ),
            group_version_bump: None,
        });
        self
    }
}

impl VersionPlanStore for MemoryPlanStore {
    fn load(&self) -> Result<Vec<VersionPlan>> {
        Ok(self.plans.clone())
    }

    fn delete(&self, absolute_path: &Path) -> Result<()> {
        self.deleted.lock().unwrap().push(absolute_path.to_path_buf());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingReporter {
    pub flushed: Arc<Mutex<Vec<(String, Vec<LogLine>)>>>,
}

impl RecordingReporter {
    pub fn projects(&self) -> Vec<String> {
        self.flushed
            .lock()
            .unwrap()
            .iter()
            .map(|(project, _)| project.clone())
            .collect()
    }

    pub fn lines_for(&self, project: &str) -> Vec<LogLine> {
        self.flushed
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == project)
            .flat_map(|(_, lines)| lines.clone())
            .collect()
    }
}

impl VersionReporter for RecordingReporter {
    fn flush(&self, project: &str, _color: ProjectColor, lines: &[LogLine]) {
        self.flushed
            .lock()
            .unwrap()
            .push((project.to_string(), lines.to_vec()));
    }
}
