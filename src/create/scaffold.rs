use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::registry::{Group, Mode, Registry, Template};
use super::render::{RenderContext, Renderer};
use super::utils;

/// What to do when a generated file is already on disk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Refuse the whole request if any target exists.
    #[default]
    #[value(alias = "fail")]
    FailIfExists,
    /// Leave existing files untouched.
    #[value(alias = "skip")]
    SkipIfExists,
    /// Replace existing files.
    Overwrite,
}

/// Which templates of the registry a request renders.
///
/// Explicit `names` take precedence over `groups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub groups: Vec<Group>,
    pub names: Vec<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            groups: vec![Group::Builder, Group::Tests],
            names: vec![],
        }
    }
}

impl Selection {
    pub fn groups(groups: Vec<Group>) -> Self {
        Self { groups, names: vec![] }
    }

    pub fn named(names: Vec<String>) -> Self {
        Self { groups: vec![], names }
    }

    pub fn without(mut self, group: Group) -> Self {
        self.groups.retain(|g| *g != group);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub root: PathBuf,
    pub selection: Selection,
    pub context: RenderContext,
    pub policy: OverwritePolicy,
    pub dry_run: bool,
}

impl ScaffoldRequest {
    pub fn new(root: impl Into<PathBuf>, context: RenderContext) -> Self {
        Self {
            root: root.into(),
            selection: Selection::default(),
            context,
            policy: OverwritePolicy::default(),
            dry_run: false,
        }
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn policy(mut self, policy: OverwritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Skipped,
    Overwritten,
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Overwritten => write!(f, "overwritten"),
            Outcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub template: String,
    pub path: PathBuf,
    pub mode: Mode,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
}

impl ScaffoldReport {
    fn new(root: &Path, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
            files: vec![],
        }
    }

    /// Files that were handled without error, including skipped ones.
    pub fn completed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| !matches!(f.outcome, Outcome::Failed(_)))
    }

    pub fn count(&self, outcome: &Outcome) -> usize {
        self.files.iter().filter(|f| &f.outcome == outcome).count()
    }
}

// A template that passed validation, rendered and ready to write.
#[derive(Debug)]
struct Planned {
    template: String,
    target: PathBuf,
    mode: Mode,
    content: String,
    exists: bool,
}

impl Planned {
    fn report(&self, outcome: Outcome) -> FileReport {
        FileReport {
            template: self.template.clone(),
            path: self.target.clone(),
            mode: self.mode,
            outcome,
        }
    }
}

/// Turns scaffold requests into files on disk.
///
/// Every request is validated in full before the first write: unknown
/// template names, paths leaving the root, two templates whose paths overlap,
/// unresolved placeholders and (under `FailIfExists`) existing targets are all
/// reported together. Writes then happen one file at a time in declaration
/// order and stop at the first failure.
pub struct Materializer {
    registry: Registry,
    renderer: Renderer,
}

impl Materializer {
    pub fn new(registry: Registry) -> Result<Self> {
        let renderer = Renderer::new(&registry)?;
        Ok(Self { registry, renderer })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn generate(&self, request: &ScaffoldRequest) -> Result<ScaffoldReport> {
        let root = utils::absolute(&request.root).map_err(|e| Error::io(&request.root, e))?;
        let planned = self.validate(&root, request)?;

        if request.dry_run {
            return Ok(self.preview(&root, planned, request.policy));
        }

        info!(
            "Generating {} file(s) in {}",
            planned.len(),
            root.display()
        );
        let mut report = ScaffoldReport::new(&root, false);
        for p in planned {
            match self.write(&p, request.policy) {
                Ok(outcome) => {
                    info!("{} {}", outcome, p.target.display());
                    report.files.push(p.report(outcome));
                }
                Err(e) => {
                    warn!("Failed to write {}: {}", p.target.display(), e);
                    report.files.push(p.report(Outcome::Failed(e.to_string())));
                    return Err(Error::Interrupted {
                        report,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(report)
    }

    fn select(&self, selection: &Selection, errors: &mut Vec<Error>) -> Vec<&Template> {
        if selection.names.is_empty() {
            return self.registry.list(|t| selection.groups.contains(&t.group));
        }
        for name in selection.names.iter() {
            if let Err(e) = self.registry.get(name) {
                errors.push(e);
            }
        }
        self.registry.list(|t| selection.names.contains(&t.name))
    }

    fn validate(&self, root: &Path, request: &ScaffoldRequest) -> Result<Vec<Planned>> {
        let mut errors = Vec::new();
        let selected = self.select(&request.selection, &mut errors);
        debug!(
            "Selected templates: {:?}",
            selected.iter().map(|t| t.name.as_str()).collect::<Vec<&str>>()
        );

        if selected.is_empty() && errors.is_empty() {
            return Err(Error::EmptySelection);
        }

        // A target that is a parent directory of another target is a conflict too.
        let mut targets: Vec<(PathBuf, &str)> = Vec::new();
        let mut existing = Vec::new();
        let mut planned = Vec::new();

        for template in selected {
            let Some(relative) = utils::normalize_relative(&template.path) else {
                errors.push(Error::PathEscape {
                    template: template.name.clone(),
                    path: template.path.clone(),
                });
                continue;
            };

            let claimed = targets
                .iter()
                .find(|(taken, _)| relative.starts_with(taken) || taken.starts_with(&relative));
            if let Some((taken, first)) = claimed {
                let path = if relative.starts_with(taken) {
                    taken.clone()
                } else {
                    relative
                };
                errors.push(Error::PathConflict {
                    path,
                    first: first.to_string(),
                    second: template.name.clone(),
                });
                continue;
            }
            targets.push((relative.clone(), template.name.as_str()));

            let missing = self.renderer.missing(template, &request.context);
            if !missing.is_empty() {
                errors.extend(missing.into_iter().map(|name| Error::UnresolvedPlaceholder {
                    template: template.name.clone(),
                    name,
                }));
                continue;
            }
            let content = match self.renderer.render(template, &request.context) {
                Ok(content) => content,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            let target = root.join(&relative);
            match utils::leaves_root(root, &target) {
                Ok(false) => {}
                Ok(true) => {
                    errors.push(Error::PathEscape {
                        template: template.name.clone(),
                        path: template.path.clone(),
                    });
                    continue;
                }
                Err(e) => {
                    errors.push(Error::io(&target, e));
                    continue;
                }
            }
            let exists = utils::exists(&target);
            if exists && request.policy == OverwritePolicy::FailIfExists {
                existing.push(target.clone());
            }
            planned.push(Planned {
                template: template.name.clone(),
                target,
                mode: template.mode,
                content,
                exists,
            });
        }

        if !existing.is_empty() {
            errors.push(Error::AlreadyExists { paths: existing });
        }
        match errors.len() {
            0 => Ok(planned),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Validation(errors)),
        }
    }

    fn preview(&self, root: &Path, planned: Vec<Planned>, policy: OverwritePolicy) -> ScaffoldReport {
        let mut report = ScaffoldReport::new(root, true);
        for p in planned {
            let outcome = match (p.exists, policy) {
                (false, _) => Outcome::Created,
                (true, OverwritePolicy::Overwrite) => Outcome::Overwritten,
                // FailIfExists with an existing target never passes validation.
                (true, _) => Outcome::Skipped,
            };
            debug!("[DRY RUN] {} {}", outcome, p.target.display());
            report.files.push(p.report(outcome));
        }
        report
    }

    fn write(&self, planned: &Planned, policy: OverwritePolicy) -> Result<Outcome> {
        if let Some(parent) = planned.target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        // The target may have appeared since validation.
        let outcome = match (utils::exists(&planned.target), policy) {
            (false, _) => Outcome::Created,
            (true, OverwritePolicy::SkipIfExists) => return Ok(Outcome::Skipped),
            (true, OverwritePolicy::Overwrite) => Outcome::Overwritten,
            (true, OverwritePolicy::FailIfExists) => {
                return Err(Error::AlreadyExists {
                    paths: vec![planned.target.clone()],
                })
            }
        };

        let replace = outcome == Outcome::Overwritten;
        utils::write_atomic(&planned.target, &planned.content, planned.mode, replace)
            .map_err(|e| Error::io(&planned.target, e))?;
        Ok(outcome)
    }
}
