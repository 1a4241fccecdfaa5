use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::templates;

/// Permission bits a generated file receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Executable,
    Regular,
}

impl Mode {
    pub fn bits(&self) -> u32 {
        match self {
            Mode::Executable => 0o755,
            Mode::Regular => 0o644,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Executable => write!(f, "executable"),
            Mode::Regular => write!(f, "regular"),
        }
    }
}

/// Optional sets of templates a request can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Dockerfile, README and the S2I lifecycle scripts.
    Builder,
    /// Integration test script, Makefile and the sample application.
    Tests,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Builder => write!(f, "builder"),
            Group::Tests => write!(f, "tests"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub body: String,
    /// Location of the generated file, relative to the project root.
    pub path: PathBuf,
    pub mode: Mode,
    pub group: Group,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        body: impl Into<String>,
        path: impl Into<PathBuf>,
        mode: Mode,
        group: Group,
    ) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            path: path.into(),
            mode,
            group,
        }
    }
}

/// Immutable catalog of templates, kept in declaration order.
#[derive(Debug, Clone)]
pub struct Registry {
    templates: Vec<Template>,
}

impl Registry {
    pub fn new(templates: Vec<Template>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in templates.iter() {
            if !seen.insert(t.name.as_str()) {
                return Err(Error::DuplicateTemplate(t.name.clone()));
            }
        }
        Ok(Self { templates })
    }

    /// The stock S2I builder image catalog.
    pub fn builtin() -> Self {
        use Group::{Builder, Tests};
        use Mode::{Executable, Regular};

        Self {
            templates: vec![
                Template::new("dockerfile", templates::DOCKERFILE, "Dockerfile", Regular, Builder),
                Template::new("readme", templates::README, "README.md", Regular, Builder),
                Template::new(
                    "assemble-script",
                    templates::ASSEMBLE_SCRIPT,
                    "s2i/bin/assemble",
                    Executable,
                    Builder,
                ),
                Template::new("run-script", templates::RUN_SCRIPT, "s2i/bin/run", Executable, Builder),
                Template::new(
                    "usage-script",
                    templates::USAGE_SCRIPT,
                    "s2i/bin/usage",
                    Executable,
                    Builder,
                ),
                Template::new(
                    "save-artifacts-script",
                    templates::SAVE_ARTIFACTS_SCRIPT,
                    "s2i/bin/save-artifacts",
                    Executable,
                    Builder,
                ),
                Template::new(
                    "test-run-script",
                    templates::TEST_RUN_SCRIPT,
                    "test/run",
                    Executable,
                    Tests,
                ),
                Template::new("makefile", templates::MAKEFILE, "Makefile", Regular, Tests),
                Template::new(
                    "index-html",
                    templates::INDEX_HTML,
                    "test/test-app/index.html",
                    Regular,
                    Tests,
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))
    }

    pub fn list<F>(&self, filter: F) -> Vec<&Template>
    where
        F: Fn(&Template) -> bool,
    {
        self.templates.iter().filter(|t| filter(t)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }
}
