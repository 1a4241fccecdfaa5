use std::path::PathBuf;

use thiserror::Error;

use super::scaffold::ScaffoldReport;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Template '{0}' does not exist.")]
    TemplateNotFound(String),

    #[error("Template '{0}' is declared more than once.")]
    DuplicateTemplate(String),

    #[error("Template '{template}' references '{name}' but no value was supplied for it.")]
    UnresolvedPlaceholder { template: String, name: String },

    #[error("Templates '{first}' and '{second}' both claim '{}'.", .path.display())]
    PathConflict { path: PathBuf, first: String, second: String },

    #[error("Template '{template}' targets '{}' which is outside the project root.", .path.display())]
    PathEscape { template: String, path: PathBuf },

    #[error("No templates selected.")]
    EmptySelection,

    #[error("Cannot proceed: {} already exist(s): {}", .paths.len(), display_paths(.paths))]
    AlreadyExists { paths: Vec<PathBuf> },

    #[error("IO error on '{}': {source}.", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile template. Original error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    #[error("Failed to render. Original error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Invalid placeholder pattern. Original error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Scaffold request is invalid:\n{}", display_errors(.0))]
    Validation(Vec<Error>),

    /// A write failed part way through; `report` lists what was done before it.
    #[error("Scaffold stopped after {} file(s): {source}", .report.completed().count())]
    Interrupted {
        report: ScaffoldReport,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<String>>()
        .join(", ")
}

fn display_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<String>>()
        .join("\n")
}
