pub mod error;
pub mod registry;
pub mod render;
pub mod scaffold;
pub mod templates;
pub mod utils;

pub use error::{Error, Result};
pub use registry::{Group, Mode, Registry, Template};
pub use render::{RenderContext, Renderer, IMAGE_NAME};
pub use scaffold::{
    FileReport, Materializer, OverwritePolicy, Outcome, ScaffoldReport, ScaffoldRequest, Selection,
};
