/// Template catalog, rendering and materialization of S2I builder projects.
pub mod create;
