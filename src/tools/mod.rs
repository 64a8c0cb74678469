//! Tools the model can call, and their assembly into a [`ToolSet`].

pub mod arguments;
pub mod database;
pub mod plugin;
pub mod tool;
pub mod toolset;
pub mod types;
pub mod validation;
pub mod variable;
pub mod workflow;

pub use arguments::ToolArguments;
pub use database::DatabaseTool;
pub use plugin::PluginTool;
pub use tool::{Tool, ToolExecutionContext, ToolOutputStream};
pub use toolset::ToolSet;
pub use types::{ParameterBuilder, ToolParameters};
pub use validation::validate_arguments;
pub use variable::{VariableTool, SET_VARIABLE_TOOL};
pub use workflow::WorkflowTool;
