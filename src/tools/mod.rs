//! Tool system for function calling.

pub mod arguments;
pub mod builtin;
pub mod executor;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use builtin::{register_builtin_tools, BuiltinTool, ListFilesOptions};
pub use executor::{ToolExecutor, DEFAULT_TOOL_TIMEOUT};
pub use registry::ToolRegistry;
pub use tool::{AgentTool, Tool};
pub use types::{ParameterKind, ToolParameter, ToolSpec};
