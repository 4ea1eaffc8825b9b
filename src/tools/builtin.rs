//! Built-in filesystem tools: `listFiles`, `readFile` and `writeFile`.
//!
//! Each tool is constructed via [`AgentTool::new`] and returned as
//! `Arc<dyn Tool>`. [`register_builtin_tools`] installs all three.
//!
//! ```rust
//! use codemend::tools::builtin::{register_builtin_tools, ListFilesOptions};
//! use codemend::tools::ToolRegistry;
//!
//! let mut registry = ToolRegistry::new();
//! register_builtin_tools(&mut registry, &ListFilesOptions::default()).unwrap();
//! assert_eq!(registry.len(), 3);
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::{AgentTool, Tool};
use super::types::ToolSpec;
use crate::error::AgentError;

/// The fixed set of host-exposed tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum BuiltinTool {
    ListFiles,
    ReadFile,
    WriteFile,
}

impl BuiltinTool {
    pub fn spec(self) -> ToolSpec {
        match self {
            Self::ListFiles => ToolSpec::new(self.to_string(), "List all files in a directory")
                .string("directory", "The directory to scan for files", true),
            Self::ReadFile => ToolSpec::new(self.to_string(), "Read the content of a file")
                .string("filePath", "The path of the file to read", true),
            Self::WriteFile => ToolSpec::new(self.to_string(), "Write content to a file")
                .string("filePath", "The path of the file to write", true)
                .string("content", "The content to write to the file", true),
        }
    }

    pub fn tool(self, list_options: &ListFilesOptions) -> Arc<dyn Tool> {
        match self {
            Self::ListFiles => list_files_tool(list_options.clone()),
            Self::ReadFile => read_file_tool(),
            Self::WriteFile => write_file_tool(),
        }
    }
}

/// Register every [`BuiltinTool`] in declaration order.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    list_options: &ListFilesOptions,
) -> Result<(), AgentError> {
    for builtin in BuiltinTool::iter() {
        registry.register_tool(builtin.tool(list_options))?;
    }
    Ok(())
}

/// Filters applied by `listFiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFilesOptions {
    /// Allowed extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Directory names skipped at any depth.
    pub excluded_dirs: Vec<String>,
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for ListFilesOptions {
    fn default() -> Self {
        Self {
            extensions: ["js", "html", "css", "json", "md", "jsx", "ts", "tsx"]
                .map(String::from)
                .to_vec(),
            excluded_dirs: ["node_modules", ".git", "build", "dist"]
                .map(String::from)
                .to_vec(),
            max_depth: 32,
            follow_symlinks: false,
        }
    }
}

impl ListFilesOptions {
    fn allows_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| ext == OsStr::new(allowed.trim_start_matches('.')))
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        self.excluded_dirs.iter().any(|dir| name == OsStr::new(dir))
    }
}

/// Create the `listFiles` tool.
///
/// Returns a JSON array of paths in traversal order.
pub fn list_files_tool(options: ListFilesOptions) -> Arc<dyn Tool> {
    let options = Arc::new(options);
    Arc::new(AgentTool::new(
        BuiltinTool::ListFiles.spec(),
        move |args: ToolArguments| {
            let options = Arc::clone(&options);
            async move {
                let directory = PathBuf::from(args.get_str("directory")?);

                let metadata = tokio::fs::metadata(&directory)
                    .await
                    .map_err(|e| AgentError::from_io(&directory, e))?;
                if !metadata.is_dir() {
                    return Err(AgentError::PathError {
                        path: directory,
                        message: "not a directory".into(),
                    });
                }

                let files = tokio::task::spawn_blocking(move || walk_files(&directory, &options))
                    .await
                    .map_err(|e| {
                        AgentError::tool(BuiltinTool::ListFiles.to_string(), e.to_string())
                    })?;

                Ok(serde_json::Value::from(files))
            }
        },
    ))
}

fn walk_files(root: &Path, options: &ListFilesOptions) -> Vec<String> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .max_depth(Some(options.max_depth));

    let filter_options = options.clone();
    builder.filter_entry(move |entry| {
        entry.depth() == 0 || !filter_options.is_excluded(entry.file_name())
    });

    let mut files = Vec::new();
    for entry in builder.build() {
        match entry {
            Ok(entry) => {
                if !entry
                    .file_type()
                    .map(|file_type| file_type.is_file())
                    .unwrap_or(false)
                {
                    continue;
                }
                if !options.allows_extension(entry.path()) {
                    continue;
                }
                files.push(entry.path().to_string_lossy().into_owned());
            }
            Err(error) => {
                tracing::warn!(
                    root = %root.display(),
                    %error,
                    "skipping entry while listing files"
                );
            }
        }
    }
    files
}

/// Create the `readFile` tool. Returns the file's full UTF-8 text.
pub fn read_file_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        BuiltinTool::ReadFile.spec(),
        |args: ToolArguments| async move {
            let path = PathBuf::from(args.get_str("filePath")?);

            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|e| AgentError::from_io(&path, e))?;
            if metadata.is_dir() {
                return Err(AgentError::IsADirectory(path));
            }

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| AgentError::from_io(&path, e))?;
            let content = String::from_utf8(bytes).map_err(|e| {
                AgentError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("{}: {e}", path.display()),
                ))
            })?;

            Ok(serde_json::Value::String(content))
        },
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteFileArgs {
    file_path: PathBuf,
    content: String,
}

/// Create the `writeFile` tool.
///
/// Overwrites or creates the file. The parent directory must already exist.
/// Exempt from the executor timeout: the write runs on the blocking pool and
/// would land on disk after a reported timeout.
pub fn write_file_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        BuiltinTool::WriteFile.spec(),
        |args: ToolArguments| async move {
            let WriteFileArgs { file_path, content } = args.deserialize()?;

            if let Ok(metadata) = tokio::fs::metadata(&file_path).await {
                if metadata.is_dir() {
                    return Err(AgentError::IsADirectory(file_path));
                }
            }

            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await? {
                    let message = format!("parent directory {} does not exist", parent.display());
                    return Err(AgentError::PathError {
                        path: file_path.clone(),
                        message,
                    });
                }
            }

            let bytes = content.len();
            tokio::fs::write(&file_path, content)
                .await
                .map_err(|e| AgentError::from_io(&file_path, e))?;

            Ok(serde_json::json!({
                "success": true,
                "path": file_path.to_string_lossy(),
                "bytesWritten": bytes,
            }))
        },
    )
    .without_timeout())
}
