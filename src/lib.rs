//! codemend: autonomous code review over a local file tree.
//!
//! An LLM backend drives a tool-calling loop: it lists, reads and rewrites
//! files through host-exposed tools until it produces a final summary.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use codemend::agent_loop::{AgentLoop, RunOutcome};
//! use codemend::config::AgentConfig;
//! use codemend::provider::google::GoogleBackend;
//! use codemend::tools::{builtin, ToolRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> codemend::error::Result<()> {
//! let config = AgentConfig::load()?;
//! let backend = GoogleBackend::from_config(&config)?;
//!
//! let mut registry = ToolRegistry::new();
//! builtin::register_builtin_tools(&mut registry, &config.list_files)?;
//!
//! let agent = AgentLoop::from_config(Arc::new(backend), Arc::new(registry), &config);
//! let report = agent
//!     .run(codemend::prompt::review_instruction("."), CancellationToken::new())
//!     .await?;
//! if let RunOutcome::Completed { text } = report.outcome {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
