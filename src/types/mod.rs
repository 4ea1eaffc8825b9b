//! Core types for codemend.

pub mod generation;
pub mod message;

pub use generation::*;
pub use message::*;
