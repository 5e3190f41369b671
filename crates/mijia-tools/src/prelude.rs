//! Convenience re-exports for common `mijia-tools` types.
//!
//! Meant to be glob-imported by agent programs:
//!
//! ```ignore
//! use mijia_tools::prelude::*;
//! ```
//!
//! This pulls in the registry, tool declaration types, the device adapter
//! trait with its in-memory implementation, and configuration loading.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{HandlerError, ToolDef, ToolError, json_schema_for};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{
    ExecutionResult, ParamType, ToolDefinition, ToolHandler, ToolParameter, ToolRegistry,
};

// ── Devices ─────────────────────────────────────────────────────────
pub use crate::device::memory::MemoryAdapter;
pub use crate::device::tools::DeviceToolsExt;
pub use crate::device::{DeviceAdapter, DeviceError};

// ── Configuration ───────────────────────────────────────────────────
pub use crate::config::MijiaConfig;
