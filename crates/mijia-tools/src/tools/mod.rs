//! Declarative tools for LLM function-calling agents.
//!
//! A tool is a [`ToolDefinition`]: a name, a description, an ordered list of
//! [`ToolParameter`]s, a category, and an optional [`ToolHandler`]. Tools are
//! collected into a [`ToolRegistry`], which exports their schemas and
//! dispatches calls with validation.
//!
//! # Defining tools
//!
//! - **Manual declaration:** build a [`ToolDefinition`] with
//!   [`ToolParameter`]s and attach a handler. Use this when a parameter needs
//!   an enum, bounds, or a type the argument struct can't express.
//! - **[`ToolDefinition::from_fn`]:** derive the name from the function and
//!   the parameters from a `#[derive(Deserialize, JsonSchema)]` argument
//!   struct.
//!
//! # Submodules
//!
//! - [`param`]: [`ParamType`] and [`ToolParameter`].
//! - [`definition`]: [`ToolDefinition`], [`ToolHandler`], [`FnToolBuilder`].
//! - [`registry`]: [`ToolRegistry`], [`ExecutionResult`], validation.
//! - [`names`]: tool name constants.

pub mod definition;
pub mod names;
pub mod param;
pub mod registry;

pub use definition::{DEFAULT_CATEGORY, FnToolBuilder, ToolDefinition, ToolFuture, ToolHandler};
pub use param::{ParamType, ToolParameter};
pub use registry::{ExecutionResult, SchemaFormat, ToolRegistry, validate_parameters};
