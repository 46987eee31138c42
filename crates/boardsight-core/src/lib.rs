//! Boardsight Core - conversational business intelligence over
//! external work-tracking boards
//!
//! This crate provides the core of the Boardsight application:
//! - Board data access and record normalization
//! - A fixed set of aggregation tools over deals and work orders
//! - Tool-call protocol parsing of model output
//! - The bounded orchestration loop that resolves a user turn
//!
//! The presentation shell drives the core through two entry points:
//! [`Agent::run_turn`] to resolve a user message into an answer plus
//! a trace log, and [`Config::missing_settings`] as the startup
//! precondition check.

pub mod agent;
pub mod board;
pub mod config;
pub mod error;
pub mod provider;
pub mod tools;

pub use agent::{Agent, Turn, TurnOutcome, TurnRole};
pub use board::{BoardClient, MondayClient, RawColumn, RawItem};
pub use config::Config;
pub use error::{Error, Result, ToolError};
pub use provider::{ChatModel, GenAiChat, PromptMessage, Role};
pub use tools::aggregate::Toolbox;
pub use tools::protocol::extract_tool_call;
pub use tools::{BoxFuture, RawToolCall, ToolCall, ToolOutput, ToolTrace};
