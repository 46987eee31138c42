//! Tool system for the Boardsight agent
//!
//! The model requests data by emitting a tool invocation; this module
//! defines the closed set of invocations the agent will execute, the
//! validation from raw model output into that set, and the trace
//! record every execution produces for observability.

pub mod aggregate;
pub mod protocol;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ToolError;

/// Boxed future type for object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A tool invocation exactly as the model emitted it, before
/// validation against the registered tool set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawToolCall {
    /// Requested tool name
    pub tool: String,
    /// Raw parameter object
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A validated tool invocation
///
/// This is the whole tool registry: a closed set of variants with
/// explicitly named parameters, built once from a [`RawToolCall`] at
/// the parser boundary. Unknown tools and mistyped parameters are
/// rejected here, before any aggregation logic runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Work order listing, optionally filtered by sector and
    /// execution status
    GetWorkOrders {
        sector: Option<String>,
        status: Option<String>,
    },
    /// Deal listing, optionally filtered by sector, stage, and status
    GetDeals {
        sector: Option<String>,
        stage: Option<String>,
        status: Option<String>,
    },
    /// Full pipeline overview across both boards
    PipelineSummary,
    /// Deep dive into one sector across both boards
    SectorAnalysis { sector: String },
    /// Billing, collection, and receivables analysis over work orders
    RevenueAnalysis,
}

impl ToolCall {
    /// Validate a raw invocation against the closed tool set.
    ///
    /// Unknown tool names come back as [`ToolError::NotFound`] so the
    /// loop can apply its permissive fallback; unknown or non-string
    /// parameters are [`ToolError::InvalidParams`].
    pub fn validate(raw: &RawToolCall) -> Result<Self, ToolError> {
        match raw.tool.as_str() {
            "get_work_orders" => {
                reject_unknown_params(&raw.params, &["sector", "status"])?;
                Ok(Self::GetWorkOrders {
                    sector: string_param(&raw.params, "sector")?,
                    status: string_param(&raw.params, "status")?,
                })
            }
            "get_deals" => {
                reject_unknown_params(&raw.params, &["sector", "stage", "status"])?;
                Ok(Self::GetDeals {
                    sector: string_param(&raw.params, "sector")?,
                    stage: string_param(&raw.params, "stage")?,
                    status: string_param(&raw.params, "status")?,
                })
            }
            "pipeline_summary" => {
                reject_unknown_params(&raw.params, &[])?;
                Ok(Self::PipelineSummary)
            }
            "sector_analysis" => {
                reject_unknown_params(&raw.params, &["sector"])?;
                let sector = string_param(&raw.params, "sector")?.ok_or_else(|| {
                    ToolError::InvalidParams("sector_analysis requires a 'sector' parameter".into())
                })?;
                Ok(Self::SectorAnalysis { sector })
            }
            "revenue_analysis" => {
                reject_unknown_params(&raw.params, &[])?;
                Ok(Self::RevenueAnalysis)
            }
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }

    /// Registered name of this tool
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetWorkOrders { .. } => "get_work_orders",
            Self::GetDeals { .. } => "get_deals",
            Self::PipelineSummary => "pipeline_summary",
            Self::SectorAnalysis { .. } => "sector_analysis",
            Self::RevenueAnalysis => "revenue_analysis",
        }
    }

    /// Parameters as a JSON object, for trace records
    pub fn params_json(&self) -> Value {
        match self {
            Self::GetWorkOrders { sector, status } => {
                json!({ "sector": sector, "status": status })
            }
            Self::GetDeals {
                sector,
                stage,
                status,
            } => json!({ "sector": sector, "stage": stage, "status": status }),
            Self::PipelineSummary | Self::RevenueAnalysis => json!({}),
            Self::SectorAnalysis { sector } => json!({ "sector": sector }),
        }
    }
}

fn string_param(params: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::InvalidParams(format!(
            "parameter '{key}' must be a string, got {other}"
        ))),
    }
}

fn reject_unknown_params(params: &Map<String, Value>, allowed: &[&str]) -> Result<(), ToolError> {
    for key in params.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ToolError::InvalidParams(format!(
                "unknown parameter '{key}'"
            )));
        }
    }
    Ok(())
}

/// Audit record of one tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Tool name
    pub tool: String,
    /// Parameters the tool ran with
    pub params: Value,
    /// Logical data source the tool read from
    pub board: String,
    /// Number of records the computation was based on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_returned: Option<usize>,
    /// Error text when the invocation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolTrace {
    /// Trace for a successful invocation (record count added once known).
    pub fn new(tool: impl Into<String>, params: Value, board: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            params,
            board: board.into(),
            records_returned: None,
            error: None,
        }
    }

    /// Attach the record count the computation was based on.
    pub fn with_records(mut self, count: usize) -> Self {
        self.records_returned = Some(count);
        self
    }

    /// Trace for a failed invocation.
    pub fn failed(
        tool: impl Into<String>,
        params: Value,
        board: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            params,
            board: board.into(),
            records_returned: None,
            error: Some(error.into()),
        }
    }
}

/// Output from a tool execution: the data payload handed back to the
/// model plus the trace handed back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    /// Aggregate metrics for the model to analyze
    pub data: Value,
    /// Audit record for the trace log
    pub trace: ToolTrace,
}
