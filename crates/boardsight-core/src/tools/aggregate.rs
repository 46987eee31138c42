//! Aggregation tools over the deals and work orders boards
//!
//! Every tool fetches fresh records, normalizes them, and computes
//! its aggregates in one pass; nothing is cached between invocations.
//! Monetary columns are already expressed in crores at the source, so
//! sums are accumulated once here and never re-scaled downstream.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::board::normalize::{
    BoardRecord, DEAL_HEADER_SENTINELS, WORK_ORDER_HEADER_SENTINELS, is_header_leak,
    normalize_record,
};
use crate::board::{BoardClient, PAGE_LIMIT};
use crate::error::ToolError;

use super::{ToolCall, ToolOutput, ToolTrace};

// Deal board columns
const DEAL_SECTOR: &str = "Sector/service";
const DEAL_STAGE: &str = "Deal Stage";
const DEAL_STATUS: &str = "Deal Status";
const DEAL_VALUE: &str = "Masked Deal value";

// Work order board columns
const WO_SECTOR: &str = "Sector";
const WO_EXECUTION_STATUS: &str = "Execution Status";
const WO_BILLED: &str = "Billed Value Incl GST";
const WO_COLLECTED: &str = "Collected Amount";
const WO_RECEIVABLE: &str = "Amount Receivable";
const WO_CONTRACT_VALUE: &str = "Amount Incl GST";
const WO_UNBILLED: &str = "Amount to Bill Incl GST";
const WO_BILLING_STATUS: &str = "Billing Status";
const WO_INVOICE_STATUS: &str = "Invoice Status";

/// Source misspellings of "Billed" folded into the canonical bucket
const BILLED_VARIANTS: &[&str] = &["billed", "biled", "bllied"];

/// The executor behind every registered tool
///
/// Built once at startup and passed by reference into the
/// orchestration loop; dispatch over the [`ToolCall`] variants is the
/// registry lookup.
pub struct Toolbox {
    client: Arc<dyn BoardClient>,
    deals_board_id: String,
    work_orders_board_id: String,
}

impl Toolbox {
    /// Create a toolbox reading from the given board client.
    pub fn new(
        client: Arc<dyn BoardClient>,
        deals_board_id: impl Into<String>,
        work_orders_board_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            deals_board_id: deals_board_id.into(),
            work_orders_board_id: work_orders_board_id.into(),
        }
    }

    /// Execute one validated tool invocation.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        debug!(tool = call.name(), "executing tool");
        match call {
            ToolCall::GetWorkOrders { sector, status } => {
                self.get_work_orders(sector.as_deref(), status.as_deref())
                    .await
            }
            ToolCall::GetDeals {
                sector,
                stage,
                status,
            } => {
                self.get_deals(sector.as_deref(), stage.as_deref(), status.as_deref())
                    .await
            }
            ToolCall::PipelineSummary => self.pipeline_summary().await,
            ToolCall::SectorAnalysis { sector } => self.sector_analysis(sector).await,
            ToolCall::RevenueAnalysis => self.revenue_analysis().await,
        }
    }

    /// Human-readable label of the data source a tool reads from.
    pub fn board_label(&self, tool: &str) -> String {
        match tool {
            "get_work_orders" => format!("Work Orders (ID: {})", self.work_orders_board_id),
            "get_deals" => format!("Deals (ID: {})", self.deals_board_id),
            "pipeline_summary" | "sector_analysis" => "Both boards".into(),
            "revenue_analysis" => "Work Orders board".into(),
            _ => "Unknown".into(),
        }
    }

    async fn fetch_records(
        &self,
        board_id: &str,
        header_sentinels: &[&str],
    ) -> Result<Vec<BoardRecord>, ToolError> {
        let titles = self
            .client
            .column_titles(board_id)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let items = self
            .client
            .items(board_id, PAGE_LIMIT)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(items
            .iter()
            .map(|item| normalize_record(item, &titles))
            .filter(|record| !is_header_leak(&record.name, header_sentinels))
            .collect())
    }

    async fn fetch_deals(&self) -> Result<Vec<BoardRecord>, ToolError> {
        self.fetch_records(&self.deals_board_id, DEAL_HEADER_SENTINELS)
            .await
    }

    async fn fetch_work_orders(&self) -> Result<Vec<BoardRecord>, ToolError> {
        self.fetch_records(&self.work_orders_board_id, WORK_ORDER_HEADER_SENTINELS)
            .await
    }

    async fn get_work_orders(
        &self,
        sector: Option<&str>,
        status: Option<&str>,
    ) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::GetWorkOrders {
            sector: sector.map(str::to_string),
            status: status.map(str::to_string),
        };

        let mut records = self.fetch_work_orders().await?;
        records = filter_contains(records, WO_SECTOR, sector);
        records = filter_contains(records, WO_EXECUTION_STATUS, status);

        let trace = ToolTrace::new(call.name(), call.params_json(), self.board_label(call.name()))
            .with_records(records.len());
        Ok(ToolOutput {
            data: Value::Array(records.iter().map(BoardRecord::to_json).collect()),
            trace,
        })
    }

    async fn get_deals(
        &self,
        sector: Option<&str>,
        stage: Option<&str>,
        status: Option<&str>,
    ) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::GetDeals {
            sector: sector.map(str::to_string),
            stage: stage.map(str::to_string),
            status: status.map(str::to_string),
        };

        let mut records = self.fetch_deals().await?;
        records = filter_contains(records, DEAL_SECTOR, sector);
        records = filter_contains(records, DEAL_STAGE, stage);
        records = filter_contains(records, DEAL_STATUS, status);

        let trace = ToolTrace::new(call.name(), call.params_json(), self.board_label(call.name()))
            .with_records(records.len());
        Ok(ToolOutput {
            data: Value::Array(records.iter().map(BoardRecord::to_json).collect()),
            trace,
        })
    }

    async fn pipeline_summary(&self) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::PipelineSummary;
        let deals = self.fetch_deals().await?;
        let work_orders = self.fetch_work_orders().await?;

        let open_deals = deals
            .iter()
            .filter(|d| {
                d.get(DEAL_STATUS)
                    .is_some_and(|s| s.trim().eq_ignore_ascii_case("open"))
            })
            .count();

        let data = json!({
            "total_deals": deals.len(),
            "open_deals": open_deals,
            "total_deal_value": sum_money(&deals, DEAL_VALUE),
            "deal_stage_distribution": count_by(&deals, DEAL_STAGE),
            "deal_status_distribution": count_by(&deals, DEAL_STATUS),
            "total_work_orders": work_orders.len(),
            "wo_sector_distribution": count_by(&work_orders, WO_SECTOR),
            "wo_execution_status": count_by(&work_orders, WO_EXECUTION_STATUS),
            "total_billed_value": sum_money(&work_orders, WO_BILLED),
            "total_collected": sum_money(&work_orders, WO_COLLECTED),
            "total_receivable": sum_money(&work_orders, WO_RECEIVABLE),
        });

        let trace = ToolTrace::new(call.name(), call.params_json(), self.board_label(call.name()))
            .with_records(deals.len() + work_orders.len());
        Ok(ToolOutput { data, trace })
    }

    async fn sector_analysis(&self, sector: &str) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::SectorAnalysis {
            sector: sector.to_string(),
        };

        let deals = filter_contains(self.fetch_deals().await?, DEAL_SECTOR, Some(sector));
        let work_orders =
            filter_contains(self.fetch_work_orders().await?, WO_SECTOR, Some(sector));

        // A sector matching nothing still yields a full (empty) shape
        let data = json!({
            "sector": sector,
            "total_deals": deals.len(),
            "total_deal_value": sum_money(&deals, DEAL_VALUE),
            "deal_status_breakdown": count_by(&deals, DEAL_STATUS),
            "deal_stage_breakdown": count_by(&deals, DEAL_STAGE),
            "total_work_orders": work_orders.len(),
            "total_billed": sum_money(&work_orders, WO_BILLED),
            "total_receivable": sum_money(&work_orders, WO_RECEIVABLE),
            "total_collected": sum_money(&work_orders, WO_COLLECTED),
            "wo_status_breakdown": count_by(&work_orders, WO_EXECUTION_STATUS),
        });

        let trace = ToolTrace::new(call.name(), call.params_json(), self.board_label(call.name()))
            .with_records(deals.len() + work_orders.len());
        Ok(ToolOutput { data, trace })
    }

    async fn revenue_analysis(&self) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::RevenueAnalysis;
        let work_orders = self.fetch_work_orders().await?;

        let total_billed = sum_money(&work_orders, WO_BILLED);
        let total_collected = sum_money(&work_orders, WO_COLLECTED);

        let mut billing_status: BTreeMap<String, usize> = BTreeMap::new();
        let mut revenue_by_sector: BTreeMap<String, f64> = BTreeMap::new();
        for wo in &work_orders {
            let status = wo
                .get(WO_BILLING_STATUS)
                .or_else(|| wo.get(WO_INVOICE_STATUS))
                .unwrap_or("Unknown")
                .trim();
            let status = if BILLED_VARIANTS.contains(&status.to_lowercase().as_str()) {
                "Billed"
            } else {
                status
            };
            *billing_status.entry(status.to_string()).or_insert(0) += 1;

            *revenue_by_sector
                .entry(wo.category(WO_SECTOR).to_string())
                .or_insert(0.0) += wo.money(WO_BILLED);
        }

        let data = json!({
            "total_contract_value": sum_money(&work_orders, WO_CONTRACT_VALUE),
            "total_billed": total_billed,
            "total_collected": total_collected,
            "total_receivable": sum_money(&work_orders, WO_RECEIVABLE),
            "total_unbilled": sum_money(&work_orders, WO_UNBILLED),
            "collection_rate_pct": collection_rate(total_collected, total_billed),
            "billing_status_breakdown": billing_status,
            "revenue_by_sector": revenue_by_sector,
            "execution_status_breakdown": count_by(&work_orders, WO_EXECUTION_STATUS),
            "total_work_orders": work_orders.len(),
        });

        let trace = ToolTrace::new(call.name(), call.params_json(), self.board_label(call.name()))
            .with_records(work_orders.len());
        Ok(ToolOutput { data, trace })
    }
}

/// Keep records whose field contains the needle, case-insensitively.
/// Records without the field never match. `None` keeps everything.
fn filter_contains(
    records: Vec<BoardRecord>,
    field: &str,
    needle: Option<&str>,
) -> Vec<BoardRecord> {
    let Some(needle) = needle else {
        return records;
    };
    let needle = needle.to_lowercase();
    records
        .into_iter()
        .filter(|r| {
            r.get(field)
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Count records per category of one field, absent values bucketed
/// under `"Unknown"`.
fn count_by(records: &[BoardRecord], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.category(field).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Sum a monetary column across records.
fn sum_money(records: &[BoardRecord], field: &str) -> f64 {
    records.iter().map(|r| r.money(field)).sum()
}

/// Collected as a percentage of billed, one decimal place; zero when
/// nothing has been billed.
fn collection_rate(collected: f64, billed: f64) -> f64 {
    if billed > 0.0 {
        (collected / billed * 100.0 * 10.0).round() / 10.0
    } else {
        0.0
    }
}
