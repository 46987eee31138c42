//! Aggregation tool integration tests
//!
//! Runs the full toolbox against in-memory boards and checks the
//! computed payloads, traces, and normalization behavior end to end.

use std::collections::HashMap;
use std::sync::Arc;

use boardsight_core::{BoardClient, BoxFuture, RawColumn, RawItem, Result, ToolCall, Toolbox};
use serde_json::json;

const DEALS_BOARD: &str = "100";
const WORK_ORDERS_BOARD: &str = "200";

/// In-memory board with fixed items and an optional title map
struct StaticBoard {
    titles: HashMap<String, String>,
    deals: Vec<RawItem>,
    work_orders: Vec<RawItem>,
}

impl BoardClient for StaticBoard {
    fn column_titles<'a>(
        &'a self,
        _board_id: &'a str,
    ) -> BoxFuture<'a, Result<HashMap<String, String>>> {
        let titles = self.titles.clone();
        Box::pin(async move { Ok(titles) })
    }

    fn items<'a>(&'a self, board_id: &'a str, _limit: usize) -> BoxFuture<'a, Result<Vec<RawItem>>> {
        let items = if board_id == DEALS_BOARD {
            self.deals.clone()
        } else {
            self.work_orders.clone()
        };
        Box::pin(async move { Ok(items) })
    }
}

fn item(name: &str, columns: &[(&str, &str)]) -> RawItem {
    RawItem {
        id: "1".to_string(),
        name: name.to_string(),
        column_values: columns
            .iter()
            .map(|(id, text)| RawColumn {
                id: (*id).to_string(),
                text: Some((*text).to_string()),
            })
            .collect(),
    }
}

/// Six deals (plus a leaked header row), four work orders. Column ids
/// double as titles.
fn sample_board() -> StaticBoard {
    StaticBoard {
        titles: HashMap::new(),
        deals: vec![
            item(
                "Metro Tunnel",
                &[
                    ("Deal Status", "Open"),
                    ("Deal Stage", "Feasibility"),
                    ("Sector/service", "Mining"),
                    ("Masked Deal value", "10.5"),
                ],
            ),
            item(
                "Signal Upgrade",
                &[
                    ("Deal Status", "Open"),
                    ("Deal Stage", "Negotiations"),
                    ("Sector/service", "Railways"),
                    ("Masked Deal value", "2"),
                ],
            ),
            item(
                "Ore Conveyor",
                &[
                    ("Deal Status", "Open"),
                    ("Deal Stage", "Feasibility"),
                    ("Sector/service", "Mining"),
                    ("Masked Deal value", "N/A"),
                ],
            ),
            item(
                "Freight Corridor",
                &[
                    ("Deal Status", "Project Won"),
                    ("Deal Stage", "Closed"),
                    ("Sector/service", "Railways"),
                    ("Masked Deal value", "1,200.50"),
                ],
            ),
            item(
                "Pit Expansion",
                &[
                    ("Deal Status", "Project Won"),
                    ("Deal Stage", "Negotiations"),
                    ("Sector/service", "Mining"),
                    ("Masked Deal value", ""),
                ],
            ),
            item(
                "Old Quarry",
                &[
                    ("Deal Status", "Dead"),
                    ("Deal Stage", "Feasibility"),
                    ("Masked Deal value", "3"),
                ],
            ),
            // Header row leaked into the data; must be dropped
            item("Deal Name", &[("Deal Status", "Deal Status")]),
        ],
        work_orders: vec![
            item(
                "WO Mine A",
                &[
                    ("Sector", "Mining"),
                    ("Execution Status", "In Progress"),
                    ("Billed Value Incl GST", "1,200.50"),
                    ("Collected Amount", "600.25"),
                    ("Amount Receivable", "600.25"),
                    ("Amount Incl GST", "2,000"),
                    ("Amount to Bill Incl GST", "799.5"),
                    ("Billing Status", "biled"),
                ],
            ),
            item(
                "WO Mine B",
                &[
                    ("Sector", "Mining"),
                    ("Execution Status", "Completed"),
                    ("Billed Value Incl GST", "null"),
                    ("Collected Amount", "0"),
                    ("Invoice Status", "Pending"),
                ],
            ),
            item(
                "WO Rail A",
                &[
                    ("Sector", "Railways"),
                    ("Execution Status", "In Progress"),
                    ("Billed Value Incl GST", "₹ 100"),
                    ("Collected Amount", "50"),
                    ("Billing Status", "Billed"),
                ],
            ),
            item("WO Misc", &[]),
        ],
    }
}

fn toolbox(board: StaticBoard) -> Toolbox {
    Toolbox::new(Arc::new(board), DEALS_BOARD, WORK_ORDERS_BOARD)
}

mod pipeline_summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_pipeline_summary_aggregates_both_boards() {
        let toolbox = toolbox(sample_board());

        let output = toolbox.execute(&ToolCall::PipelineSummary).await.unwrap();
        let data = output.data;

        // Header leak excluded from every count
        assert_eq!(data["total_deals"], 6);
        assert_eq!(data["open_deals"], 3);
        assert_eq!(data["total_deal_value"], json!(1216.0));
        assert_eq!(
            data["deal_status_distribution"],
            json!({"Dead": 1, "Open": 3, "Project Won": 2})
        );
        assert_eq!(
            data["deal_stage_distribution"],
            json!({"Closed": 1, "Feasibility": 3, "Negotiations": 2})
        );
        assert_eq!(data["total_work_orders"], 4);
        assert_eq!(
            data["wo_sector_distribution"],
            json!({"Mining": 2, "Railways": 1, "Unknown": 1})
        );
        assert_eq!(data["total_billed_value"], json!(1300.5));
        assert_eq!(data["total_collected"], json!(650.25));

        assert_eq!(output.trace.board, "Both boards");
        assert_eq!(output.trace.records_returned, Some(10));
    }
}

mod revenue_analysis_tests {
    use super::*;

    #[tokio::test]
    async fn test_revenue_analysis_totals_and_rate() {
        let toolbox = toolbox(sample_board());

        let output = toolbox.execute(&ToolCall::RevenueAnalysis).await.unwrap();
        let data = output.data;

        // "1,200.50" and "₹ 100" parse; "null" and the absent cell
        // coerce to zero
        assert_eq!(data["total_billed"], json!(1300.5));
        assert_eq!(data["total_collected"], json!(650.25));
        assert_eq!(data["total_receivable"], json!(600.25));
        assert_eq!(data["total_contract_value"], json!(2000.0));
        assert_eq!(data["total_unbilled"], json!(799.5));
        assert_eq!(data["collection_rate_pct"], json!(50.0));
        assert_eq!(data["total_work_orders"], 4);
    }

    #[tokio::test]
    async fn test_billing_status_canonicalization_and_fallback() {
        let toolbox = toolbox(sample_board());

        let output = toolbox.execute(&ToolCall::RevenueAnalysis).await.unwrap();
        let data = output.data;

        // "biled" folds into "Billed"; a missing Billing Status falls
        // back to Invoice Status, then to "Unknown"
        assert_eq!(
            data["billing_status_breakdown"],
            json!({"Billed": 2, "Pending": 1, "Unknown": 1})
        );
        assert_eq!(
            data["revenue_by_sector"],
            json!({"Mining": 1200.5, "Railways": 100.0, "Unknown": 0.0})
        );
        assert_eq!(
            data["execution_status_breakdown"],
            json!({"Completed": 1, "In Progress": 2, "Unknown": 1})
        );
    }

    #[tokio::test]
    async fn test_collection_rate_is_zero_when_nothing_billed() {
        let board = StaticBoard {
            titles: HashMap::new(),
            deals: vec![],
            work_orders: vec![item(
                "WO Unbilled",
                &[("Collected Amount", "40"), ("Billed Value Incl GST", "-")],
            )],
        };
        let toolbox = toolbox(board);

        let output = toolbox.execute(&ToolCall::RevenueAnalysis).await.unwrap();
        assert_eq!(output.data["total_billed"], json!(0.0));
        assert_eq!(output.data["collection_rate_pct"], json!(0.0));
    }
}

mod sector_analysis_tests {
    use super::*;

    #[tokio::test]
    async fn test_sector_analysis_cross_board_slice() {
        let toolbox = toolbox(sample_board());

        let call = ToolCall::SectorAnalysis {
            sector: "Railways".to_string(),
        };
        let output = toolbox.execute(&call).await.unwrap();
        let data = output.data;

        assert_eq!(data["sector"], "Railways");
        assert_eq!(data["total_deals"], 2);
        assert_eq!(data["total_deal_value"], json!(1202.5));
        assert_eq!(
            data["deal_status_breakdown"],
            json!({"Open": 1, "Project Won": 1})
        );
        assert_eq!(data["total_work_orders"], 1);
        assert_eq!(data["total_billed"], json!(100.0));
        assert_eq!(output.trace.records_returned, Some(3));
    }

    #[tokio::test]
    async fn test_unmatched_sector_yields_empty_shape() {
        let toolbox = toolbox(sample_board());

        let call = ToolCall::SectorAnalysis {
            sector: "Aerospace".to_string(),
        };
        let output = toolbox.execute(&call).await.unwrap();
        let data = output.data;

        assert_eq!(data["total_deals"], 0);
        assert_eq!(data["total_deal_value"], json!(0.0));
        assert_eq!(data["deal_status_breakdown"], json!({}));
        assert_eq!(data["total_work_orders"], 0);
        assert_eq!(output.trace.records_returned, Some(0));
    }
}

mod listing_tool_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_deals_filters_are_case_insensitive_substrings() {
        let toolbox = toolbox(sample_board());

        let call = ToolCall::GetDeals {
            sector: Some("mini".to_string()),
            stage: None,
            status: None,
        };
        let output = toolbox.execute(&call).await.unwrap();

        let rows = output.data.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row["Sector/service"], "Mining");
        }
        assert_eq!(output.trace.board, format!("Deals (ID: {DEALS_BOARD})"));
        assert_eq!(output.trace.records_returned, Some(3));
    }

    #[tokio::test]
    async fn test_get_work_orders_filters_compose() {
        let toolbox = toolbox(sample_board());

        let call = ToolCall::GetWorkOrders {
            sector: Some("mining".to_string()),
            status: Some("progress".to_string()),
        };
        let output = toolbox.execute(&call).await.unwrap();

        let rows = output.data.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "WO Mine A");
    }

    #[tokio::test]
    async fn test_records_without_the_filter_field_never_match() {
        let toolbox = toolbox(sample_board());

        // "WO Misc" has no Sector cell at all
        let call = ToolCall::GetWorkOrders {
            sector: Some("unknown".to_string()),
            status: None,
        };
        let output = toolbox.execute(&call).await.unwrap();
        assert_eq!(output.trace.records_returned, Some(0));
    }
}

mod normalization_tests {
    use super::*;

    #[tokio::test]
    async fn test_header_sentinels_apply_to_their_own_board_only() {
        let board = StaticBoard {
            titles: HashMap::new(),
            deals: vec![
                // A deal that happens to carry the work-orders
                // sentinel as its name is real data
                item("Deal name masked", &[("Deal Status", "Open")]),
                item("Deal Name", &[("Deal Status", "Open")]),
                item("name", &[("Deal Status", "Open")]),
            ],
            work_orders: vec![
                item("Deal name masked", &[("Sector", "Mining")]),
                item("Deal Name", &[("Sector", "Mining")]),
                item("name", &[("Sector", "Mining")]),
            ],
        };
        let toolbox = toolbox(board);

        let output = toolbox.execute(&ToolCall::PipelineSummary).await.unwrap();
        assert_eq!(output.data["total_deals"], 1);
        assert_eq!(output.data["open_deals"], 1);
        assert_eq!(output.data["total_work_orders"], 1);
        assert_eq!(output.data["wo_sector_distribution"], json!({"Mining": 1}));
    }

    #[tokio::test]
    async fn test_column_ids_resolve_through_the_title_map() {
        let board = StaticBoard {
            titles: HashMap::from([("status_col".to_string(), "Deal Status".to_string())]),
            deals: vec![item("Lone Deal", &[("status_col", "Open")])],
            work_orders: vec![],
        };
        let toolbox = toolbox(board);

        let output = toolbox.execute(&ToolCall::PipelineSummary).await.unwrap();
        assert_eq!(output.data["deal_status_distribution"], json!({"Open": 1}));
        assert_eq!(output.data["open_deals"], 1);
    }
}
