//! JSONL audit trail logging.
//!
//! Each planner run appends events to an audit.jsonl file, one JSON object
//! per line, so a day of iterations can be replayed and inspected.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::Result;
use crate::funding::SellingPlan;
use crate::margin::{MarginPosition, MarginStatus, MarginStrategyDecision};
use crate::planner::IterationPlan;
use crate::profit::IterationProfitSummary;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(audit: &mut AuditLog, account_id: &str, snapshot_file: &str) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "account": account_id,
            "snapshot": snapshot_file,
        }),
    )
}

/// Convenience: log identified margin positions and the combined status.
pub fn log_margin_status(
    audit: &mut AuditLog,
    positions: &[MarginPosition],
    status: &MarginStatus,
) -> Result<()> {
    let position_data: Vec<_> = positions
        .iter()
        .map(|p| {
            serde_json::json!({
                "base": p.position.base,
                "total_value": p.position.total_price,
                "margin_value": p.margin_value,
                "leverage": p.leverage,
            })
        })
        .collect();

    audit.log(
        "margin_status",
        serde_json::json!({
            "positions": position_data,
            "status": status,
        }),
    )
}

/// Convenience: log the close-time strategy decision.
pub fn log_margin_decision(audit: &mut AuditLog, decision: &MarginStrategyDecision) -> Result<()> {
    audit.log("margin_decision", serde_json::json!({ "decision": decision }))
}

/// Convenience: log required funds for non-margin purchases.
pub fn log_required_funds(audit: &mut AuditLog, required: &FxHashMap<String, f64>) -> Result<()> {
    audit.log("required_funds", serde_json::json!({ "required": required }))
}

/// Convenience: log the computed selling plan.
pub fn log_selling_plan(audit: &mut AuditLog, plan: &SellingPlan) -> Result<()> {
    audit.log("selling_plan", serde_json::json!({ "plan": plan }))
}

/// Convenience: log the iteration profit summary.
pub fn log_profit_summary(audit: &mut AuditLog, summary: &IterationProfitSummary) -> Result<()> {
    audit.log("profit_summary", serde_json::json!({ "summary": summary }))
}

/// Convenience: log every step of a computed plan.
pub fn log_plan(audit: &mut AuditLog, plan: &IterationPlan) -> Result<()> {
    log_margin_status(audit, &plan.margin_positions, &plan.margin_status)?;
    log_margin_decision(audit, &plan.margin_decision)?;
    log_required_funds(audit, &plan.required_funds)?;
    log_selling_plan(audit, &plan.selling_plan)?;
    log_profit_summary(audit, &plan.profit)
}

/// Convenience: log run completion.
pub fn log_run_completed(audit: &mut AuditLog, margin_valid: bool) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({ "margin_valid": margin_valid }),
    )
}
