//! Explain plan output
//!
//! Produces deterministic, human-readable explain output.

use std::fmt;

use super::errors::PlanError;
use super::planner::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// One line per indexed lookup: access kind, access, served groups
    pub lookups: Vec<String>,
    /// Cursor-evaluated AND-groups
    pub cursor_groups: Vec<String>,
    /// Additions in application order
    pub additions: Vec<String>,
    /// Forcing reason, if the plan was forced into cursor mode
    pub forced: Option<String>,
    pub native_ordering: bool,
    pub diagnostics: Vec<String>,
    /// Constant filter, if any ("TRUE" or "FALSE")
    pub constant: Option<&'static str>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful query plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let lookups = plan
            .lookups()
            .map(|lookup| {
                let groups: Vec<String> = lookup.groups.iter().map(|g| g.to_string()).collect();
                format!(
                    "{} {} for [{}]",
                    lookup.access.kind_name(),
                    lookup.access,
                    groups.join(" || ")
                )
            })
            .collect();

        let constant = if plan.is_universal_false {
            Some("FALSE")
        } else if plan.is_universal_true {
            Some("TRUE")
        } else {
            None
        };

        Self {
            accepted: true,
            lookups,
            cursor_groups: plan.cursor_required.iter().map(|g| g.to_string()).collect(),
            additions: plan.additions.iter().map(|a| a.to_string()).collect(),
            forced: plan.forced.as_ref().map(|r| r.to_string()),
            native_ordering: plan.native_ordering,
            diagnostics: plan.diagnostics.iter().map(|d| d.to_string()).collect(),
            constant,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlanError) -> Self {
        Self::rejected(err.code(), err.to_string())
    }

    /// Creates a rejected explain plan from any error code and reason
    pub fn rejected(code: &str, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            lookups: Vec::new(),
            cursor_groups: Vec::new(),
            additions: Vec::new(),
            forced: None,
            native_ordering: false,
            diagnostics: Vec::new(),
            constant: None,
            rejection_reason: Some(reason.into()),
            rejection_code: Some(code.to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(constant) = self.constant {
            writeln!(f, "Filter: {}", constant)?;
        }
        if let Some(reason) = &self.forced {
            writeln!(f, "Forced Cursor: {}", reason)?;
        }
        if !self.lookups.is_empty() {
            writeln!(f, "Indexed Lookups:")?;
            for lookup in &self.lookups {
                writeln!(f, "  - {}", lookup)?;
            }
        }
        if !self.cursor_groups.is_empty() {
            writeln!(f, "Cursor Groups:")?;
            for group in &self.cursor_groups {
                writeln!(f, "  - {}", group)?;
            }
        }
        if !self.additions.is_empty() {
            writeln!(f, "Additions: {}", self.additions.join(" -> "))?;
        }
        if self.native_ordering {
            writeln!(f, "Ordering: NATIVE")?;
        }
        for diagnostic in &self.diagnostics {
            writeln!(f, "Diagnostic: {}", diagnostic)?;
        }

        Ok(())
    }
}
