use chrono::NaiveDate;

use super::AuditCheck;
use crate::models::enums::{AuditCheckType, Severity};

/// A due date before the issue date is almost always a misread field.
pub fn check_due_date(issue: Option<NaiveDate>, due: Option<NaiveDate>) -> AuditCheck {
    match (issue, due) {
        (Some(issue), Some(due)) if due < issue => AuditCheck::fail(
            AuditCheckType::DueDate,
            Severity::Warning,
            format!("Due date {due} is before issue date {issue}"),
        )
        .with_hint("Re-read the issue and due dates; day and month may be swapped")
        .with_fields(&["dueDate", "issueDate"]),
        (Some(_), Some(_)) => AuditCheck::pass(AuditCheckType::DueDate, "Due date follows issue date")
            .with_fields(&["dueDate", "issueDate"]),
        _ => AuditCheck::pass(AuditCheckType::DueDate, "Due date could not be verified"),
    }
}
