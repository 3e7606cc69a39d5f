//! Essential fields: the minimum a document needs to be processed normally.

use serde::{Deserialize, Serialize};

use super::audit::AuditCheck;
use crate::models::enums::{AuditCheckType, Severity};
use crate::pipeline::extraction::types::ExtractedData;
use crate::pipeline::parsing::{has_text, is_date_present, is_parseable};

const VENDOR_IDENTITY: &str = "vendorIdentity (vendorName or vendorVatNumber)";
const SUPPLIER_IDENTITY: &str = "supplierIdentity (supplierName or supplierVatNumber)";
const MERCHANT_IDENTITY: &str = "merchantIdentity (merchantName or merchantVatNumber)";

/// Outcome of the essential-fields validation for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialFieldsCheck {
    pub has_all_fields: bool,
    /// Missing or malformed fields, in rule order.
    pub missing_fields: Vec<String>,
}

impl EssentialFieldsCheck {
    fn from_missing(missing: Vec<&str>) -> Self {
        Self {
            has_all_fields: missing.is_empty(),
            missing_fields: missing.into_iter().map(str::to_string).collect(),
        }
    }

    /// Express the misses as an audit verdict so correction hints can be
    /// built from one list of failures. `None` when nothing is missing.
    pub fn to_audit_check(&self) -> Option<AuditCheck> {
        if self.has_all_fields {
            return None;
        }
        let fields: Vec<&str> = self
            .missing_fields
            .iter()
            .flat_map(|label| fields_of(label))
            .collect();
        Some(
            AuditCheck::fail(
                AuditCheckType::EssentialFields,
                Severity::Critical,
                format!("Missing essential fields: {}", self.missing_fields.join(", ")),
            )
            .with_hint(format!(
                "Look again for {}; amounts as plain numbers, dates as YYYY-MM-DD",
                self.missing_fields.join(", ")
            ))
            .with_fields(&fields),
        )
    }
}

/// Extraction fields behind a missing-field label.
fn fields_of(label: &str) -> Vec<&str> {
    match label {
        VENDOR_IDENTITY => vec!["vendorName", "vendorVatNumber"],
        SUPPLIER_IDENTITY => vec!["supplierName", "supplierVatNumber"],
        MERCHANT_IDENTITY => vec!["merchantName", "merchantVatNumber"],
        other => vec![other],
    }
}

/// Determine which essential fields are missing or invalid.
///
/// Pure. Amounts must parse, dates must be ISO calendar dates, and an
/// identity is satisfied by either a name or a VAT number.
pub fn check_essential_fields(data: &ExtractedData) -> EssentialFieldsCheck {
    let mut missing = Vec::new();

    match data {
        ExtractedData::Invoice(d) => {
            require_amount(&mut missing, d.total_amount.as_deref());
            require_date(&mut missing, "issueDate", d.issue_date.as_deref());
            require_identity(
                &mut missing,
                VENDOR_IDENTITY,
                d.vendor_name.as_deref(),
                d.vendor_vat_number.as_deref(),
            );
        }
        ExtractedData::CreditNote(d) => {
            require_amount(&mut missing, d.total_amount.as_deref());
            require_date(&mut missing, "issueDate", d.issue_date.as_deref());
            require_identity(
                &mut missing,
                VENDOR_IDENTITY,
                d.vendor_name.as_deref(),
                d.vendor_vat_number.as_deref(),
            );
        }
        ExtractedData::Bill(d) => {
            require_amount(&mut missing, d.total_amount.as_deref());
            require_date(&mut missing, "issueDate", d.issue_date.as_deref());
            require_identity(
                &mut missing,
                SUPPLIER_IDENTITY,
                d.supplier_name.as_deref(),
                d.supplier_vat_number.as_deref(),
            );
        }
        ExtractedData::Receipt(d) => {
            require_amount(&mut missing, d.total_amount.as_deref());
            require_date(&mut missing, "transactionDate", d.transaction_date.as_deref());
            require_identity(
                &mut missing,
                MERCHANT_IDENTITY,
                d.merchant_name.as_deref(),
                d.merchant_vat_number.as_deref(),
            );
        }
        ExtractedData::Expense(d) => {
            require_amount(&mut missing, d.total_amount.as_deref());
            require_date(&mut missing, "date", d.date.as_deref());
        }
    }

    EssentialFieldsCheck::from_missing(missing)
}

fn require_amount(missing: &mut Vec<&str>, total: Option<&str>) {
    if !is_parseable(total) {
        missing.push("totalAmount");
    }
}

fn require_date<'a>(missing: &mut Vec<&'a str>, field: &'a str, value: Option<&str>) {
    if !is_date_present(value) {
        missing.push(field);
    }
}

fn require_identity<'a>(
    missing: &mut Vec<&'a str>,
    label: &'a str,
    name: Option<&str>,
    vat_number: Option<&str>,
) {
    if !has_text(name) && !has_text(vat_number) {
        missing.push(label);
    }
}
