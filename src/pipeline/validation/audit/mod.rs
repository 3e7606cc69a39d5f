//! Rule-based audit checks over one extraction attempt.
//!
//! Each check is independent and stateless and yields an `AuditCheck`
//! verdict. Which checks run is fixed per extraction shape:
//!
//! | Shape       | Checks                                        |
//! |-------------|-----------------------------------------------|
//! | Invoice     | math, VAT rate, reference, IBAN, due date     |
//! | Credit note | math, VAT rate, reference, IBAN               |
//! | Bill        | math, VAT rate, reference, IBAN, due date     |
//! | Receipt     | math, VAT rate                                |
//! | Expense     | none                                          |

pub mod checksum;
pub mod due_date;
pub mod math;
pub mod rate_table;
pub mod vat_rate;

use serde::{Deserialize, Serialize};

use crate::models::enums::{AuditCheckType, Severity};
use crate::pipeline::extraction::types::{ExtractedData, VatBreakdownLine};
use crate::pipeline::parsing::{parse_amount, parse_iso_date};

pub use checksum::{check_iban, check_payment_reference};
pub use due_date::check_due_date;
pub use math::{breakdown_totals, check_math};
pub use rate_table::{CategoryRule, RateBand, RateTable, RateTables, Regime};
pub use vat_rate::check_vat_rate;

/// Verdict of one audit rule on one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCheck {
    pub check_type: AuditCheckType,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    pub hint: Option<String>,
    /// Extraction fields this verdict concerns.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl AuditCheck {
    /// A passing verdict. Passing checks are always `Info`.
    pub fn pass(check_type: AuditCheckType, message: impl Into<String>) -> Self {
        Self {
            check_type,
            passed: true,
            severity: Severity::Info,
            message: message.into(),
            hint: None,
            fields: Vec::new(),
        }
    }

    pub fn fail(check_type: AuditCheckType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check_type,
            passed: false,
            severity,
            message: message.into(),
            hint: None,
            fields: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Failed with at least the given severity.
    pub fn fails_at(&self, severity: Severity) -> bool {
        !self.passed && self.severity >= severity
    }
}

/// Runs the fixed check set for each extraction shape.
#[derive(Debug, Clone, Default)]
pub struct AuditSuite {
    rate_tables: RateTables,
}

impl AuditSuite {
    pub fn new(rate_tables: RateTables) -> Self {
        Self { rate_tables }
    }

    pub fn rate_tables(&self) -> &RateTables {
        &self.rate_tables
    }

    /// Run every check that applies to the shape, in a stable order.
    pub fn run(&self, data: &ExtractedData) -> Vec<AuditCheck> {
        match data {
            ExtractedData::Invoice(d) => vec![
                self.math(data, &d.vat_breakdown),
                self.vat_rate(data, &d.vat_breakdown),
                check_payment_reference(d.payment_reference.as_deref()),
                check_iban(d.iban.as_deref()),
                check_due_date(
                    parse_iso_date(d.issue_date.as_deref()),
                    parse_iso_date(d.due_date.as_deref()),
                ),
            ],
            ExtractedData::CreditNote(d) => vec![
                self.math(data, &d.vat_breakdown),
                self.vat_rate(data, &d.vat_breakdown),
                check_payment_reference(d.payment_reference.as_deref()),
                check_iban(d.iban.as_deref()),
            ],
            ExtractedData::Bill(d) => vec![
                self.math(data, &d.vat_breakdown),
                self.vat_rate(data, &d.vat_breakdown),
                check_payment_reference(d.payment_reference.as_deref()),
                check_iban(d.iban.as_deref()),
                check_due_date(
                    parse_iso_date(d.issue_date.as_deref()),
                    parse_iso_date(d.due_date.as_deref()),
                ),
            ],
            ExtractedData::Receipt(d) => vec![
                self.math(data, &d.vat_breakdown),
                self.vat_rate(data, &d.vat_breakdown),
            ],
            ExtractedData::Expense(_) => Vec::new(),
        }
    }

    fn math(&self, data: &ExtractedData, breakdown: &[VatBreakdownLine]) -> AuditCheck {
        let (subtotal, vat) = subtotal_and_vat(data, breakdown);
        check_math(subtotal, vat, parse_amount(data.total_amount()))
    }

    fn vat_rate(&self, data: &ExtractedData, breakdown: &[VatBreakdownLine]) -> AuditCheck {
        let (subtotal, vat) = subtotal_and_vat(data, breakdown);
        match self.rate_tables.for_vat_number(data.seller().vat_number) {
            Some(table) => check_vat_rate(
                table,
                subtotal,
                vat,
                parse_iso_date(data.document_date()),
                data.category(),
            ),
            None => AuditCheck::pass(
                AuditCheckType::VatRate,
                "VAT rate could not be verified: no rate table for this jurisdiction",
            ),
        }
    }
}

/// Top-level subtotal and VAT, falling back to the breakdown lines when the
/// document only states per-rate amounts.
fn subtotal_and_vat(
    data: &ExtractedData,
    breakdown: &[VatBreakdownLine],
) -> (Option<rust_decimal::Decimal>, Option<rust_decimal::Decimal>) {
    let subtotal = parse_amount(data.subtotal_amount());
    let vat = parse_amount(data.vat_amount());
    if subtotal.is_some() && vat.is_some() {
        return (subtotal, vat);
    }
    match breakdown_totals(breakdown) {
        Some((base, tax)) => (subtotal.or(Some(base)), vat.or(Some(tax))),
        None => (subtotal, vat),
    }
}
