use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::rate_table::{RateTable, Regime};
use super::AuditCheck;
use crate::models::enums::{AuditCheckType, Severity};

const FIELDS: &[&str] = &["vatAmount", "subtotalAmount"];

/// Check the observed VAT rate (tax / subtotal) against a jurisdiction's
/// rate table.
///
/// - Missing or zero subtotal (or missing VAT): inconclusive, passed/Info.
/// - Category rules are tried first; the document date picks the band.
/// - No known rate within tolerance: failed/Warning. A rate check alone
///   never blocks a draft.
pub fn check_vat_rate(
    table: &RateTable,
    subtotal: Option<Decimal>,
    vat: Option<Decimal>,
    date: Option<NaiveDate>,
    category: Option<&str>,
) -> AuditCheck {
    let Some(subtotal) = subtotal.filter(|s| !s.is_zero()) else {
        return AuditCheck::pass(
            AuditCheckType::VatRate,
            "VAT rate could not be verified: subtotal missing or zero",
        );
    };
    let Some(vat) = vat else {
        return AuditCheck::pass(
            AuditCheckType::VatRate,
            "VAT rate could not be verified: VAT amount missing",
        );
    };
    let Some(observed) = vat
        .checked_div(subtotal)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return AuditCheck::pass(
            AuditCheckType::VatRate,
            "VAT rate could not be verified: amounts out of range",
        );
    };

    let within = |rate: Decimal| (observed - rate).abs() <= table.tolerance;
    let shown = observed.round_dp(2);

    if let Some(rule) = table.rule_for(category) {
        let (band, regime) = rule.band_for(date);
        if within(band.rate) {
            let regime_note = match regime {
                Regime::BeforeCutover => format!("before {}, covers {}", rule.cutover, band.scope),
                Regime::AfterCutover => format!("from {}, covers {}", rule.cutover, band.scope),
                Regime::Undated => format!(
                    "document date unknown, assuming the regime from {}: {}",
                    rule.cutover, band.scope
                ),
            };
            return AuditCheck::pass(
                AuditCheckType::VatRate,
                format!(
                    "VAT rate {shown}% matches the {} {} rate of {}% ({regime_note})",
                    table.name, rule.label, band.rate
                ),
            )
            .with_fields(FIELDS);
        }
    }

    if let Some(rate) = table.standard_rates.iter().copied().find(|r| within(*r)) {
        return AuditCheck::pass(
            AuditCheckType::VatRate,
            format!("VAT rate {shown}% matches the {} {rate}% rate", table.name),
        )
        .with_fields(FIELDS);
    }

    AuditCheck::fail(
        AuditCheckType::VatRate,
        Severity::Warning,
        format!("Unusual VAT rate {shown}% for {} VAT", table.name),
    )
    .with_hint(format!(
        "{} VAT rates are {}; re-read the VAT amount and the subtotal",
        table.name,
        table.describe_rates()
    ))
    .with_fields(FIELDS)
}
