use rust_decimal::Decimal;

use super::AuditCheck;
use crate::models::enums::{AuditCheckType, Severity};
use crate::pipeline::extraction::types::VatBreakdownLine;
use crate::pipeline::parsing::parse_amount;

const FIELDS: &[&str] = &["subtotalAmount", "vatAmount", "totalAmount"];

/// One cent.
fn tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Subtotal + VAT must equal the total within one cent.
///
/// Any operand missing makes the check inconclusive (passed, Info).
/// A mismatch is Critical: an inconsistent total blocks booking.
pub fn check_math(
    subtotal: Option<Decimal>,
    vat: Option<Decimal>,
    total: Option<Decimal>,
) -> AuditCheck {
    let (Some(subtotal), Some(vat), Some(total)) = (subtotal, vat, total) else {
        return AuditCheck::pass(
            AuditCheckType::Math,
            "Totals could not be cross-checked: subtotal, VAT or total missing",
        );
    };

    let Some(sum) = subtotal.checked_add(vat) else {
        return AuditCheck::pass(AuditCheckType::Math, "Totals could not be cross-checked: overflow");
    };

    let difference = (sum - total).abs();
    if difference <= tolerance() {
        AuditCheck::pass(AuditCheckType::Math, "Subtotal plus VAT matches the total")
            .with_fields(FIELDS)
    } else {
        AuditCheck::fail(
            AuditCheckType::Math,
            Severity::Critical,
            format!("Subtotal {subtotal} + VAT {vat} = {sum}, but the total reads {total}"),
        )
        .with_hint("Re-read subtotal, VAT and total: the total must equal subtotal plus VAT")
        .with_fields(FIELDS)
    }
}

/// Sum of (base, VAT) over breakdown lines; `None` unless every line parses.
pub fn breakdown_totals(lines: &[VatBreakdownLine]) -> Option<(Decimal, Decimal)> {
    if lines.is_empty() {
        return None;
    }
    lines.iter().try_fold((Decimal::ZERO, Decimal::ZERO), |(base, vat), line| {
        let line_base = parse_amount(line.base_amount.as_deref())?;
        let line_vat = parse_amount(line.vat_amount.as_deref())?;
        Some((base.checked_add(line_base)?, vat.checked_add(line_vat)?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn consistent_totals_pass() {
        let check = check_math(d("826.45"), d("173.55"), d("1000.00"));
        assert!(check.passed);
        assert_eq!(check.severity, Severity::Info);
    }

    #[test]
    fn one_cent_rounding_is_tolerated() {
        assert!(check_math(d("826.45"), d("173.55"), d("1000.01")).passed);
        assert!(!check_math(d("826.45"), d("173.55"), d("1000.02")).passed);
    }

    #[test]
    fn mismatch_is_critical() {
        let check = check_math(d("800.00"), d("168.00"), d("1000.00"));
        assert!(!check.passed);
        assert_eq!(check.severity, Severity::Critical);
        assert!(check.hint.is_some());
        assert_eq!(check.fields, vec!["subtotalAmount", "vatAmount", "totalAmount"]);
    }

    #[test]
    fn negative_credit_note_amounts() {
        assert!(check_math(d("-100.00"), d("-21.00"), d("-121.00")).passed);
    }

    #[test]
    fn missing_operand_is_inconclusive() {
        let check = check_math(None, d("21.00"), d("121.00"));
        assert!(check.passed);
        assert_eq!(check.severity, Severity::Info);
    }

    #[test]
    fn breakdown_sums_lines() {
        let line = |base: &str, vat: &str| VatBreakdownLine {
            rate: None,
            base_amount: Some(base.into()),
            vat_amount: Some(vat.into()),
        };
        let totals = breakdown_totals(&[line("100.00", "21.00"), line("50,00", "3,00")]);
        assert_eq!(totals, Some((Decimal::new(15000, 2), Decimal::new(2400, 2))));

        assert_eq!(breakdown_totals(&[line("100.00", "n/a")]), None);
        assert_eq!(breakdown_totals(&[]), None);
    }
}
