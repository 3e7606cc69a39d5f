use super::AuditCheck;
use crate::models::enums::{AuditCheckType, Severity};
use crate::pipeline::parsing::{classify_reference, has_text, is_valid_iban, is_valid_ogm, is_valid_rf, ReferenceKind};

/// Verify a payment reference's checksum when it is a structured one.
///
/// No reference, or a free-text one, is not a failure. A structured
/// reference that fails its checksum is Critical: the payment would bounce
/// or land unmatched.
pub fn check_payment_reference(reference: Option<&str>) -> AuditCheck {
    let Some(reference) = reference.filter(|r| has_text(Some(*r))) else {
        return AuditCheck::pass(AuditCheckType::ChecksumOgm, "No payment reference to verify");
    };
    let reference = reference.trim();

    match classify_reference(reference) {
        ReferenceKind::Ogm if is_valid_ogm(reference) => AuditCheck::pass(
            AuditCheckType::ChecksumOgm,
            "Structured communication checksum is valid",
        )
        .with_fields(&["paymentReference"]),
        ReferenceKind::Ogm => AuditCheck::fail(
            AuditCheckType::ChecksumOgm,
            Severity::Critical,
            format!("Structured communication {reference} fails its mod-97 checksum"),
        )
        .with_hint(
            "Re-read the structured communication (+++ddd/dddd/ddddd+++): \
             the last two digits are the first ten modulo 97",
        )
        .with_fields(&["paymentReference"]),
        ReferenceKind::Rf if is_valid_rf(reference) => {
            AuditCheck::pass(AuditCheckType::ChecksumRf, "RF creditor reference checksum is valid")
                .with_fields(&["paymentReference"])
        }
        ReferenceKind::Rf => AuditCheck::fail(
            AuditCheckType::ChecksumRf,
            Severity::Critical,
            format!("RF creditor reference {reference} fails its mod-97 checksum"),
        )
        .with_hint("Re-read the RF reference character by character, including the two check digits after 'RF'")
        .with_fields(&["paymentReference"]),
        ReferenceKind::FreeText => AuditCheck::pass(
            AuditCheckType::ChecksumOgm,
            "Payment reference is free text; no checksum to verify",
        ),
    }
}

/// Verify the IBAN checksum when one was extracted.
pub fn check_iban(iban: Option<&str>) -> AuditCheck {
    let Some(iban) = iban.filter(|i| has_text(Some(*i))) else {
        return AuditCheck::pass(AuditCheckType::ChecksumIban, "No IBAN to verify");
    };

    if is_valid_iban(iban) {
        AuditCheck::pass(AuditCheckType::ChecksumIban, "IBAN checksum is valid").with_fields(&["iban"])
    } else {
        AuditCheck::fail(
            AuditCheckType::ChecksumIban,
            Severity::Critical,
            format!("IBAN {} fails its checksum", iban.trim()),
        )
        .with_hint("Re-read the IBAN: country code, two check digits, then the account number")
        .with_fields(&["iban"])
    }
}
