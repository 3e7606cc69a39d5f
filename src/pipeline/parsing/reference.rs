//! Checksum validation for structured payment references.
//!
//! - OGM/VCS: Belgian structured communication `+++ddd/dddd/ddddd+++`,
//!   check digits = 10-digit body mod 97 (a remainder of 0 is written 97).
//! - RF: ISO 11649 creditor reference, ISO 7064 mod 97-10.
//! - IBAN: ISO 13616, same mod 97-10 scheme.
//!
//! Everything here is pure and total: malformed input is `false`, never a panic.

use std::sync::LazyLock;

use regex::Regex;

static OGM_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+{3}|\*{3})?\s*\d{3}\s*/?\s*\d{4}\s*/?\s*\d{5}\s*(?:\+{3}|\*{3})?$").unwrap()
});

static RF_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^RF\d{2}").unwrap());

/// What kind of payment reference a free-form string holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Belgian structured communication (delimited or 12 bare digits).
    Ogm,
    /// ISO 11649 creditor reference.
    Rf,
    /// Anything else: an unstructured remittance text.
    FreeText,
}

/// Decide which checksum scheme (if any) applies to a reference.
pub fn classify_reference(raw: &str) -> ReferenceKind {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with("+++") || compact.starts_with("***") || OGM_SHAPE.is_match(raw.trim()) {
        ReferenceKind::Ogm
    } else if RF_PREFIX.is_match(&compact) {
        ReferenceKind::Rf
    } else {
        ReferenceKind::FreeText
    }
}

/// Validate a Belgian OGM/VCS structured communication.
pub fn is_valid_ogm(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    let only_expected_chars = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '*' | '/' | ' '));
    if digits.len() != 12 || !only_expected_chars {
        return false;
    }

    let body = digits[..10].iter().fold(0u64, |acc, &d| acc * 10 + u64::from(d));
    let check = u64::from(digits[10] * 10 + digits[11]);
    let expected = match body % 97 {
        0 => 97,
        r => r,
    };
    check == expected
}

/// Validate an ISO 11649 creditor reference (`RFkk` + up to 21 alphanumerics).
pub fn is_valid_rf(raw: &str) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !(5..=25).contains(&compact.len()) || !compact.starts_with("RF") {
        return false;
    }
    mod97_10_holds(&compact)
}

/// Validate an IBAN (country code, 2 check digits, BBAN; 15–34 chars).
pub fn is_valid_iban(raw: &str) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !(15..=34).contains(&compact.len()) {
        return false;
    }
    let bytes = compact.as_bytes();
    let shape_ok = bytes[..2].iter().all(u8::is_ascii_alphabetic)
        && bytes[2..4].iter().all(u8::is_ascii_digit);
    shape_ok && mod97_10_holds(&compact)
}

/// ISO 7064 mod 97-10: move the first four characters to the end, expand
/// letters to 10..=35 and require a remainder of 1.
fn mod97_10_holds(compact: &str) -> bool {
    if compact.len() < 5 || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    let (head, tail) = compact.split_at(4);
    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    remainder == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ogm_in_several_notations() {
        assert!(is_valid_ogm("+++012/3456/78939+++"));
        assert!(is_valid_ogm("***123/4567/89002***"));
        assert!(is_valid_ogm("123456789002"));
        assert!(is_valid_ogm("+++ 123 / 4567 / 89002 +++"));
    }

    #[test]
    fn ogm_remainder_zero_is_written_97() {
        assert!(is_valid_ogm("+++097/0000/00097+++"));
        assert!(!is_valid_ogm("+++097/0000/00000+++"));
    }

    #[test]
    fn invalid_ogm() {
        assert!(!is_valid_ogm("+++012/3456/78940+++"));
        assert!(!is_valid_ogm("+++123/4567/8900+++"));
        assert!(!is_valid_ogm("+++12A/4567/89002+++"));
        assert!(!is_valid_ogm(""));
    }

    #[test]
    fn rf_reference() {
        assert!(is_valid_rf("RF18539007547034"));
        assert!(is_valid_rf("RF18 5390 0754 7034"));
        assert!(is_valid_rf("rf18539007547034"));
        assert!(!is_valid_rf("RF19539007547034"));
        assert!(!is_valid_rf("RF18"));
    }

    #[test]
    fn iban() {
        assert!(is_valid_iban("BE68539007547034"));
        assert!(is_valid_iban("BE68 5390 0754 7034"));
        assert!(is_valid_iban("GB82WEST12345698765432"));
        assert!(!is_valid_iban("BE68539007547035"));
        assert!(!is_valid_iban("68BE539007547034"));
        assert!(!is_valid_iban("BE68"));
        assert!(!is_valid_iban("BE68-5390-0754-7034"));
    }

    #[test]
    fn classifies_references() {
        assert_eq!(classify_reference("+++012/3456/78939+++"), ReferenceKind::Ogm);
        assert_eq!(classify_reference("+++123/4567/8900+++"), ReferenceKind::Ogm);
        assert_eq!(classify_reference("012/3456/78939"), ReferenceKind::Ogm);
        assert_eq!(classify_reference("RF18 5390 0754 7034"), ReferenceKind::Rf);
        assert_eq!(classify_reference("Invoice 2026-001"), ReferenceKind::FreeText);
        assert_eq!(classify_reference("INV-42"), ReferenceKind::FreeText);
    }
}
