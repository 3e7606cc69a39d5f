use chrono::NaiveDate;

/// Parse a strict ISO calendar date (`YYYY-MM-DD`).
///
/// No locale fallbacks: "03/04/2026" is rejected rather than guessed,
/// so day and month can never be swapped silently.
pub fn parse_iso_date(raw: Option<&str>) -> Option<NaiveDate> {
    let trimmed = raw?.trim();
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// A date is "present" only if it parses as an ISO date.
pub fn is_date_present(raw: Option<&str>) -> bool {
    parse_iso_date(raw).is_some()
}
