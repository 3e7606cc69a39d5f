use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Currency symbols tolerated around an amount.
const CURRENCY_SYMBOLS: &[char] = &['€', '$', '£'];

/// Characters that only ever group thousands.
const GROUPING_CHARS: &[char] = &[' ', '\u{a0}', '\u{202f}', '\''];

static CANONICAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

/// Parse a free-form monetary string into an exact decimal.
///
/// Accepts an optional sign, an optional currency symbol or ISO code on
/// either side, thousands separators and one decimal separator. Returns
/// `None` for blank or malformed input; never panics.
pub fn parse_amount(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let (negative, rest) = take_sign(raw);
    let rest = strip_currency(rest);
    // The sign may also sit between the currency and the digits ("€ -12,50").
    let (negative, rest) = match take_sign(rest) {
        (true, r) if !negative && r.len() < rest.len() => (true, r),
        (false, r) if r.len() < rest.len() => (negative, r),
        _ => (negative, rest),
    };

    let canonical = canonicalize(rest.trim())?;
    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

/// True iff `parse_amount` yields a value.
pub fn is_parseable(raw: Option<&str>) -> bool {
    parse_amount(raw).is_some()
}

fn take_sign(s: &str) -> (bool, &str) {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn strip_currency(s: &str) -> &str {
    let mut s = s
        .trim()
        .trim_start_matches(CURRENCY_SYMBOLS)
        .trim_end_matches(CURRENCY_SYMBOLS)
        .trim();

    if let Some(code) = s.get(..3) {
        if is_currency_code(code) {
            s = s[3..].trim_start();
        }
    }
    if s.len() >= 3 {
        if let Some(code) = s.get(s.len() - 3..) {
            if is_currency_code(code) {
                s = s[..s.len() - 3].trim_end();
            }
        }
    }
    s
}

fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase())
}

/// Normalize separators to a plain `1234.56` form.
fn canonicalize(body: &str) -> Option<String> {
    let allowed = |c: char| c.is_ascii_digit() || c == '.' || c == ',' || GROUPING_CHARS.contains(&c);
    if body.is_empty() || !body.chars().all(allowed) {
        return None;
    }

    let dots = body.matches('.').count();
    let commas = body.matches(',').count();

    let (integer, fraction) = match (dots, commas) {
        (0, 0) => (body, None),
        (_, 0) | (0, _) => {
            let sep = if dots > 0 { '.' } else { ',' };
            let (head, tail) = body.rsplit_once(sep)?;
            // A lone separator is the decimal point unless exactly three
            // digits follow a head that could lead a thousands group.
            let groups_thousands = tail.len() == 3 && !head.starts_with('0');
            if dots + commas == 1 && !groups_thousands {
                (head, Some(tail))
            } else {
                (body, None)
            }
        }
        _ => {
            let last_dot = body.rfind('.')?;
            let last_comma = body.rfind(',')?;
            let sep = if last_dot > last_comma { '.' } else { ',' };
            let (head, tail) = body.rsplit_once(sep)?;
            if head.contains(sep) {
                return None;
            }
            (head, Some(tail))
        }
    };

    let integer = ungroup(integer)?;
    let canonical = match fraction {
        Some(f) => format!("{integer}.{f}"),
        None => integer,
    };

    CANONICAL_AMOUNT.is_match(&canonical).then_some(canonical)
}

/// Strip thousands separators, checking they sit on 3-digit boundaries
/// after a 1-3 digit head that does not start with 0.
fn ungroup(integer: &str) -> Option<String> {
    let groups: Vec<&str> = integer
        .split(|c: char| c == '.' || c == ',' || GROUPING_CHARS.contains(&c))
        .collect();
    if groups.len() == 1 {
        return Some(integer.to_string());
    }
    let (first, rest) = groups.split_first()?;
    let well_formed = (1..=3).contains(&first.len())
        && !first.starts_with('0')
        && rest.iter().all(|g| g.len() == 3);
    well_formed.then(|| groups.concat())
}
