//! Jurisdiction VAT rate tables.
//!
//! Rates and cutover dates are domain data: the built-in tables cover the
//! jurisdictions we ship with, and deployments can load their own from JSON.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::tenant::normalize_vat;

fn default_tolerance() -> Decimal {
    Decimal::new(5, 1)
}

/// The rate set one jurisdiction accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// ISO country code, also the VAT number prefix ("BE").
    pub jurisdiction: String,
    /// Adjective used in messages ("Belgian").
    pub name: String,
    /// Known rates in percent.
    pub standard_rates: Vec<Decimal>,
    /// Absolute tolerance in percentage points.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    #[serde(default)]
    pub category_rules: Vec<CategoryRule>,
}

/// A category whose applicable rate changed on a fixed date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Human label used in messages ("restaurant").
    pub label: String,
    /// Category labels this rule applies to, compared case-insensitively.
    pub categories: Vec<String>,
    pub cutover: NaiveDate,
    pub before: RateBand,
    pub after: RateBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub rate: Decimal,
    /// What the rate covers under this regime.
    pub scope: String,
}

/// Which side of a cutover a document falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    BeforeCutover,
    AfterCutover,
    /// No usable document date; the current regime is assumed.
    Undated,
}

impl CategoryRule {
    pub fn applies_to(&self, category: &str) -> bool {
        let category = category.trim();
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn band_for(&self, date: Option<NaiveDate>) -> (&RateBand, Regime) {
        match date {
            Some(d) if d < self.cutover => (&self.before, Regime::BeforeCutover),
            Some(_) => (&self.after, Regime::AfterCutover),
            None => (&self.after, Regime::Undated),
        }
    }
}

impl RateTable {
    pub fn rule_for(&self, category: Option<&str>) -> Option<&CategoryRule> {
        let category = category?;
        self.category_rules.iter().find(|r| r.applies_to(category))
    }

    /// "0%, 6%, 12% and 21%"
    pub fn describe_rates(&self) -> String {
        let rates: Vec<String> = self.standard_rates.iter().map(|r| format!("{r}%")).collect();
        match rates.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {last}", rest.join(", ")),
            Some((last, _)) => last.clone(),
            None => "none".to_string(),
        }
    }
}

/// All known tables plus the jurisdiction used when a document gives no hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    pub default_jurisdiction: String,
    pub tables: Vec<RateTable>,
}

impl RateTables {
    /// Belgium (default), the Netherlands and France.
    pub fn builtin() -> Self {
        let cutover = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN);
        let pct = |n: i64| Decimal::new(n, 0);

        Self {
            default_jurisdiction: "BE".into(),
            tables: vec![
                RateTable {
                    jurisdiction: "BE".into(),
                    name: "Belgian".into(),
                    standard_rates: vec![pct(0), pct(6), pct(12), pct(21)],
                    tolerance: default_tolerance(),
                    category_rules: vec![
                        CategoryRule {
                            label: "restaurant".into(),
                            categories: vec![
                                "RESTAURANT".into(),
                                "CATERING".into(),
                                "HOSPITALITY".into(),
                            ],
                            cutover,
                            before: RateBand {
                                rate: pct(12),
                                scope: "food only, beverages at 21%".into(),
                            },
                            after: RateBand {
                                rate: pct(12),
                                scope: "food and non-alcoholic beverages".into(),
                            },
                        },
                        CategoryRule {
                            label: "take-away".into(),
                            categories: vec!["TAKEAWAY".into(), "TAKE_AWAY".into()],
                            cutover,
                            before: RateBand {
                                rate: pct(6),
                                scope: "take-away meals".into(),
                            },
                            after: RateBand {
                                rate: pct(12),
                                scope: "take-away meals".into(),
                            },
                        },
                    ],
                },
                RateTable {
                    jurisdiction: "NL".into(),
                    name: "Dutch".into(),
                    standard_rates: vec![pct(0), pct(9), pct(21)],
                    tolerance: default_tolerance(),
                    category_rules: vec![],
                },
                RateTable {
                    jurisdiction: "FR".into(),
                    name: "French".into(),
                    standard_rates: vec![
                        pct(0),
                        Decimal::new(21, 1),
                        Decimal::new(55, 1),
                        pct(10),
                        pct(20),
                    ],
                    tolerance: default_tolerance(),
                    category_rules: vec![],
                },
            ],
        }
    }

    pub fn table(&self, jurisdiction: &str) -> Option<&RateTable> {
        self.tables
            .iter()
            .find(|t| t.jurisdiction.eq_ignore_ascii_case(jurisdiction))
    }

    /// Pick the table from a VAT number's country prefix, else the default.
    pub fn for_vat_number(&self, vat_number: Option<&str>) -> Option<&RateTable> {
        vat_number
            .and_then(normalize_vat)
            .and_then(|vat| vat.get(..2).and_then(|prefix| self.table(prefix)))
            .or_else(|| self.table(&self.default_jurisdiction))
    }
}

impl Default for RateTables {
    fn default() -> Self {
        Self::builtin()
    }
}
