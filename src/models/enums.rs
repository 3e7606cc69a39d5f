use serde::{Deserialize, Serialize};

use super::InvalidEnum;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ClassifiedType {
    Invoice => "invoice",
    CreditNote => "credit_note",
    ProForma => "pro_forma",
    Bill => "bill",
    Receipt => "receipt",
    Expense => "expense",
    Unknown => "unknown",
});

str_enum!(Direction {
    Inbound => "inbound",
    Outbound => "outbound",
    Unknown => "unknown",
});

str_enum!(DirectionSource {
    VatMatch => "vat_match",
    NameMatch => "name_match",
    AiHint => "ai_hint",
    Unknown => "unknown",
});

// Declaration order is severity order: Info < Warning < Critical.
str_enum!(Severity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(AuditCheckType {
    EssentialFields => "essential_fields",
    Math => "math",
    VatRate => "vat_rate",
    ChecksumOgm => "checksum_ogm",
    ChecksumRf => "checksum_rf",
    ChecksumIban => "checksum_iban",
    DueDate => "due_date",
});

impl ClassifiedType {
    /// Invoice, credit note and pro forma share one set of gate rules.
    pub fn is_invoice_family(&self) -> bool {
        matches!(self, Self::Invoice | Self::CreditNote | Self::ProForma)
    }
}
