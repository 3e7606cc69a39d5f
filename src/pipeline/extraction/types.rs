use serde::{Deserialize, Serialize};

use crate::models::enums::{ClassifiedType, Direction};

/// Result of the classification step. Produced once per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: ClassifiedType,
    pub confidence: f64,
    pub reasoning: String,
}

/// The model's own guess at the transaction direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionHint {
    pub direction: Direction,
    pub confidence: Option<f64>,
}

/// One line of a per-rate VAT breakdown, amounts still unparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatBreakdownLine {
    pub rate: Option<String>,
    pub base_amount: Option<String>,
    pub vat_amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceExtraction {
    pub invoice_number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_vat_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_vat_number: Option<String>,
    pub subtotal_amount: Option<String>,
    pub vat_amount: Option<String>,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub payment_reference: Option<String>,
    pub iban: Option<String>,
    #[serde(default)]
    pub vat_breakdown: Vec<VatBreakdownLine>,
    pub category: Option<String>,
    pub direction_hint: Option<DirectionHint>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditNoteExtraction {
    pub credit_note_number: Option<String>,
    pub credited_invoice_number: Option<String>,
    pub issue_date: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_vat_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_vat_number: Option<String>,
    pub subtotal_amount: Option<String>,
    pub vat_amount: Option<String>,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub payment_reference: Option<String>,
    pub iban: Option<String>,
    #[serde(default)]
    pub vat_breakdown: Vec<VatBreakdownLine>,
    pub category: Option<String>,
    pub reason: Option<String>,
    pub direction_hint: Option<DirectionHint>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillExtraction {
    pub bill_number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_vat_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_vat_number: Option<String>,
    pub subtotal_amount: Option<String>,
    pub vat_amount: Option<String>,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub payment_reference: Option<String>,
    pub iban: Option<String>,
    #[serde(default)]
    pub vat_breakdown: Vec<VatBreakdownLine>,
    pub category: Option<String>,
    pub direction_hint: Option<DirectionHint>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptExtraction {
    pub receipt_number: Option<String>,
    pub transaction_date: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant_vat_number: Option<String>,
    pub subtotal_amount: Option<String>,
    pub vat_amount: Option<String>,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub vat_breakdown: Vec<VatBreakdownLine>,
    pub category: Option<String>,
    pub direction_hint: Option<DirectionHint>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseExtraction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub merchant_name: Option<String>,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub confidence: f64,
}

/// Structured data for one extraction attempt.
///
/// A closed set of shapes: every consumer matches exhaustively, so a new
/// document type has to be handled everywhere before it compiles.
/// Attempts replace each other wholesale; a value is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ExtractedData {
    Invoice(InvoiceExtraction),
    CreditNote(CreditNoteExtraction),
    Bill(BillExtraction),
    Receipt(ReceiptExtraction),
    Expense(ExpenseExtraction),
}

/// One side of the transaction as seen on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Party<'a> {
    pub name: Option<&'a str>,
    pub vat_number: Option<&'a str>,
}

impl ExtractedData {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Invoice(_) => "invoice",
            Self::CreditNote(_) => "credit_note",
            Self::Bill(_) => "bill",
            Self::Receipt(_) => "receipt",
            Self::Expense(_) => "expense",
        }
    }

    /// Whether this shape is the extraction schema for a classified type.
    /// Pro forma documents are extracted with the invoice schema.
    pub fn fits(&self, document_type: ClassifiedType) -> bool {
        matches!(
            (self, document_type),
            (Self::Invoice(_), ClassifiedType::Invoice | ClassifiedType::ProForma)
                | (Self::CreditNote(_), ClassifiedType::CreditNote)
                | (Self::Bill(_), ClassifiedType::Bill)
                | (Self::Receipt(_), ClassifiedType::Receipt)
                | (Self::Expense(_), ClassifiedType::Expense)
        )
    }

    pub fn total_amount(&self) -> Option<&str> {
        match self {
            Self::Invoice(d) => d.total_amount.as_deref(),
            Self::CreditNote(d) => d.total_amount.as_deref(),
            Self::Bill(d) => d.total_amount.as_deref(),
            Self::Receipt(d) => d.total_amount.as_deref(),
            Self::Expense(d) => d.total_amount.as_deref(),
        }
    }

    pub fn subtotal_amount(&self) -> Option<&str> {
        match self {
            Self::Invoice(d) => d.subtotal_amount.as_deref(),
            Self::CreditNote(d) => d.subtotal_amount.as_deref(),
            Self::Bill(d) => d.subtotal_amount.as_deref(),
            Self::Receipt(d) => d.subtotal_amount.as_deref(),
            Self::Expense(_) => None,
        }
    }

    pub fn vat_amount(&self) -> Option<&str> {
        match self {
            Self::Invoice(d) => d.vat_amount.as_deref(),
            Self::CreditNote(d) => d.vat_amount.as_deref(),
            Self::Bill(d) => d.vat_amount.as_deref(),
            Self::Receipt(d) => d.vat_amount.as_deref(),
            Self::Expense(_) => None,
        }
    }

    /// The date the document is booked on (issue, transaction or expense date).
    pub fn document_date(&self) -> Option<&str> {
        match self {
            Self::Invoice(d) => d.issue_date.as_deref(),
            Self::CreditNote(d) => d.issue_date.as_deref(),
            Self::Bill(d) => d.issue_date.as_deref(),
            Self::Receipt(d) => d.transaction_date.as_deref(),
            Self::Expense(d) => d.date.as_deref(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Invoice(d) => d.category.as_deref(),
            Self::CreditNote(d) => d.category.as_deref(),
            Self::Bill(d) => d.category.as_deref(),
            Self::Receipt(d) => d.category.as_deref(),
            Self::Expense(d) => d.category.as_deref(),
        }
    }

    /// The party that issued the document (vendor, supplier, merchant).
    pub fn seller(&self) -> Party<'_> {
        match self {
            Self::Invoice(d) => Party {
                name: d.vendor_name.as_deref(),
                vat_number: d.vendor_vat_number.as_deref(),
            },
            Self::CreditNote(d) => Party {
                name: d.vendor_name.as_deref(),
                vat_number: d.vendor_vat_number.as_deref(),
            },
            Self::Bill(d) => Party {
                name: d.supplier_name.as_deref(),
                vat_number: d.supplier_vat_number.as_deref(),
            },
            Self::Receipt(d) => Party {
                name: d.merchant_name.as_deref(),
                vat_number: d.merchant_vat_number.as_deref(),
            },
            Self::Expense(d) => Party {
                name: d.merchant_name.as_deref(),
                vat_number: None,
            },
        }
    }

    /// The party the document is addressed to, when the shape records one.
    pub fn buyer(&self) -> Party<'_> {
        match self {
            Self::Invoice(d) => Party {
                name: d.customer_name.as_deref(),
                vat_number: d.customer_vat_number.as_deref(),
            },
            Self::CreditNote(d) => Party {
                name: d.customer_name.as_deref(),
                vat_number: d.customer_vat_number.as_deref(),
            },
            Self::Bill(d) => Party {
                name: d.customer_name.as_deref(),
                vat_number: d.customer_vat_number.as_deref(),
            },
            Self::Receipt(_) | Self::Expense(_) => Party::default(),
        }
    }

    pub fn direction_hint(&self) -> Option<&DirectionHint> {
        match self {
            Self::Invoice(d) => d.direction_hint.as_ref(),
            Self::CreditNote(d) => d.direction_hint.as_ref(),
            Self::Bill(d) => d.direction_hint.as_ref(),
            Self::Receipt(d) => d.direction_hint.as_ref(),
            Self::Expense(_) => None,
        }
    }

    /// Field names whose value differs from `previous`, in key order.
    /// Confidence is bookkeeping, not a field, and is never reported.
    pub fn changed_fields(&self, previous: &ExtractedData) -> Vec<String> {
        let current = field_map(self);
        let before = field_map(previous);

        let mut keys: Vec<&String> = current.keys().chain(before.keys()).collect();
        keys.sort();
        keys.dedup();

        keys.into_iter()
            .filter(|k| !matches!(k.as_str(), "shape" | "confidence"))
            .filter(|k| current.get(*k) != before.get(*k))
            .map(|k| k.to_string())
            .collect()
    }
}

fn field_map(data: &ExtractedData) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(data) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}
