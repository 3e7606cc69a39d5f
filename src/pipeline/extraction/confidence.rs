use super::types::*;

/// Anything that carries a model-reported confidence (0.0–1.0).
///
/// Every extraction shape holds a required `confidence` field, so there is
/// no fallback value: a payload without one never deserializes.
pub trait HasConfidence {
    fn confidence(&self) -> f64;
}

macro_rules! impl_has_confidence {
    ($($shape:ty),+ $(,)?) => {
        $(impl HasConfidence for $shape {
            fn confidence(&self) -> f64 {
                self.confidence
            }
        })+
    };
}

impl_has_confidence!(
    InvoiceExtraction,
    CreditNoteExtraction,
    BillExtraction,
    ReceiptExtraction,
    ExpenseExtraction,
    Classification,
);

impl HasConfidence for ExtractedData {
    fn confidence(&self) -> f64 {
        match self {
            Self::Invoice(d) => d.confidence(),
            Self::CreditNote(d) => d.confidence(),
            Self::Bill(d) => d.confidence(),
            Self::Receipt(d) => d.confidence(),
            Self::Expense(d) => d.confidence(),
        }
    }
}
