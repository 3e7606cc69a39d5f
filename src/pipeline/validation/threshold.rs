use crate::models::enums::ClassifiedType;
use crate::pipeline::extraction::types::ExtractedData;
use crate::pipeline::parsing::has_text;

/// Decide whether an extraction carries enough to be worth a draft.
///
/// Looser than the essential-fields check: a draft may still need manual
/// completion. "Present" means non-blank; nothing has to parse here.
/// An `Unknown` classification never yields a draft.
pub fn meets_minimal_threshold(document_type: ClassifiedType, data: &ExtractedData) -> bool {
    if document_type == ClassifiedType::Unknown {
        return false;
    }

    // Invoice family: a total alone is enough, which also covers a total
    // paired with an issue date or vendor name. Failing that, subtotal and
    // VAT together are enough to reconstruct it.
    if document_type.is_invoice_family() {
        return invoice_family(data);
    }

    match data {
        ExtractedData::Invoice(_) | ExtractedData::CreditNote(_) => invoice_family(data),
        // An amount is enough; the amount-with-date-or-supplier branch is
        // subsumed by it.
        ExtractedData::Bill(d) => has_text(d.total_amount.as_deref()),
        ExtractedData::Receipt(d) => {
            has_text(d.total_amount.as_deref())
                && (has_text(d.merchant_name.as_deref()) || has_text(d.transaction_date.as_deref()))
        }
        ExtractedData::Expense(d) => {
            has_text(d.total_amount.as_deref())
                && (has_text(d.merchant_name.as_deref())
                    || has_text(d.date.as_deref())
                    || has_text(d.description.as_deref()))
        }
    }
}

fn invoice_family(data: &ExtractedData) -> bool {
    has_text(data.total_amount()) || (has_text(data.subtotal_amount()) && has_text(data.vat_amount()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::types::fixtures;

    fn total_only_invoice() -> ExtractedData {
        let mut invoice = fixtures::empty_invoice();
        invoice.total_amount = Some("100.00".into());
        ExtractedData::Invoice(invoice)
    }

    #[test]
    fn invoice_with_only_a_total_passes() {
        assert!(meets_minimal_threshold(ClassifiedType::Invoice, &total_only_invoice()));
        assert!(meets_minimal_threshold(ClassifiedType::ProForma, &total_only_invoice()));
    }

    #[test]
    fn invoice_subtotal_and_vat_pass_without_total() {
        let mut invoice = fixtures::empty_invoice();
        invoice.subtotal_amount = Some("100.00".into());
        assert!(!meets_minimal_threshold(
            ClassifiedType::Invoice,
            &ExtractedData::Invoice(invoice.clone())
        ));
        invoice.vat_amount = Some("21.00".into());
        assert!(meets_minimal_threshold(
            ClassifiedType::Invoice,
            &ExtractedData::Invoice(invoice)
        ));
    }

    #[test]
    fn credit_note_follows_invoice_rules() {
        let mut note = fixtures::credit_note();
        note.total_amount = None;
        assert!(meets_minimal_threshold(
            ClassifiedType::CreditNote,
            &ExtractedData::CreditNote(note.clone())
        ));
        note.vat_amount = None;
        assert!(!meets_minimal_threshold(
            ClassifiedType::CreditNote,
            &ExtractedData::CreditNote(note)
        ));
    }

    #[test]
    fn empty_invoice_fails() {
        let data = ExtractedData::Invoice(fixtures::empty_invoice());
        assert!(!meets_minimal_threshold(ClassifiedType::Invoice, &data));
    }

    #[test]
    fn receipt_needs_merchant_or_date() {
        let mut receipt = fixtures::receipt();
        receipt.merchant_name = None;
        receipt.transaction_date = None;
        assert!(!meets_minimal_threshold(
            ClassifiedType::Receipt,
            &ExtractedData::Receipt(receipt.clone())
        ));

        receipt.transaction_date = Some("2026-04-01".into());
        assert!(meets_minimal_threshold(
            ClassifiedType::Receipt,
            &ExtractedData::Receipt(receipt)
        ));
    }

    #[test]
    fn bill_needs_an_amount() {
        let mut bill = fixtures::bill();
        assert!(meets_minimal_threshold(ClassifiedType::Bill, &ExtractedData::Bill(bill.clone())));
        bill.total_amount = Some(" ".into());
        assert!(!meets_minimal_threshold(ClassifiedType::Bill, &ExtractedData::Bill(bill)));
    }

    #[test]
    fn expense_needs_amount_and_one_detail() {
        let mut expense = fixtures::expense();
        assert!(meets_minimal_threshold(
            ClassifiedType::Expense,
            &ExtractedData::Expense(expense.clone())
        ));
        expense.date = None;
        expense.description = None;
        expense.merchant_name = None;
        assert!(!meets_minimal_threshold(
            ClassifiedType::Expense,
            &ExtractedData::Expense(expense)
        ));
    }

    #[test]
    fn unknown_never_passes() {
        let data = ExtractedData::Invoice(fixtures::invoice());
        assert!(!meets_minimal_threshold(ClassifiedType::Unknown, &data));
    }
}
