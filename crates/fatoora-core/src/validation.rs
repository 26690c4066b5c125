//! Draft validation: business rules checked once, all violations collected.
//!
//! Acceptance downstream is all-or-nothing, so checks never short-circuit.
//! A draft that passes becomes a [`ValidatedInvoice`].

use rust_decimal::Decimal;

use crate::error::{ValidationError, Violation, ViolationCode};
use crate::model::{
    non_blank, Address, DocumentTotals, IdScheme, InvoiceDraft, LineTotals, Party,
    ValidatedInvoice, DOMESTIC_COUNTRY, MANDATED_CURRENCY,
};

/// Validate a draft, returning the immutable validated invoice or every
/// violation found.
pub fn validate(draft: InvoiceDraft) -> Result<ValidatedInvoice, ValidationError> {
    let violations = check(&draft);
    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    let mut v = Violations::default();
    match amounts(&draft, &mut v) {
        Some((lines, totals)) => Ok(ValidatedInvoice::new(draft, lines, totals)),
        None => Err(ValidationError { violations: v.0 }),
    }
}

/// Collect all violations of a draft without consuming it.
pub fn check(draft: &InvoiceDraft) -> Vec<Violation> {
    let mut v = Violations::default();

    check_document(draft, &mut v);
    check_seller(&draft.seller, &mut v);
    if draft.kind.profile().includes_buyer {
        match &draft.buyer {
            Some(buyer) => check_buyer(buyer, &mut v),
            None => v.push(
                ViolationCode::BuyerMissing,
                "Buyer",
                "buyer is required for standard invoices",
            ),
        }
    }
    check_lines(draft, &mut v);
    if !draft.lines.is_empty() {
        amounts(draft, &mut v);
    }

    v.0
}

/// Line and document amounts, recording a violation for each overflow.
fn amounts(
    draft: &InvoiceDraft,
    v: &mut Violations,
) -> Option<(Vec<LineTotals>, DocumentTotals)> {
    let mut lines = Vec::with_capacity(draft.lines.len());
    for (idx, line) in draft.lines.iter().enumerate() {
        match line.totals() {
            Some(totals) => lines.push(totals),
            None => v.push(
                ViolationCode::LineAmount,
                format!("InvoiceLine[{}].LineExtensionAmount", idx + 1),
                "line amount is out of range",
            ),
        }
    }
    if lines.len() != draft.lines.len() {
        return None;
    }

    match DocumentTotals::from_lines(&lines) {
        Some(totals) => Some((lines, totals)),
        None => {
            v.push(
                ViolationCode::DocumentAmount,
                "LegalMonetaryTotal",
                "document total is out of range",
            );
            None
        }
    }
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(
        &mut self,
        code: ViolationCode,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.push(Violation {
            code,
            message: message.into(),
            field: field.into(),
        });
    }

    /// Record a violation when `value` is blank.
    fn require(&mut self, code: ViolationCode, field: &str, value: Option<&str>, message: &str) {
        if non_blank(value).is_none() {
            self.push(code, field, message);
        }
    }
}

fn is_building_number(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

fn check_document(draft: &InvoiceDraft, v: &mut Violations) {
    v.require(
        ViolationCode::InvoiceNumber,
        "ID",
        Some(draft.number.as_str()),
        "invoice number is required",
    );

    if draft.currency.trim() != MANDATED_CURRENCY {
        v.push(
            ViolationCode::Currency,
            "DocumentCurrencyCode",
            format!(
                "currency must be {MANDATED_CURRENCY}, got {:?}",
                draft.currency
            ),
        );
    }

    if let Some(tax_currency) = &draft.tax_currency {
        let t = tax_currency.trim();
        if t.len() != 3 || !t.bytes().all(|b| b.is_ascii_uppercase()) {
            v.push(
                ViolationCode::TaxCurrency,
                "TaxCurrencyCode",
                format!("tax currency must be a 3-letter ISO 4217 code, got {tax_currency:?}"),
            );
        }
    }

    if draft.icv == 0 {
        v.push(
            ViolationCode::CounterValue,
            "AdditionalDocumentReference.ICV",
            "invoice counter value starts at 1",
        );
    }
}

fn check_seller(seller: &Party, v: &mut Violations) {
    v.require(
        ViolationCode::SellerName,
        "Seller.Name",
        Some(seller.name.as_str()),
        "seller name is required",
    );
    v.require(
        ViolationCode::SellerVat,
        "Seller.VAT",
        seller.vat_number.as_deref(),
        "seller VAT number is required",
    );
    v.require(
        ViolationCode::SellerRegistration,
        "Seller.CRN",
        seller.id_value(),
        "seller commercial registration number is required",
    );
    if let Some(id) = seller.identification.as_ref() {
        if seller.id_value().is_some() && id.scheme != IdScheme::Crn {
            v.push(
                ViolationCode::SellerRegistration,
                "Seller.CRN",
                format!(
                    "seller identification must use scheme CRN, got {}",
                    id.scheme.as_str()
                ),
            );
        }
    }

    let addr = &seller.address;
    v.require(
        ViolationCode::SellerStreet,
        "Seller.Address.Street",
        Some(addr.street.as_str()),
        "seller street is required",
    );
    v.require(
        ViolationCode::SellerCity,
        "Seller.Address.City",
        Some(addr.city.as_str()),
        "seller city is required",
    );
    v.require(
        ViolationCode::SellerPostalZone,
        "Seller.Address.PostalZone",
        Some(addr.postal_code.as_str()),
        "seller postal code is required",
    );
    v.require(
        ViolationCode::SellerDistrict,
        "Seller.Address.District",
        addr.district.as_deref(),
        "seller district is required",
    );
    v.require(
        ViolationCode::SellerCountry,
        "Seller.Address.Country",
        Some(addr.country.as_str()),
        "seller country code is required",
    );

    let building = addr.building_number.trim();
    if building.is_empty() {
        v.push(
            ViolationCode::SellerBuildingNumber,
            "Seller.Address.BuildingNumber",
            "seller building number is required (4 digits)",
        );
    } else if !is_building_number(building) {
        v.push(
            ViolationCode::SellerBuildingNumber,
            "Seller.Address.BuildingNumber",
            format!("building number must be exactly 4 digits, got {building:?}"),
        );
    }
}

fn check_buyer(buyer: &Party, v: &mut Violations) {
    let addr: &Address = &buyer.address;
    let country = addr.country.trim();
    // A blank country is reported below and otherwise treated as domestic.
    let domestic = country.is_empty() || country.eq_ignore_ascii_case(DOMESTIC_COUNTRY);

    v.require(
        ViolationCode::BuyerName,
        "Buyer.Name",
        Some(buyer.name.as_str()),
        "buyer name is required for standard invoices",
    );
    v.require(
        ViolationCode::BuyerStreet,
        "Buyer.Address.Street",
        Some(addr.street.as_str()),
        "buyer street is required for standard invoices",
    );
    v.require(
        ViolationCode::BuyerCity,
        "Buyer.Address.City",
        Some(addr.city.as_str()),
        "buyer city is required for standard invoices",
    );
    if domestic {
        v.require(
            ViolationCode::BuyerPostalZone,
            "Buyer.Address.PostalZone",
            Some(addr.postal_code.as_str()),
            "buyer postal code is required for domestic buyers",
        );
        v.require(
            ViolationCode::BuyerDistrict,
            "Buyer.Address.District",
            addr.district.as_deref(),
            "buyer district is required for domestic buyers",
        );
    }
    v.require(
        ViolationCode::BuyerCountry,
        "Buyer.Address.Country",
        Some(country),
        "buyer country code is required for standard invoices",
    );

    let building = addr.building_number.trim();
    if !building.is_empty() {
        if !is_building_number(building) {
            v.push(
                ViolationCode::BuyerBuildingNumber,
                "Buyer.Address.BuildingNumber",
                format!("building number must be exactly 4 digits, got {building:?}"),
            );
        }
    } else if domestic {
        v.push(
            ViolationCode::BuyerBuildingNumber,
            "Buyer.Address.BuildingNumber",
            "buyer building number is required (4 digits) for domestic buyers",
        );
    }

    if buyer.vat().is_none() && buyer.id_value().is_none() {
        v.push(
            ViolationCode::BuyerIdentification,
            "Buyer.ID",
            "buyer VAT number or a scheme-tagged identification is required",
        );
    }
}

fn check_lines(draft: &InvoiceDraft, v: &mut Violations) {
    if draft.lines.is_empty() {
        v.push(
            ViolationCode::NoLines,
            "InvoiceLine",
            "at least one invoice line is required",
        );
        return;
    }

    for (idx, line) in draft.lines.iter().enumerate() {
        let path = format!("InvoiceLine[{}]", idx + 1);

        if line.quantity <= Decimal::ZERO {
            v.push(
                ViolationCode::LineQuantity,
                format!("{path}.InvoicedQuantity"),
                format!("quantity must be greater than zero, got {}", line.quantity),
            );
        }
        if line.unit_price < Decimal::ZERO {
            v.push(
                ViolationCode::LinePrice,
                format!("{path}.PriceAmount"),
                format!("unit price must not be negative, got {}", line.unit_price),
            );
        }
        if line.vat_rate < Decimal::ZERO || line.vat_rate > Decimal::ONE_HUNDRED {
            v.push(
                ViolationCode::LineVatRate,
                format!("{path}.Item.ClassifiedTaxCategory.Percent"),
                format!("VAT rate must be between 0 and 100, got {}", line.vat_rate),
            );
        }
        if line.name.trim().is_empty() {
            v.push(
                ViolationCode::LineName,
                format!("{path}.Item.Name"),
                "item name is required",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdScheme, InvoiceType, LineItem};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    fn address() -> Address {
        Address {
            street: "King Fahd Rd".into(),
            building_number: "1234".into(),
            city: "Riyadh".into(),
            postal_code: "11564".into(),
            district: Some("Olaya".into()),
            country: "SA".into(),
        }
    }

    fn seller() -> Party {
        Party::new("ACME", address())
            .with_vat_number("310123456700003")
            .with_identification(IdScheme::Crn, "2341682066")
    }

    fn buyer() -> Party {
        Party::new("Buyer Co", address()).with_vat_number("300000000000003")
    }

    fn draft(kind: InvoiceType) -> InvoiceDraft {
        InvoiceDraft::new(
            kind,
            "INV-1",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            seller(),
        )
        .line(LineItem::new("Widget", dec!(2), dec!(100), dec!(15)))
    }

    #[test]
    fn test_valid_simplified() {
        assert!(validate(draft(InvoiceType::Simplified)).is_ok());
    }

    #[test]
    fn test_valid_standard() {
        assert!(validate(draft(InvoiceType::Standard).buyer(buyer())).is_ok());
    }

    #[test]
    fn test_aggregates_three_distinct_violations() {
        let mut d = draft(InvoiceType::Simplified);
        d.seller.vat_number = None;
        d.seller.identification = None;
        d.lines[0].quantity = Decimal::ZERO;

        let err = validate(d).unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert_eq!(
            err.codes(),
            vec![
                ViolationCode::SellerVat,
                ViolationCode::SellerRegistration,
                ViolationCode::LineQuantity,
            ]
        );
        assert_eq!(err.violations[2].field, "InvoiceLine[1].InvoicedQuantity");
    }

    #[test]
    fn test_seller_registration_must_be_crn() {
        let mut d = draft(InvoiceType::Simplified);
        d.seller = d.seller.with_identification(IdScheme::Nat, "1234567890");
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::SellerRegistration]);
        assert!(err.violations[0].message.contains("NAT"));
    }

    #[test]
    fn test_line_amount_overflow_is_a_violation() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(19), 0);
        let d = draft(InvoiceType::Simplified)
            .line(LineItem::new("Galaxy", huge, huge, dec!(15)));
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::LineAmount]);
        assert_eq!(err.violations[0].field, "InvoiceLine[2].LineExtensionAmount");
    }

    #[test]
    fn test_document_total_overflow_is_a_violation() {
        let big = Decimal::from_i128_with_scale(4 * 10_i128.pow(28), 0);
        let mut d = draft(InvoiceType::Simplified);
        d.lines = vec![
            LineItem::new("A", dec!(1), big, dec!(0)),
            LineItem::new("B", dec!(1), big, dec!(0)),
        ];
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::DocumentAmount]);
    }

    #[test]
    fn test_currency_must_be_sar() {
        let err = validate(draft(InvoiceType::Simplified).currency("USD")).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::Currency]);
        assert_eq!(err.violations[0].code.as_str(), "BT-5");
    }

    #[test]
    fn test_tax_currency_format() {
        assert!(validate(draft(InvoiceType::Simplified).tax_currency("USD")).is_ok());
        let err = validate(draft(InvoiceType::Simplified).tax_currency("usd")).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::TaxCurrency]);
    }

    #[test]
    fn test_seller_building_number_format() {
        let mut d = draft(InvoiceType::Simplified);
        d.seller.address.building_number = "12a4".into();
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::SellerBuildingNumber]);

        let mut d = draft(InvoiceType::Simplified);
        d.seller.address.building_number = "  ".into();
        let err = validate(d).unwrap_err();
        assert!(err.violations[0].message.contains("required"));
    }

    #[test]
    fn test_seller_district_never_defaulted() {
        let mut d = draft(InvoiceType::Simplified);
        d.seller.address.district = Some(" ".into());
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::SellerDistrict]);
    }

    #[test]
    fn test_standard_requires_buyer() {
        let err = validate(draft(InvoiceType::Standard)).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::BuyerMissing]);
    }

    #[test]
    fn test_simplified_ignores_buyer() {
        let incomplete = Party::new("", Address::default());
        assert!(validate(draft(InvoiceType::Simplified).buyer(incomplete)).is_ok());
    }

    #[test]
    fn test_standard_buyer_requires_vat_or_id() {
        let mut b = buyer();
        b.vat_number = None;
        let err = validate(draft(InvoiceType::Standard).buyer(b.clone())).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::BuyerIdentification]);

        let b = b.with_identification(IdScheme::Nat, "1010101010");
        assert!(validate(draft(InvoiceType::Standard).buyer(b)).is_ok());
    }

    #[test]
    fn test_foreign_buyer_relaxed_address() {
        let mut b = buyer();
        b.address.country = "AE".into();
        b.address.postal_code = String::new();
        b.address.district = None;
        b.address.building_number = String::new();
        assert!(validate(draft(InvoiceType::Standard).buyer(b)).is_ok());
    }

    #[test]
    fn test_domestic_buyer_full_address() {
        let mut b = buyer();
        b.address.postal_code = String::new();
        b.address.district = None;
        b.address.building_number = String::new();
        let err = validate(draft(InvoiceType::Standard).buyer(b)).unwrap_err();
        assert_eq!(
            err.codes(),
            vec![
                ViolationCode::BuyerPostalZone,
                ViolationCode::BuyerDistrict,
                ViolationCode::BuyerBuildingNumber,
            ]
        );
    }

    #[test]
    fn test_no_lines() {
        let mut d = draft(InvoiceType::Simplified);
        d.lines.clear();
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::NoLines]);
    }

    #[test]
    fn test_line_rules_use_one_based_paths() {
        let d = draft(InvoiceType::Simplified)
            .line(LineItem::new(" ", dec!(1), dec!(-1), dec!(101)));
        let err = validate(d).unwrap_err();
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "InvoiceLine[2].PriceAmount",
                "InvoiceLine[2].Item.ClassifiedTaxCategory.Percent",
                "InvoiceLine[2].Item.Name",
            ]
        );
    }

    #[test]
    fn test_zero_icv_rejected() {
        let d = draft(InvoiceType::Simplified).chained(0, None);
        let err = validate(d).unwrap_err();
        assert_eq!(err.codes(), vec![ViolationCode::CounterValue]);
    }

    #[test]
    fn test_check_does_not_consume() {
        let d = draft(InvoiceType::Simplified).currency("EUR");
        assert_eq!(check(&d).len(), 1);
        assert_eq!(d.currency, "EUR");
    }
}
