//! UBL 2.1 serializer.
//!
//! Element order is load-bearing: downstream schema checks reject anything
//! out of place. The order lives in one place, [`SECTIONS`], an ordered list
//! of block builders. Subtype differences are read from the invoice's
//! [`TypeProfile`](crate::model::TypeProfile) inside the optional blocks.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::format::{money, percent, quantity};
use crate::model::{
    Address, Party, ValidatedInvoice, DEFAULT_UNIT_CODE,
};
use crate::xml::Element;

pub const INVOICE_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
pub const CAC_NS: &str =
    "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
pub const CBC_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";

/// Business process profile.
pub const PROFILE_ID: &str = "reporting:1.0";

/// Placeholder district for non-domestic buyers.
pub const DISTRICT_PLACEHOLDER: &str = "N/A";

/// Longest district name emitted.
pub const MAX_DISTRICT_CHARS: usize = 127;

/// Appends one block of the document to the root element.
pub type BlockBuilder = fn(&ValidatedInvoice, &mut Element) -> Result<(), CoreError>;

/// The document blocks, in emission order.
pub const SECTIONS: &[(&str, BlockBuilder)] = &[
    ("header", header),
    ("currencies", currencies),
    ("references", references),
    ("supply_period", supply_period),
    ("seller", seller),
    ("buyer", buyer),
    ("tax_total", tax_total),
    ("monetary_total", monetary_total),
    ("lines", lines),
];

/// Build the document tree of a validated invoice.
pub fn serialize(invoice: &ValidatedInvoice) -> Result<Element, CoreError> {
    let mut root = Element::new("Invoice")
        .attr("xmlns", INVOICE_NS)
        .attr("xmlns:cac", CAC_NS)
        .attr("xmlns:cbc", CBC_NS);

    for (_, build) in SECTIONS {
        build(invoice, &mut root)?;
    }
    Ok(root)
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocks
// ─────────────────────────────────────────────────────────────────────────────

fn header(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let draft = invoice.draft();
    let profile = invoice.profile();

    root.push(Element::leaf("cbc:ProfileID", PROFILE_ID));
    root.push(Element::leaf("cbc:ID", required("ID", &draft.number)?));
    root.push(Element::leaf("cbc:UUID", draft.uuid.to_string()));
    root.push(Element::leaf(
        "cbc:IssueDate",
        draft.issue_date.format("%Y-%m-%d").to_string(),
    ));
    root.push(Element::leaf(
        "cbc:IssueTime",
        draft.issue_time.format("%H:%M:%S").to_string(),
    ));
    root.push(
        Element::leaf("cbc:InvoiceTypeCode", profile.type_code)
            .attr("name", profile.transaction_code),
    );
    Ok(())
}

fn currencies(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let currency = required("DocumentCurrencyCode", &invoice.draft().currency)?;
    root.push(Element::leaf("cbc:DocumentCurrencyCode", currency));
    root.push(Element::leaf("cbc:TaxCurrencyCode", invoice.tax_currency()));
    Ok(())
}

fn references(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    root.push(
        Element::new("cac:AdditionalDocumentReference")
            .child(Element::leaf("cbc:ID", "ICV"))
            .child(Element::leaf("cbc:UUID", invoice.icv().to_string())),
    );
    root.push(
        Element::new("cac:AdditionalDocumentReference")
            .child(Element::leaf("cbc:ID", "PIH"))
            .child(
                Element::new("cac:Attachment").child(
                    Element::leaf("cbc:EmbeddedDocumentBinaryObject", invoice.pih().to_base64())
                        .attr("mimeCode", "text/plain"),
                ),
            ),
    );
    Ok(())
}

fn supply_period(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    if invoice.profile().includes_supply_period {
        root.push(Element::new("cac:InvoicePeriod").child(Element::leaf(
            "cbc:StartDate",
            invoice.supply_date().format("%Y-%m-%d").to_string(),
        )));
    }
    Ok(())
}

fn seller(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let seller = invoice.seller();
    let name = required("Seller.Name", &seller.name)?;
    let vat = tax_id("Seller.VAT", seller.vat_number.as_deref())?;
    let registration = seller
        .identification
        .as_ref()
        .ok_or_else(|| CoreError::empty("Seller.CRN"))?;
    let registration_value = required("Seller.CRN", &registration.value)?;

    let party = Element::new("cac:Party")
        .child(Element::new("cac:PartyName").child(Element::leaf("cbc:Name", name.clone())))
        .child(postal_address("Seller", &seller.address, true)?)
        .child(
            Element::new("cac:PartyTaxScheme")
                .child(Element::leaf("cbc:CompanyID", vat))
                .child(vat_scheme()),
        )
        .child(
            Element::new("cac:PartyLegalEntity")
                .child(Element::leaf("cbc:RegistrationName", name))
                .child(
                    Element::leaf("cbc:CompanyID", registration_value)
                        .attr("schemeID", registration.scheme.as_str()),
                ),
        );

    root.push(Element::new("cac:AccountingSupplierParty").child(party));
    Ok(())
}

fn buyer(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    if !invoice.profile().includes_buyer {
        return Ok(());
    }
    let buyer: &Party = invoice.buyer().ok_or_else(|| CoreError::empty("Buyer"))?;
    let name = required("Buyer.Name", &buyer.name)?;

    let mut party = Element::new("cac:Party");

    let vat = buyer.vat().map(strip_whitespace);
    if vat.is_none() {
        let id = buyer
            .identification
            .as_ref()
            .ok_or_else(|| CoreError::empty("Buyer.ID"))?;
        party.push(
            Element::new("cac:PartyIdentification").child(
                Element::leaf("cbc:ID", required("Buyer.ID", &id.value)?)
                    .attr("schemeID", id.scheme.as_str()),
            ),
        );
    }

    party.push(Element::new("cac:PartyName").child(Element::leaf("cbc:Name", name.clone())));
    party.push(postal_address(
        "Buyer",
        &buyer.address,
        buyer.address.is_domestic(),
    )?);

    let mut tax_scheme = Element::new("cac:PartyTaxScheme");
    if let Some(vat) = vat {
        tax_scheme.push(Element::leaf("cbc:CompanyID", vat));
    }
    party.push(tax_scheme.child(vat_scheme()));

    party.push(
        Element::new("cac:PartyLegalEntity").child(Element::leaf("cbc:RegistrationName", name)),
    );

    root.push(Element::new("cac:AccountingCustomerParty").child(party));
    Ok(())
}

fn tax_total(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let currency = invoice.currency();
    let mut total =
        Element::new("cac:TaxTotal").child(amount("cbc:TaxAmount", invoice.totals().vat, currency));

    if invoice.distinct_tax_currency().is_none() {
        for group in invoice.tax_breakdown() {
            total.push(
                Element::new("cac:TaxSubtotal")
                    .child(amount("cbc:TaxableAmount", group.taxable, currency))
                    .child(amount("cbc:TaxAmount", group.tax, currency))
                    .child(tax_category(
                        "cac:TaxCategory",
                        group.category.code(),
                        group.rate,
                    )),
            );
        }
    }

    root.push(total);
    Ok(())
}

fn monetary_total(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let currency = invoice.currency();
    let totals = invoice.totals();
    root.push(
        Element::new("cac:LegalMonetaryTotal")
            .child(amount("cbc:LineExtensionAmount", totals.line_extension, currency))
            .child(amount("cbc:TaxExclusiveAmount", totals.tax_exclusive, currency))
            .child(amount("cbc:TaxInclusiveAmount", totals.tax_inclusive, currency))
            .child(amount("cbc:PayableAmount", totals.payable, currency)),
    );
    Ok(())
}

fn lines(invoice: &ValidatedInvoice, root: &mut Element) -> Result<(), CoreError> {
    let currency = invoice.currency();

    for (idx, (line, totals)) in invoice.lines().enumerate() {
        let path = format!("InvoiceLine[{}]", idx + 1);
        let unit_code = match line.unit_code.trim() {
            "" => DEFAULT_UNIT_CODE,
            code => code,
        };

        root.push(
            Element::new("cac:InvoiceLine")
                .child(Element::leaf("cbc:ID", (idx + 1).to_string()))
                .child(
                    Element::leaf("cbc:InvoicedQuantity", quantity(line.quantity))
                        .attr("unitCode", unit_code),
                )
                .child(amount("cbc:LineExtensionAmount", totals.net, currency))
                .child(
                    Element::new("cac:TaxTotal")
                        .child(amount("cbc:TaxAmount", totals.vat, currency))
                        .child(amount("cbc:RoundingAmount", totals.gross, currency)),
                )
                .child(
                    Element::new("cac:Item")
                        .child(Element::leaf(
                            "cbc:Name",
                            required(&format!("{path}.Item.Name"), &line.name)?,
                        ))
                        .child(tax_category(
                            "cac:ClassifiedTaxCategory",
                            line.vat_category.code(),
                            line.vat_rate,
                        )),
                )
                .child(
                    Element::new("cac:Price")
                        .child(amount("cbc:PriceAmount", line.unit_price, currency)),
                ),
        );
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Trimmed value, or a structural failure if nothing remains.
fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(CoreError::empty(field));
    }
    Ok(v.to_string())
}

fn tax_id(field: &str, value: Option<&str>) -> Result<String, CoreError> {
    let v = strip_whitespace(value.unwrap_or_default());
    if v.is_empty() {
        return Err(CoreError::empty(field));
    }
    Ok(v)
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

fn amount(name: &str, value: Decimal, currency: &str) -> Element {
    Element::leaf(name, money(value)).attr("currencyID", currency)
}

fn vat_scheme() -> Element {
    Element::new("cac:TaxScheme").child(Element::leaf("cbc:ID", "VAT"))
}

fn tax_category(name: &str, code: &str, rate: Decimal) -> Element {
    Element::new(name)
        .child(Element::leaf("cbc:ID", code))
        .child(Element::leaf("cbc:Percent", percent(rate)))
        .child(vat_scheme())
}

/// Keep digits only, take the first four and left-pad with zeros.
pub fn building_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(4).collect();
    format!("{digits:0>4}")
}

fn postal_address(
    owner: &str,
    addr: &Address,
    district_required: bool,
) -> Result<Element, CoreError> {
    let street = required(&format!("{owner}.Address.Street"), &addr.street)?;
    let city = required(&format!("{owner}.Address.City"), &addr.city)?;
    let postal = required(&format!("{owner}.Address.PostalZone"), &addr.postal_code)?;
    let country = required(&format!("{owner}.Address.Country"), &addr.country)?.to_uppercase();

    let district = addr.district.as_deref().map(str::trim).unwrap_or_default();
    let district = if district.is_empty() {
        if district_required {
            return Err(CoreError::empty(format!("{owner}.Address.District")));
        }
        DISTRICT_PLACEHOLDER.to_string()
    } else {
        district.chars().take(MAX_DISTRICT_CHARS).collect()
    };

    Ok(Element::new("cac:PostalAddress")
        .child(Element::leaf("cbc:StreetName", street))
        .child(Element::leaf(
            "cbc:BuildingNumber",
            building_number(&addr.building_number),
        ))
        .child(Element::leaf("cbc:CityName", city))
        .child(Element::leaf("cbc:PostalZone", postal))
        .child(Element::leaf("cbc:District", district))
        .child(Element::new("cac:Country").child(Element::leaf("cbc:IdentificationCode", country))))
}
