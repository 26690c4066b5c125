//! Invoice document model.
//!
//! An [`InvoiceDraft`] is plain data assembled by the caller. It becomes a
//! [`ValidatedInvoice`] only through [`crate::validation::validate`], which
//! checks every business rule once and precomputes all totals. The serializer
//! accepts nothing else.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::round_money;
use crate::hash::InvoiceHash;

/// The only document currency accepted.
pub const MANDATED_CURRENCY: &str = "SAR";

/// Country code of a domestic party.
pub const DOMESTIC_COUNTRY: &str = "SA";

/// Default unit of measure for a line.
pub const DEFAULT_UNIT_CODE: &str = "EA";

/// Invoice subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    /// Business-to-business tax invoice.
    Standard,
    /// Business-to-consumer simplified invoice.
    Simplified,
}

impl InvoiceType {
    /// The type strategy consulted by the serializer.
    pub fn profile(self) -> &'static TypeProfile {
        match self {
            InvoiceType::Standard => &STANDARD,
            InvoiceType::Simplified => &SIMPLIFIED,
        }
    }
}

/// Everything that differs between invoice subtypes.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeProfile {
    /// `cbc:InvoiceTypeCode` content.
    pub type_code: &'static str,
    /// `name` attribute of `cbc:InvoiceTypeCode`.
    pub transaction_code: &'static str,
    /// Whether the buyer party block is emitted.
    pub includes_buyer: bool,
    /// Whether the supply-period block is emitted.
    pub includes_supply_period: bool,
}

static STANDARD: TypeProfile = TypeProfile {
    type_code: "388",
    transaction_code: "0100000",
    includes_buyer: true,
    includes_supply_period: true,
};

static SIMPLIFIED: TypeProfile = TypeProfile {
    type_code: "389",
    transaction_code: "0200000",
    includes_buyer: false,
    includes_supply_period: false,
};

/// VAT category of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VatCategory {
    #[default]
    #[serde(rename = "S")]
    Standard,
    #[serde(rename = "Z")]
    ZeroRated,
    #[serde(rename = "E")]
    Exempt,
    #[serde(rename = "O")]
    OutOfScope,
}

impl VatCategory {
    pub fn code(self) -> &'static str {
        match self {
            VatCategory::Standard => "S",
            VatCategory::ZeroRated => "Z",
            VatCategory::Exempt => "E",
            VatCategory::OutOfScope => "O",
        }
    }
}

/// Identification scheme for a party id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdScheme {
    /// Commercial registration number.
    Crn,
    /// National id.
    Nat,
    /// Iqama (resident id).
    Iqa,
    /// Passport.
    Pas,
    /// Ministry of municipal affairs license.
    Mom,
    /// Ministry of labor and social development license.
    Mls,
    /// Sagia license.
    Sag,
    /// GCC id.
    Gcc,
    /// Tax identification number.
    Tin,
    /// Other id.
    Oth,
    /// 700 number.
    #[serde(rename = "700")]
    SevenHundred,
}

impl IdScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            IdScheme::Crn => "CRN",
            IdScheme::Nat => "NAT",
            IdScheme::Iqa => "IQA",
            IdScheme::Pas => "PAS",
            IdScheme::Mom => "MOM",
            IdScheme::Mls => "MLS",
            IdScheme::Sag => "SAG",
            IdScheme::Gcc => "GCC",
            IdScheme::Tin => "TIN",
            IdScheme::Oth => "OTH",
            IdScheme::SevenHundred => "700",
        }
    }
}

/// A scheme-tagged party identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyId {
    pub scheme: IdScheme,
    pub value: String,
}

impl PartyId {
    pub fn new(scheme: IdScheme, value: impl Into<String>) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    /// Four digits; zero-padded on output.
    pub building_number: String,
    pub city: String,
    pub postal_code: String,
    pub district: Option<String>,
    /// ISO 3166-1 alpha-2.
    pub country: String,
}

impl Address {
    /// Whether the address is inside the kingdom.
    pub fn is_domestic(&self) -> bool {
        self.country.trim().eq_ignore_ascii_case(DOMESTIC_COUNTRY)
    }
}

/// A seller or buyer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    /// VAT registration number.
    pub vat_number: Option<String>,
    /// Registration or identity number. For the seller this is the CRN.
    pub identification: Option<PartyId>,
    pub address: Address,
}

impl Party {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            ..Default::default()
        }
    }

    pub fn with_vat_number(mut self, vat: impl Into<String>) -> Self {
        self.vat_number = Some(vat.into());
        self
    }

    pub fn with_identification(mut self, scheme: IdScheme, value: impl Into<String>) -> Self {
        self.identification = Some(PartyId::new(scheme, value));
        self
    }

    /// VAT number with surrounding whitespace removed, if non-blank.
    pub fn vat(&self) -> Option<&str> {
        non_blank(self.vat_number.as_deref())
    }

    /// Identification value, if non-blank.
    pub fn id_value(&self) -> Option<&str> {
        non_blank(self.identification.as_ref().map(|id| id.value.as_str()))
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// An invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Percentage, e.g. `15`.
    pub vat_rate: Decimal,
    #[serde(default)]
    pub vat_category: VatCategory,
    #[serde(default = "default_unit_code")]
    pub unit_code: String,
}

fn default_unit_code() -> String {
    DEFAULT_UNIT_CODE.to_string()
}

impl LineItem {
    /// A standard-rated line with unit code `EA`.
    pub fn new(
        name: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            vat_rate,
            vat_category: VatCategory::Standard,
            unit_code: default_unit_code(),
        }
    }

    pub fn with_category(mut self, category: VatCategory) -> Self {
        self.vat_category = category;
        self
    }

    pub fn with_unit_code(mut self, unit_code: impl Into<String>) -> Self {
        self.unit_code = unit_code.into();
        self
    }

    /// Net, VAT and gross amounts of this line.
    ///
    /// `net = round(qty * price, 2)`, `vat = round(net * rate / 100, 2)`,
    /// `gross = net + vat`. `None` when an amount overflows.
    pub fn totals(&self) -> Option<LineTotals> {
        let net = round_money(self.quantity.checked_mul(self.unit_price)?);
        let vat = round_money(
            net.checked_mul(self.vat_rate)?
                .checked_div(Decimal::ONE_HUNDRED)?,
        );
        Some(LineTotals {
            net,
            vat,
            gross: net.checked_add(vat)?,
        })
    }
}

/// Derived amounts of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

/// Derived document-level amounts: the sums of line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of line net amounts.
    pub line_extension: Decimal,
    /// Amount without VAT.
    pub tax_exclusive: Decimal,
    /// Sum of line VAT amounts.
    pub vat: Decimal,
    /// Amount with VAT.
    pub tax_inclusive: Decimal,
    /// Amount due.
    pub payable: Decimal,
}

impl DocumentTotals {
    /// Sum line totals. `None` when a sum overflows.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineTotals>) -> Option<Self> {
        let (net, vat) = lines
            .into_iter()
            .try_fold((Decimal::ZERO, Decimal::ZERO), |(n, v), t| {
                Some((n.checked_add(t.net)?, v.checked_add(t.vat)?))
            })?;
        let gross = net.checked_add(vat)?;
        Some(Self {
            line_extension: net,
            tax_exclusive: net,
            vat,
            tax_inclusive: gross,
            payable: gross,
        })
    }
}

/// One (category, rate) group of the tax breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSubtotal {
    pub category: VatCategory,
    pub rate: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
}

/// Caller-supplied invoice data, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub kind: InvoiceType,
    /// Human-facing invoice number. Distinct from the ICV.
    pub number: String,
    pub uuid: Uuid,
    pub issue_date: NaiveDate,
    pub issue_time: NaiveTime,
    /// Defaults to the issue date.
    pub supply_date: Option<NaiveDate>,
    pub currency: String,
    /// Declared only when it differs from the document currency.
    pub tax_currency: Option<String>,
    /// Invoice counter value.
    pub icv: u64,
    /// Hash of the preceding document; `None` for the first in a chain.
    pub previous_hash: Option<InvoiceHash>,
    pub seller: Party,
    pub buyer: Option<Party>,
    pub lines: Vec<LineItem>,
}

impl InvoiceDraft {
    /// Start a draft with ICV 1, no predecessor, currency `SAR` and a fresh UUID.
    pub fn new(
        kind: InvoiceType,
        number: impl Into<String>,
        issue_date: NaiveDate,
        issue_time: NaiveTime,
        seller: Party,
    ) -> Self {
        Self {
            kind,
            number: number.into(),
            uuid: Uuid::new_v4(),
            issue_date,
            issue_time,
            supply_date: None,
            currency: MANDATED_CURRENCY.to_string(),
            tax_currency: None,
            icv: 1,
            previous_hash: None,
            seller,
            buyer: None,
            lines: Vec::new(),
        }
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn supply_date(mut self, date: NaiveDate) -> Self {
        self.supply_date = Some(date);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn tax_currency(mut self, currency: impl Into<String>) -> Self {
        self.tax_currency = Some(currency.into());
        self
    }

    pub fn buyer(mut self, buyer: Party) -> Self {
        self.buyer = Some(buyer);
        self
    }

    pub fn line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    /// Set ICV and PIH from a chain position.
    pub fn chained(mut self, icv: u64, previous_hash: Option<InvoiceHash>) -> Self {
        self.icv = icv;
        self.previous_hash = previous_hash;
        self
    }
}

/// A draft that passed validation. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInvoice {
    draft: InvoiceDraft,
    line_totals: Vec<LineTotals>,
    totals: DocumentTotals,
}

impl ValidatedInvoice {
    pub(crate) fn new(
        draft: InvoiceDraft,
        line_totals: Vec<LineTotals>,
        totals: DocumentTotals,
    ) -> Self {
        Self {
            draft,
            line_totals,
            totals,
        }
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    pub fn into_draft(self) -> InvoiceDraft {
        self.draft
    }

    pub fn kind(&self) -> InvoiceType {
        self.draft.kind
    }

    pub fn profile(&self) -> &'static TypeProfile {
        self.draft.kind.profile()
    }

    pub fn seller(&self) -> &Party {
        &self.draft.seller
    }

    /// The buyer, when the subtype carries one.
    pub fn buyer(&self) -> Option<&Party> {
        if self.profile().includes_buyer {
            self.draft.buyer.as_ref()
        } else {
            None
        }
    }

    pub fn icv(&self) -> u64 {
        self.draft.icv
    }

    /// Previous invoice hash, or the zero hash for the first document.
    pub fn pih(&self) -> InvoiceHash {
        self.draft.previous_hash.unwrap_or(InvoiceHash::ZERO)
    }

    pub fn supply_date(&self) -> NaiveDate {
        self.draft.supply_date.unwrap_or(self.draft.issue_date)
    }

    /// The tax currency, if one distinct from the document currency is declared.
    pub fn distinct_tax_currency(&self) -> Option<&str> {
        non_blank(self.draft.tax_currency.as_deref()).filter(|c| *c != self.currency())
    }

    /// The document currency code, trimmed.
    pub fn currency(&self) -> &str {
        self.draft.currency.trim()
    }

    /// The currency written as `cbc:TaxCurrencyCode`.
    pub fn tax_currency(&self) -> &str {
        self.distinct_tax_currency().unwrap_or(self.currency())
    }

    /// Lines paired with their derived amounts.
    pub fn lines(&self) -> impl Iterator<Item = (&LineItem, &LineTotals)> {
        self.draft.lines.iter().zip(self.line_totals.iter())
    }

    pub fn totals(&self) -> &DocumentTotals {
        &self.totals
    }

    /// Line amounts grouped by (category, rate), in first-seen order.
    pub fn tax_breakdown(&self) -> Vec<TaxSubtotal> {
        let mut groups: Vec<TaxSubtotal> = Vec::new();
        for (line, totals) in self.lines() {
            let rate = line.vat_rate.normalize();
            match groups
                .iter_mut()
                .find(|g| g.category == line.vat_category && g.rate == rate)
            {
                Some(group) => {
                    group.taxable += totals.net;
                    group.tax += totals.vat;
                }
                None => groups.push(TaxSubtotal {
                    category: line.vat_category,
                    rate,
                    taxable: totals.net,
                    tax: totals.vat,
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_totals() {
        let line = LineItem::new("Widget", dec!(2), dec!(100), dec!(15));
        let t = line.totals().unwrap();
        assert_eq!(t.net.to_string(), "200.00");
        assert_eq!(t.vat.to_string(), "30.00");
        assert_eq!(t.gross.to_string(), "230.00");
    }

    #[test]
    fn test_line_totals_round_each_step() {
        // 3 x 0.335 = 1.005 -> 1.01; 1.01 * 15% = 0.1515 -> 0.15
        let line = LineItem::new("Bolt", dec!(3), dec!(0.335), dec!(15));
        let t = line.totals().unwrap();
        assert_eq!(t.net, dec!(1.01));
        assert_eq!(t.vat, dec!(0.15));
        assert_eq!(t.gross, dec!(1.16));
    }

    #[test]
    fn test_document_totals_sum_lines() {
        let lines = [
            LineItem::new("A", dec!(1), dec!(10), dec!(15)).totals().unwrap(),
            LineItem::new("B", dec!(2), dec!(5.5), dec!(0)).totals().unwrap(),
        ];
        let totals = DocumentTotals::from_lines(&lines).unwrap();
        assert_eq!(totals.line_extension, dec!(21.00));
        assert_eq!(totals.vat, dec!(1.50));
        assert_eq!(totals.payable, dec!(22.50));
        assert_eq!(totals.tax_inclusive, totals.payable);
    }

    #[test]
    fn test_line_totals_overflow() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(19), 0);
        let line = LineItem::new("Everything", huge, huge, dec!(15));
        assert_eq!(line.totals(), None);

        let max = LineTotals {
            net: Decimal::MAX,
            vat: Decimal::ZERO,
            gross: Decimal::MAX,
        };
        assert_eq!(DocumentTotals::from_lines(&[max, max]), None);
    }

    #[test]
    fn test_type_profiles() {
        let standard = InvoiceType::Standard.profile();
        assert_eq!(standard.type_code, "388");
        assert_eq!(standard.transaction_code, "0100000");
        assert!(standard.includes_buyer && standard.includes_supply_period);

        let simplified = InvoiceType::Simplified.profile();
        assert_eq!(simplified.type_code, "389");
        assert_eq!(simplified.transaction_code, "0200000");
        assert!(!simplified.includes_buyer && !simplified.includes_supply_period);
    }

    #[test]
    fn test_line_defaults() {
        let line = LineItem::new("A", dec!(1), dec!(1), dec!(15));
        assert_eq!(line.vat_category, VatCategory::Standard);
        assert_eq!(line.unit_code, "EA");

        let json = r#"{"name":"A","quantity":"1","unit_price":"2","vat_rate":"15"}"#;
        let parsed: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.vat_category, VatCategory::Standard);
        assert_eq!(parsed.unit_code, "EA");
    }

    #[test]
    fn test_address_domestic() {
        let mut addr = Address {
            country: "sa".into(),
            ..Default::default()
        };
        assert!(addr.is_domestic());
        addr.country = "AE".into();
        assert!(!addr.is_domestic());
    }

    #[test]
    fn test_party_trims_ids() {
        let party = Party::new("X", Address::default())
            .with_vat_number("  ")
            .with_identification(IdScheme::Nat, " 1010 ");
        assert_eq!(party.vat(), None);
        assert_eq!(party.id_value(), Some("1010"));
    }
}
