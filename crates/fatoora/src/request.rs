//! What a caller asks the engine to issue.
//!
//! A request carries only the per-invoice data. The seller, currency and
//! chain position come from the engine.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fatoora_core::model::DEFAULT_UNIT_CODE;
use fatoora_core::{ChainState, InvoiceDraft, InvoiceType, LineItem, Party, VatCategory};

use crate::config::EngineConfig;

/// One line of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Falls back to the engine's default rate.
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
    #[serde(default)]
    pub vat_category: Option<VatCategory>,
    #[serde(default)]
    pub unit_code: Option<String>,
}

impl LineRequest {
    pub fn new(name: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            vat_rate: None,
            vat_category: None,
            unit_code: None,
        }
    }

    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = Some(rate);
        self
    }

    pub fn vat_category(mut self, category: VatCategory) -> Self {
        self.vat_category = Some(category);
        self
    }

    pub fn unit_code(mut self, code: impl Into<String>) -> Self {
        self.unit_code = Some(code.into());
        self
    }

    fn into_line(self, config: &EngineConfig) -> LineItem {
        LineItem {
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            vat_rate: self.vat_rate.unwrap_or(config.default_vat_rate),
            vat_category: self.vat_category.unwrap_or_default(),
            unit_code: self
                .unit_code
                .unwrap_or_else(|| DEFAULT_UNIT_CODE.to_string()),
        }
    }
}

/// An invoice to issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub kind: InvoiceType,
    pub number: String,
    /// Generated when absent.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub issue_time: NaiveTime,
    #[serde(default)]
    pub supply_date: Option<NaiveDate>,
    #[serde(default)]
    pub tax_currency: Option<String>,
    #[serde(default)]
    pub buyer: Option<Party>,
    pub lines: Vec<LineRequest>,
}

impl InvoiceRequest {
    pub fn new(
        kind: InvoiceType,
        number: impl Into<String>,
        issue_date: NaiveDate,
        issue_time: NaiveTime,
    ) -> Self {
        Self {
            kind,
            number: number.into(),
            uuid: None,
            issue_date,
            issue_time,
            supply_date: None,
            tax_currency: None,
            buyer: None,
            lines: Vec::new(),
        }
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn supply_date(mut self, date: NaiveDate) -> Self {
        self.supply_date = Some(date);
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

    pub fn line(mut self, line: LineRequest) -> Self {
        self.lines.push(line);
        self
    }

    /// Build the draft for the next position of a chain.
    pub fn into_draft(self, seller: &Party, config: &EngineConfig, chain: &ChainState) -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(
            self.kind,
            self.number,
            self.issue_date,
            self.issue_time,
            seller.clone(),
        )
        .currency(config.currency.clone())
        .chained(chain.icv(), chain.previous_hash());

        if let Some(uuid) = self.uuid {
            draft = draft.uuid(uuid);
        }
        draft.supply_date = self.supply_date;
        draft.tax_currency = self.tax_currency;
        draft.buyer = self.buyer;
        draft.lines = self
            .lines
            .into_iter()
            .map(|line| line.into_line(config))
            .collect();
        draft
    }
}
