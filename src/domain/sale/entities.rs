use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{
  CountryCode, Currency, InvoiceNumber, Quantity, SaleStatus, ValueObjectError, VatRate,
};
use crate::domain::rendering::calc;

// Bank - producer payment coordinates referenced from the invoice footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
  pub id: String,
  pub name: String,
  pub iban: String,
  pub bic: Option<String>,
}

// PartySnapshot - buyer/producer data denormalized at confirmation time.
// The sale carries its own copy so later edits to the party never change
// an already-issued invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySnapshot {
  pub company_name: String,
  pub vat_number: Option<String>,
  pub tax_code: Option<String>,
  pub street: Option<String>,
  pub city: Option<String>,
  pub postal_code: Option<String>,
  pub province: Option<String>,
  pub country: CountryCode,
  pub email: Option<String>,
}

impl PartySnapshot {
  pub fn address_lines(&self) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(street) = &self.street {
      if !street.trim().is_empty() {
        lines.push(street.clone());
      }
    }
    let mut city_line = Vec::new();
    if let Some(postal_code) = &self.postal_code {
      if !postal_code.trim().is_empty() {
        city_line.push(postal_code.clone());
      }
    }
    if let Some(city) = &self.city {
      if !city.trim().is_empty() {
        city_line.push(city.clone());
      }
    }
    if let Some(province) = &self.province {
      if !province.trim().is_empty() {
        city_line.push(format!("({})", province));
      }
    }
    if !city_line.is_empty() {
      lines.push(city_line.join(" "));
    }
    lines
  }
}

// Invoice metadata carried on the sale record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
  pub generated: bool,
  pub generated_at: Option<DateTime<Utc>>,
  pub number: Option<InvoiceNumber>,
}

// Sale - the invoice-bearing aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub number: i64,
  pub date: NaiveDate,
  pub buyer: PartySnapshot,
  pub producer: PartySnapshot,
  pub banks: Vec<Bank>,
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub total: Decimal,
  pub currency: Currency,
  pub status: SaleStatus,
  pub invoice: InvoiceMetadata,
  pub line_count: u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Sale {
  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }

  /// `total == subtotal + tax_amount` to the currency's minor unit.
  pub fn totals_consistent(&self) -> bool {
    (self.total - (self.subtotal + self.tax_amount)).abs() < Decimal::new(1, 2)
  }

  pub fn change_status(&mut self, new_status: SaleStatus) -> Result<(), ValueObjectError> {
    if !self.status.can_transition_to(new_status) {
      return Err(ValueObjectError::InvalidStatus(format!(
        "Cannot transition sale from {} to {}",
        self.status.as_str(),
        new_status.as_str()
      )));
    }
    self.status = new_status;
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Assigns the invoice number on first generation. Once assigned the
  /// number never changes, no matter how many times the invoice is
  /// regenerated.
  pub fn assign_invoice_number(&mut self, year: i32) -> InvoiceNumber {
    if let Some(existing) = &self.invoice.number {
      return existing.clone();
    }
    let number = InvoiceNumber::for_sale(self.number, year);
    self.invoice.number = Some(number.clone());
    number
  }

  /// Marks the sale as invoiced after a successful artifact upload.
  pub fn record_invoice_generation(&mut self, now: DateTime<Utc>) {
    self.invoice.generated = true;
    self.invoice.generated_at = Some(now);
    if self.status == SaleStatus::Confirmed {
      // can_transition_to(Confirmed -> Invoiced) always holds
      self.status = SaleStatus::Invoiced;
    }
    self.updated_at = now;
  }
}

// Sale line item. The persisted net/VAT/total columns are never trusted at
// render time; the calculation engine re-derives them from the raw inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
  pub id: Uuid,
  pub sale_id: Uuid,
  pub line_number: u32,
  pub description: String,
  pub code: Option<String>,
  pub quantity: Quantity,
  pub unit_price: Decimal,
  pub discount_pct: Decimal,
  pub vat_rate: VatRate,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl SaleLine {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    sale_id: Uuid,
    line_number: u32,
    description: String,
    code: Option<String>,
    quantity: Quantity,
    unit_price: Decimal,
    discount_pct: Decimal,
    vat_rate: VatRate,
  ) -> Result<Self, ValueObjectError> {
    if discount_pct < Decimal::ZERO || discount_pct > Decimal::from(100) {
      return Err(ValueObjectError::InvalidDiscount(
        "Discount must be between 0 and 100 percent".to_string(),
      ));
    }
    Ok(Self {
      id: Uuid::new_v4(),
      sale_id,
      line_number,
      description,
      code,
      quantity,
      unit_price,
      discount_pct,
      vat_rate,
      deleted_at: None,
    })
  }

  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }

  pub fn has_code(&self) -> bool {
    self
      .code
      .as_deref()
      .map(|c| !c.trim().is_empty())
      .unwrap_or(false)
  }

  pub fn has_discount(&self) -> bool {
    !self.discount_pct.is_zero()
  }

  pub fn net_amount(&self) -> Decimal {
    calc::line_cost(self.unit_price, self.quantity.value(), self.discount_pct)
  }

  pub fn vat_amount(&self) -> Decimal {
    calc::line_vat_amount(
      self.unit_price,
      self.quantity.value(),
      self.discount_pct,
      self.vat_rate.value(),
    )
  }

  pub fn total(&self) -> Decimal {
    calc::line_total(
      self.unit_price,
      self.quantity.value(),
      self.discount_pct,
      self.vat_rate.value(),
    )
  }
}
