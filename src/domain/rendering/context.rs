//! Strongly-typed render context.
//!
//! The renderer never sees raw maps: a `RenderContext` is assembled
//! explicitly from the sale aggregate, validated once, and serialized into
//! the template engine. Line amounts and document totals are re-derived here
//! through the calculation engine; persisted values are display hints only
//! and are never trusted at render time.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calc;
use crate::domain::invoice::errors::InvoiceError;
use crate::domain::sale::{Bank, Language, PartySnapshot, Sale, SaleLine, SaleStatus};

/// Columns always present: description, quantity, unit price, VAT, total.
pub const BASE_COLUMN_COUNT: u32 = 5;

/// Inferred from status and the sign of the payable amount, never from an
/// input flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
  Invoice,
  ProformaInvoice,
  CreditNote,
}

impl DocumentType {
  pub fn infer(status: SaleStatus, grand_total: Decimal) -> Self {
    if grand_total.is_sign_negative() && !grand_total.is_zero() {
      DocumentType::CreditNote
    } else if status == SaleStatus::Confirmed {
      DocumentType::ProformaInvoice
    } else {
      DocumentType::Invoice
    }
  }

  /// Translation key for the document title.
  pub fn title_key(&self) -> &'static str {
    match self {
      DocumentType::Invoice => "invoice",
      DocumentType::ProformaInvoice => "proforma_invoice",
      DocumentType::CreditNote => "credit_note",
    }
  }

  /// FatturaPA TipoDocumento code.
  pub fn sdi_code(&self) -> &'static str {
    match self {
      DocumentType::CreditNote => "TD04",
      _ => "TD01",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
  pub line_number: u32,
  pub code: Option<String>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub discount_pct: Decimal,
  pub vat_rate: Decimal,
  pub cost: Decimal,
  pub vat_amount: Decimal,
  pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsView {
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyView {
  pub company_name: String,
  pub vat_number: Option<String>,
  pub tax_code: Option<String>,
  /// Pre-joined lines for HTML display; the structured fields below stay
  /// available for consumers that need them individually.
  pub address_lines: Vec<String>,
  pub street: Option<String>,
  pub city: Option<String>,
  pub postal_code: Option<String>,
  pub province: Option<String>,
  pub country: String,
  pub email: Option<String>,
}

impl PartyView {
  fn from_snapshot(snapshot: &PartySnapshot) -> Self {
    Self {
      company_name: snapshot.company_name.clone(),
      vat_number: snapshot.vat_number.clone(),
      tax_code: snapshot.tax_code.clone(),
      address_lines: snapshot.address_lines(),
      street: snapshot.street.clone(),
      city: snapshot.city.clone(),
      postal_code: snapshot.postal_code.clone(),
      province: snapshot.province.clone(),
      country: snapshot.country.value().to_string(),
      email: snapshot.email.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
  pub sale_id: Uuid,
  pub sale_number: i64,
  /// YYYYMMDD, the formatting engine's date representation.
  pub date: String,
  pub language: Language,
  pub document_type: DocumentType,
  pub invoice_number: Option<String>,
  pub currency: String,
  pub currency_symbol: String,
  pub buyer: PartyView,
  pub producer: PartyView,
  pub banks: Vec<Bank>,
  pub lines: Vec<LineView>,
  pub totals: TotalsView,
  pub show_code: bool,
  pub show_discount: bool,
  pub col_span: u32,
}

impl RenderContext {
  /// Validates structure (language is already typed; an empty line list is
  /// rejected here) and recomputes every monetary amount.
  pub fn assemble(
    sale: &Sale,
    lines: &[SaleLine],
    language: Language,
  ) -> Result<Self, InvoiceError> {
    let mut live: Vec<&SaleLine> = lines.iter().filter(|l| !l.is_deleted()).collect();
    if live.is_empty() {
      return Err(InvoiceError::Validation(format!(
        "Sale {} has no billable lines",
        sale.id
      )));
    }
    live.sort_by_key(|l| l.line_number);

    let views: Vec<LineView> = live
      .iter()
      .map(|line| LineView {
        line_number: line.line_number,
        code: line.code.clone(),
        description: line.description.clone(),
        quantity: line.quantity.value(),
        unit_price: line.unit_price,
        discount_pct: line.discount_pct,
        vat_rate: line.vat_rate.value(),
        cost: line.net_amount(),
        vat_amount: line.vat_amount(),
        total: line.total(),
      })
      .collect();

    let subtotal: Decimal = views.iter().map(|v| v.cost).sum();
    let tax: Decimal = views.iter().map(|v| v.vat_amount).sum();
    let total = subtotal + tax;
    let totals = TotalsView {
      subtotal: calc::round_amount(subtotal),
      tax: calc::round_amount(tax),
      total: calc::round_amount(total),
    };

    let show_code = live.iter().any(|l| l.has_code());
    let show_discount = live.iter().any(|l| l.has_discount());
    let col_span = column_count(show_code, show_discount);

    Ok(Self {
      sale_id: sale.id,
      sale_number: sale.number,
      date: sale.date.format("%Y%m%d").to_string(),
      language,
      document_type: DocumentType::infer(sale.status, totals.total),
      invoice_number: sale.invoice.number.as_ref().map(|n| n.value().to_string()),
      currency: sale.currency.as_str().to_string(),
      currency_symbol: sale.currency.symbol().to_string(),
      buyer: PartyView::from_snapshot(&sale.buyer),
      producer: PartyView::from_snapshot(&sale.producer),
      banks: sale.banks.clone(),
      lines: views,
      totals,
      show_code,
      show_discount,
      col_span,
    })
  }
}

pub fn column_count(has_code: bool, has_discount: bool) -> u32 {
  BASE_COLUMN_COUNT + u32::from(has_code) + u32::from(has_discount)
}
