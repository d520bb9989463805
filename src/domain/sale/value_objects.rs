use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid invoice number: {0}")]
  InvalidInvoiceNumber(String),
  #[error("Invalid currency code: {0}")]
  InvalidCurrency(String),
  #[error("Invalid language code: {0}")]
  InvalidLanguage(String),
  #[error("Invalid country code: {0}")]
  InvalidCountry(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid VAT rate: {0}")]
  InvalidVatRate(String),
  #[error("Invalid discount: {0}")]
  InvalidDiscount(String),
  #[error("Invalid sale status: {0}")]
  InvalidStatus(String),
  #[error("Invalid artifact format: {0}")]
  InvalidArtifactFormat(String),
  #[error("Invalid page scale: {0}")]
  InvalidPageScale(String),
}

// Sale Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
  Draft,
  Confirmed,
  Invoiced,
  Paid,
  Cancelled,
}

impl SaleStatus {
  /// Transitions are monotonic: draft -> confirmed -> invoiced -> paid.
  /// Cancelled is reachable from any non-terminal state.
  pub fn can_transition_to(&self, new_status: SaleStatus) -> bool {
    match (self, new_status) {
      (SaleStatus::Draft, SaleStatus::Confirmed) => true,
      (SaleStatus::Draft, SaleStatus::Cancelled) => true,
      (SaleStatus::Confirmed, SaleStatus::Invoiced) => true,
      (SaleStatus::Confirmed, SaleStatus::Cancelled) => true,
      (SaleStatus::Invoiced, SaleStatus::Paid) => true,
      (SaleStatus::Invoiced, SaleStatus::Cancelled) => true,
      // Paid and Cancelled are terminal states
      _ => false,
    }
  }

  /// Invoice generation requires the sale to have left draft and not be cancelled.
  pub fn is_invoiceable(&self) -> bool {
    matches!(
      self,
      SaleStatus::Confirmed | SaleStatus::Invoiced | SaleStatus::Paid
    )
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, SaleStatus::Paid | SaleStatus::Cancelled)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SaleStatus::Draft => "draft",
      SaleStatus::Confirmed => "confirmed",
      SaleStatus::Invoiced => "invoiced",
      SaleStatus::Paid => "paid",
      SaleStatus::Cancelled => "cancelled",
    }
  }
}

impl FromStr for SaleStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "draft" => Ok(SaleStatus::Draft),
      "confirmed" => Ok(SaleStatus::Confirmed),
      "invoiced" => Ok(SaleStatus::Invoiced),
      "paid" => Ok(SaleStatus::Paid),
      "cancelled" => Ok(SaleStatus::Cancelled),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown status: {}",
        s
      ))),
    }
  }
}

// Document language, the axis of all locale-aware formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  It,
  En,
  De,
  Fr,
}

impl Language {
  pub fn as_str(&self) -> &'static str {
    match self {
      Language::It => "it",
      Language::En => "en",
      Language::De => "de",
      Language::Fr => "fr",
    }
  }

  pub fn all() -> [Language; 4] {
    [Language::It, Language::En, Language::De, Language::Fr]
  }
}

impl FromStr for Language {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "it" => Ok(Language::It),
      "en" => Ok(Language::En),
      "de" => Ok(Language::De),
      "fr" => Ok(Language::Fr),
      _ => Err(ValueObjectError::InvalidLanguage(format!(
        "Unsupported language: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// Currency - ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
  EUR,
  USD,
  GBP,
  CHF,
}

impl Currency {
  pub fn as_str(&self) -> &'static str {
    match self {
      Currency::EUR => "EUR",
      Currency::USD => "USD",
      Currency::GBP => "GBP",
      Currency::CHF => "CHF",
    }
  }

  pub fn symbol(&self) -> &'static str {
    match self {
      Currency::EUR => "€",
      Currency::USD => "$",
      Currency::GBP => "£",
      Currency::CHF => "CHF",
    }
  }
}

impl FromStr for Currency {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "EUR" => Ok(Currency::EUR),
      "USD" => Ok(Currency::USD),
      "GBP" => Ok(Currency::GBP),
      "CHF" => Ok(Currency::CHF),
      _ => Err(ValueObjectError::InvalidCurrency(format!(
        "Unsupported currency: {}",
        s
      ))),
    }
  }
}

// Country Code - ISO 3166-1 alpha-2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
  pub fn new(value: &str) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim().to_uppercase();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(ValueObjectError::InvalidCountry(format!(
        "Country code must be two letters, got '{}'",
        value
      )));
    }
    Ok(Self(trimmed))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn is_italy(&self) -> bool {
    self.0 == "IT"
  }
}

impl fmt::Display for CountryCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Invoice Number - assigned once, never changed across regenerations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 100 {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot exceed 100 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  /// The canonical scheme: INV-{saleNumber}-{year}.
  pub fn for_sale(sale_number: i64, year: i32) -> Self {
    Self(format!("INV-{}-{}", sale_number, year))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for InvoiceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity must be positive".to_string(),
      ));
    }
    if value.scale() > 4 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot have more than 4 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// VAT Rate (percentage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(Decimal);

impl VatRate {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO || value > Decimal::from(100) {
      return Err(ValueObjectError::InvalidVatRate(
        "VAT rate must be between 0 and 100".to_string(),
      ));
    }
    if value.scale() > 2 {
      return Err(ValueObjectError::InvalidVatRate(
        "VAT rate cannot have more than 2 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_status_transitions_are_monotonic() {
    assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Confirmed));
    assert!(SaleStatus::Confirmed.can_transition_to(SaleStatus::Invoiced));
    assert!(SaleStatus::Invoiced.can_transition_to(SaleStatus::Paid));

    assert!(!SaleStatus::Draft.can_transition_to(SaleStatus::Invoiced));
    assert!(!SaleStatus::Confirmed.can_transition_to(SaleStatus::Draft));
    assert!(!SaleStatus::Invoiced.can_transition_to(SaleStatus::Confirmed));
    assert!(!SaleStatus::Paid.can_transition_to(SaleStatus::Invoiced));
  }

  #[test]
  fn test_cancelled_reachable_from_non_terminal_states_only() {
    assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Cancelled));
    assert!(SaleStatus::Confirmed.can_transition_to(SaleStatus::Cancelled));
    assert!(SaleStatus::Invoiced.can_transition_to(SaleStatus::Cancelled));
    assert!(!SaleStatus::Paid.can_transition_to(SaleStatus::Cancelled));
    assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Cancelled));
  }

  #[test]
  fn test_invoiceable_statuses() {
    assert!(!SaleStatus::Draft.is_invoiceable());
    assert!(SaleStatus::Confirmed.is_invoiceable());
    assert!(SaleStatus::Invoiced.is_invoiceable());
    assert!(SaleStatus::Paid.is_invoiceable());
    assert!(!SaleStatus::Cancelled.is_invoiceable());
  }

  #[test]
  fn test_language_parsing() {
    assert_eq!(Language::from_str("IT").unwrap(), Language::It);
    assert_eq!(Language::from_str("fr").unwrap(), Language::Fr);
    assert!(Language::from_str("es").is_err());
  }

  #[test]
  fn test_country_code() {
    assert!(CountryCode::new("it").unwrap().is_italy());
    assert_eq!(CountryCode::new(" de ").unwrap().value(), "DE");
    assert!(CountryCode::new("ITA").is_err());
    assert!(CountryCode::new("1T").is_err());
  }

  #[test]
  fn test_invoice_number_scheme() {
    let number = InvoiceNumber::for_sale(42, 2024);
    assert_eq!(number.value(), "INV-42-2024");
    assert!(InvoiceNumber::new("".to_string()).is_err());
  }

  #[test]
  fn test_quantity() {
    assert!(Quantity::new(dec!(1)).is_ok());
    assert!(Quantity::new(dec!(0)).is_err());
    assert!(Quantity::new(dec!(-1)).is_err());
    assert!(Quantity::new(dec!(1.12345)).is_err());
  }

  #[test]
  fn test_vat_rate() {
    assert!(VatRate::new(dec!(22)).is_ok());
    assert!(VatRate::new(dec!(0)).is_ok());
    assert!(VatRate::new(dec!(100)).is_ok());
    assert!(VatRate::new(dec!(-1)).is_err());
    assert!(VatRate::new(dec!(101)).is_err());
  }

  #[test]
  fn test_currency() {
    assert_eq!(Currency::EUR.as_str(), "EUR");
    assert_eq!(Currency::from_str("eur").unwrap(), Currency::EUR);
    assert!(Currency::from_str("JPY").is_err());
  }
}
