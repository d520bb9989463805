pub mod entities;
pub mod value_objects;

pub use entities::{Bank, InvoiceMetadata, PartySnapshot, Sale, SaleLine};
pub use value_objects::{
  CountryCode, Currency, InvoiceNumber, Language, Quantity, SaleStatus, ValueObjectError, VatRate,
};
