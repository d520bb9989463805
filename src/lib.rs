//! Invoice generation for sales: locale-aware HTML rendition, PDF
//! conversion through wkhtmltopdf, and FatturaPA XML for the Italian SDI
//! exchange system.
//!
//! The crate follows a hexagonal layout:
//! - `domain` holds the sale aggregate, the calculation and formatting
//!   engines, and the generation orchestrator behind its ports
//! - `adapters` provides the Tera renderer and the FatturaPA generator
//! - `infrastructure` supplies the wkhtmltopdf converter, artifact stores
//!   and configuration
//! - `application` exposes the command/response use cases

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::invoice::{InvoiceError, InvoiceService, InvoiceServiceDependencies};
