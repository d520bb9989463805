pub mod generate_invoice;
pub mod get_invoice_document;

pub use generate_invoice::{GenerateInvoiceCommand, GenerateInvoiceResponse, GenerateInvoiceUseCase};
pub use get_invoice_document::{
  GetInvoiceDocumentCommand, GetInvoiceDocumentResponse, GetInvoiceDocumentUseCase,
};
