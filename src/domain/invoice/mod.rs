pub mod errors;
pub mod ports;
pub mod services;

pub use errors::InvoiceError;
pub use ports::{
  ArtifactFormat, ArtifactStore, ConvertError, DocumentConverter, InvoiceMetadataUpdate,
  InvoiceRenderer, Orientation, PageOptions, PageSize, SaleRepository, SdiGenerator, artifact_key,
};
pub use services::{
  Caller, GenerationOutcome, GenerationRequest, GenerationStage, InvoiceService,
  InvoiceServiceDependencies,
};
