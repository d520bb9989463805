use thiserror::Error;
use uuid::Uuid;

use super::ports::ConvertError;
use crate::domain::sale::ValueObjectError;

/// Error taxonomy for the invoice generation pipeline.
///
/// `Validation`, `NotFound`, `Conflict` carry caller-facing semantics.
/// `Forbidden` exists internally only: the application boundary translates
/// it to `NotFound` for sales, so callers cannot enumerate resources they
/// are not allowed to see. Stage failures (`RenderFailed`,
/// `ConversionFailed`, `StorageFailed`) name the failing stage and the sale
/// id, so an operator can tell malformed sale data from a downed PDF engine
/// from unreachable storage.
#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Sale not found: {0}")]
  NotFound(Uuid),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Template not found: {0}")]
  TemplateNotFound(String),

  #[error("Rendering failed for sale {sale_id}: {reason}")]
  RenderFailed { sale_id: Uuid, reason: String },

  #[error("PDF conversion failed for sale {sale_id}: {source}")]
  ConversionFailed {
    sale_id: Uuid,
    #[source]
    source: ConvertError,
  },

  #[error("Artifact storage failed for sale {sale_id}: {reason}")]
  StorageFailed { sale_id: Uuid, reason: String },

  #[error("Repository error: {0}")]
  Repository(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl From<ValueObjectError> for InvoiceError {
  fn from(error: ValueObjectError) -> Self {
    InvoiceError::Validation(error.to_string())
  }
}

impl InvoiceError {
  /// Structural errors belong to the caller and must pass through stage
  /// wrapping unchanged.
  pub fn is_caller_fault(&self) -> bool {
    matches!(
      self,
      InvoiceError::Validation(_)
        | InvoiceError::NotFound(_)
        | InvoiceError::Forbidden(_)
        | InvoiceError::Conflict(_)
        | InvoiceError::TemplateNotFound(_)
    )
  }
}
