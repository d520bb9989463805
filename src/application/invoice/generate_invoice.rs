use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  ArtifactFormat, Caller, GenerationRequest, InvoiceError, InvoiceService,
};
use crate::domain::sale::Language;

#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceCommand {
  pub user_id: Uuid,
  #[serde(default)]
  pub is_admin: bool,
  pub sale_id: Uuid,
  /// "html", "pdf" or "sdi".
  pub format: String,
  /// Required for html/pdf, ignored for sdi.
  pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateInvoiceResponse {
  pub sale_id: Uuid,
  pub format: String,
  pub artifact_key: String,
  pub invoice_number: String,
}

pub struct GenerateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GenerateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GenerateInvoiceCommand,
  ) -> Result<GenerateInvoiceResponse, InvoiceError> {
    let format = ArtifactFormat::from_str(&command.format)?;
    let language = command
      .language
      .as_deref()
      .map(Language::from_str)
      .transpose()?;

    let caller = if command.is_admin {
      Caller::admin(command.user_id)
    } else {
      Caller::user(command.user_id)
    };

    let outcome = self
      .invoice_service
      .generate_invoice(GenerationRequest {
        caller,
        sale_id: command.sale_id,
        format,
        language,
      })
      .await
      .map_err(|e| hide_forbidden(e, command.sale_id))?;

    Ok(GenerateInvoiceResponse {
      sale_id: outcome.sale_id,
      format: outcome.format.as_str().to_string(),
      artifact_key: outcome.artifact_key,
      invoice_number: outcome.invoice_number.into_inner(),
    })
  }
}

/// A caller must not learn whether a sale they cannot access exists, so
/// authorization failures leave this layer as NotFound.
pub(crate) fn hide_forbidden(error: InvoiceError, sale_id: Uuid) -> InvoiceError {
  match error {
    InvoiceError::Forbidden(_) => InvoiceError::NotFound(sale_id),
    other => other,
  }
}
