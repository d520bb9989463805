use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::generate_invoice::hide_forbidden;
use crate::domain::invoice::{ArtifactFormat, Caller, InvoiceError, InvoiceService};
use crate::domain::sale::Language;

#[derive(Debug, Deserialize)]
pub struct GetInvoiceDocumentCommand {
  pub user_id: Uuid,
  #[serde(default)]
  pub is_admin: bool,
  pub sale_id: Uuid,
  pub format: String,
  pub language: Option<String>,
  pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct GetInvoiceDocumentResponse {
  pub sale_id: Uuid,
  pub format: String,
  pub download_url: String,
}

pub struct GetInvoiceDocumentUseCase {
  invoice_service: Arc<InvoiceService>,
  default_ttl_seconds: u64,
}

impl GetInvoiceDocumentUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>, default_ttl_seconds: u64) -> Self {
    Self {
      invoice_service,
      default_ttl_seconds,
    }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceDocumentCommand,
  ) -> Result<GetInvoiceDocumentResponse, InvoiceError> {
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

    let ttl = command.ttl_seconds.unwrap_or(self.default_ttl_seconds);
    let download_url = self
      .invoice_service
      .artifact_url(caller, command.sale_id, format, language, ttl)
      .await
      .map_err(|e| hide_forbidden(e, command.sale_id))?;

    Ok(GetInvoiceDocumentResponse {
      sale_id: command.sale_id,
      format: format.as_str().to_string(),
      download_url,
    })
  }
}
