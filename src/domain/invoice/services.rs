use chrono::{Datelike, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::errors::InvoiceError;
use super::ports::{
  ArtifactFormat, ArtifactStore, DocumentConverter, InvoiceMetadataUpdate, InvoiceRenderer,
  PageOptions, SaleRepository, SdiGenerator, artifact_key,
};
use crate::domain::rendering::RenderContext;
use crate::domain::sale::{InvoiceNumber, Language, Sale, SaleStatus};

/// Template resolved for every HTML/PDF rendering.
pub const INVOICE_TEMPLATE: &str = "invoice.html";

/// Identity of the requester. Non-owners without the admin role are denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub user_id: Uuid,
  pub admin: bool,
}

impl Caller {
  pub fn user(user_id: Uuid) -> Self {
    Self {
      user_id,
      admin: false,
    }
  }

  pub fn admin(user_id: Uuid) -> Self {
    Self {
      user_id,
      admin: true,
    }
  }

  fn can_access(&self, sale: &Sale) -> bool {
    self.admin || sale.owner_id == self.user_id
  }
}

/// Pipeline stages, in execution order. Used for logging and for naming the
/// failing stage in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
  Rendering,
  Converting,
  Uploading,
  Recording,
}

impl GenerationStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      GenerationStage::Rendering => "render",
      GenerationStage::Converting => "convert",
      GenerationStage::Uploading => "store",
      GenerationStage::Recording => "record",
    }
  }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
  pub caller: Caller,
  pub sale_id: Uuid,
  pub format: ArtifactFormat,
  /// Required for HTML and PDF output; ignored for SDI.
  pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
  pub sale_id: Uuid,
  pub format: ArtifactFormat,
  pub artifact_key: String,
  pub invoice_number: InvoiceNumber,
}

pub struct InvoiceServiceDependencies {
  pub sales: Arc<dyn SaleRepository>,
  pub artifacts: Arc<dyn ArtifactStore>,
  pub renderer: Arc<dyn InvoiceRenderer>,
  pub converter: Arc<dyn DocumentConverter>,
  pub sdi: Arc<dyn SdiGenerator>,
}

/// The invoice generation orchestrator.
///
/// Stages run strictly sequentially per request: render -> convert ->
/// upload -> record. There is no cross-stage recovery and no hidden retry;
/// a failed request is safe to resubmit because the invoice number and the
/// artifact key are both deterministic. The metadata update and the
/// artifact upload are not one atomic transaction: a crash between them
/// leaves an uploaded artifact with `invoice.generated` still false, which
/// regeneration resolves.
pub struct InvoiceService {
  sales: Arc<dyn SaleRepository>,
  artifacts: Arc<dyn ArtifactStore>,
  renderer: Arc<dyn InvoiceRenderer>,
  converter: Arc<dyn DocumentConverter>,
  sdi: Arc<dyn SdiGenerator>,
  page_options: PageOptions,
}

impl InvoiceService {
  pub fn new(deps: InvoiceServiceDependencies, page_options: PageOptions) -> Self {
    Self {
      sales: deps.sales,
      artifacts: deps.artifacts,
      renderer: deps.renderer,
      converter: deps.converter,
      sdi: deps.sdi,
      page_options,
    }
  }

  pub async fn generate_invoice(
    &self,
    request: GenerationRequest,
  ) -> Result<GenerationOutcome, InvoiceError> {
    let sale_id = request.sale_id;
    let mut sale = self.load_authorized_sale(request.caller, sale_id).await?;

    // Preconditions, checked before any render attempt.
    if sale.status == SaleStatus::Draft {
      return Err(InvoiceError::Validation(format!(
        "Sale {} must be confirmed before invoicing",
        sale_id
      )));
    }
    if sale.status == SaleStatus::Cancelled {
      return Err(InvoiceError::Validation(format!(
        "Sale {} is cancelled and cannot be invoiced",
        sale_id
      )));
    }

    let lines = self.sales.list_lines(sale_id).await?;
    let live_count = lines.iter().filter(|l| !l.is_deleted()).count();
    if live_count == 0 {
      return Err(InvoiceError::Validation(format!(
        "Sale {} has no billable lines",
        sale_id
      )));
    }

    let language = match request.format {
      ArtifactFormat::Sdi => {
        if !sale.buyer.country.is_italy() || !sale.producer.country.is_italy() {
          return Err(InvoiceError::Validation(format!(
            "SDI e-invoice for sale {} requires both buyer and producer to be registered in IT (got {} / {})",
            sale_id, sale.buyer.country, sale.producer.country
          )));
        }
        // SDI output is language-invariant; labels are fixed by the schema.
        request.language.unwrap_or(Language::It)
      }
      _ => request.language.ok_or_else(|| {
        InvoiceError::Validation(format!(
          "A target language is required for {} output",
          request.format.as_str()
        ))
      })?,
    };

    // The invoice number is deterministic, so it is fixed on the working
    // copy before rendering: the first artifact already carries it, and the
    // advanced status makes regeneration reproduce the same bytes. Nothing
    // is persisted until the artifact upload has succeeded.
    let now = Utc::now();
    let invoice_number = sale.assign_invoice_number(now.year());
    sale.record_invoice_generation(now);

    let context = RenderContext::assemble(&sale, &lines, language)?;

    // Rendering
    tracing::info!(
      sale_id = %sale_id,
      format = request.format.as_str(),
      language = %language,
      stage = GenerationStage::Rendering.as_str(),
      "Generating invoice artifact"
    );
    let rendered = match request.format {
      ArtifactFormat::Sdi => self.sdi.generate(&context).await,
      _ => self.renderer.render_html(INVOICE_TEMPLATE, &context).await,
    }
    .map_err(|e| render_failure(sale_id, e))?;

    // Converting (PDF path only)
    let (bytes, key) = match request.format {
      ArtifactFormat::Pdf => {
        tracing::debug!(sale_id = %sale_id, stage = GenerationStage::Converting.as_str(), "Converting markup to PDF");
        let pdf = self
          .converter
          .convert(&rendered, &self.page_options)
          .await
          .map_err(|source| InvoiceError::ConversionFailed { sale_id, source })?;
        (pdf, artifact_key(sale_id, ArtifactFormat::Pdf, Some(language)))
      }
      ArtifactFormat::Html => (
        rendered.into_bytes(),
        artifact_key(sale_id, ArtifactFormat::Html, Some(language)),
      ),
      ArtifactFormat::Sdi => (
        rendered.into_bytes(),
        artifact_key(sale_id, ArtifactFormat::Sdi, None),
      ),
    };

    // Uploading. Rendered content is discarded on failure; the caller
    // resubmits rather than this layer retrying silently.
    tracing::debug!(sale_id = %sale_id, key = %key, stage = GenerationStage::Uploading.as_str(), "Uploading artifact");
    self
      .artifacts
      .put(&key, bytes, request.format.content_type())
      .await
      .map_err(|e| match e {
        err if err.is_caller_fault() => err,
        err => InvoiceError::StorageFailed {
          sale_id,
          reason: err.to_string(),
        },
      })?;

    // Recording. Number assignment is idempotent across regenerations.
    self
      .sales
      .update_invoice_metadata(
        sale_id,
        InvoiceMetadataUpdate {
          generated: true,
          generated_at: now,
          invoice_number: invoice_number.clone(),
        },
      )
      .await
      .map_err(|e| match e {
        err if err.is_caller_fault() => err,
        err => InvoiceError::Repository(format!(
          "Recording invoice metadata for sale {} failed: {}",
          sale_id, err
        )),
      })?;

    tracing::info!(
      sale_id = %sale_id,
      key = %key,
      invoice_number = %invoice_number,
      "Invoice artifact generated"
    );

    Ok(GenerationOutcome {
      sale_id,
      format: request.format,
      artifact_key: key,
      invoice_number,
    })
  }

  /// Presigned download URL for a previously generated artifact, under the
  /// same access policy as generation.
  pub async fn artifact_url(
    &self,
    caller: Caller,
    sale_id: Uuid,
    format: ArtifactFormat,
    language: Option<Language>,
    ttl_seconds: u64,
  ) -> Result<String, InvoiceError> {
    let sale = self.load_authorized_sale(caller, sale_id).await?;
    if !sale.invoice.generated {
      return Err(InvoiceError::Validation(format!(
        "No invoice has been generated for sale {}",
        sale_id
      )));
    }
    let key = match format {
      ArtifactFormat::Sdi => artifact_key(sale_id, format, None),
      _ => {
        let lang = language.ok_or_else(|| {
          InvoiceError::Validation(format!(
            "A target language is required for {} output",
            format.as_str()
          ))
        })?;
        artifact_key(sale_id, format, Some(lang))
      }
    };
    self.artifacts.presigned_url(&key, ttl_seconds).await
  }

  async fn load_authorized_sale(
    &self,
    caller: Caller,
    sale_id: Uuid,
  ) -> Result<Sale, InvoiceError> {
    let sale = self
      .sales
      .get(sale_id)
      .await?
      .ok_or(InvoiceError::NotFound(sale_id))?;

    if sale.is_deleted() {
      return Err(InvoiceError::NotFound(sale_id));
    }
    if !caller.can_access(&sale) {
      // Translated to NotFound at the application boundary.
      return Err(InvoiceError::Forbidden(format!(
        "User {} has no access to sale {}",
        caller.user_id, sale_id
      )));
    }
    Ok(sale)
  }
}

/// Wraps renderer and SDI-generator failures; structural errors
/// (validation, missing template) pass through unchanged. The later stages
/// carry their own error shapes and are mapped inline.
fn render_failure(sale_id: Uuid, error: InvoiceError) -> InvoiceError {
  if error.is_caller_fault() {
    return error;
  }
  tracing::error!(
    sale_id = %sale_id,
    stage = GenerationStage::Rendering.as_str(),
    error = %error,
    "Pipeline stage failed"
  );
  InvoiceError::RenderFailed {
    sale_id,
    reason: error.to_string(),
  }
}
