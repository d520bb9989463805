use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::errors::InvoiceError;
use crate::domain::rendering::RenderContext;
use crate::domain::sale::{InvoiceNumber, Language, Sale, SaleLine, ValueObjectError};

/// Output format of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
  Html,
  Pdf,
  Sdi,
}

impl ArtifactFormat {
  pub fn as_str(&self) -> &'static str {
    match self {
      ArtifactFormat::Html => "html",
      ArtifactFormat::Pdf => "pdf",
      ArtifactFormat::Sdi => "xml",
    }
  }

  pub fn extension(&self) -> &'static str {
    match self {
      ArtifactFormat::Html => "html",
      ArtifactFormat::Pdf => "pdf",
      ArtifactFormat::Sdi => "xml",
    }
  }

  pub fn content_type(&self) -> &'static str {
    match self {
      ArtifactFormat::Html => "text/html; charset=utf-8",
      ArtifactFormat::Pdf => "application/pdf",
      ArtifactFormat::Sdi => "application/xml",
    }
  }

  /// SDI output has no language axis.
  pub fn is_localized(&self) -> bool {
    !matches!(self, ArtifactFormat::Sdi)
  }
}

impl FromStr for ArtifactFormat {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "html" => Ok(ArtifactFormat::Html),
      "pdf" => Ok(ArtifactFormat::Pdf),
      "sdi" | "xml" => Ok(ArtifactFormat::Sdi),
      _ => Err(ValueObjectError::InvalidArtifactFormat(format!(
        "Unknown format: {}",
        s
      ))),
    }
  }
}

/// Deterministic artifact key. Regenerating overwrites the same key rather
/// than creating a new version.
pub fn artifact_key(sale_id: Uuid, format: ArtifactFormat, language: Option<Language>) -> String {
  match (format, language) {
    (ArtifactFormat::Sdi, _) => format!("invoices/{}/xml/sdi.xml", sale_id),
    (_, Some(lang)) => format!(
      "invoices/{}/{}/{}.{}",
      sale_id,
      format.as_str(),
      lang.as_str(),
      format.extension()
    ),
    (_, None) => format!(
      "invoices/{}/{}/document.{}",
      sale_id,
      format.as_str(),
      format.extension()
    ),
  }
}

// Page geometry for the document converter

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
  A4,
  A3,
  Letter,
  Legal,
}

impl PageSize {
  pub fn as_str(&self) -> &'static str {
    match self {
      PageSize::A4 => "A4",
      PageSize::A3 => "A3",
      PageSize::Letter => "Letter",
      PageSize::Legal => "Legal",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
  Portrait,
  Landscape,
}

impl Orientation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Orientation::Portrait => "Portrait",
      Orientation::Landscape => "Landscape",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
  pub page_size: PageSize,
  pub orientation: Orientation,
  pub margin_top_mm: u32,
  pub margin_bottom_mm: u32,
  pub margin_left_mm: u32,
  pub margin_right_mm: u32,
  pub scale: f64,
  pub header_html: Option<String>,
  pub footer_html: Option<String>,
}

impl Default for PageOptions {
  fn default() -> Self {
    Self {
      page_size: PageSize::A4,
      orientation: Orientation::Portrait,
      margin_top_mm: 10,
      margin_bottom_mm: 10,
      margin_left_mm: 10,
      margin_right_mm: 10,
      scale: 1.0,
      header_html: None,
      footer_html: None,
    }
  }
}

impl PageOptions {
  pub fn with_scale(mut self, scale: f64) -> Result<Self, ValueObjectError> {
    if !(0.1..=2.0).contains(&scale) {
      return Err(ValueObjectError::InvalidPageScale(format!(
        "Scale must be between 0.1 and 2.0, got {}",
        scale
      )));
    }
    self.scale = scale;
    Ok(self)
  }
}

/// Conversion failure taxonomy. The converter does not retry on its own;
/// retry policy belongs to the caller of the orchestrator.
#[derive(Debug, Error)]
pub enum ConvertError {
  #[error("Input markup too large: {bytes} bytes (limit {max})")]
  InputTooLarge { bytes: usize, max: usize },

  #[error("Conversion timed out after {seconds}s")]
  Timeout { seconds: u64 },

  #[error("Rendering engine fault: {0}")]
  EngineFault(String),
}

/// Conditional invoice-metadata write applied to the sale record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceMetadataUpdate {
  pub generated: bool,
  pub generated_at: DateTime<Utc>,
  pub invoice_number: InvoiceNumber,
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
  async fn get(&self, sale_id: Uuid) -> Result<Option<Sale>, InvoiceError>;
  /// Live (non-deleted) lines in render order.
  async fn list_lines(&self, sale_id: Uuid) -> Result<Vec<SaleLine>, InvoiceError>;
  /// Conditional on the sale still existing; fails with `NotFound` otherwise.
  async fn update_invoice_metadata(
    &self,
    sale_id: Uuid,
    update: InvoiceMetadataUpdate,
  ) -> Result<(), InvoiceError>;
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), InvoiceError>;
  async fn presigned_url(&self, key: &str, ttl_seconds: u64) -> Result<String, InvoiceError>;
}

#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
  async fn render_html(
    &self,
    template: &str,
    context: &RenderContext,
  ) -> Result<String, InvoiceError>;
}

#[async_trait]
pub trait DocumentConverter: Send + Sync {
  async fn convert(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, ConvertError>;
}

#[async_trait]
pub trait SdiGenerator: Send + Sync {
  async fn generate(&self, context: &RenderContext) -> Result<String, InvoiceError>;
}
