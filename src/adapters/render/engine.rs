//! Tera-backed HTML renderer.
//!
//! Templates are embedded at compile time, so the renderer carries no
//! filesystem dependency and a given context always renders to identical
//! bytes. The helper registry is closed at construction; see `helpers`.

use async_trait::async_trait;
use tera::Tera;

use super::helpers;
use crate::domain::invoice::errors::InvoiceError;
use crate::domain::invoice::ports::InvoiceRenderer;
use crate::domain::rendering::RenderContext;

const INVOICE_HTML: &str = include_str!(concat!(
  env!("CARGO_MANIFEST_DIR"),
  "/templates/invoice.html.tera"
));

pub struct HtmlRenderer {
  tera: Tera,
}

impl HtmlRenderer {
  pub fn new() -> Result<Self, InvoiceError> {
    let mut tera = Tera::default();
    tera
      .add_raw_templates(vec![("invoice.html", INVOICE_HTML)])
      .map_err(|e| InvoiceError::Internal(format!("Template registration failed: {}", e)))?;
    tera.autoescape_on(vec![".html"]);
    helpers::register(&mut tera);
    Ok(Self { tera })
  }

  pub fn render(&self, template: &str, context: &RenderContext) -> Result<String, InvoiceError> {
    if !self.tera.get_template_names().any(|name| name == template) {
      return Err(InvoiceError::TemplateNotFound(template.to_string()));
    }
    let tera_context = tera::Context::from_serialize(context).map_err(|e| {
      InvoiceError::RenderFailed {
        sale_id: context.sale_id,
        reason: format!("Context serialization failed: {}", e),
      }
    })?;
    self
      .tera
      .render(template, &tera_context)
      .map_err(|e| InvoiceError::RenderFailed {
        sale_id: context.sale_id,
        reason: render_error_chain(&e),
      })
  }
}

#[async_trait]
impl InvoiceRenderer for HtmlRenderer {
  async fn render_html(
    &self,
    template: &str,
    context: &RenderContext,
  ) -> Result<String, InvoiceError> {
    self.render(template, context)
  }
}

/// Tera buries the useful message in the source chain; flatten it.
fn render_error_chain(error: &tera::Error) -> String {
  let mut message = error.to_string();
  let mut source = std::error::Error::source(error);
  while let Some(cause) = source {
    message.push_str(": ");
    message.push_str(&cause.to_string());
    source = cause.source();
  }
  message
}
