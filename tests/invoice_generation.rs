//! End-to-end tests for the invoice generation pipeline, running the real
//! renderer and FatturaPA generator against in-memory infrastructure.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use fatture::adapters::render::HtmlRenderer;
use fatture::adapters::sdi::FatturaPaGenerator;
use fatture::application::invoice::{GenerateInvoiceCommand, GenerateInvoiceUseCase};
use fatture::domain::invoice::{
  ArtifactFormat, Caller, ConvertError, DocumentConverter, GenerationRequest, InvoiceError,
  InvoiceMetadataUpdate, InvoiceService, InvoiceServiceDependencies, PageOptions, SaleRepository,
  artifact_key,
};
use fatture::domain::sale::{
  Bank, CountryCode, Currency, InvoiceMetadata, Language, PartySnapshot, Quantity, Sale,
  SaleLine, SaleStatus, VatRate,
};
use fatture::infrastructure::storage::InMemoryArtifactStore;

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

struct FakeSaleRepository {
  sale: Mutex<Sale>,
  lines: Vec<SaleLine>,
  updates: AtomicUsize,
}

impl FakeSaleRepository {
  fn new(sale: Sale, lines: Vec<SaleLine>) -> Self {
    Self {
      sale: Mutex::new(sale),
      lines,
      updates: AtomicUsize::new(0),
    }
  }

  async fn sale(&self) -> Sale {
    self.sale.lock().await.clone()
  }

  fn update_count(&self) -> usize {
    self.updates.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl SaleRepository for FakeSaleRepository {
  async fn get(&self, sale_id: Uuid) -> Result<Option<Sale>, InvoiceError> {
    let sale = self.sale.lock().await;
    if sale.id == sale_id {
      Ok(Some(sale.clone()))
    } else {
      Ok(None)
    }
  }

  async fn list_lines(&self, sale_id: Uuid) -> Result<Vec<SaleLine>, InvoiceError> {
    Ok(
      self
        .lines
        .iter()
        .filter(|l| l.sale_id == sale_id)
        .cloned()
        .collect(),
    )
  }

  async fn update_invoice_metadata(
    &self,
    sale_id: Uuid,
    update: InvoiceMetadataUpdate,
  ) -> Result<(), InvoiceError> {
    let mut sale = self.sale.lock().await;
    if sale.id != sale_id {
      return Err(InvoiceError::NotFound(sale_id));
    }
    sale.invoice.generated = update.generated;
    sale.invoice.generated_at = Some(update.generated_at);
    sale.invoice.number.get_or_insert(update.invoice_number);
    if sale.status == SaleStatus::Confirmed {
      sale.status = SaleStatus::Invoiced;
    }
    self.updates.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

struct StubConverter {
  calls: AtomicUsize,
}

impl StubConverter {
  fn new() -> Self {
    Self {
      calls: AtomicUsize::new(0),
    }
  }

  fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl DocumentConverter for StubConverter {
  async fn convert(&self, _html: &str, _options: &PageOptions) -> Result<Vec<u8>, ConvertError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(b"%PDF-1.4\nstub".to_vec())
  }
}

struct FailingConverter;

#[async_trait]
impl DocumentConverter for FailingConverter {
  async fn convert(&self, _html: &str, _options: &PageOptions) -> Result<Vec<u8>, ConvertError> {
    Err(ConvertError::EngineFault("engine crashed".to_string()))
  }
}

fn party(country: &str) -> PartySnapshot {
  PartySnapshot {
    company_name: "Rossi Srl".to_string(),
    vat_number: Some("01234567890".to_string()),
    tax_code: None,
    street: Some("Via Garibaldi 10".to_string()),
    city: Some("Torino".to_string()),
    postal_code: Some("10100".to_string()),
    province: Some("TO".to_string()),
    country: CountryCode::new(country).unwrap(),
    email: None,
  }
}

fn sale(status: SaleStatus, producer_country: &str) -> Sale {
  let now = Utc::now();
  Sale {
    id: Uuid::new_v4(),
    owner_id: Uuid::new_v4(),
    number: 7,
    date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    buyer: party("IT"),
    producer: party(producer_country),
    banks: vec![Bank {
      id: "b1".to_string(),
      name: "Banca di Prova".to_string(),
      iban: "IT60X0542811101000000123456".to_string(),
      bic: None,
    }],
    subtotal: dec!(1000.00),
    tax_amount: dec!(220.00),
    total: dec!(1220.00),
    currency: Currency::EUR,
    status,
    invoice: InvoiceMetadata::default(),
    line_count: 1,
    created_at: now,
    updated_at: now,
    deleted_at: None,
  }
}

fn lines(sale_id: Uuid) -> Vec<SaleLine> {
  vec![
    SaleLine::new(
      sale_id,
      1,
      "Consulting".to_string(),
      None,
      Quantity::new(dec!(10)).unwrap(),
      dec!(100),
      dec!(0),
      VatRate::new(dec!(22)).unwrap(),
    )
    .unwrap(),
  ]
}

struct Harness {
  service: InvoiceService,
  repository: Arc<FakeSaleRepository>,
  artifacts: Arc<InMemoryArtifactStore>,
  converter: Arc<StubConverter>,
  sale_id: Uuid,
  owner: Caller,
}

fn harness(sale: Sale, lines: Vec<SaleLine>) -> Harness {
  init_tracing();
  let sale_id = sale.id;
  let owner = Caller::user(sale.owner_id);
  let repository = Arc::new(FakeSaleRepository::new(sale, lines));
  let artifacts = Arc::new(InMemoryArtifactStore::new());
  let converter = Arc::new(StubConverter::new());
  let service = InvoiceService::new(
    InvoiceServiceDependencies {
      sales: repository.clone(),
      artifacts: artifacts.clone(),
      renderer: Arc::new(HtmlRenderer::new().unwrap()),
      converter: converter.clone(),
      sdi: Arc::new(FatturaPaGenerator::new()),
    },
    PageOptions::default(),
  );
  Harness {
    service,
    repository,
    artifacts,
    converter,
    sale_id,
    owner,
  }
}

fn default_harness() -> Harness {
  let sale = sale(SaleStatus::Confirmed, "IT");
  let lines = lines(sale.id);
  harness(sale, lines)
}

fn request(h: &Harness, format: ArtifactFormat, language: Option<Language>) -> GenerationRequest {
  GenerationRequest {
    caller: h.owner,
    sale_id: h.sale_id,
    format,
    language,
  }
}

#[tokio::test]
async fn html_generation_stores_localized_artifact() {
  let h = default_harness();
  let outcome = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::En)))
    .await
    .unwrap();

  let expected_key = artifact_key(h.sale_id, ArtifactFormat::Html, Some(Language::En));
  assert_eq!(outcome.artifact_key, expected_key);
  assert!(outcome.invoice_number.value().starts_with("INV-7-"));

  let stored = h.artifacts.get(&expected_key).await.unwrap();
  assert_eq!(stored.content_type, "text/html; charset=utf-8");
  let html = String::from_utf8(stored.bytes).unwrap();
  assert!(html.contains("1,220.00"));
  assert!(html.contains("03/15/2024"));
  assert_eq!(h.converter.call_count(), 0);

  let sale = h.repository.sale().await;
  assert!(sale.invoice.generated);
  assert_eq!(sale.status, SaleStatus::Invoiced);
}

#[tokio::test]
async fn first_generation_embeds_the_invoice_number() {
  let h = default_harness();
  let outcome = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::En)))
    .await
    .unwrap();

  // The very first artifact must already carry the assigned number, even
  // though nothing was persisted when rendering started.
  let stored = h.artifacts.get(&outcome.artifact_key).await.unwrap();
  let html = String::from_utf8(stored.bytes).unwrap();
  assert!(html.contains(outcome.invoice_number.value()));
  // And it is titled as a final invoice, not a proforma.
  assert!(html.contains(">Invoice<"));
  assert!(!html.contains("Proforma"));
}

#[tokio::test]
async fn pdf_generation_goes_through_the_converter() {
  let h = default_harness();
  let outcome = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Pdf, Some(Language::It)))
    .await
    .unwrap();

  assert_eq!(h.converter.call_count(), 1);
  let stored = h.artifacts.get(&outcome.artifact_key).await.unwrap();
  assert_eq!(stored.content_type, "application/pdf");
  assert!(stored.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn sdi_generation_stores_fattura_pa_xml() {
  let h = default_harness();
  let outcome = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Sdi, None))
    .await
    .unwrap();

  assert_eq!(
    outcome.artifact_key,
    format!("invoices/{}/xml/sdi.xml", h.sale_id)
  );
  let stored = h.artifacts.get(&outcome.artifact_key).await.unwrap();
  assert_eq!(stored.content_type, "application/xml");
  let xml = String::from_utf8(stored.bytes).unwrap();
  assert!(xml.contains("FatturaElettronica"));
  assert!(xml.contains("<TipoDocumento>TD01</TipoDocumento>"));
  assert!(xml.contains(&format!(
    "<Numero>{}</Numero>",
    outcome.invoice_number.value()
  )));
  // The XML carries the same recomputed amounts as the HTML rendition.
  assert!(xml.contains("<ImponibileImporto>1000.00</ImponibileImporto>"));
  assert!(xml.contains("<ImportoTotaleDocumento>1220.00</ImportoTotaleDocumento>"));
  assert_eq!(h.converter.call_count(), 0);
}

#[tokio::test]
async fn draft_sale_fails_before_any_rendering() {
  let sale = sale(SaleStatus::Draft, "IT");
  let lines = lines(sale.id);
  let h = harness(sale, lines);

  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Pdf, Some(Language::It)))
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));
  assert_eq!(h.converter.call_count(), 0);
  assert_eq!(h.artifacts.len().await, 0);
  assert_eq!(h.repository.update_count(), 0);
}

#[tokio::test]
async fn cancelled_sale_cannot_be_invoiced() {
  let sale = sale(SaleStatus::Cancelled, "IT");
  let lines = lines(sale.id);
  let h = harness(sale, lines);

  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::It)))
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));
}

#[tokio::test]
async fn sale_without_billable_lines_is_rejected() {
  let sale = sale(SaleStatus::Confirmed, "IT");
  let h = harness(sale, vec![]);

  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::It)))
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));
}

#[tokio::test]
async fn sdi_requires_both_parties_in_italy() {
  let sale = sale(SaleStatus::Confirmed, "DE");
  let lines = lines(sale.id);
  let h = harness(sale, lines);

  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Sdi, None))
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));
  assert_eq!(h.converter.call_count(), 0);
  assert_eq!(h.artifacts.len().await, 0);
  assert_eq!(h.repository.update_count(), 0);
}

#[tokio::test]
async fn missing_language_for_html_is_rejected() {
  let h = default_harness();
  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, None))
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));
}

#[tokio::test]
async fn invoice_number_survives_regeneration() {
  let h = default_harness();
  let first = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::En)))
    .await
    .unwrap();
  let second = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Pdf, Some(Language::It)))
    .await
    .unwrap();

  assert_eq!(first.invoice_number, second.invoice_number);
  assert_eq!(h.repository.update_count(), 2);
}

#[tokio::test]
async fn regeneration_overwrites_the_same_key() {
  let h = default_harness();
  for _ in 0..2 {
    h.service
      .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::En)))
      .await
      .unwrap();
  }
  assert_eq!(h.artifacts.len().await, 1);
}

#[tokio::test]
async fn rendering_is_byte_identical_across_regenerations() {
  let h = default_harness();
  let key = artifact_key(h.sale_id, ArtifactFormat::Html, Some(Language::De));

  h.service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::De)))
    .await
    .unwrap();
  let first = h.artifacts.get(&key).await.unwrap().bytes;

  h.service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::De)))
    .await
    .unwrap();
  let second = h.artifacts.get(&key).await.unwrap().bytes;

  assert_eq!(first, second);
}

#[tokio::test]
async fn conversion_failure_records_nothing() {
  init_tracing();
  let sale = sale(SaleStatus::Confirmed, "IT");
  let sale_lines = lines(sale.id);
  let sale_id = sale.id;
  let owner = Caller::user(sale.owner_id);
  let repository = Arc::new(FakeSaleRepository::new(sale, sale_lines));
  let artifacts = Arc::new(InMemoryArtifactStore::new());
  let service = InvoiceService::new(
    InvoiceServiceDependencies {
      sales: repository.clone(),
      artifacts: artifacts.clone(),
      renderer: Arc::new(HtmlRenderer::new().unwrap()),
      converter: Arc::new(FailingConverter),
      sdi: Arc::new(FatturaPaGenerator::new()),
    },
    PageOptions::default(),
  );

  let result = service
    .generate_invoice(GenerationRequest {
      caller: owner,
      sale_id,
      format: ArtifactFormat::Pdf,
      language: Some(Language::It),
    })
    .await;

  assert!(matches!(result, Err(InvoiceError::ConversionFailed { .. })));
  assert_eq!(artifacts.len().await, 0);
  assert_eq!(repository.update_count(), 0);
}

#[tokio::test]
async fn other_users_see_not_found_through_the_use_case() {
  let h = default_harness();
  let use_case = GenerateInvoiceUseCase::new(Arc::new(h.service));

  let result = use_case
    .execute(GenerateInvoiceCommand {
      user_id: Uuid::new_v4(),
      is_admin: false,
      sale_id: h.sale_id,
      format: "pdf".to_string(),
      language: Some("it".to_string()),
    })
    .await;

  assert!(matches!(result, Err(InvoiceError::NotFound(id)) if id == h.sale_id));
}

#[tokio::test]
async fn admins_can_generate_for_any_sale() {
  let h = default_harness();
  let admin = Caller::admin(Uuid::new_v4());
  let outcome = h
    .service
    .generate_invoice(GenerationRequest {
      caller: admin,
      sale_id: h.sale_id,
      format: ArtifactFormat::Html,
      language: Some(Language::Fr),
    })
    .await
    .unwrap();
  assert!(outcome.artifact_key.ends_with("/html/fr.html"));
}

#[tokio::test]
async fn artifact_url_requires_a_generated_invoice() {
  let h = default_harness();
  let result = h
    .service
    .artifact_url(h.owner, h.sale_id, ArtifactFormat::Html, Some(Language::En), 900)
    .await;
  assert!(matches!(result, Err(InvoiceError::Validation(_))));

  h.service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::En)))
    .await
    .unwrap();

  let url = h
    .service
    .artifact_url(h.owner, h.sale_id, ArtifactFormat::Html, Some(Language::En), 900)
    .await
    .unwrap();
  assert!(url.contains(&format!("invoices/{}/html/en.html", h.sale_id)));
}

#[tokio::test]
async fn deleted_sale_is_not_found() {
  let mut sale = sale(SaleStatus::Confirmed, "IT");
  sale.deleted_at = Some(Utc::now());
  let sale_lines = lines(sale.id);
  let h = harness(sale, sale_lines);

  let result = h
    .service
    .generate_invoice(request(&h, ArtifactFormat::Html, Some(Language::It)))
    .await;
  assert!(matches!(result, Err(InvoiceError::NotFound(_))));
}
