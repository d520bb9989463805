//! FatturaPA (tracciato 1.2, FPR12) e-invoice generation for the Italian
//! exchange system.
//!
//! The document is built straight from the render context, so the amounts
//! carried into the XML are the same recomputed values that appear on the
//! HTML/PDF rendition. Transmission is out of scope: the output is the
//! signed-ready XML body, addressed to the recipient's portal cassetto
//! (CodiceDestinatario 0000000).

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::xml::{XmlBuilder, format_xml_decimal};
use crate::domain::invoice::errors::InvoiceError;
use crate::domain::invoice::ports::SdiGenerator;
use crate::domain::rendering::context::PartyView;
use crate::domain::rendering::{LineView, RenderContext};

const FORMATO_TRASMISSIONE: &str = "FPR12";
const CODICE_DESTINATARIO: &str = "0000000";
const FATTURA_NAMESPACE: &str =
  "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";
/// Ordinary VAT regime. Configurable regimes are a follow-up if a producer
/// on a special regime ever shows up.
const REGIME_FISCALE: &str = "RF01";

pub struct FatturaPaGenerator;

impl FatturaPaGenerator {
  pub fn new() -> Self {
    Self
  }

  fn build(&self, context: &RenderContext) -> Result<String, InvoiceError> {
    let producer_vat = context.producer.vat_number.as_deref().ok_or_else(|| {
      InvoiceError::Validation(format!(
        "Sale {} cannot be sent to SDI: the producer has no VAT number",
        context.sale_id
      ))
    })?;
    if context.buyer.vat_number.is_none() && context.buyer.tax_code.is_none() {
      return Err(InvoiceError::Validation(format!(
        "Sale {} cannot be sent to SDI: the buyer has neither VAT number nor tax code",
        context.sale_id
      )));
    }

    let mut xml = XmlBuilder::new()?;
    xml.open_with_attrs(
      "p:FatturaElettronica",
      &[
        ("versione", FORMATO_TRASMISSIONE),
        ("xmlns:p", FATTURA_NAMESPACE),
      ],
    )?;

    self.header(&mut xml, context, producer_vat)?;
    self.body(&mut xml, context)?;

    xml.close("p:FatturaElettronica")?;
    xml.into_string()
  }

  fn header(
    &self,
    xml: &mut XmlBuilder,
    context: &RenderContext,
    producer_vat: &str,
  ) -> Result<(), InvoiceError> {
    xml.open("FatturaElettronicaHeader")?;

    xml.open("DatiTrasmissione")?;
    xml.open("IdTrasmittente")?;
    xml.text_element("IdPaese", &context.producer.country)?;
    xml.text_element("IdCodice", producer_vat)?;
    xml.close("IdTrasmittente")?;
    xml.text_element("ProgressivoInvio", &context.sale_number.to_string())?;
    xml.text_element("FormatoTrasmissione", FORMATO_TRASMISSIONE)?;
    xml.text_element("CodiceDestinatario", CODICE_DESTINATARIO)?;
    xml.close("DatiTrasmissione")?;

    xml.open("CedentePrestatore")?;
    xml.open("DatiAnagrafici")?;
    xml.open("IdFiscaleIVA")?;
    xml.text_element("IdPaese", &context.producer.country)?;
    xml.text_element("IdCodice", producer_vat)?;
    xml.close("IdFiscaleIVA")?;
    xml.optional_element("CodiceFiscale", context.producer.tax_code.as_deref())?;
    xml.open("Anagrafica")?;
    xml.text_element("Denominazione", &context.producer.company_name)?;
    xml.close("Anagrafica")?;
    xml.text_element("RegimeFiscale", REGIME_FISCALE)?;
    xml.close("DatiAnagrafici")?;
    self.sede(xml, &context.producer)?;
    xml.close("CedentePrestatore")?;

    xml.open("CessionarioCommittente")?;
    xml.open("DatiAnagrafici")?;
    if let Some(buyer_vat) = context.buyer.vat_number.as_deref() {
      xml.open("IdFiscaleIVA")?;
      xml.text_element("IdPaese", &context.buyer.country)?;
      xml.text_element("IdCodice", buyer_vat)?;
      xml.close("IdFiscaleIVA")?;
    }
    xml.optional_element("CodiceFiscale", context.buyer.tax_code.as_deref())?;
    xml.open("Anagrafica")?;
    xml.text_element("Denominazione", &context.buyer.company_name)?;
    xml.close("Anagrafica")?;
    xml.close("DatiAnagrafici")?;
    self.sede(xml, &context.buyer)?;
    xml.close("CessionarioCommittente")?;

    xml.close("FatturaElettronicaHeader")?;
    Ok(())
  }

  fn sede(&self, xml: &mut XmlBuilder, party: &PartyView) -> Result<(), InvoiceError> {
    xml.open("Sede")?;
    xml.text_element("Indirizzo", party.street.as_deref().unwrap_or("-"))?;
    xml.optional_element("CAP", party.postal_code.as_deref())?;
    xml.text_element("Comune", party.city.as_deref().unwrap_or("-"))?;
    xml.optional_element("Provincia", party.province.as_deref())?;
    xml.text_element("Nazione", &party.country)?;
    xml.close("Sede")?;
    Ok(())
  }

  fn body(&self, xml: &mut XmlBuilder, context: &RenderContext) -> Result<(), InvoiceError> {
    xml.open("FatturaElettronicaBody")?;

    xml.open("DatiGenerali")?;
    xml.open("DatiGeneraliDocumento")?;
    xml.text_element("TipoDocumento", context.document_type.sdi_code())?;
    xml.text_element("Divisa", &context.currency)?;
    xml.text_element("Data", &iso_date(&context.date))?;
    let numero = context
      .invoice_number
      .clone()
      .unwrap_or_else(|| context.sale_number.to_string());
    xml.text_element("Numero", &numero)?;
    xml.text_element(
      "ImportoTotaleDocumento",
      &format_xml_decimal(context.totals.total),
    )?;
    xml.close("DatiGeneraliDocumento")?;
    xml.close("DatiGenerali")?;

    xml.open("DatiBeniServizi")?;
    for line in &context.lines {
      self.dettaglio_linea(xml, line)?;
    }
    for (rate, (imponibile, imposta)) in vat_summary(&context.lines) {
      xml.open("DatiRiepilogo")?;
      xml.text_element("AliquotaIVA", &format_xml_decimal(rate))?;
      xml.text_element("ImponibileImporto", &format_xml_decimal(imponibile))?;
      xml.text_element("Imposta", &format_xml_decimal(imposta))?;
      xml.text_element("EsigibilitaIVA", "I")?;
      xml.close("DatiRiepilogo")?;
    }
    xml.close("DatiBeniServizi")?;

    if let Some(bank) = context.banks.first() {
      xml.open("DatiPagamento")?;
      xml.text_element("CondizioniPagamento", "TP02")?;
      xml.open("DettaglioPagamento")?;
      xml.text_element("ModalitaPagamento", "MP05")?;
      xml.text_element(
        "ImportoPagamento",
        &format_xml_decimal(context.totals.total),
      )?;
      xml.text_element("IstitutoFinanziario", &bank.name)?;
      xml.text_element("IBAN", &bank.iban)?;
      xml.optional_element("BIC", bank.bic.as_deref())?;
      xml.close("DettaglioPagamento")?;
      xml.close("DatiPagamento")?;
    }

    xml.close("FatturaElettronicaBody")?;
    Ok(())
  }

  fn dettaglio_linea(&self, xml: &mut XmlBuilder, line: &LineView) -> Result<(), InvoiceError> {
    xml.open("DettaglioLinee")?;
    xml.text_element("NumeroLinea", &line.line_number.to_string())?;
    if let Some(code) = line.code.as_deref().filter(|c| !c.trim().is_empty()) {
      xml.open("CodiceArticolo")?;
      xml.text_element("CodiceTipo", "SKU")?;
      xml.text_element("CodiceValore", code)?;
      xml.close("CodiceArticolo")?;
    }
    xml.text_element("Descrizione", &line.description)?;
    xml.text_element("Quantita", &format_xml_decimal(line.quantity))?;
    xml.text_element("PrezzoUnitario", &format_xml_decimal(line.unit_price))?;
    if !line.discount_pct.is_zero() {
      xml.open("ScontoMaggiorazione")?;
      xml.text_element("Tipo", "SC")?;
      xml.text_element("Percentuale", &format_xml_decimal(line.discount_pct))?;
      xml.close("ScontoMaggiorazione")?;
    }
    xml.text_element("PrezzoTotale", &format_xml_decimal(line.cost))?;
    xml.text_element("AliquotaIVA", &format_xml_decimal(line.vat_rate))?;
    xml.close("DettaglioLinee")?;
    Ok(())
  }
}

impl Default for FatturaPaGenerator {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl SdiGenerator for FatturaPaGenerator {
  async fn generate(&self, context: &RenderContext) -> Result<String, InvoiceError> {
    self.build(context)
  }
}

/// Taxable base and tax per VAT rate, rate-ordered so the output is stable.
fn vat_summary(lines: &[LineView]) -> BTreeMap<Decimal, (Decimal, Decimal)> {
  let mut summary: BTreeMap<Decimal, (Decimal, Decimal)> = BTreeMap::new();
  for line in lines {
    let entry = summary
      .entry(line.vat_rate)
      .or_insert((Decimal::ZERO, Decimal::ZERO));
    entry.0 += line.cost;
    entry.1 += line.vat_amount;
  }
  summary
}

/// YYYYMMDD to the ISO 8601 form the tracciato requires.
fn iso_date(yyyymmdd: &str) -> String {
  if yyyymmdd.len() == 8 && yyyymmdd.chars().all(|c| c.is_ascii_digit()) {
    format!(
      "{}-{}-{}",
      &yyyymmdd[0..4],
      &yyyymmdd[4..6],
      &yyyymmdd[6..8]
    )
  } else {
    yyyymmdd.to_string()
  }
}
