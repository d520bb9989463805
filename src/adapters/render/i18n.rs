//! Invoice label translations for the four supported document languages.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::domain::sale::Language;

// (key, it, en, de, fr)
const LABELS: &[(&str, &str, &str, &str, &str)] = &[
  ("invoice", "Fattura", "Invoice", "Rechnung", "Facture"),
  (
    "proforma_invoice",
    "Fattura proforma",
    "Proforma invoice",
    "Proformarechnung",
    "Facture proforma",
  ),
  (
    "credit_note",
    "Nota di credito",
    "Credit note",
    "Gutschrift",
    "Avoir",
  ),
  (
    "invoice_number",
    "Numero fattura",
    "Invoice number",
    "Rechnungsnummer",
    "Numéro de facture",
  ),
  ("sale_number", "Numero ordine", "Sale number", "Auftragsnummer", "Numéro de vente"),
  ("date", "Data", "Date", "Datum", "Date"),
  ("bill_to", "Destinatario", "Bill to", "Rechnungsempfänger", "Destinataire"),
  ("from", "Emittente", "From", "Aussteller", "Émetteur"),
  ("code", "Codice", "Code", "Artikelnr.", "Code"),
  ("description", "Descrizione", "Description", "Beschreibung", "Description"),
  ("quantity", "Quantità", "Qty", "Menge", "Qté"),
  ("unit_price", "Prezzo unitario", "Unit price", "Einzelpreis", "Prix unitaire"),
  ("discount", "Sconto", "Discount", "Rabatt", "Remise"),
  ("vat", "IVA", "VAT", "USt.", "TVA"),
  ("net_amount", "Imponibile", "Net amount", "Nettobetrag", "Montant HT"),
  ("line_total", "Totale riga", "Line total", "Zeilensumme", "Total ligne"),
  ("subtotal", "Imponibile totale", "Subtotal", "Zwischensumme", "Sous-total"),
  ("total_vat", "Totale IVA", "Total VAT", "USt. gesamt", "Total TVA"),
  ("grand_total", "Totale documento", "Total", "Gesamtbetrag", "Total"),
  ("vat_number", "Partita IVA", "VAT number", "USt-IdNr.", "Numéro de TVA"),
  ("tax_code", "Codice fiscale", "Tax code", "Steuernummer", "Code fiscal"),
  (
    "bank_details",
    "Coordinate bancarie",
    "Bank details",
    "Bankverbindung",
    "Coordonnées bancaires",
  ),
  ("iban", "IBAN", "IBAN", "IBAN", "IBAN"),
  ("bic", "BIC", "BIC", "BIC", "BIC"),
];

lazy_static! {
  static ref TABLES: HashMap<Language, HashMap<&'static str, &'static str>> = {
    let mut tables = HashMap::new();
    for lang in Language::all() {
      let mut table = HashMap::new();
      for (key, it, en, de, fr) in LABELS {
        let value = match lang {
          Language::It => it,
          Language::En => en,
          Language::De => de,
          Language::Fr => fr,
        };
        table.insert(*key, *value);
      }
      tables.insert(lang, table);
    }
    tables
  };
}

pub fn translate(lang: Language, key: &str) -> Option<&'static str> {
  TABLES.get(&lang).and_then(|table| table.get(key)).copied()
}

/// Missing keys render a visibly-wrong placeholder instead of aborting the
/// document: partial localization must not break rendering.
pub fn translate_or_placeholder(lang: Language, key: &str) -> String {
  translate(lang, key)
    .map(str::to_string)
    .unwrap_or_else(|| format!("??{}??", key))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_key_exists_in_all_languages() {
    for (key, ..) in LABELS {
      for lang in Language::all() {
        assert!(translate(lang, key).is_some(), "missing {} for {}", key, lang);
      }
    }
  }

  #[test]
  fn known_labels() {
    assert_eq!(translate(Language::It, "invoice"), Some("Fattura"));
    assert_eq!(translate(Language::De, "grand_total"), Some("Gesamtbetrag"));
  }

  #[test]
  fn missing_key_yields_placeholder() {
    assert_eq!(
      translate_or_placeholder(Language::En, "no_such_key"),
      "??no_such_key??"
    );
  }
}
