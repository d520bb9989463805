//! Event-based XML writer for the FatturaPA document.
//!
//! FatturaPA is element-order sensitive, so the document is emitted as an
//! explicit event stream rather than through serde: the builder writes
//! elements exactly in the order the tracciato prescribes.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::domain::invoice::errors::InvoiceError;

fn xml_io(e: std::io::Error) -> InvoiceError {
  InvoiceError::Internal(format!("XML write error: {}", e))
}

pub struct XmlBuilder {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlBuilder {
  pub fn new() -> Result<Self, InvoiceError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
      .map_err(xml_io)?;
    Ok(Self { writer })
  }

  pub fn into_string(self) -> Result<String, InvoiceError> {
    let buf = self.writer.into_inner().into_inner();
    String::from_utf8(buf).map_err(|e| InvoiceError::Internal(format!("XML UTF-8 error: {}", e)))
  }

  pub fn open(&mut self, name: &str) -> Result<&mut Self, InvoiceError> {
    self
      .writer
      .write_event(Event::Start(BytesStart::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  pub fn open_with_attrs(
    &mut self,
    name: &str,
    attrs: &[(&str, &str)],
  ) -> Result<&mut Self, InvoiceError> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
      elem.push_attribute((*k, *v));
    }
    self
      .writer
      .write_event(Event::Start(elem))
      .map_err(xml_io)?;
    Ok(self)
  }

  pub fn close(&mut self, name: &str) -> Result<&mut Self, InvoiceError> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, InvoiceError> {
    self.open(name)?;
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(xml_io)?;
    self.close(name)
  }

  /// Skipped entirely when the value is absent; FatturaPA forbids empty
  /// optional elements.
  pub fn optional_element(
    &mut self,
    name: &str,
    text: Option<&str>,
  ) -> Result<&mut Self, InvoiceError> {
    match text {
      Some(text) if !text.trim().is_empty() => self.text_element(name, text),
      _ => Ok(self),
    }
  }
}

/// Decimal rendering for FatturaPA amounts: at least two decimals, trailing
/// zeros beyond that stripped.
pub fn format_xml_decimal(d: Decimal) -> String {
  let s = d.normalize().to_string();
  if let Some(dot_pos) = s.find('.') {
    let decimals = s.len() - dot_pos - 1;
    if decimals < 2 {
      format!("{}{}", s, "0".repeat(2 - decimals))
    } else {
      s
    }
  } else {
    format!("{}.00", s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn decimal_rendering() {
    assert_eq!(format_xml_decimal(dec!(100)), "100.00");
    assert_eq!(format_xml_decimal(dec!(1500.0)), "1500.00");
    assert_eq!(format_xml_decimal(dec!(49.90)), "49.90");
    assert_eq!(format_xml_decimal(dec!(0.005)), "0.005");
    assert_eq!(format_xml_decimal(dec!(22)), "22.00");
  }

  #[test]
  fn builder_emits_declaration_and_nesting() {
    let mut builder = XmlBuilder::new().unwrap();
    builder.open("Root").unwrap();
    builder.text_element("Child", "value").unwrap();
    builder.optional_element("Skipped", None).unwrap();
    builder.optional_element("Blank", Some("  ")).unwrap();
    builder.close("Root").unwrap();
    let xml = builder.into_string().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<Child>value</Child>"));
    assert!(!xml.contains("Skipped"));
    assert!(!xml.contains("Blank"));
  }

  #[test]
  fn text_is_escaped() {
    let mut builder = XmlBuilder::new().unwrap();
    builder.text_element("Descrizione", "Nuts & bolts <1mm>").unwrap();
    let xml = builder.into_string().unwrap();
    assert!(xml.contains("Nuts &amp; bolts &lt;1mm&gt;"));
  }
}
