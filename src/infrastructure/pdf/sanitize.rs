//! HTML sanitization applied before the markup reaches the conversion
//! engine. wkhtmltopdf executes JavaScript and follows subresource loads,
//! so active content is stripped even though our own template never emits
//! any: converter input may one day include user-supplied fragments
//! (custom headers, footers).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
  static ref SCRIPT_BLOCKS: Regex =
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
  static ref EVENT_HANDLERS: Regex =
    Regex::new(r#"(?i)\son\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap();
  static ref JAVASCRIPT_URLS: Regex =
    Regex::new(r#"(?i)(href|src)\s*=\s*("\s*javascript:[^"']*"|'\s*javascript:[^"']*')"#).unwrap();
  static ref EMBEDDED_FRAMES: Regex =
    Regex::new(r"(?is)<(iframe|object|embed)\b[^>]*>(.*?</(iframe|object|embed)\s*>)?").unwrap();
}

pub fn sanitize_html(html: &str) -> String {
  let html = SCRIPT_BLOCKS.replace_all(html, "");
  let html = EVENT_HANDLERS.replace_all(&html, "");
  let html = JAVASCRIPT_URLS.replace_all(&html, "$1=\"\"");
  EMBEDDED_FRAMES.replace_all(&html, "").into_owned()
}
