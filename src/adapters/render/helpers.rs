//! The closed helper set exposed to invoice templates.
//!
//! Helpers are registered once at renderer construction; templates cannot
//! reach anything outside this set. Value arguments follow the formatting
//! engine's fail-soft contract (a malformed field formats as zero/empty),
//! while a missing `lang` or `key` argument is a template bug and errors.
//! Comparison and boolean logic use tera's native operators.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tera::Tera;

use super::{countries, i18n};
use crate::domain::rendering::context::column_count;
use crate::domain::rendering::{calc, format};
use crate::domain::sale::Language;

type Args = HashMap<String, Value>;

fn lang_arg(args: &Args) -> tera::Result<Language> {
  let raw = args
    .get("lang")
    .and_then(Value::as_str)
    .ok_or_else(|| tera::Error::msg("helper requires a `lang` argument"))?;
  Language::from_str(raw).map_err(|e| tera::Error::msg(e.to_string()))
}

/// Fail-soft scalar coercion: strings and numbers pass through, everything
/// else (missing, null, objects) becomes the empty string.
fn raw_arg(args: &Args, name: &str) -> String {
  match args.get(name) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  }
}

fn dec_arg(args: &Args, name: &str) -> Decimal {
  Decimal::from_str(raw_arg(args, name).trim()).unwrap_or(Decimal::ZERO)
}

fn line_has_code(line: &Value) -> bool {
  line
    .get("code")
    .and_then(Value::as_str)
    .map(|c| !c.trim().is_empty())
    .unwrap_or(false)
}

fn line_has_discount(line: &Value) -> bool {
  let discount = match line.get("discount_pct") {
    Some(Value::String(s)) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
    Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).unwrap_or(Decimal::ZERO),
    _ => Decimal::ZERO,
  };
  !discount.is_zero()
}

fn lines_arg(args: &Args) -> Vec<Value> {
  args
    .get("lines")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default()
}

fn t_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  let key = args
    .get("key")
    .and_then(Value::as_str)
    .ok_or_else(|| tera::Error::msg("t requires a `key` argument"))?;
  Ok(Value::String(i18n::translate_or_placeholder(lang, key)))
}

fn amount_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  Ok(Value::String(format::format_amount(
    &raw_arg(args, "v"),
    lang,
  )))
}

fn flex_amount_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  Ok(Value::String(format::format_flex_amount(
    &raw_arg(args, "v"),
    lang,
  )))
}

fn percent_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  Ok(Value::String(format::format_percent(
    &raw_arg(args, "v"),
    lang,
  )))
}

fn quantity_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  Ok(Value::String(format::format_quantity(
    &raw_arg(args, "v"),
    lang,
  )))
}

fn date_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  Ok(Value::String(format::format_date(&raw_arg(args, "v"), lang)))
}

fn date_before_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::Bool(format::date_before(
    &raw_arg(args, "a"),
    &raw_arg(args, "b"),
  )))
}

fn line_cost_fn(args: &Args) -> tera::Result<Value> {
  let cost = calc::line_cost(
    dec_arg(args, "price"),
    dec_arg(args, "qty"),
    dec_arg(args, "discount"),
  );
  Ok(Value::String(cost.to_string()))
}

fn line_vat_fn(args: &Args) -> tera::Result<Value> {
  let vat = calc::line_vat_amount(
    dec_arg(args, "price"),
    dec_arg(args, "qty"),
    dec_arg(args, "discount"),
    dec_arg(args, "vat"),
  );
  Ok(Value::String(vat.to_string()))
}

fn line_total_fn(args: &Args) -> tera::Result<Value> {
  let total = calc::line_total(
    dec_arg(args, "price"),
    dec_arg(args, "qty"),
    dec_arg(args, "discount"),
    dec_arg(args, "vat"),
  );
  Ok(Value::String(total.to_string()))
}

fn add_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::String(
    (dec_arg(args, "a") + dec_arg(args, "b")).to_string(),
  ))
}

fn subtract_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::String(
    (dec_arg(args, "a") - dec_arg(args, "b")).to_string(),
  ))
}

fn multiply_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::String(
    (dec_arg(args, "a") * dec_arg(args, "b")).to_string(),
  ))
}

fn divide_fn(args: &Args) -> tera::Result<Value> {
  let divisor = dec_arg(args, "b");
  let result = if divisor.is_zero() {
    Decimal::ZERO
  } else {
    dec_arg(args, "a") / divisor
  };
  Ok(Value::String(result.to_string()))
}

fn modulo_fn(args: &Args) -> tera::Result<Value> {
  let divisor = dec_arg(args, "b");
  let result = if divisor.is_zero() {
    Decimal::ZERO
  } else {
    dec_arg(args, "a") % divisor
  };
  Ok(Value::String(result.to_string()))
}

fn negate_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::String((-dec_arg(args, "a")).to_string()))
}

fn has_code_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::Bool(lines_arg(args).iter().any(line_has_code)))
}

fn has_discount_fn(args: &Args) -> tera::Result<Value> {
  Ok(Value::Bool(lines_arg(args).iter().any(line_has_discount)))
}

fn col_span_fn(args: &Args) -> tera::Result<Value> {
  let lines = lines_arg(args);
  let span = column_count(
    lines.iter().any(line_has_code),
    lines.iter().any(line_has_discount),
  );
  Ok(Value::Number(span.into()))
}

/// Finds a bank by id in the context's bank list. Misses yield null.
fn get_bank_fn(args: &Args) -> tera::Result<Value> {
  let id = raw_arg(args, "id");
  let bank = args
    .get("banks")
    .and_then(Value::as_array)
    .and_then(|banks| {
      banks
        .iter()
        .find(|b| b.get("id").and_then(Value::as_str) == Some(id.as_str()))
        .cloned()
    });
  Ok(bank.unwrap_or(Value::Null))
}

fn get_country_name_fn(args: &Args) -> tera::Result<Value> {
  let lang = lang_arg(args)?;
  let code = raw_arg(args, "code");
  Ok(match countries::country_name(&code, lang) {
    Some(name) => Value::String(name.to_string()),
    None => Value::Null,
  })
}

pub fn register(tera: &mut Tera) {
  tera.register_function("t", t_fn);
  tera.register_function("amount", amount_fn);
  tera.register_function("flex_amount", flex_amount_fn);
  tera.register_function("percent", percent_fn);
  tera.register_function("quantity", quantity_fn);
  tera.register_function("date", date_fn);
  tera.register_function("date_before", date_before_fn);
  tera.register_function("line_cost", line_cost_fn);
  tera.register_function("line_vat", line_vat_fn);
  tera.register_function("line_total", line_total_fn);
  tera.register_function("add", add_fn);
  tera.register_function("subtract", subtract_fn);
  tera.register_function("multiply", multiply_fn);
  tera.register_function("divide", divide_fn);
  tera.register_function("modulo", modulo_fn);
  tera.register_function("negate", negate_fn);
  tera.register_function("has_code", has_code_fn);
  tera.register_function("has_discount", has_discount_fn);
  tera.register_function("col_span", col_span_fn);
  tera.register_function("get_bank", get_bank_fn);
  tera.register_function("get_country_name", get_country_name_fn);
}
