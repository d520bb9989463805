//! Calculation engine for line-level and document-level arithmetic.
//!
//! One rounding rule everywhere: round half-up to two decimals at the final
//! step only. Intermediate factors are never rounded, so the HTML and XML
//! renderings of the same sale always agree to the cent.

use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Round-half-up to two decimals, the terminal step of every calculation.
pub fn round_amount(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `price * qty * (1 - discount/100)`, rounded once at the end.
pub fn line_cost(price: Decimal, qty: Decimal, discount_pct: Decimal) -> Decimal {
  round_amount(raw_cost(price, qty, discount_pct))
}

/// VAT applied to the discounted cost, rounded once at the end.
pub fn line_vat_amount(
  price: Decimal,
  qty: Decimal,
  discount_pct: Decimal,
  vat_pct: Decimal,
) -> Decimal {
  round_amount(raw_cost(price, qty, discount_pct) * vat_pct / HUNDRED)
}

/// Cost plus VAT. Defined as the sum of the two rounded components so that
/// `line_total == line_cost + line_vat_amount` holds exactly.
pub fn line_total(price: Decimal, qty: Decimal, discount_pct: Decimal, vat_pct: Decimal) -> Decimal {
  line_cost(price, qty, discount_pct) + line_vat_amount(price, qty, discount_pct, vat_pct)
}

fn raw_cost(price: Decimal, qty: Decimal, discount_pct: Decimal) -> Decimal {
  price * qty * (Decimal::ONE - discount_pct / HUNDRED)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use rust_decimal_macros::dec;

  #[test]
  fn no_discount_no_surprises() {
    // qty=10, price=100, vat=22 -> total 1220.00
    assert_eq!(line_cost(dec!(100), dec!(10), dec!(0)), dec!(1000.00));
    assert_eq!(line_vat_amount(dec!(100), dec!(10), dec!(0), dec!(22)), dec!(220.00));
    assert_eq!(line_total(dec!(100), dec!(10), dec!(0), dec!(22)), dec!(1220.00));
  }

  #[test]
  fn discount_applies_before_vat() {
    // qty=10, price=100, discount=10, vat=22 -> 900 / 198 / 1098
    assert_eq!(line_cost(dec!(100), dec!(10), dec!(10)), dec!(900.00));
    assert_eq!(line_vat_amount(dec!(100), dec!(10), dec!(10), dec!(22)), dec!(198.00));
    assert_eq!(line_total(dec!(100), dec!(10), dec!(10), dec!(22)), dec!(1098.00));
  }

  #[test]
  fn intermediate_factors_are_not_rounded() {
    // 3 * 0.333 = 0.999 -> cost 1.00; VAT on the raw 0.999, not on 1.00
    assert_eq!(line_cost(dec!(0.333), dec!(3), dec!(0)), dec!(1.00));
    assert_eq!(line_vat_amount(dec!(0.333), dec!(3), dec!(0), dec!(22)), dec!(0.22));
  }

  #[test]
  fn rounds_half_away_from_zero() {
    assert_eq!(round_amount(dec!(0.125)), dec!(0.13));
    assert_eq!(round_amount(dec!(-0.125)), dec!(-0.13));
  }

  proptest! {
    /// The total is the exact sum of the two rounded components.
    #[test]
    fn total_is_cost_plus_vat(
      price_cents in 0i64..10_000_000,
      qty_milli in 1i64..1_000_000,
      discount_bp in 0i64..10_000,
      vat_bp in 0i64..10_000,
    ) {
      let price = Decimal::new(price_cents, 2);
      let qty = Decimal::new(qty_milli, 3);
      let discount = Decimal::new(discount_bp, 2);
      let vat = Decimal::new(vat_bp, 2);

      let cost = line_cost(price, qty, discount);
      let vat_amount = line_vat_amount(price, qty, discount, vat);
      let total = line_total(price, qty, discount, vat);

      prop_assert_eq!(total, cost + vat_amount);
      prop_assert_eq!(cost.scale(), 2);
      prop_assert_eq!(vat_amount.scale(), 2);
    }

    /// The raw formula holds within one cent of rounding tolerance.
    #[test]
    fn total_matches_raw_formula_within_tolerance(
      price_cents in 0i64..10_000_000,
      qty in 1i64..10_000,
      discount_bp in 0i64..10_000,
      vat_bp in 0i64..10_000,
    ) {
      let price = Decimal::new(price_cents, 2);
      let qty = Decimal::from(qty);
      let discount = Decimal::new(discount_bp, 2);
      let vat = Decimal::new(vat_bp, 2);

      let raw = price * qty * (Decimal::ONE - discount / dec!(100))
        * (Decimal::ONE + vat / dec!(100));
      let total = line_total(price, qty, discount, vat);
      prop_assert!((total - raw).abs() <= dec!(0.01));
    }
  }
}
