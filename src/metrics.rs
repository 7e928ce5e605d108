//! Pure derivation of display metrics from raw chain figures.
//!
//! No I/O, no clock access — `now` is an argument so the calculator stays
//! deterministic. Price-class fields are `Option<f64>`: `None` is the
//! "unavailable" sentinel and must never be conflated with zero.

use serde::Serialize;

use crate::catalog::BondDescriptor;
use crate::chain::RawBondSnapshot;
use crate::error::FetchError;

/// Read model served to the presentation layer. Immutable once computed
/// for a given fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedBondMetrics {
    /// `None` for deprecated bonds.
    pub bond_price: Option<f64>,
    /// Discount in percent, full precision (rounding is a display concern).
    /// `None` for deprecated bonds.
    pub discount_pct: Option<f64>,
    /// `market − bond` price. May be negative; the UI shows a discount
    /// badge only when positive. `None` for deprecated bonds.
    pub price_diff: Option<f64>,
    /// Largest principal amount the user may deposit right now. `None`
    /// for deprecated bonds (purchasing is disabled).
    pub max_user_can_buy: Option<f64>,
    /// Largest single payout the protocol currently allows.
    pub max_payout: f64,
    pub purchased: f64,
    pub debt_ratio: f64,
    pub quote: f64,
    /// Vesting term in seconds.
    pub vesting_term: u64,
    /// True only for an active, matured position. A zero maturation
    /// timestamp means "no active position" and is never vested.
    pub fully_vested: bool,
    /// Short human-readable time to maturity; `None` when there is no
    /// active position or it has already vested.
    pub vesting_remaining: Option<String>,
    /// Payout still owed to the user; `None` without a wallet session or
    /// active position.
    pub claimable: Option<f64>,
}

/// Parse a decimal-string field from a raw snapshot.
fn parse_decimal(field: &'static str, s: &str) -> Result<f64, FetchError> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| FetchError::BadSnapshot(format!("{field}: unparseable decimal {s:?}")))?;
    if !v.is_finite() {
        return Err(FetchError::BadSnapshot(format!("{field}: non-finite value {s:?}")));
    }
    Ok(v)
}

fn ensure_finite(field: &'static str, v: f64) -> Result<f64, FetchError> {
    if !v.is_finite() {
        return Err(FetchError::BadSnapshot(format!("{field}: non-finite value {v}")));
    }
    Ok(v)
}

/// Short rendering of a remaining vesting duration, e.g. "4d 3h".
pub fn pretty_vesting(remaining_secs: i64) -> String {
    let days = remaining_secs / 86_400;
    let hours = (remaining_secs % 86_400) / 3_600;
    let minutes = (remaining_secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        // Sub-minute remainders still show as pending, not blank.
        format!("{}m", minutes.max(1))
    }
}

/// Turn raw chain figures + market price into the derived read model.
///
/// Deprecated bonds skip price/discount derivation entirely and report the
/// unavailable sentinel; their position fields are still computed so held
/// balances remain redeemable in the UI.
pub fn compute_metrics(
    raw: &RawBondSnapshot,
    descriptor: &BondDescriptor,
    now: i64,
) -> Result<DerivedBondMetrics, FetchError> {
    let (maturation_ts, claimable) = match &raw.position {
        Some(p) => (p.maturation_ts, Some(p.claimable)),
        None => (0, None),
    };

    let fully_vested = now > maturation_ts && maturation_ts > 0;
    let vesting_remaining = if maturation_ts > 0 && !fully_vested {
        Some(pretty_vesting(maturation_ts - now))
    } else {
        None
    };

    if descriptor.deprecated {
        return Ok(DerivedBondMetrics {
            bond_price: None,
            discount_pct: None,
            price_diff: None,
            max_user_can_buy: None,
            max_payout: raw.max_payout,
            purchased: raw.purchased,
            debt_ratio: raw.debt_ratio,
            quote: raw.quote,
            vesting_term: raw.vesting_term,
            fully_vested,
            vesting_remaining,
            claimable,
        });
    }

    let bond_price = ensure_finite("bond_price", raw.bond_price)?;
    let discount_rate = ensure_finite("discount_rate", raw.discount_rate)?;
    let market_price = parse_decimal("market_price", &raw.market_price)?;
    let max_user_can_buy = parse_decimal("max_user_can_buy", &raw.max_user_can_buy)?;

    Ok(DerivedBondMetrics {
        bond_price: Some(bond_price),
        discount_pct: Some(discount_rate * 100.0),
        price_diff: Some(market_price - bond_price),
        max_user_can_buy: Some(max_user_can_buy),
        max_payout: raw.max_payout,
        purchased: raw.purchased,
        debt_ratio: raw.debt_ratio,
        quote: raw.quote,
        vesting_term: raw.vesting_term,
        fully_vested,
        vesting_remaining,
        claimable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::chain::UserPosition;

    fn raw() -> RawBondSnapshot {
        RawBondSnapshot {
            discount_rate: 0.05,
            debt_ratio: 0.31,
            quote: 12.4,
            purchased: 1_250_000.0,
            vesting_term: 432_000,
            bond_price: 10.0,
            market_price: "10.8".to_string(),
            max_payout: 500.0,
            max_user_can_buy: "2500".to_string(),
            position: None,
        }
    }

    #[test]
    fn discount_and_price_diff() {
        let desc = catalog::describe("clam-dai-lp").unwrap();
        let m = compute_metrics(&raw(), desc, 1_700_000_000).unwrap();

        assert_eq!(m.bond_price, Some(10.0));
        assert!((m.discount_pct.unwrap() - 5.0).abs() < 1e-12);
        // 10.8 − 10.0: positive, so the UI shows a discount badge.
        assert!((m.price_diff.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(m.max_user_can_buy, Some(2500.0));
    }

    #[test]
    fn zero_maturation_is_never_vested() {
        let desc = catalog::describe("mai").unwrap();

        let mut snapshot = raw();
        snapshot.position = Some(UserPosition { claimable: 3.5, maturation_ts: 0 });

        // Far-future "now" must not flip a zero timestamp to vested.
        let m = compute_metrics(&snapshot, desc, i64::MAX - 1).unwrap();
        assert!(!m.fully_vested);
        assert_eq!(m.vesting_remaining, None);
    }

    #[test]
    fn active_position_vesting_text_and_maturity() {
        let desc = catalog::describe("mai").unwrap();
        let now = 1_700_000_000;

        let mut snapshot = raw();
        // 2 days 3 hours out.
        snapshot.position = Some(UserPosition {
            claimable: 3.5,
            maturation_ts: now + 2 * 86_400 + 3 * 3_600,
        });
        let m = compute_metrics(&snapshot, desc, now).unwrap();
        assert!(!m.fully_vested);
        assert_eq!(m.vesting_remaining.as_deref(), Some("2d 3h"));
        assert_eq!(m.claimable, Some(3.5));

        // Past maturity: vested, no countdown text.
        snapshot.position = Some(UserPosition { claimable: 3.5, maturation_ts: now - 1 });
        let m = compute_metrics(&snapshot, desc, now).unwrap();
        assert!(m.fully_vested);
        assert_eq!(m.vesting_remaining, None);
    }

    #[test]
    fn deprecated_bond_reports_unavailable_not_zero() {
        let desc = catalog::describe("frax").unwrap();
        assert!(desc.deprecated);

        // A perfectly valid snapshot still yields the sentinel.
        let m = compute_metrics(&raw(), desc, 1_700_000_000).unwrap();
        assert_eq!(m.bond_price, None);
        assert_eq!(m.discount_pct, None);
        assert_eq!(m.price_diff, None);
        assert_eq!(m.max_user_can_buy, None);
        // Non-price passthroughs survive.
        assert_eq!(m.purchased, 1_250_000.0);
    }

    #[test]
    fn deprecated_bond_ignores_malformed_market_price() {
        let desc = catalog::describe("frax").unwrap();
        let mut snapshot = raw();
        snapshot.market_price = "n/a".to_string();
        // Price derivation is skipped entirely, so this must not error.
        assert!(compute_metrics(&snapshot, desc, 1_700_000_000).is_ok());
    }

    #[test]
    fn malformed_market_price_is_an_error_not_zero() {
        let desc = catalog::describe("mai").unwrap();
        let mut snapshot = raw();
        snapshot.market_price = "".to_string();

        match compute_metrics(&snapshot, desc, 1_700_000_000) {
            Err(FetchError::BadSnapshot(msg)) => assert!(msg.contains("market_price")),
            other => panic!("expected BadSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_chain_figures_are_rejected() {
        let desc = catalog::describe("mai").unwrap();
        let mut snapshot = raw();
        snapshot.bond_price = f64::NAN;
        assert!(matches!(
            compute_metrics(&snapshot, desc, 1_700_000_000),
            Err(FetchError::BadSnapshot(_))
        ));

        let mut snapshot = raw();
        snapshot.market_price = "inf".to_string();
        assert!(matches!(
            compute_metrics(&snapshot, desc, 1_700_000_000),
            Err(FetchError::BadSnapshot(_))
        ));
    }

    #[test]
    fn pretty_vesting_buckets() {
        assert_eq!(pretty_vesting(3 * 86_400 + 5 * 3_600), "3d 5h");
        assert_eq!(pretty_vesting(2 * 3_600 + 40 * 60), "2h 40m");
        assert_eq!(pretty_vesting(11 * 60), "11m");
        assert_eq!(pretty_vesting(25), "1m");
    }
}
