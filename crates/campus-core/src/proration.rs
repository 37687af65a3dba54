//! Proration for mid-period tier changes.
//!
//! Daily rates are computed in major currency units (dollars) over a fixed
//! 30-day month; the final charge/credit amounts are converted to minor
//! units (cents) because that is what the gateway consumes. Keep that
//! split: collapsing everything to cents shifts results by a factor of 100.

use chrono::{DateTime, Utc};

use crate::tier::BillingTier;

/// Days in a billing month for daily-rate purposes.
const DAYS_PER_MONTH: f64 = 30.0;

/// Cents per major unit.
const MINOR_PER_MAJOR: f64 = 100.0;

/// Outcome of a proration calculation.
///
/// Exactly one of `charge_cents` / `credit_cents` is non-zero (both are
/// zero when the rates cancel out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proration {
    /// Amount to charge now, in cents.
    pub charge_cents: i64,

    /// Credit to apply to the next invoice, in cents.
    pub credit_cents: i64,

    /// Remaining whole days in the period the calculation covered.
    pub remaining_days: i64,
}

/// Daily rate for a tier at the given seat count, in major units.
fn daily_rate(tier: &BillingTier, user_count: u32) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let monthly_major = tier.total_price_for_users(user_count) as f64 / MINOR_PER_MAJOR;
    monthly_major / DAYS_PER_MONTH
}

/// Compute the credit/charge for switching `old_tier` -> `new_tier` with
/// `remaining_days` left in the current period.
///
/// Unused credit for the old tier offsets the new tier's cost for the same
/// window; whichever side is larger determines whether the result is a
/// charge or a credit.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn prorate(
    old_tier: &BillingTier,
    new_tier: &BillingTier,
    user_count: u32,
    remaining_days: i64,
) -> Proration {
    let remaining_days = remaining_days.max(0);
    #[allow(clippy::cast_precision_loss)]
    let days = remaining_days as f64;

    let unused_credit = daily_rate(old_tier, user_count) * days;
    let new_charge = daily_rate(new_tier, user_count) * days;

    if unused_credit >= new_charge {
        Proration {
            charge_cents: 0,
            credit_cents: ((unused_credit - new_charge) * MINOR_PER_MAJOR).round() as i64,
            remaining_days,
        }
    } else {
        Proration {
            charge_cents: ((new_charge - unused_credit) * MINOR_PER_MAJOR).round() as i64,
            credit_cents: 0,
            remaining_days,
        }
    }
}

/// Whole days remaining until `period_end`, rounded up, floored at zero.
///
/// Zero when the period end is absent or already past.
#[must_use]
pub fn remaining_days_in_period(period_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(end) = period_end else {
        return 0;
    };
    let seconds = (end - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    // Ceiling division: a partial day counts as a full remaining day.
    (seconds + 86_399) / 86_400
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TenantId;
    use crate::tier::TierKind;
    use chrono::Duration;

    fn tier(monthly_cents: i64, per_user_cents: i64) -> BillingTier {
        BillingTier::new(
            TenantId::generate(),
            "T",
            TierKind::Standard,
            monthly_cents,
            per_user_cents,
            None,
        )
        .unwrap()
    }

    #[test]
    fn upgrade_mid_period_charges_difference() {
        // $30/mo -> $60/mo, 15 days left: old daily $1.00, new daily $2.00,
        // unused credit $15.00, new charge $30.00 -> charge 1500 cents.
        let old = tier(3000, 0);
        let new = tier(6000, 0);
        let p = prorate(&old, &new, 0, 15);
        assert_eq!(p.charge_cents, 1500);
        assert_eq!(p.credit_cents, 0);
        assert_eq!(p.remaining_days, 15);
    }

    #[test]
    fn downgrade_mid_period_credits_difference() {
        // $60/mo -> $30/mo, 15 days left -> credit 1500 cents.
        let old = tier(6000, 0);
        let new = tier(3000, 0);
        let p = prorate(&old, &new, 0, 15);
        assert_eq!(p.credit_cents, 1500);
        assert_eq!(p.charge_cents, 0);
    }

    #[test]
    fn equal_tiers_net_to_zero() {
        let old = tier(4500, 200);
        let new = tier(4500, 200);
        let p = prorate(&old, &new, 7, 12);
        assert_eq!(p.charge_cents, 0);
        assert_eq!(p.credit_cents, 0);
    }

    #[test]
    fn per_user_price_participates_in_daily_rate() {
        // old: $30 + 10 x $3 = $60/mo; new: $90 + 10 x $3 = $120/mo.
        // daily $2.00 vs $4.00, 15 days -> charge $30.00 = 3000 cents.
        let old = tier(3000, 300);
        let new = tier(9000, 300);
        let p = prorate(&old, &new, 10, 15);
        assert_eq!(p.charge_cents, 3000);
    }

    #[test]
    fn negative_remaining_days_treated_as_zero() {
        let old = tier(3000, 0);
        let new = tier(6000, 0);
        let p = prorate(&old, &new, 0, -3);
        assert_eq!(p.charge_cents, 0);
        assert_eq!(p.credit_cents, 0);
        assert_eq!(p.remaining_days, 0);
    }

    #[test]
    fn remaining_days_rounds_up_partial_days() {
        let now = Utc::now();
        let end = now + Duration::days(14) + Duration::hours(1);
        assert_eq!(remaining_days_in_period(Some(end), now), 15);
    }

    #[test]
    fn remaining_days_exact_boundary() {
        let now = Utc::now();
        let end = now + Duration::days(15);
        assert_eq!(remaining_days_in_period(Some(end), now), 15);
    }

    #[test]
    fn remaining_days_zero_when_absent_or_past() {
        let now = Utc::now();
        assert_eq!(remaining_days_in_period(None, now), 0);
        assert_eq!(
            remaining_days_in_period(Some(now - Duration::days(2)), now),
            0
        );
    }
}
