//! Subscription plan catalogue, pricing and status names.
//!
//! The string forms must match the CHECK constraints in
//! `20251101000002_create_subscriptions_table.sql`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of the trial window granted on every new or upgraded subscription.
pub const TRIAL_DAYS: i64 = 30;

/// Legacy tag for the free trial, still sent by older marketing links.
const LEGACY_TRIAL_TAG: &str = "essai";

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// A monthly price stored as an integer number of cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The closed set of subscription plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Pro,
    Enterprise,
    Trial,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Starter, Plan::Pro, Plan::Enterprise, Plan::Trial];

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
            Plan::Trial => "trial",
        }
    }

    /// Parse an exact plan tag (case-insensitive). `essai` is an alias of
    /// `trial`.
    pub fn parse(tag: &str) -> Option<Plan> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag == LEGACY_TRIAL_TAG {
            return Some(Plan::Trial);
        }
        Plan::ALL.into_iter().find(|plan| plan.as_str() == tag)
    }

    /// Fixed monthly price. Enterprise is quoted separately, so it is listed
    /// at zero.
    pub fn monthly_price(self) -> Price {
        match self {
            Plan::Starter => Price::from_cents(2900),
            Plan::Pro => Price::from_cents(6900),
            Plan::Enterprise | Plan::Trial => Price::from_cents(0),
        }
    }

    pub fn is_paid_tier(self) -> bool {
        !matches!(self, Plan::Trial)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the plan requested by a signup form.
///
/// An absent or blank tag means the free trial. Unknown tags fall back to
/// [`Plan::Starter`], so they are charged the starter price.
pub fn resolve_requested_plan(tag: Option<&str>) -> Plan {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        None => Plan::Trial,
        Some(t) => Plan::parse(t).unwrap_or_else(|| {
            tracing::warn!(plan = %t, "Unknown plan tag, falling back to starter");
            Plan::Starter
        }),
    }
}

// ---------------------------------------------------------------------------
// Subscription status
// ---------------------------------------------------------------------------

/// Lifecycle state of a subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
