// Shared domain validations
//
// One process-wide instance holds the membership rules; guard helpers are
// plain functions used by every constructor and setter.

use crate::error::{IntranetError, IntranetResult};
use crate::foodwaste::Membership;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static INSTANCE: OnceCell<DomainObjectValidations> = OnceCell::new();

// ============================================================================
// RANGE
// ============================================================================

/// Bounds as they arrive from outside, checked by `Range::new`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RangeBounds<T> {
    pub start: T,
    pub end: T,
}

/// Inclusive range, start never above end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RangeBounds<T>",
    bound(deserialize = "T: Deserialize<'de> + PartialOrd + Copy + std::fmt::Display")
)]
pub struct Range<T> {
    start: T,
    end: T,
}

impl<T: PartialOrd + Copy + std::fmt::Display> TryFrom<RangeBounds<T>> for Range<T> {
    type Error = IntranetError;

    fn try_from(bounds: RangeBounds<T>) -> IntranetResult<Self> {
        Range::new(bounds.start, bounds.end)
    }
}

impl<T: PartialOrd + Copy + std::fmt::Display> Range<T> {
    pub fn new(start: T, end: T) -> IntranetResult<Self> {
        if start > end {
            return Err(IntranetError::illegal(
                "range",
                format!("start {} is above end {}", start, end),
            ));
        }
        Ok(Range { start, end })
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.start && value <= self.end
    }
}

// ============================================================================
// DOMAIN OBJECT VALIDATIONS
// ============================================================================

pub struct DomainObjectValidations {
    basic_limit: usize,
    deluxe_limit: usize,
    premium_limit: usize,
}

impl DomainObjectValidations {
    /// Shared instance, created on first use
    pub fn create() -> &'static DomainObjectValidations {
        INSTANCE.get_or_init(|| DomainObjectValidations {
            basic_limit: 1,
            deluxe_limit: 2,
            premium_limit: 999,
        })
    }

    /// Structural mail address check: local@domain.tld without whitespace
    pub fn is_mail_address(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return false;
        }

        let mut parts = value.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };

        if local.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
            return false;
        }

        domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
    }

    pub fn household_limit(&self, membership: Membership) -> usize {
        match membership {
            Membership::Basic => self.basic_limit,
            Membership::Deluxe => self.deluxe_limit,
            Membership::Premium => self.premium_limit,
        }
    }

    pub fn has_reached_household_limit(&self, membership: Membership, households: usize) -> bool {
        households >= self.household_limit(membership)
    }

    /// Memberships can be renewed or raised, never lowered
    pub fn can_upgrade_membership(&self, current: Membership, target: Membership) -> bool {
        target >= current
    }

    pub fn in_range<T: PartialOrd + Copy + std::fmt::Display>(&self, value: T, range: &Range<T>) -> bool {
        range.contains(value)
    }
}

// ============================================================================
// GUARDS
// ============================================================================

/// Trimmed text, rejecting blank input
pub fn require_text(field: &'static str, value: &str) -> IntranetResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntranetError::ArgumentNull(field));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text, blank becomes None
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn require_range(field: &'static str, value: i32, min: i32, max: i32) -> IntranetResult<i32> {
    if value < min || value > max {
        return Err(IntranetError::illegal(
            field,
            format!("{} is outside {}..={}", value, min, max),
        ));
    }
    Ok(value)
}
