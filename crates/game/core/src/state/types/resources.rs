//! Named-quantity vectors for resource pools and transfers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mapping from resource name to signed quantity.
///
/// Used both as a player's pool and as the payload of a transfer. Values are
/// immutable once built: arithmetic returns a fresh amount. Missing resources
/// read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAmount(BTreeMap<String, i64>);

impl ResourceAmount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `resource` set to `quantity`.
    #[must_use]
    pub fn with(&self, resource: impl Into<String>, quantity: i64) -> Self {
        let mut quantities = self.0.clone();
        quantities.insert(resource.into(), quantity);
        Self(quantities)
    }

    /// Quantity of `resource`, zero when untracked.
    pub fn get(&self, resource: &str) -> i64 {
        self.0.get(resource).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, quantity)| (name.as_str(), *quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element-wise sum over the union of tracked resources, `None` when any
    /// quantity overflows.
    #[must_use]
    pub fn checked_plus(&self, other: &ResourceAmount) -> Option<Self> {
        let mut quantities = self.0.clone();
        for (name, quantity) in other.iter() {
            let total = quantities.entry(name.to_string()).or_insert(0);
            *total = total.checked_add(quantity)?;
        }
        Some(Self(quantities))
    }

    #[must_use]
    pub fn checked_negated(&self) -> Option<Self> {
        self.0
            .iter()
            .map(|(name, quantity)| Some((name.clone(), quantity.checked_neg()?)))
            .collect::<Option<BTreeMap<_, _>>>()
            .map(Self)
    }

    /// First resource whose quantity would leave the `i64` range if `change`
    /// were added.
    pub fn first_overflow<'a>(&self, change: &'a ResourceAmount) -> Option<&'a str> {
        change
            .iter()
            .find(|(name, quantity)| self.get(name).checked_add(*quantity).is_none())
            .map(|(name, _)| name)
    }

    /// First resource that would go negative if `change` were added, with the
    /// current quantity. `None` means the pool is compatible with the change.
    pub fn first_shortfall<'a>(&self, change: &'a ResourceAmount) -> Option<(&'a str, i64)> {
        change
            .iter()
            .find(|(name, quantity)| {
                self.get(name)
                    .checked_add(*quantity)
                    .is_some_and(|total| total < 0)
            })
            .map(|(name, _)| (name, self.get(name)))
    }

    /// True when adding `change` keeps every resource non-negative.
    pub fn is_compatible_with(&self, change: &ResourceAmount) -> bool {
        self.first_overflow(change).is_none() && self.first_shortfall(change).is_none()
    }

    pub fn is_non_negative(&self) -> bool {
        self.0.values().all(|quantity| *quantity >= 0)
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for ResourceAmount {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, quantity)| (name.into(), quantity))
                .collect(),
        )
    }
}

/// Renders `"crystal: -3, metal: 5"`.
impl fmt::Display for ResourceAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, quantity)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {quantity}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_checks_every_changed_resource() {
        let pool = ResourceAmount::from_iter([("metal", 10), ("gas", 2)]);

        assert!(pool.is_compatible_with(&ResourceAmount::from_iter([("metal", -10)])));
        assert!(!pool.is_compatible_with(&ResourceAmount::from_iter([("metal", -15)])));
        assert_eq!(
            pool.first_shortfall(&ResourceAmount::from_iter([("gas", -3), ("metal", 1)])),
            Some(("gas", 2))
        );
        // Untracked resources start at zero.
        assert!(!pool.is_compatible_with(&ResourceAmount::from_iter([("crystal", -1)])));
    }

    #[test]
    fn arithmetic_returns_new_values() {
        let pool = ResourceAmount::from_iter([("metal", 10)]);
        let income = ResourceAmount::from_iter([("metal", 5), ("gas", 1)]);

        let total = pool.checked_plus(&income).unwrap();

        assert_eq!(pool.get("metal"), 10);
        assert_eq!(total.get("metal"), 15);
        assert_eq!(total.get("gas"), 1);
        assert_eq!(income.checked_negated().unwrap().get("metal"), -5);
    }

    #[test]
    fn overflow_is_reported_instead_of_wrapping() {
        let pool = ResourceAmount::from_iter([("metal", 10)]);
        let flood = ResourceAmount::from_iter([("metal", i64::MAX)]);

        assert_eq!(pool.checked_plus(&flood), None);
        assert_eq!(pool.first_overflow(&flood), Some("metal"));
        assert_eq!(pool.first_shortfall(&flood), None);
        assert!(!pool.is_compatible_with(&flood));
        assert_eq!(
            ResourceAmount::from_iter([("metal", i64::MIN)]).checked_negated(),
            None
        );
    }

    #[test]
    fn display_is_sorted_and_comma_joined() {
        let amount = ResourceAmount::new().with("metal", 5).with("crystal", -3);
        assert_eq!(amount.to_string(), "crystal: -3, metal: 5");
    }
}
