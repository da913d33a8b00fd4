//! Cost values that remember why they might be wrong.
//!
//! A [`CostValue`] is an integer price paired with a list of *reasons*: labels of
//! base items whose price is unknown. Sums concatenate reasons, scaling keeps them,
//! so a final estimate always discloses which inputs were missing.
//!
//! ```
//! use craftcost::cost::CostValue;
//!
//! let ore = CostValue::known(10) * 4;
//! let flux = CostValue::missing("Flux");
//! let batch = &ore + &flux;
//! assert_eq!(batch.value, 40);
//! assert!(batch.is_uncertain());
//! assert_eq!(batch.div(2).value, 20);
//! ```

use log::error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// Reason attached to a value produced by dividing by zero.
pub const DIVISION_BY_ZERO_REASON: &str = "division by zero (recipe yields 0 units)";

/// A price, or an estimate carrying the labels of its missing inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostValue {
    pub value: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl CostValue {
    /// A certain value with no reasons.
    pub fn known(value: i64) -> Self {
        Self {
            value,
            reasons: Vec::new(),
        }
    }

    /// An unset price: value 0, one reason naming the item.
    pub fn missing(label: impl Into<String>) -> Self {
        Self {
            value: 0,
            reasons: vec![label.into()],
        }
    }

    pub fn is_uncertain(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// `self + other`; reasons are concatenated (duplicates allowed until display).
    pub fn plus(&self, other: &CostValue) -> CostValue {
        let mut reasons = Vec::with_capacity(self.reasons.len() + other.reasons.len());
        reasons.extend(self.reasons.iter().cloned());
        reasons.extend(other.reasons.iter().cloned());
        CostValue {
            value: self.value.saturating_add(other.value),
            reasons,
        }
    }

    /// `self * factor`; reasons unchanged.
    pub fn scaled(&self, factor: i64) -> CostValue {
        CostValue {
            value: self.value.saturating_mul(factor),
            reasons: self.reasons.clone(),
        }
    }

    /// Truncating division.
    ///
    /// Dividing by zero never panics: it is logged and the result degrades to
    /// value 0 carrying [`DIVISION_BY_ZERO_REASON`]. The dividend's own reasons
    /// are dropped, the divisor being the invalid input here.
    pub fn div(&self, divisor: i64) -> CostValue {
        match self.value.checked_div(divisor) {
            Some(value) => CostValue {
                value,
                reasons: self.reasons.clone(),
            },
            None if divisor == 0 => {
                error!("division by zero while amortizing value {}", self.value);
                CostValue::missing(DIVISION_BY_ZERO_REASON)
            }
            // i64::MIN / -1
            None => CostValue {
                value: i64::MAX,
                reasons: self.reasons.clone(),
            },
        }
    }

    /// Reasons with duplicates removed, sorted for display.
    pub fn distinct_reasons(&self) -> Vec<&str> {
        distinct_labels(self.reasons.iter().map(String::as_str))
    }

    /// Same value with its reasons sorted and deduplicated.
    pub fn compacted(self) -> CostValue {
        let reasons = distinct_labels(self.reasons.iter().map(String::as_str))
            .into_iter()
            .map(str::to_string)
            .collect();
        CostValue {
            value: self.value,
            reasons,
        }
    }
}

/// Sorted, deduplicated labels from any number of cost values.
pub fn distinct_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    labels.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

impl fmt::Display for CostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_uncertain() {
            write!(f, "{} + <N/A>", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl Add for CostValue {
    type Output = CostValue;

    fn add(mut self, rhs: CostValue) -> CostValue {
        self += rhs;
        self
    }
}

impl Add<&CostValue> for &CostValue {
    type Output = CostValue;

    fn add(self, rhs: &CostValue) -> CostValue {
        self.plus(rhs)
    }
}

impl AddAssign for CostValue {
    fn add_assign(&mut self, rhs: CostValue) {
        self.value = self.value.saturating_add(rhs.value);
        self.reasons.extend(rhs.reasons);
    }
}

impl Mul<i64> for CostValue {
    type Output = CostValue;

    fn mul(mut self, rhs: i64) -> CostValue {
        self.value = self.value.saturating_mul(rhs);
        self
    }
}

impl std::iter::Sum for CostValue {
    fn sum<I: Iterator<Item = CostValue>>(iter: I) -> CostValue {
        iter.fold(CostValue::default(), |acc, v| acc + v)
    }
}
