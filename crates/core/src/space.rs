//! Action spaces and the actions drawn from them.
//!
//! Tree search needs to list every action of a state, so only spaces with a
//! finite set of members can be enumerated:
//! - `Discrete(n)`: the actions `0..n`
//! - `Tuple`: the Cartesian product of its (enumerable) sub-spaces
//!
//! `Box` spaces can still be sampled by a rollout policy, but asking for their
//! enumeration fails with `IquctError::UnsupportedActionSpace`.

use crate::{IquctError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An action accepted by an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Discrete(usize),
    Tuple(Vec<Action>),
    Continuous(Vec<f64>),
}

impl Action {
    /// Index of a discrete action, `None` for any other kind.
    pub fn as_discrete(&self) -> Option<usize> {
        match self {
            Action::Discrete(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Discrete(i) => write!(f, "{}", i),
            Action::Tuple(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
            Action::Continuous(values) => write!(f, "{:?}", values),
        }
    }
}

/// The set of actions an environment accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionSpace {
    /// `n` actions numbered `0..n`.
    Discrete(usize),

    /// Product of sub-spaces; an action picks one member of each.
    Tuple(Vec<ActionSpace>),

    /// Real vectors bounded component-wise by `low` and `high`.
    Box { low: Vec<f64>, high: Vec<f64> },
}

impl ActionSpace {
    /// List every action of the space.
    ///
    /// Tuple products are ordered with the first sub-space varying slowest.
    ///
    /// # Errors
    /// Returns `UnsupportedActionSpace` if the space (or any sub-space) is a `Box`.
    pub fn enumerate(&self) -> Result<Vec<Action>> {
        match self {
            ActionSpace::Discrete(n) => Ok((0..*n).map(Action::Discrete).collect()),
            ActionSpace::Tuple(spaces) => {
                let mut product: Vec<Vec<Action>> = vec![Vec::new()];
                for space in spaces {
                    let members = space.enumerate()?;
                    let mut next = Vec::with_capacity(product.len() * members.len());
                    for prefix in &product {
                        for member in &members {
                            let mut combo = prefix.clone();
                            combo.push(member.clone());
                            next.push(combo);
                        }
                    }
                    product = next;
                }
                Ok(product.into_iter().map(Action::Tuple).collect())
            }
            ActionSpace::Box { .. } => Err(IquctError::UnsupportedActionSpace(
                "cannot enumerate a continuous Box space".to_string(),
            )),
        }
    }

    /// Number of actions `enumerate` would return.
    ///
    /// # Errors
    /// Returns `UnsupportedActionSpace` for a `Box` space, or for a tuple
    /// whose product does not fit in a `usize`.
    pub fn cardinality(&self) -> Result<usize> {
        match self {
            ActionSpace::Discrete(n) => Ok(*n),
            ActionSpace::Tuple(spaces) => spaces.iter().try_fold(1usize, |acc, s| {
                s.cardinality().and_then(|c| {
                    acc.checked_mul(c).ok_or_else(|| {
                        IquctError::UnsupportedActionSpace(
                            "tuple space is too large to enumerate".to_string(),
                        )
                    })
                })
            }),
            ActionSpace::Box { .. } => Err(IquctError::UnsupportedActionSpace(
                "a continuous Box space has no cardinality".to_string(),
            )),
        }
    }

    /// Draw an action uniformly at random.
    ///
    /// # Errors
    /// Returns `EmptyActionSpace` for a space without members and
    /// `InvalidAction` for a `Box` with inconsistent bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Action> {
        match self {
            ActionSpace::Discrete(0) => Err(IquctError::EmptyActionSpace),
            ActionSpace::Discrete(n) => Ok(Action::Discrete(rng.gen_range(0..*n))),
            ActionSpace::Tuple(spaces) => spaces
                .iter()
                .map(|s| s.sample(rng))
                .collect::<Result<Vec<_>>>()
                .map(Action::Tuple),
            ActionSpace::Box { low, high } => {
                if low.len() != high.len() {
                    return Err(IquctError::InvalidAction(format!(
                        "box bounds have different lengths ({} vs {})",
                        low.len(),
                        high.len()
                    )));
                }
                low.iter()
                    .zip(high)
                    .map(|(&lo, &hi)| {
                        if lo > hi {
                            Err(IquctError::InvalidAction(format!(
                                "box lower bound {} exceeds upper bound {}",
                                lo, hi
                            )))
                        } else if lo == hi {
                            Ok(lo)
                        } else {
                            Ok(rng.gen_range(lo..hi))
                        }
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Action::Continuous)
            }
        }
    }

    /// Check whether an action belongs to the space.
    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (ActionSpace::Discrete(n), Action::Discrete(i)) => i < n,
            (ActionSpace::Tuple(spaces), Action::Tuple(parts)) => {
                spaces.len() == parts.len()
                    && spaces.iter().zip(parts).all(|(s, a)| s.contains(a))
            }
            (ActionSpace::Box { low, high }, Action::Continuous(values)) => {
                values.len() == low.len()
                    && values.len() == high.len()
                    && values
                        .iter()
                        .zip(low.iter().zip(high))
                        .all(|(v, (lo, hi))| lo <= v && v <= hi)
            }
            _ => false,
        }
    }
}
