//! Free-ID search and reservation
//!
//! Finds the lowest unused ID at or above a base value and, when asked,
//! claims it by writing a placeholder row. There is no lock: two callers
//! can pick the same candidate, and the store's uniqueness constraint decides
//! who wins. The loser moves its base past the contested ID and searches
//! again with a fresh snapshot.

use crate::record::RecordId;
use log::debug;
use std::collections::BTreeSet;
use thiserror::Error;

/// Outcome of trying to claim an ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Reserved,
    /// Someone else holds the key already
    DuplicateKey,
}

/// An integer key space that can be searched and claimed
///
/// `used_ids` may be stale by the time the candidate is checked;
/// `is_occupied` and `reserve` must reflect the live store.
pub trait IdSpace {
    type Error;

    /// Snapshot of the IDs currently in use
    fn used_ids(&self) -> Result<BTreeSet<RecordId>, Self::Error>;

    /// Whether a live record holds `id` right now
    fn is_occupied(&self, id: RecordId) -> Result<bool, Self::Error>;

    /// Atomically claim `id`
    fn reserve(&self, id: RecordId) -> Result<Reservation, Self::Error>;
}

#[derive(Debug, Error, PartialEq)]
pub enum FreeIdError<E> {
    #[error("no free id between {base} and {max}")]
    Exhausted { base: RecordId, max: RecordId },
    #[error("gave up after {0} conflicting reservations")]
    TooManyConflicts(u32),
    #[error(transparent)]
    Source(E),
}

/// Parameters of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// First ID to consider
    pub base: RecordId,
    /// Largest ID the space can hold
    pub max_id: RecordId,
    /// Claim the ID instead of only reporting it
    pub reserve: bool,
    /// Stop after this many lost races (`None` retries until the space runs out)
    pub max_conflicts: Option<u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            base: 0,
            max_id: RecordId::MAX,
            reserve: false,
            max_conflicts: None,
        }
    }
}

impl SearchOptions {
    pub fn from_base(base: RecordId) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn reserving(mut self) -> Self {
        self.reserve = true;
        self
    }
}

/// Smallest value in `base..=max` that is not in `used`
pub fn next_free_value(
    used: &BTreeSet<RecordId>,
    base: RecordId,
    max: RecordId,
) -> Option<RecordId> {
    if base > max {
        return None;
    }

    let mut candidate = base;
    for &id in used.range(base..) {
        if id != candidate {
            break;
        }
        if candidate == max {
            return None;
        }
        candidate += 1;
    }

    Some(candidate)
}

/// Find (and optionally reserve) the lowest free ID in `space`
pub fn find_free_id<S: IdSpace>(
    space: &S,
    options: &SearchOptions,
) -> Result<RecordId, FreeIdError<S::Error>> {
    let exhausted = || FreeIdError::Exhausted {
        base: options.base,
        max: options.max_id,
    };

    let mut base = options.base;
    let mut conflicts = 0u32;

    loop {
        let mut used = space.used_ids().map_err(FreeIdError::Source)?;

        let candidate = loop {
            let candidate = next_free_value(&used, base, options.max_id).ok_or_else(exhausted)?;
            if !space.is_occupied(candidate).map_err(FreeIdError::Source)? {
                break candidate;
            }
            debug!("id {} is taken but missing from the used snapshot", candidate);
            used.insert(candidate);
        };

        if !options.reserve {
            return Ok(candidate);
        }

        match space.reserve(candidate).map_err(FreeIdError::Source)? {
            Reservation::Reserved => {
                debug!("reserved id {}", candidate);
                return Ok(candidate);
            }
            Reservation::DuplicateKey => {
                conflicts += 1;
                debug!("lost race for id {} (conflict {})", candidate, conflicts);
                if let Some(limit) = options.max_conflicts {
                    if conflicts >= limit {
                        return Err(FreeIdError::TooManyConflicts(conflicts));
                    }
                }
                if candidate == options.max_id {
                    return Err(exhausted());
                }
                base = candidate + 1;
            }
        }
    }
}
