// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Which remote workouts still need importing.

use std::collections::HashSet;

use crate::models::WorkoutId;

/// Remote IDs that are not stored yet, in remote listing order.
///
/// The stored set is authoritative. IDs listed twice upstream are kept
/// once, at their first position.
pub fn pending_ids(remote: &[WorkoutId], stored: &HashSet<WorkoutId>) -> Vec<WorkoutId> {
    let mut seen: HashSet<&WorkoutId> = HashSet::with_capacity(remote.len());
    remote
        .iter()
        .filter(|id| !stored.contains(*id) && seen.insert(*id))
        .cloned()
        .collect()
}
