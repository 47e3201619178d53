// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::location::{limit::RequestMethod, location::Location};

/// An index into a [`LocationTable`]. Callers hold this, never a borrowed
/// reference, across table mutations (invariant i, §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationId(usize);

/// The owning, stable-index collection of Locations (§4.1). Backed by a
/// plain `Vec`: Rust's ownership model gives invariants (ii) and (iii) —
/// every Location's `String`/`Vec` fields, and the table's own entries,
/// drop themselves — so there is no manual `destroy` to implement.
#[derive(Debug, Default)]
pub struct LocationTable {
    entries: Vec<Location>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `loc`, returning its stable id. Duplicate paths are
    /// permitted — selection in `find_best` is purely by longest-prefix
    /// length, ties broken by insertion order.
    pub fn add(&mut self, loc: Location) -> LocationId {
        let id = LocationId(self.entries.len());
        self.entries.push(loc);
        id
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.entries.get(id.0)
    }

    /// Case-insensitive exact-path lookup.
    pub fn find_by_name(&self, path: &str) -> Option<LocationId> {
        self.entries
            .iter()
            .position(|loc| loc.path.eq_ignore_ascii_case(path))
            .map(LocationId)
    }

    /// Longest-prefix match with method-limit intersection (§4.1). Strips
    /// a trailing `.ppd` from `/printers/*` and `/classes/*` request
    /// paths before matching.
    pub fn find_best(&self, request_path: &str, method: RequestMethod) -> Option<LocationId> {
        let uri = strip_ppd_suffix(request_path);
        let method_bit = method.to_limit_bit();

        let mut best: Option<(usize, LocationId)> = None;
        for (idx, loc) in self.entries.iter().enumerate() {
            if !loc.is_absolute() {
                continue;
            }
            if loc.path.len() <= best.map(|(len, _)| len).unwrap_or(0) {
                continue;
            }
            if !loc.limit.intersects(method_bit) {
                continue;
            }
            if !loc.path_is_prefix_of(uri) {
                continue;
            }
            best = Some((loc.path.len(), LocationId(idx)));
        }
        best.map(|(_, id)| id)
    }

    /// Deep copy of the Location at `id`. `Location` already derives
    /// `Clone`, so a partial-allocation rollback (§4.1, §7 error kind i)
    /// cannot happen in Rust: either the clone succeeds wholesale or the
    /// caller never gets an id to roll back.
    pub fn copy(&mut self, id: LocationId) -> Option<LocationId> {
        let loc = self.entries.get(id.0)?.clone();
        Some(self.add(loc))
    }

    /// Destroys every Location. `Vec::clear` drops all owned
    /// substructure (§4.1 `remove_all`, §5 resource discipline).
    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strip_ppd_suffix(path: &str) -> &str {
    let lower = path.to_ascii_lowercase();
    let under_printers_or_classes = lower.starts_with("/printers/") || lower.starts_with("/classes/");
    if under_printers_or_classes && lower.ends_with(".ppd") {
        &path[..path.len() - 4]
    } else {
        path
    }
}
