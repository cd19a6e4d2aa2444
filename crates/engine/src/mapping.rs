// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mapping tables and the user resolver.
//!
//! Tables are loaded from the Hub at phase boundaries. Additions and
//! removals buffer locally and flush at checkpoints; within a cycle tables
//! are append-only. Lookups scan in iteration order and the first match
//! wins.

use tracklink_core::{Mapping, MappingScope};

use crate::hub::{HubError, HubResult, HubService};

/// One mapping table loaded into memory, with buffered changes.
#[derive(Debug)]
pub struct MappingTable {
    scope: MappingScope,
    entries: Vec<Mapping>,
    added: Vec<Mapping>,
    removed: Vec<Mapping>,
}

impl MappingTable {
    /// Creates an empty table for the given scope.
    pub fn new(scope: MappingScope) -> Self {
        MappingTable {
            scope,
            entries: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Creates a table pre-populated with persisted entries.
    pub fn load(scope: MappingScope, entries: Vec<Mapping>) -> Self {
        MappingTable {
            scope,
            entries,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Replaces the persisted entries. Buffered additions that have not
    /// been flushed yet stay visible, so in-run mappings survive the
    /// mid-cycle reload.
    pub fn reload(&mut self, entries: Vec<Mapping>) {
        self.entries = entries;
        self.entries.extend(self.added.iter().cloned());
    }

    /// The scope this table serves.
    pub fn scope(&self) -> MappingScope {
        self.scope
    }

    /// Finds the first entry for an internal id within a project scope.
    pub fn by_internal_id(&self, hub_project_id: Option<i64>, internal_id: i64) -> Option<&Mapping> {
        self.entries
            .iter()
            .find(|m| m.internal_id == internal_id && m.in_project(hub_project_id))
    }

    /// Finds the first entry for an external key within a project scope.
    ///
    /// With `only_primary`, non-primary alias entries are excluded before
    /// the scan.
    pub fn by_external_key(
        &self,
        hub_project_id: Option<i64>,
        external_key: &str,
        only_primary: bool,
    ) -> Option<&Mapping> {
        self.entries.iter().find(|m| {
            (!only_primary || m.primary)
                && m.in_project(hub_project_id)
                && m.external_key == external_key
        })
    }

    /// Buffers a new mapping and makes it visible to subsequent lookups.
    pub fn add(&mut self, mapping: Mapping) {
        self.entries.push(mapping.clone());
        self.added.push(mapping);
    }

    /// Records an entry for administrative removal outside this engine.
    pub fn mark_removed(&mut self, mapping: Mapping) {
        self.removed.push(mapping);
    }

    /// Drains the buffered additions for a checkpoint flush.
    pub fn take_added(&mut self) -> Vec<Mapping> {
        std::mem::take(&mut self.added)
    }

    /// Drains the buffered removals for a checkpoint flush.
    pub fn take_removed(&mut self) -> Vec<Mapping> {
        std::mem::take(&mut self.removed)
    }

    /// All visible entries, persisted and buffered.
    pub fn entries(&self) -> &[Mapping] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flushes buffered changes through the Hub mapping store.
    pub fn flush(&mut self, hub: &mut dyn HubService) -> HubResult<()> {
        let added = self.take_added();
        if !added.is_empty() {
            hub.add_mappings(self.scope, &added)?;
        }
        let removed = self.take_removed();
        if !removed.is_empty() {
            hub.remove_mappings(self.scope, &removed)?;
        }
        Ok(())
    }
}

/// The sole user-lookup chokepoint.
///
/// With `auto_map` the mapping store is bypassed entirely: users resolve
/// against the Hub's user directory and a mapping is synthesized from the
/// user record. Without it, lookups go through the loaded user table.
#[derive(Debug)]
pub struct UserResolver {
    table: MappingTable,
    auto_map: bool,
}

impl UserResolver {
    /// Creates a resolver over the loaded user table.
    pub fn new(table: MappingTable, auto_map: bool) -> Self {
        UserResolver { table, auto_map }
    }

    /// Resolves a Hub user id to its mapping.
    pub fn by_internal_id(
        &self,
        hub: &mut dyn HubService,
        internal_id: i64,
    ) -> Result<Option<Mapping>, HubError> {
        if self.auto_map {
            let user = hub.user_by_id(internal_id)?;
            return Ok(user.map(|u| Mapping::new(MappingScope::User, None, u.id, u.login)));
        }
        Ok(self.table.by_internal_id(None, internal_id).cloned())
    }

    /// Resolves a Tracker login to its mapping.
    pub fn by_external_key(
        &self,
        hub: &mut dyn HubService,
        login: &str,
    ) -> Result<Option<Mapping>, HubError> {
        if self.auto_map {
            let user = hub.user_by_login(login)?;
            return Ok(user.map(|u| Mapping::new(MappingScope::User, None, u.id, u.login)));
        }
        Ok(self.table.by_external_key(None, login, false).cloned())
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
