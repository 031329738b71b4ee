// crates/fio-ledger-core/src/runtime/memory.rs
// ============================================================================
// Module: fio-ledger In-Memory Ledger
// Description: In-memory run ledger for tests and local experiments.
// Purpose: Provide a deterministic store without external dependencies.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryRunLedger`] keeps history in a vector and the latest-state view
//! as a tuple-keyed map, both behind one mutex so every materialization is
//! atomic. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::filter::FilterSet;
use crate::core::identifiers::RunRecordId;
use crate::core::identity::SourceDigest;
use crate::core::metadata::DeleteOutcome;
use crate::core::record::ConfigTuple;
use crate::core::record::NewRunRecord;
use crate::core::record::RunRecord;
use crate::interfaces::MaterializeMode;
use crate::interfaces::MaterializeOutcome;
use crate::interfaces::RunLedgerStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Ledger
// ============================================================================

/// Ledger state guarded by one mutex.
#[derive(Debug, Default)]
struct LedgerState {
    /// Append-only history.
    history: Vec<RunRecord>,
    /// Current history id per tuple.
    latest: BTreeMap<ConfigTuple, RunRecordId>,
    /// Last assigned id.
    last_id: i64,
    /// Number of upcoming materializations that fail.
    pending_failures: usize,
}

impl LedgerState {
    /// Rebuilds the latest entry of a tuple from its highest history id.
    fn refresh(&mut self, tuple: &ConfigTuple) {
        let newest = self
            .history
            .iter()
            .filter(|record| &record.tuple == tuple)
            .map(|record| record.id)
            .max();
        match newest {
            Some(id) => {
                self.latest.insert(tuple.clone(), id);
            }
            None => {
                self.latest.remove(tuple);
            }
        }
    }
}

/// In-memory run ledger for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunLedger {
    /// Ledger state protected by a mutex.
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryRunLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` materializations fail without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the mutex is poisoned.
    pub fn fail_next(&self, count: usize) -> Result<(), StoreError> {
        self.lock()?.pending_failures = count;
        Ok(())
    }

    /// Returns all history rows in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the mutex is poisoned.
    pub fn history(&self) -> Result<Vec<RunRecord>, StoreError> {
        Ok(self.lock()?.history.clone())
    }

    /// Returns current rows matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the mutex is poisoned.
    pub fn latest(&self, filters: &FilterSet) -> Result<Vec<RunRecord>, StoreError> {
        let state = self.lock()?;
        let ids: BTreeSet<RunRecordId> = state.latest.values().copied().collect();
        let mut rows: Vec<RunRecord> = state
            .history
            .iter()
            .filter(|record| ids.contains(&record.id) && filters.matches(&record.tuple))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.metadata.timestamp, b.id).cmp(&(a.metadata.timestamp, a.id)));
        Ok(rows)
    }

    /// Deletes history rows and rebuilds affected latest entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the mutex is poisoned.
    pub fn delete(&self, ids: &[RunRecordId]) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.lock()?;
        let requested: BTreeSet<RunRecordId> = ids.iter().copied().collect();
        let mut touched = BTreeSet::new();
        let mut deleted = 0_u64;
        state.history.retain(|record| {
            if requested.contains(&record.id) {
                touched.insert(record.tuple.clone());
                deleted += 1;
                false
            } else {
                true
            }
        });
        for tuple in &touched {
            state.refresh(tuple);
        }
        Ok(DeleteOutcome {
            deleted,
            not_found: requested.len() as u64 - deleted,
        })
    }

    /// Locks the ledger state.
    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("run ledger mutex poisoned".to_string()))
    }
}

impl RunLedgerStore for InMemoryRunLedger {
    fn materialize(
        &self,
        record: &NewRunRecord,
        mode: MaterializeMode,
    ) -> Result<MaterializeOutcome, StoreError> {
        let mut state = self.lock()?;
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(StoreError::Db("injected materialization failure".to_string()));
        }
        if mode == MaterializeMode::SkipDuplicate
            && state.history.iter().any(|row| {
                row.tuple == record.tuple && row.metadata.source_digest == record.metadata.source_digest
            })
        {
            return Ok(MaterializeOutcome::Duplicate);
        }
        state.last_id += 1;
        let id = RunRecordId::new(state.last_id);
        state.history.push(record.clone().with_id(id));
        state.latest.insert(record.tuple.clone(), id);
        Ok(MaterializeOutcome::Inserted(id))
    }

    fn contains_source(&self, tuple: &ConfigTuple, digest: &SourceDigest) -> Result<bool, StoreError> {
        let state = self.lock()?;
        Ok(state
            .history
            .iter()
            .any(|row| &row.tuple == tuple && &row.metadata.source_digest == digest))
    }
}
