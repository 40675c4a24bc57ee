//! Migrator - applies, rolls back and reports migration steps.
//!
//! Each applied or rolled-back step is exactly one transaction covering the
//! step's action and its ledger row. A failure part way through `up` leaves
//! earlier steps committed; re-running `up` resumes at the failed step.
//!
//! The migrator takes no cross-process lock. Callers running more than one
//! process against the same database must serialize them externally; the
//! unique constraint on `version` only turns a racing double apply into an
//! error.

use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, TransactionBehavior};
use stepladder_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::ledger::{self, LEDGER_TABLE, MigrationRecord};
use crate::status::{StatusReport, StepState, StepStatus};
use crate::step::{Direction, StepDefinition};
use crate::store::{Store, table_exists};

pub struct Migrator {
    store: Store,
    steps: Vec<StepDefinition>,
}

impl Migrator {
    /// Build a migrator over `steps`. Their order is the apply order.
    pub fn new(store: Store, steps: Vec<StepDefinition>) -> Self {
        let mut migrator = Self {
            store,
            steps: Vec::with_capacity(steps.len()),
        };
        for step in steps {
            migrator.register(step);
        }
        migrator
    }

    /// Append a step after the ones already registered.
    pub fn register(&mut self, step: StepDefinition) {
        if self.find(step.version()).is_some() {
            warn!(
                "migration version {} registered more than once; the ledger will reject the second apply",
                step.version()
            );
        }
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create the ledger table if it does not exist.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.store.connection()?;
        ledger::ensure_table(&conn)
    }

    /// Apply every registered step not yet in the ledger, in registration
    /// order. Returns how many were applied.
    pub fn up(&self) -> Result<usize> {
        let mut conn = self.store.connection()?;
        self.apply_pending(&mut conn)
    }

    /// Roll back the most recently applied step. Returns its removed ledger
    /// record, or `None` when nothing has been applied.
    pub fn down(&self) -> Result<Option<MigrationRecord>> {
        info!("rolling back the last migration");
        let mut conn = self.store.connection()?;
        ledger::ensure_table(&conn)?;

        let Some(last) = ledger::latest(&conn)? else {
            info!("no migrations to roll back");
            return Ok(None);
        };

        let step = self
            .find(&last.version)
            .ok_or_else(|| Error::OrphanedVersion(last.version.clone()))?;

        info!(
            "rolling back migration: {} - {}",
            step.version(),
            step.description()
        );

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        step.run(Direction::Backward, &tx)?;
        ledger::remove(&tx, &last)?;
        tx.commit().map_err(|e| Error::LedgerWrite {
            version: last.version.clone(),
            reason: format!("failed to commit rollback: {e}"),
        })?;

        info!("rolled back migration: {}", step.version());
        Ok(Some(last))
    }

    /// Report every registered step as pending or executed.
    ///
    /// Read-only: a missing ledger is reported as all-pending rather than
    /// created.
    pub fn status(&self) -> Result<StatusReport> {
        let mut conn = self.store.connection()?;

        // One read transaction so the report reflects a single snapshot.
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin read transaction: {e}")))?;
        let records = if table_exists(&tx, LEDGER_TABLE)? {
            ledger::applied(&tx)?
        } else {
            debug!("{LEDGER_TABLE} table does not exist yet");
            Vec::new()
        };
        drop(tx);

        let mut executed: HashMap<&str, &MigrationRecord> = records
            .iter()
            .map(|r| (r.version.as_str(), r))
            .collect();

        let steps = self
            .steps
            .iter()
            .map(|step| {
                let record = executed.remove(step.version());
                StepStatus {
                    version: step.version().to_string(),
                    description: step.description().to_string(),
                    state: if record.is_some() {
                        StepState::Executed
                    } else {
                        StepState::Pending
                    },
                    executed_at: record.map(|r| r.executed_at),
                }
            })
            .collect();

        let orphaned = records
            .iter()
            .filter(|r| executed.contains_key(r.version.as_str()))
            .cloned()
            .collect();

        Ok(StatusReport { steps, orphaned })
    }

    /// Drop the ledger table and apply every registered step again.
    ///
    /// Only the ledger is dropped; whatever earlier forward actions built is
    /// left in place, so every forward action runs against a store that may
    /// already reflect it. This is only safe when all registered forward
    /// actions are re-runnable, which the migrator cannot check.
    pub fn reset(&self) -> Result<usize> {
        warn!("dropping the {LEDGER_TABLE} table and re-running all migrations");
        let mut conn = self.store.connection()?;
        ledger::drop_table(&conn)?;
        let applied = self.apply_pending(&mut conn)?;
        info!("reset complete");
        Ok(applied)
    }

    fn apply_pending(&self, conn: &mut Connection) -> Result<usize> {
        info!("starting database migrations");
        ledger::ensure_table(conn)?;

        let records = ledger::applied(conn)?;
        let applied: HashSet<&str> = records.iter().map(|r| r.version.as_str()).collect();
        self.warn_orphans(&records);

        let mut count = 0;
        for step in self.steps.iter().filter(|s| !applied.contains(s.version())) {
            info!("running migration: {} - {}", step.version(), step.description());

            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
            // Any early return drops `tx`, rolling back both the action and the row.
            step.run(Direction::Forward, &tx)?;
            ledger::insert(&tx, step.version(), step.description())?;
            tx.commit().map_err(|e| Error::LedgerWrite {
                version: step.version().to_string(),
                reason: format!("failed to commit migration: {e}"),
            })?;

            info!("applied migration: {}", step.version());
            count += 1;
        }

        if count == 0 {
            info!("database is up to date, no migrations needed");
        } else {
            info!("applied {count} migration(s)");
        }
        Ok(count)
    }

    fn warn_orphans(&self, records: &[MigrationRecord]) {
        for record in records.iter().filter(|r| self.find(&r.version).is_none()) {
            warn!(
                "ledger contains version {} with no registered migration step",
                record.version
            );
        }
    }

    fn find(&self, version: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.version() == version)
    }
}
