use std::fmt;

use rusqlite::Transaction;
use stepladder_common::{Error, Result};
use tracing::debug;

/// The forward and backward actions of one migration step.
///
/// Both run on the borrowed transaction the migrator opened for the step and
/// must not reach the store any other way. `backward` undoes `forward`.
///
/// `forward` may run again against a store that already reflects it (see
/// [`Migrator::reset`](crate::Migrator::reset)), so it should be written to be
/// re-runnable: `CREATE ... IF NOT EXISTS`, check-before-insert seeding.
pub trait Step {
    fn forward(&self, tx: &Transaction<'_>) -> Result<()>;

    fn backward(&self, tx: &Transaction<'_>) -> Result<()>;
}

/// Which of a step's two actions to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// A step whose actions are plain SQL batches.
#[derive(Debug, Clone, Copy)]
pub struct SqlStep {
    pub forward: &'static str,
    pub backward: &'static str,
}

impl Step for SqlStep {
    fn forward(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.forward)
            .map_err(|e| Error::Database(format!("forward sql failed: {e}")))
    }

    fn backward(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.backward)
            .map_err(|e| Error::Database(format!("backward sql failed: {e}")))
    }
}

/// A versioned, described migration step supplied by the application.
pub struct StepDefinition {
    version: String,
    description: String,
    actions: Box<dyn Step>,
}

impl StepDefinition {
    pub fn new(
        version: impl Into<String>,
        description: impl Into<String>,
        actions: impl Step + 'static,
    ) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            actions: Box::new(actions),
        }
    }

    pub fn sql(
        version: impl Into<String>,
        description: impl Into<String>,
        forward: &'static str,
        backward: &'static str,
    ) -> Self {
        Self::new(version, description, SqlStep { forward, backward })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run one action, attributing any failure to this step's version.
    pub fn run(&self, direction: Direction, tx: &Transaction<'_>) -> Result<()> {
        debug!("running {direction} action of migration {}", self.version);
        let outcome = match direction {
            Direction::Forward => self.actions.forward(tx),
            Direction::Backward => self.actions.backward(tx),
        };
        outcome.map_err(|e| Error::execution(&self.version, e))
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
