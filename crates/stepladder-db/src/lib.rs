pub mod ledger;
pub mod migrator;
pub mod status;
pub mod step;
pub mod store;

pub use ledger::{LEDGER_TABLE, MigrationRecord};
pub use migrator::Migrator;
pub use status::{StatusReport, StepState, StepStatus};
pub use step::{Direction, SqlStep, Step, StepDefinition};
pub use store::Store;
