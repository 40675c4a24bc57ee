use stepladder_db::StepDefinition;

use crate::versions;

/// Every migration step, in the order it must be applied.
///
/// New steps go at the end. Reordering or removing a step that has already
/// shipped leaves its ledger rows orphaned.
pub fn migrations() -> Vec<StepDefinition> {
    vec![
        versions::create_users_table(),
        versions::add_user_indexes(),
        versions::seed_admin_user(),
    ]
}
