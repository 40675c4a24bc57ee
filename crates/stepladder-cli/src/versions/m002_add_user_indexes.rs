use stepladder_db::StepDefinition;

const UP: &str = "
CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_users_is_active ON users(is_active);
CREATE INDEX IF NOT EXISTS idx_users_is_active_role ON users(is_active, role);";

const DOWN: &str = "
DROP INDEX IF EXISTS idx_users_email;
DROP INDEX IF EXISTS idx_users_role;
DROP INDEX IF EXISTS idx_users_is_active;
DROP INDEX IF EXISTS idx_users_is_active_role;";

pub fn add_user_indexes() -> StepDefinition {
    StepDefinition::sql("002_add_user_indexes", "Add indexes to users table", UP, DOWN)
}
