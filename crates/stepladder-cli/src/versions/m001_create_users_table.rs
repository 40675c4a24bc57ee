use stepladder_db::StepDefinition;

const UP: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users(deleted_at);";

const DOWN: &str = "DROP TABLE IF EXISTS users;";

pub fn create_users_table() -> StepDefinition {
    StepDefinition::sql("001_create_users_table", "Create users table", UP, DOWN)
}
