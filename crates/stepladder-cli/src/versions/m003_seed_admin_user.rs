use chrono::{SecondsFormat, Utc};
use rusqlite::{Transaction, params};
use stepladder_common::{Error, Result};
use stepladder_db::{Step, StepDefinition};
use tracing::debug;

pub const ADMIN_EMAIL: &str = "admin@company.com";

// Not a valid password hash: the account cannot log in until a password is set
// through the application.
const DISABLED_PASSWORD: &str = "!";

struct SeedAdminUser;

impl Step for SeedAdminUser {
    fn forward(&self, tx: &Transaction<'_>) -> Result<()> {
        let existing: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                params![ADMIN_EMAIL],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("failed to look up admin user: {e}")))?;

        if existing > 0 {
            debug!("admin user already present, skipping seed");
            return Ok(());
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        tx.execute(
            "INSERT INTO users (email, password, first_name, last_name, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, 'John', 'Doe', 'admin', 1, ?3, ?3)",
            params![ADMIN_EMAIL, DISABLED_PASSWORD, now],
        )
        .map_err(|e| Error::Database(format!("failed to seed admin user: {e}")))?;
        Ok(())
    }

    fn backward(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute("DELETE FROM users WHERE email = ?1", params![ADMIN_EMAIL])
            .map_err(|e| Error::Database(format!("failed to remove admin user: {e}")))?;
        Ok(())
    }
}

pub fn seed_admin_user() -> StepDefinition {
    StepDefinition::new("003_seed_admin_user", "Seed initial admin user", SeedAdminUser)
}
