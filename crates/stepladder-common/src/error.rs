use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    /// The ledger table could not be created or read.
    #[error("ledger initialization failed: {0}")]
    Initialization(String),

    /// A forward or backward action failed. Always names the step.
    #[error("migration {version} failed: {source}")]
    Execution {
        version: String,
        #[source]
        source: Box<Error>,
    },

    /// The action succeeded but its ledger row could not be written or removed.
    #[error("ledger write for migration {version} failed: {reason}")]
    LedgerWrite { version: String, reason: String },

    /// The latest ledger row names a version no registered step knows about.
    #[error("migration step not found for applied version: {0}")]
    OrphanedVersion(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an action failure with the version of the step that raised it.
    pub fn execution(version: impl Into<String>, source: Error) -> Self {
        Error::Execution {
            version: version.into(),
            source: Box::new(source),
        }
    }

    /// Version of the step this error is attributed to, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Error::Execution { version, .. } | Error::LedgerWrite { version, .. } => Some(version),
            Error::OrphanedVersion(version) => Some(version),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad yaml".into());
        assert_eq!(e.to_string(), "configuration error: bad yaml");

        let e = Error::Initialization("permission denied".into());
        assert_eq!(
            e.to_string(),
            "ledger initialization failed: permission denied"
        );

        let e = Error::OrphanedVersion("004_drop_things".into());
        assert_eq!(
            e.to_string(),
            "migration step not found for applied version: 004_drop_things"
        );

        let e = Error::Other("misc".into());
        assert_eq!(e.to_string(), "misc");
    }

    #[test]
    fn execution_error_wraps_source_with_version() {
        let e = Error::execution("002_add_user_indexes", Error::Database("no such table".into()));
        assert_eq!(
            e.to_string(),
            "migration 002_add_user_indexes failed: database error: no such table"
        );
        assert_eq!(e.version(), Some("002_add_user_indexes"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn version_is_absent_for_non_step_errors() {
        assert_eq!(Error::Database("x".into()).version(), None);
        let e = Error::LedgerWrite {
            version: "001".into(),
            reason: "UNIQUE constraint failed".into(),
        };
        assert_eq!(e.version(), Some("001"));
    }
}
