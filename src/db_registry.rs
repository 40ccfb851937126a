// SPDX-License-Identifier: Apache-2.0

//! Holder for the loaded pattern databases, one per basis.
//!
//! Built once during startup by the embedding shell and then passed down
//! the call stack to the rewriting passes. Nothing here is process-global:
//! a pass that needs a database takes the registry (or the shared handle
//! itself) as an argument.

use std::path::Path;
use std::sync::Arc;

use crate::pattern_db::{Basis, DbError, PatternDb};

#[derive(Debug, Clone, Default)]
pub struct DbRegistry {
    aig_db: Option<Arc<PatternDb>>,
    bench_db: Option<Arc<PatternDb>>,
}

impl DbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the database file for `basis`, replacing any earlier handle.
    pub fn load(&mut self, path: &Path, basis: Basis) -> Result<(), DbError> {
        let db = Arc::new(PatternDb::load(path, basis)?);
        self.set(basis, db);
        Ok(())
    }

    /// Installs an already-loaded database.
    pub fn set(&mut self, basis: Basis, db: Arc<PatternDb>) {
        match basis {
            Basis::Aig => self.aig_db = Some(db),
            Basis::Bench => self.bench_db = Some(db),
        }
    }

    /// Shared handle to the database for `basis`.
    pub fn get(&self, basis: Basis) -> Result<Arc<PatternDb>, DbError> {
        let slot = match basis {
            Basis::Aig => &self.aig_db,
            Basis::Bench => &self.bench_db,
        };
        slot.clone().ok_or(DbError::NotLoaded { basis })
    }

    pub fn is_loaded(&self, basis: Basis) -> bool {
        match basis {
            Basis::Aig => self.aig_db.is_some(),
            Basis::Bench => self.bench_db.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use test_case::test_case;

    use super::*;

    #[test_case(Basis::Aig)]
    #[test_case(Basis::Bench)]
    fn missing_database_is_an_error_naming_the_basis(basis: Basis) {
        let registry = DbRegistry::new();
        assert!(!registry.is_loaded(basis));
        match registry.get(basis) {
            Err(DbError::NotLoaded { basis: got }) => assert_eq!(got, basis),
            other => panic!("expected NotLoaded error, got {:?}", other),
        }
    }

    #[test]
    fn loaded_database_is_shared() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"2 1 6 2 AND 0 1\n").unwrap();

        let mut registry = DbRegistry::new();
        registry.load(file.path(), Basis::Aig).unwrap();

        let first = registry.get(Basis::Aig).unwrap();
        let second = registry.get(Basis::Aig).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lookup(&[6]), Some(0));
        assert!(registry.get(Basis::Bench).is_err());
    }
}
