use crate::errors::RelayResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SeenStore;

pub struct SqliteSeenStore {
    storage: SqliteStorage,
}

impl SqliteSeenStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl SeenStore for SqliteSeenStore {
    fn load(&self) -> RelayResult<Vec<String>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT identifier FROM seen_items ORDER BY id ASC")?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    fn save(&self, ids: &[String]) -> RelayResult<()> {
        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM seen_items", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO seen_items (identifier) VALUES (?1)")?;
            for id in ids {
                stmt.execute([id])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteSeenStore {
        SqliteSeenStore::new(SqliteStorage::in_memory().unwrap())
    }

    #[test]
    fn test_empty_database_loads_empty() {
        let store = setup();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_contents_in_order() {
        let store = setup();

        store
            .save(&["a".to_string(), "b".to_string(), "c".to_string()])
            .unwrap();
        store.save(&["b".to_string(), "c".to_string(), "d".to_string()]).unwrap();

        assert_eq!(
            store.load().unwrap(),
            vec!["b".to_string(), "c".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.db");

        SqliteSeenStore::new(SqliteStorage::new(&path).unwrap())
            .save(&["guid-1".to_string(), "guid-2".to_string()])
            .unwrap();

        let reopened = SqliteSeenStore::new(SqliteStorage::new(&path).unwrap());
        assert_eq!(
            reopened.load().unwrap(),
            vec!["guid-1".to_string(), "guid-2".to_string()]
        );
    }
}
