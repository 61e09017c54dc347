use crate::Result;
use rusqlite::Connection;
use std::path::Path;

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('notes', 'subpages')",
            [],
            |row| row.get(0),
        )?;

        if table_count != 2 {
            return Err(crate::NotewellError::InvalidStore(
                "Not a valid Notewell database".to_string(),
            ));
        }

        // Migrate: add content_recovery columns if they don't exist
        for table in ["notes", "subpages"] {
            let column_exists: bool = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name='content_recovery'"
                ),
                [],
                |row| row.get::<_, i64>(0).map(|count| count > 0),
            )?;

            if !column_exists {
                conn.execute(
                    &format!("ALTER TABLE {table} ADD COLUMN content_recovery TEXT"),
                    [],
                )?;
            }
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        let tables: Vec<String> = storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"notes".to_string()));
        assert!(tables.contains(&"subpages".to_string()));
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();
        Storage::create(temp.path()).unwrap();

        let storage = Storage::open(temp.path()).unwrap();
        let count: i64 = storage
            .connection()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();

        // An empty SQLite file has none of the expected tables.
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE other (id INTEGER PRIMARY KEY)", [])
                .unwrap();
        }

        let result = Storage::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_migration_adds_content_recovery_column() {
        let temp = NamedTempFile::new().unwrap();

        // Create database with the pre-recovery schema.
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute(
                "CREATE TABLE notes (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    emoji TEXT NOT NULL,
                    banner TEXT,
                    author TEXT NOT NULL,
                    is_trash INTEGER NOT NULL DEFAULT 0,
                    deleted_at INTEGER,
                    is_published INTEGER NOT NULL DEFAULT 0,
                    published_url TEXT,
                    created_at INTEGER NOT NULL,
                    modified_at INTEGER NOT NULL,
                    content_json TEXT NOT NULL
                )",
                [],
            )
            .unwrap();
            conn.execute(
                "CREATE TABLE subpages (
                    id TEXT NOT NULL,
                    parent_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    emoji TEXT NOT NULL,
                    banner TEXT,
                    is_trash INTEGER NOT NULL DEFAULT 0,
                    deleted_at INTEGER,
                    is_published INTEGER NOT NULL DEFAULT 0,
                    published_url TEXT,
                    created_at INTEGER NOT NULL,
                    modified_at INTEGER NOT NULL,
                    content_json TEXT NOT NULL,
                    PRIMARY KEY (parent_id, id)
                )",
                [],
            )
            .unwrap();
        }

        let storage = Storage::open(temp.path()).unwrap();

        for table in ["notes", "subpages"] {
            let column_exists: bool = storage
                .connection()
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name='content_recovery'"
                    ),
                    [],
                    |row| row.get::<_, i64>(0).map(|count| count > 0),
                )
                .unwrap();
            assert!(
                column_exists,
                "content_recovery column should exist on {table} after migration"
            );
        }
    }
}
