use rusqlite::{Connection, OpenFlags};

/// Opens the dashboard database strictly read-only. The file must exist.
pub fn open_read_only(path: &str) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )?;

    conn.execute_batch(
        "
        PRAGMA query_only = ON;
        PRAGMA cache_size = -64000;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    log::info!("Database opened read-only: {}", path);
    Ok(conn)
}

/// In-memory database seeded with the bundled demo data.
pub fn open_demo() -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(include_str!("sql/fixture.sql"))?;
    conn.pragma_update(None, "query_only", true)?;
    log::info!("Demo database seeded in memory");
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_read_only_missing_file_fails() {
        let path = std::env::temp_dir().join("streamdash-does-not-exist.db");
        assert!(open_read_only(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_open_read_only_rejects_writes() {
        let path = std::env::temp_dir().join(format!("streamdash-ro-{}.db", std::process::id()));
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
                .unwrap();
        }

        let conn = open_read_only(path.to_str().unwrap()).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
        assert!(conn.execute("INSERT INTO t VALUES (2)", []).is_err());

        drop(conn);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_open_demo_is_seeded_and_query_only() {
        let conn = open_demo().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Subscribers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 12);
        assert!(conn.execute("DELETE FROM Subscribers", []).is_err());
    }
}
