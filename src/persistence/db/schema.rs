use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 1;

pub fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Additive bootstrap; safe to run on every open.
    let sql = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT
    );

    -- Opaque blobs keyed by name (gallery JSON, credential)
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );
    "#;
    conn.execute_batch(sql)?;
    conn.execute(
        "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO NOTHING",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}
