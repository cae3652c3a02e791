use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::AppResult;

pub fn query_one<T, F>(
    conn: &Connection,
    sql: &str,
    p: &[&dyn rusqlite::ToSql],
    map: F,
) -> AppResult<Option<T>>
where
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
    let mut stmt = conn.prepare(sql)?;
    let res = stmt.query_row(p, map).optional()?;
    Ok(res)
}

pub fn exec(conn: &Connection, sql: &str, p: &[&dyn rusqlite::ToSql]) -> AppResult<usize> {
    Ok(conn.execute(sql, p)?)
}
