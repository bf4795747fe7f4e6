//! Row helpers for `frontend_files`.

use nntpchan_types::PostFile;
use rusqlite::{params, Connection, Row};

use crate::error::DbError;
use crate::posts::uuid_column;

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<PostFile> {
    Ok(PostFile {
        file_id: uuid_column(row, 0)?,
        filename: row.get(1)?,
        filepath: row.get(2)?,
        parent: row.get(3)?,
    })
}

/// Inserts an attachment row.
///
/// # Errors
///
/// Returns `DbError::Sqlite` on failure. A `parent` that names no stored
/// post is reported by [`DbError::is_foreign_key_violation`].
pub fn insert_file(conn: &Connection, file: &PostFile) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO frontend_files (file_id, filename, filepath, parent)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            file.file_id.to_string(),
            file.filename,
            file.filepath,
            file.parent,
        ],
    )?;
    Ok(())
}

/// Lists the attachments of a post in the order they were stored.
pub fn list_files_for_post(conn: &Connection, article_id: &str) -> Result<Vec<PostFile>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT file_id, filename, filepath, parent FROM frontend_files
         WHERE parent = ?1 ORDER BY rowid",
    )?;
    let files = stmt
        .query_map([article_id], file_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(files)
}
