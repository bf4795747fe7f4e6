//! Declared shape of the frontend tables and a checker that compares it
//! against a live database.
//!
//! The migrations create the tables; [`TABLES`] says what they must look
//! like afterwards. [`verify_schema`] catches databases whose tables were
//! created by something else (an older deployment, a hand-written script)
//! and do not match.

use nntpchan_types::{FILES_TABLE, POSTS_TABLE};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

/// One declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Declared SQL type, compared case-insensitively.
    pub sql_type: &'static str,
    pub not_null: bool,
    pub primary_key: bool,
    /// Has a single-column UNIQUE constraint of its own.
    pub unique: bool,
    /// `(table, column)` this column references.
    pub references: Option<(&'static str, &'static str)>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    const fn not_null(self) -> Self {
        Self {
            not_null: true,
            ..self
        }
    }

    /// Primary keys are declared NOT NULL as well.
    const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            not_null: true,
            ..self
        }
    }

    const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    const fn references(self, table: &'static str, column: &'static str) -> Self {
        Self {
            references: Some((table, column)),
            ..self
        }
    }
}

/// One declared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

/// `frontend_posts`.
pub const POSTS: TableDef = TableDef {
    name: POSTS_TABLE,
    columns: &[
        ColumnDef::new("article_id", "TEXT").unique(),
        ColumnDef::new("article_id_hash", "TEXT"),
        ColumnDef::new("id", "UUID").primary_key(),
        ColumnDef::new("newsgroup", "TEXT").not_null(),
        ColumnDef::new("parent", "TEXT"),
        ColumnDef::new("pubkey", "TEXT"),
        ColumnDef::new("subject", "TEXT"),
        ColumnDef::new("comment", "TEXT"),
    ],
};

/// `frontend_files`.
pub const FILES: TableDef = TableDef {
    name: FILES_TABLE,
    columns: &[
        ColumnDef::new("file_id", "UUID").primary_key(),
        ColumnDef::new("filename", "TEXT").not_null(),
        ColumnDef::new("filepath", "TEXT").not_null(),
        ColumnDef::new("parent", "TEXT").references(POSTS_TABLE, "article_id"),
    ],
};

/// Every table the frontend owns, in creation order.
pub const TABLES: &[TableDef] = &[POSTS, FILES];

/// A difference between the declared and the actual schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table '{0}' does not exist")]
    MissingTable(&'static str),

    #[error("table '{table}' has no column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("table '{table}' has undeclared column '{column}'")]
    UnexpectedColumn { table: &'static str, column: String },

    /// A column exists but its type, nullability or key flag differs.
    #[error("column '{table}.{column}': expected {expected}, found {found}")]
    ColumnMismatch {
        table: &'static str,
        column: &'static str,
        expected: String,
        found: String,
    },

    #[error("column '{table}.{column}' is not unique")]
    MissingUnique {
        table: &'static str,
        column: &'static str,
    },

    #[error("column '{table}.{column}' does not reference '{target}'")]
    MissingForeignKey {
        table: &'static str,
        column: &'static str,
        target: String,
    },

    /// Reading the catalog failed.
    #[error("failed to inspect schema: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Column as reported by `pragma_table_info`.
struct ActualColumn {
    name: String,
    sql_type: String,
    not_null: bool,
    primary_key: bool,
}

fn describe(sql_type: &str, not_null: bool, primary_key: bool) -> String {
    let mut out = sql_type.to_ascii_uppercase();
    if not_null {
        out.push_str(" NOT NULL");
    }
    if primary_key {
        out.push_str(" PRIMARY KEY");
    }
    out
}

/// Checks every table in [`TABLES`] against the connected database.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found, in declaration order.
pub fn verify_schema(conn: &Connection) -> Result<(), SchemaError> {
    for table in TABLES {
        verify_table(conn, table)?;
    }
    Ok(())
}

/// Checks a single table.
///
/// # Errors
///
/// See [`verify_schema`].
pub fn verify_table(conn: &Connection, table: &TableDef) -> Result<(), SchemaError> {
    let mut stmt =
        conn.prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1)"#)?;
    let actual = stmt
        .query_map([table.name], |row| {
            Ok(ActualColumn {
                name: row.get(0)?,
                sql_type: row.get(1)?,
                not_null: row.get(2)?,
                primary_key: row.get::<_, i64>(3)? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if actual.is_empty() {
        return Err(SchemaError::MissingTable(table.name));
    }

    for column in table.columns {
        let found = actual
            .iter()
            .find(|c| c.name == column.name)
            .ok_or(SchemaError::MissingColumn {
                table: table.name,
                column: column.name,
            })?;

        if !found.sql_type.eq_ignore_ascii_case(column.sql_type)
            || found.not_null != column.not_null
            || found.primary_key != column.primary_key
        {
            return Err(SchemaError::ColumnMismatch {
                table: table.name,
                column: column.name,
                expected: describe(column.sql_type, column.not_null, column.primary_key),
                found: describe(&found.sql_type, found.not_null, found.primary_key),
            });
        }

        if column.unique && !has_unique_index(conn, table.name, column.name)? {
            return Err(SchemaError::MissingUnique {
                table: table.name,
                column: column.name,
            });
        }

        if let Some((ref_table, ref_column)) = column.references {
            if !has_foreign_key(conn, table.name, column.name, ref_table, ref_column)? {
                return Err(SchemaError::MissingForeignKey {
                    table: table.name,
                    column: column.name,
                    target: format!("{ref_table}.{ref_column}"),
                });
            }
        }
    }

    if let Some(extra) = actual
        .into_iter()
        .find(|a| !table.columns.iter().any(|c| c.name == a.name))
    {
        return Err(SchemaError::UnexpectedColumn {
            table: table.name,
            column: extra.name,
        });
    }

    Ok(())
}

fn has_unique_index(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(
        r#"SELECT il.name FROM pragma_index_list(?1) AS il
           WHERE il."unique" = 1
             AND (SELECT COUNT(*) FROM pragma_index_info(il.name)) = 1"#,
    )?;
    let indexes = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for index in indexes {
        let indexed: Option<String> = conn
            .query_row(
                "SELECT name FROM pragma_index_info(?1)",
                [&index],
                |row| row.get(0),
            )
            .optional()?;
        if indexed.as_deref() == Some(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn has_foreign_key(
    conn: &Connection,
    table: &str,
    column: &str,
    ref_table: &str,
    ref_column: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        r#"SELECT EXISTS(
               SELECT 1 FROM pragma_foreign_key_list(?1)
               WHERE "from" = ?2 AND "table" = ?3 AND "to" = ?4
           )"#,
        [table, column, ref_table, ref_column],
        |row| row.get(0),
    )
}
