//! Row helpers for `frontend_posts`.

use nntpchan_types::Post;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::DbError;

const POST_COLUMNS: &str =
    "id, article_id, article_id_hash, newsgroup, parent, pubkey, subject, comment";

/// Reads a UUID stored as hyphenated text.
pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: uuid_column(row, 0)?,
        article_id: row.get(1)?,
        article_id_hash: row.get(2)?,
        newsgroup: row.get(3)?,
        parent: row.get(4)?,
        pubkey: row.get(5)?,
        subject: row.get(6)?,
        comment: row.get(7)?,
    })
}

/// Inserts a post.
///
/// # Errors
///
/// Returns `DbError::Sqlite` on failure. A duplicate `article_id` or `id`
/// is reported by [`DbError::is_unique_violation`].
pub fn insert_post(conn: &Connection, post: &Post) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO frontend_posts
            (id, article_id, article_id_hash, newsgroup, parent, pubkey, subject, comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            post.id.to_string(),
            post.article_id,
            post.article_id_hash,
            post.newsgroup,
            post.parent,
            post.pubkey,
            post.subject,
            post.comment,
        ],
    )?;
    tracing::debug!(
        post_id = %post.id,
        newsgroup = %post.newsgroup,
        "stored frontend post"
    );
    Ok(())
}

/// Looks up a post by its article id.
pub fn get_post(conn: &Connection, article_id: &str) -> Result<Option<Post>, DbError> {
    let post = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM frontend_posts WHERE article_id = ?1"),
            [article_id],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

/// Looks up a post by its `article_id_hash`.
///
/// The hash column is not unique; the earliest stored match wins.
pub fn get_post_by_hash(conn: &Connection, hash: &str) -> Result<Option<Post>, DbError> {
    let post = conn
        .query_row(
            &format!(
                "SELECT {POST_COLUMNS} FROM frontend_posts
                 WHERE article_id_hash = ?1 ORDER BY rowid LIMIT 1"
            ),
            [hash],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

/// Returns `true` if a post with this article id is stored.
pub fn has_article(conn: &Connection, article_id: &str) -> Result<bool, DbError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM frontend_posts WHERE article_id = ?1)",
        [article_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Lists the most recently stored posts of a newsgroup, newest first.
pub fn list_posts_in_newsgroup(
    conn: &Connection,
    newsgroup: &str,
    limit: u32,
) -> Result<Vec<Post>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM frontend_posts
         WHERE newsgroup = ?1 ORDER BY rowid DESC LIMIT ?2"
    ))?;
    let posts = stmt
        .query_map(params![newsgroup, limit], post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Lists the replies to a thread root in the order they were stored.
pub fn list_replies(conn: &Connection, parent: &str) -> Result<Vec<Post>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM frontend_posts WHERE parent = ?1 ORDER BY rowid"
    ))?;
    let posts = stmt
        .query_map([parent], post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("should enable foreign keys");
        run_migrations(&conn).expect("migrations should succeed");
        conn
    }

    #[test]
    fn insert_and_get_post() {
        let conn = test_db();
        let post = Post::new("<root@test>", "overchan.test").with_content("hello", "first");
        insert_post(&conn, &post).expect("insert should succeed");

        let loaded = get_post(&conn, "<root@test>")
            .expect("query should succeed")
            .expect("post should exist");
        assert_eq!(loaded, post);

        let by_hash = get_post_by_hash(&conn, post.article_id_hash.as_deref().unwrap_or_default())
            .expect("query should succeed");
        assert_eq!(by_hash, Some(post));

        assert!(get_post(&conn, "<missing@test>")
            .expect("query should succeed")
            .is_none());
    }

    #[test]
    fn duplicate_article_id_is_unique_violation() {
        let conn = test_db();
        insert_post(&conn, &Post::new("<dup@test>", "overchan.test")).expect("first insert");

        let err = insert_post(&conn, &Post::new("<dup@test>", "overchan.test"))
            .expect_err("second insert should fail");
        assert!(err.is_unique_violation(), "unexpected error: {err:?}");
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn duplicate_id_is_unique_violation() {
        let conn = test_db();
        let post = Post::new("<a@test>", "overchan.test");
        insert_post(&conn, &post).expect("first insert");

        let mut clash = Post::new("<b@test>", "overchan.test");
        clash.id = post.id;
        let err = insert_post(&conn, &clash).expect_err("same id should fail");
        assert!(err.is_unique_violation(), "unexpected error: {err:?}");
    }

    #[test]
    fn posts_without_article_id_do_not_collide() {
        let conn = test_db();
        for _ in 0..2 {
            let mut post = Post::new("<tmp@test>", "overchan.test");
            post.article_id = None;
            insert_post(&conn, &post).expect("NULL article ids are not unique-checked");
        }
    }

    #[test]
    fn parent_is_unconstrained() {
        let conn = test_db();
        let reply = Post::new("<reply@test>", "overchan.test").with_parent("<nowhere@test>");
        insert_post(&conn, &reply).expect("replies may precede their root");
    }

    #[test]
    fn lists_newsgroup_newest_first_and_replies_in_order() {
        let conn = test_db();
        let root = Post::new("<root@test>", "overchan.test");
        let first = Post::new("<r1@test>", "overchan.test").with_parent("<root@test>");
        let second = Post::new("<r2@test>", "overchan.test").with_parent("<root@test>");
        let elsewhere = Post::new("<x@test>", "overchan.other");
        for post in [&root, &first, &second, &elsewhere] {
            insert_post(&conn, post).expect("insert should succeed");
        }

        let listed = list_posts_in_newsgroup(&conn, "overchan.test", 2).expect("list");
        let ids: Vec<_> = listed.iter().filter_map(|p| p.article_id.as_deref()).collect();
        assert_eq!(ids, ["<r2@test>", "<r1@test>"]);

        let replies = list_replies(&conn, "<root@test>").expect("list replies");
        assert_eq!(replies, vec![first, second]);

        assert!(has_article(&conn, "<x@test>").expect("query"));
        assert!(!has_article(&conn, "<y@test>").expect("query"));
    }

    #[test]
    fn malformed_uuid_is_a_conversion_error() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO frontend_posts (id, article_id, newsgroup) VALUES ('not-a-uuid', '<bad@test>', 'g')",
            [],
        )
        .expect("raw insert should succeed");

        let err = get_post(&conn, "<bad@test>").expect_err("should fail to decode");
        assert!(matches!(
            err,
            DbError::Sqlite(rusqlite::Error::FromSqlConversionFailure(0, Type::Text, _))
        ));
    }
}
