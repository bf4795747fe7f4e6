//! Row records shared across the nntpchan frontend crates.
//!
//! The frontend keeps two tables: `frontend_posts`, one row per article
//! shown on the web frontend, and `frontend_files`, one row per attachment
//! belonging to such an article. The records here mirror those tables
//! column for column; `nntpchan-db` owns the SQL that stores them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Name of the posts table.
pub const POSTS_TABLE: &str = "frontend_posts";

/// Name of the attachments table.
pub const FILES_TABLE: &str = "frontend_files";

/// A post as stored in `frontend_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Primary key.
    pub id: Uuid,

    /// NNTP message id of the article. Unique across all posts.
    pub article_id: Option<String>,

    /// Derived identifier, see [`article_id_hash`].
    pub article_id_hash: Option<String>,

    /// Newsgroup the post was made in.
    pub newsgroup: String,

    /// Article id of the thread root this post replies to, if any.
    ///
    /// Not constrained by the database.
    pub parent: Option<String>,

    /// Public key of the poster, if the post was signed.
    pub pubkey: Option<String>,

    pub subject: Option<String>,
    pub comment: Option<String>,
}

impl Post {
    /// Creates a post with a fresh id and the hash derived from `article_id`.
    ///
    /// Optional fields start empty.
    pub fn new(article_id: impl Into<String>, newsgroup: impl Into<String>) -> Self {
        let article_id = article_id.into();
        Self {
            id: Uuid::new_v4(),
            article_id_hash: Some(article_id_hash(&article_id)),
            article_id: Some(article_id),
            newsgroup: newsgroup.into(),
            parent: None,
            pubkey: None,
            subject: None,
            comment: None,
        }
    }

    /// Sets the thread parent.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets subject and comment body.
    pub fn with_content(mut self, subject: impl Into<String>, comment: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.comment = Some(comment.into());
        self
    }

    /// Returns `true` if this post starts a thread.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// An attachment as stored in `frontend_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFile {
    /// Primary key.
    pub file_id: Uuid,

    /// Original file name as uploaded.
    pub filename: String,

    /// Location of the stored file, relative to the frontend's file root.
    pub filepath: String,

    /// Article id of the owning post. Must reference an existing
    /// `frontend_posts.article_id`.
    pub parent: Option<String>,
}

impl PostFile {
    /// Creates an attachment row with a fresh id owned by `parent`.
    pub fn new(
        parent: impl Into<String>,
        filename: impl Into<String>,
        filepath: impl Into<String>,
    ) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            filename: filename.into(),
            filepath: filepath.into(),
            parent: Some(parent.into()),
        }
    }
}

/// Derives the secondary identifier stored in `article_id_hash`.
///
/// Lowercase hex SHA-256 of the article id bytes. Safe to embed in URLs,
/// unlike raw message ids which contain `<`, `>` and `@`.
pub fn article_id_hash(article_id: &str) -> String {
    hex::encode(Sha256::digest(article_id.as_bytes()))
}
