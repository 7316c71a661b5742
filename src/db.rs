use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Nested author record as it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self { first_name: first_name.into(), last_name: last_name.into() }
    }

    /// Display form used on the wire: `"<firstName> <lastName>"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A persisted post. `id` and `created` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub created: DateTime<Utc>,
}

/// A post before insertion.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: Author,
}

/// Fields to overwrite on an existing post. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<Author>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none()
    }
}

pub fn initialize(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    conn.busy_timeout(Duration::from_secs(5))?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            author_first_name TEXT NOT NULL,
            author_last_name TEXT NOT NULL,
            created TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

const SELECT_POST: &str =
    "SELECT id, title, content, author_first_name, author_last_name, created FROM posts";

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: Author { first_name: row.get(3)?, last_name: row.get(4)? },
        created: row.get(5)?,
    })
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<Post>, StoreError> {
    let post = conn
        .query_row(&format!("{SELECT_POST} WHERE id = ?1"), [id], row_to_post)
        .optional()?;
    Ok(post)
}

fn insert_post(conn: &Connection, new: NewPost) -> Result<Post, StoreError> {
    let post = Post {
        id: uuid::Uuid::new_v4().to_string(),
        title: new.title,
        content: new.content,
        author: new.author,
        created: Utc::now(),
    };
    conn.execute(
        "INSERT INTO posts (id, title, content, author_first_name, author_last_name, created) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![post.id, post.title, post.content, post.author.first_name, post.author.last_name, post.created],
    )?;
    Ok(post)
}

/// The post collection. One SQLite connection shared behind a mutex; a
/// second `PostStore` opened on the same file sees the same records.
pub struct PostStore {
    conn: Mutex<Connection>,
}

impl PostStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        initialize(&conn)?;
        tracing::debug!(path = %path.display(), "opened post store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Recovers from mutex poison instead of propagating the panic.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_one(&self, new: NewPost) -> Result<Post, StoreError> {
        insert_post(&self.conn(), new)
    }

    /// Inserts all records in one transaction; either all land or none do.
    pub fn insert_many(&self, records: Vec<NewPost>) -> Result<Vec<Post>, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let posts = records
            .into_iter()
            .map(|new| insert_post(&tx, new))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(posts)
    }

    /// All posts in insertion order.
    pub fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{SELECT_POST} ORDER BY rowid"))?;
        let posts = stmt
            .query_map([], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        query_post(&self.conn(), id)
    }

    /// Applies `patch` and returns the updated post, or `None` if `id` is absent.
    pub fn find_by_id_and_update(&self, id: &str, patch: PostPatch) -> Result<Option<Post>, StoreError> {
        let conn = self.conn();
        let Some(current) = query_post(&conn, id)? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(current));
        }

        let title = patch.title.unwrap_or(current.title);
        let content = patch.content.unwrap_or(current.content);
        let author = patch.author.unwrap_or(current.author);

        conn.execute(
            "UPDATE posts SET title = ?1, content = ?2, author_first_name = ?3, author_last_name = ?4 WHERE id = ?5",
            params![title, content, author.first_name, author.last_name, id],
        )?;
        query_post(&conn, id)
    }

    /// Removes the post and returns it, or `None` if `id` is absent.
    pub fn find_by_id_and_remove(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let conn = self.conn();
        let Some(post) = query_post(&conn, id)? else {
            return Ok(None);
        };
        conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(Some(post))
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self.conn().query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Removes every record, leaving an empty collection.
    pub fn drop_all(&self) -> Result<(), StoreError> {
        self.conn().execute("DELETE FROM posts", [])?;
        Ok(())
    }
}
