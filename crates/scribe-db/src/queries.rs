use crate::Database;
use crate::models::{CommentRow, NewUser, PostRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};

const SELECT_POST: &str = "SELECT p.id, p.author_id, u.username, p.title, p.content, p.created_at, p.updated_at
     FROM posts p
     JOIN users u ON p.author_id = u.id";

const SELECT_COMMENT: &str = "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at
     FROM comments c
     JOIN users u ON c.author_id = u.id";

impl Database {
    // -- Users --

    /// Insert an account unless its username or email is already taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<NewUser> {
        self.with_conn(|conn| {
            if exists(conn, "SELECT 1 FROM users WHERE username = ?1", username)? {
                return Ok(NewUser::UsernameTaken);
            }
            if exists(conn, "SELECT 1 FROM users WHERE email = ?1", email)? {
                return Ok(NewUser::EmailTaken);
            }

            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(NewUser::Created)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        title: &str,
        content: &str,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, title, content) VALUES (?1, ?2, ?3, ?4)",
                (id, author_id, title, content),
            )?;
            query_post(conn, id)?.ok_or_else(|| anyhow!("Post missing after insert: {}", id))
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{SELECT_POST} ORDER BY p.created_at DESC, p.rowid DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Comments --

    /// Returns `None` when the parent post does not exist.
    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            if !exists(conn, "SELECT 1 FROM posts WHERE id = ?1", post_id)? {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, post_id, author_id, content),
            )?;

            let sql = format!("{SELECT_COMMENT} WHERE c.id = ?1");
            let row = conn.query_row(&sql, [id], map_comment)?;
            Ok(Some(row))
        })
    }

    /// Oldest first. Returns `None` when the parent post does not exist.
    pub fn list_comments(&self, post_id: &str) -> Result<Option<Vec<CommentRow>>> {
        self.with_conn(|conn| {
            if !exists(conn, "SELECT 1 FROM posts WHERE id = ?1", post_id)? {
                return Ok(None);
            }

            let sql = format!("{SELECT_COMMENT} WHERE c.post_id = ?1 ORDER BY c.created_at, c.rowid");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(rows))
        })
    }
}

// Connection-level helpers. These are public so callers can compose them
// inside `Database::with_tx`.

pub fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    let sql = format!("{SELECT_POST} WHERE p.id = ?1");
    let row = conn.query_row(&sql, [id], map_post).optional()?;
    Ok(row)
}

/// Returns whether a row was changed.
pub fn update_post(conn: &Connection, id: &str, title: &str, content: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE posts SET title = ?2, content = ?3, updated_at = datetime('now') WHERE id = ?1",
        (id, title, content),
    )?;
    Ok(changed == 1)
}

/// Removes the post and, through the foreign key cascade, its comments.
pub fn delete_post(conn: &Connection, id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    Ok(changed == 1)
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, email, password FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
    let found = conn.query_row(sql, [value], |_| Ok(())).optional()?;
    Ok(found.is_some())
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn seed_user(db: &Database, username: &str) -> String {
        let id = new_id();
        let outcome = db
            .create_user(&id, username, &format!("{username}@x.com"), "$argon2id$stub")
            .unwrap();
        assert_eq!(outcome, NewUser::Created);
        id
    }

    #[test]
    fn usernames_and_emails_are_unique() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");

        let dup_name = db.create_user(&new_id(), "alice", "other@x.com", "h").unwrap();
        assert_eq!(dup_name, NewUser::UsernameTaken);

        let dup_email = db.create_user(&new_id(), "bob", "alice@x.com", "h").unwrap();
        assert_eq!(dup_email, NewUser::EmailTaken);

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.password, "$argon2id$stub");
        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn post_rows_carry_author_username() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let post_id = new_id();

        let post = db.insert_post(&post_id, &alice, "hi", "there").unwrap();
        assert_eq!(post.author_id, alice);
        assert_eq!(post.author_username, "alice");

        assert_eq!(db.list_posts().unwrap().len(), 1);
        assert!(db.get_post(&new_id()).unwrap().is_none());
    }

    #[test]
    fn post_requires_existing_author() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_post(&new_id(), &new_id(), "hi", "there").is_err());
    }

    #[test]
    fn update_and_delete_inside_transaction() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let post_id = new_id();
        db.insert_post(&post_id, &alice, "hi", "there").unwrap();
        db.insert_comment(&new_id(), &post_id, &alice, "first").unwrap().unwrap();

        db.with_tx(|tx| -> Result<()> {
            assert!(update_post(tx, &post_id, "new", "body")?);
            Ok(())
        })
        .unwrap();
        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.title, "new");
        assert_eq!(post.content, "body");

        db.with_tx(|tx| -> Result<()> {
            assert!(delete_post(tx, &post_id)?);
            Ok(())
        })
        .unwrap();
        assert!(db.get_post(&post_id).unwrap().is_none());

        let orphans: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let post_id = new_id();
        db.insert_post(&post_id, &alice, "hi", "there").unwrap();

        let result = db.with_tx(|tx| -> Result<()> {
            delete_post(tx, &post_id)?;
            Err(anyhow!("abort"))
        });
        assert!(result.is_err());
        assert!(db.get_post(&post_id).unwrap().is_some());
    }

    #[test]
    fn comments_need_an_existing_post() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let missing = new_id();

        assert!(db.insert_comment(&new_id(), &missing, &alice, "hello").unwrap().is_none());
        assert!(db.list_comments(&missing).unwrap().is_none());

        let post_id = new_id();
        db.insert_post(&post_id, &alice, "hi", "there").unwrap();
        let comment = db.insert_comment(&new_id(), &post_id, &alice, "hello").unwrap().unwrap();
        assert_eq!(comment.author_username, "alice");
        assert_eq!(comment.post_id, post_id);

        let comments = db.list_comments(&post_id).unwrap().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "hello");
    }
}
