//! Database row types. These map directly to SQLite rows and are kept
//! separate from the scribe-types wire models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Outcome of an account insert. Uniqueness is checked under the same lock
/// as the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewUser {
    Created,
    UsernameTaken,
    EmailTaken,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
}
