//! Row → wire conversions. Stored ids and timestamps are trusted; a corrupt
//! value is logged and replaced with a default rather than failing the
//! whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use scribe_db::models::{CommentRow, PostRow};
use scribe_types::api::{CommentResponse, PostResponse};

fn parse_id(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; it is UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

pub(crate) fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: parse_id(&row.id, "id", &row.id),
        owner_id: parse_id(&row.author_id, "author_id", &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        owner_username: row.author_username,
        title: row.title,
        content: row.content,
    }
}

pub(crate) fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_id(&row.id, "id", &row.id),
        post_id: parse_id(&row.post_id, "post_id", &row.id),
        owner_id: parse_id(&row.author_id, "author_id", &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        owner_username: row.author_username,
        content: row.content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn sqlite_timestamps_are_utc() {
        let ts = parse_timestamp("2024-03-05 07:08:09", "row");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (7, 8, 9));
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        assert_eq!(parse_timestamp("yesterday", "row"), DateTime::<Utc>::default());
        assert_eq!(parse_id("42", "id", "row"), Uuid::default());
    }
}
