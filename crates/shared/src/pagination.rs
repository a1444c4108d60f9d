//! Cursor-based pagination utilities.
//!
//! List endpoints order rows by `(created_at DESC, id DESC)`; the cursor
//! carries the last row's pair so the next page resumes strictly after it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Error type for cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Encodes a cursor from timestamp and ID.
///
/// The cursor format is: base64(RFC3339_timestamp|uuid)
pub fn encode_cursor(created_at: DateTime<Utc>, id: Uuid) -> String {
    let raw = format!(
        "{}|{}",
        created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        id
    );
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor into timestamp and ID.
pub fn decode_cursor(cursor: &str) -> Result<(DateTime<Utc>, Uuid), CursorError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    let (timestamp_str, id_str) = s.split_once('|').ok_or(CursorError::InvalidFormat)?;

    let id = Uuid::parse_str(id_str).map_err(|_| CursorError::InvalidId)?;

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .map_err(|_| CursorError::InvalidTimestamp)?
        .with_timezone(&Utc);

    Ok((timestamp, id))
}

/// Query parameters accepted by paginated list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Requested page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Decoded cursor, if one was supplied.
    pub fn decoded_cursor(&self) -> Result<Option<(DateTime<Utc>, Uuid)>, CursorError> {
        self.cursor.as_deref().map(decode_cursor).transpose()
    }
}

/// A page of results plus the cursor for the next page.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with `limit + 1`, trimming the probe row.
    pub fn from_probe<F>(mut rows: Vec<T>, limit: i64, key: F) -> Self
    where
        F: Fn(&T) -> (DateTime<Utc>, Uuid),
    {
        let limit = limit.max(0) as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|row| {
                let (created_at, id) = key(row);
                encode_cursor(created_at, id)
            })
        } else {
            None
        };
        Self {
            data: rows,
            next_cursor,
        }
    }

    /// Converts every item, keeping the cursor.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_decode_cursor() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let id = Uuid::new_v4();

        let cursor = encode_cursor(timestamp, id);
        let (decoded_ts, decoded_id) = decode_cursor(&cursor).unwrap();

        assert_eq!(decoded_ts, timestamp);
        assert_eq!(decoded_id, id);
    }

    #[test]
    fn test_decode_invalid_cursors() {
        assert!(matches!(
            decode_cursor("!!!"),
            Err(CursorError::InvalidEncoding)
        ));

        let no_separator = URL_SAFE_NO_PAD.encode("2024-01-15T10:30:00Z");
        assert!(matches!(
            decode_cursor(&no_separator),
            Err(CursorError::InvalidFormat)
        ));

        let bad_id = URL_SAFE_NO_PAD.encode("2024-01-15T10:30:00Z|42");
        assert!(matches!(decode_cursor(&bad_id), Err(CursorError::InvalidId)));

        let bad_ts = URL_SAFE_NO_PAD.encode(format!("yesterday|{}", Uuid::new_v4()));
        assert!(matches!(
            decode_cursor(&bad_ts),
            Err(CursorError::InvalidTimestamp)
        ));
    }

    #[test]
    fn test_page_params_limit_clamped() {
        let params = PageParams::default();
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);

        let params = PageParams {
            cursor: None,
            limit: Some(10_000),
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);

        let params = PageParams {
            cursor: None,
            limit: Some(0),
        };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_page_from_probe() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let rows: Vec<(DateTime<Utc>, Uuid)> = (0..3)
            .map(|i| (base - chrono::Duration::minutes(i), Uuid::new_v4()))
            .collect();
        let last_kept = rows[1];

        let page = Page::from_probe(rows.clone(), 2, |r| *r);
        assert_eq!(page.data.len(), 2);
        let (ts, id) = decode_cursor(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!((ts, id), last_kept);

        let page = Page::from_probe(rows, 5, |r| *r);
        assert_eq!(page.data.len(), 3);
        assert!(page.next_cursor.is_none());
    }
}
