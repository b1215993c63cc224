//! Row shapes for the chat and watchlist tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Role, Turn};

/// A turn row as inserted. Storage assigns id and created_at.
#[derive(Debug, Clone, Serialize)]
pub struct NewTurn {
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub movie_ids: Vec<i64>,
}

/// A turn row as read back from storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredTurn {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub movie_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl StoredTurn {
    /// Map a persisted row into the in-memory turn shape.
    pub fn into_turn(self) -> Turn {
        Turn {
            id: self.id,
            role: self.role,
            content: self.content,
            movie_ids: self.movie_ids,
            in_progress: false,
        }
    }
}

/// One watchlist row, keyed by (user_id, movie_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub movie_id: i64,
    pub movie_title: String,
    #[serde(default)]
    pub movie_poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_turn_mapping() {
        let json = serde_json::json!({
            "id": "a1b2",
            "user_id": "u-1",
            "role": "model",
            "content": "Watch **Heat** (1995).",
            "movie_ids": [949],
            "created_at": "2026-01-04T12:00:00Z"
        });
        let stored: StoredTurn = serde_json::from_value(json).unwrap();
        let turn = stored.into_turn();
        assert_eq!(turn.id, "a1b2");
        assert_eq!(turn.role, Role::Model);
        assert_eq!(turn.movie_ids, vec![949]);
        assert!(!turn.in_progress);
    }

    #[test]
    fn test_missing_movie_ids_defaults_empty() {
        let json = serde_json::json!({
            "id": "a1b3",
            "user_id": "u-1",
            "role": "user",
            "content": "hi",
            "created_at": "2026-01-04T12:00:00Z"
        });
        let stored: StoredTurn = serde_json::from_value(json).unwrap();
        assert!(stored.into_turn().movie_ids.is_empty());
    }

    #[test]
    fn test_new_turn_row_shape() {
        let row = NewTurn {
            user_id: "u-1".into(),
            role: Role::User,
            content: "something cozy".into(),
            movie_ids: vec![],
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["movie_ids"], serde_json::json!([]));
    }
}
