//! Session-start history hydration
//!
//! Runs once when a session becomes authenticated: pulls the most recent
//! persisted turns (bounded), swaps them into the conversation store
//! wholesale, then warms the movie cache with one detail lookup per distinct
//! referenced id. Everything here degrades silently: an empty conversation
//! is an acceptable state, not an error.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::session::{ConversationStore, MovieCache, Turn};
use crate::storage::TurnStore;
use crate::tmdb::MovieSource;

pub struct HistoryLoader {
    turns: Arc<dyn TurnStore>,
    movies: Arc<dyn MovieSource>,
    store: Arc<ConversationStore>,
    cache: Arc<MovieCache>,
    /// Upper bound on loaded turns, regardless of what storage returns.
    cap: usize,
}

impl HistoryLoader {
    pub fn new(
        turns: Arc<dyn TurnStore>,
        movies: Arc<dyn MovieSource>,
        store: Arc<ConversationStore>,
        cache: Arc<MovieCache>,
        cap: usize,
    ) -> Self {
        Self { turns, movies, store, cache, cap }
    }

    pub async fn load(&self, user_id: &str) {
        let rows = match self.turns.recent_turns(user_id, self.cap).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("failed to load chat history: {}", e);
                return;
            }
        };

        if rows.is_empty() {
            debug!("no chat history for user");
            return;
        }

        let loaded: Vec<Turn> = rows
            .into_iter()
            .take(self.cap)
            .map(|row| row.into_turn())
            .collect();

        let mut seen = HashSet::new();
        let movie_ids: Vec<i64> = loaded
            .iter()
            .flat_map(|turn| turn.movie_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect();

        info!(
            "loaded {} turns, warming cache for {} movies",
            loaded.len(),
            movie_ids.len()
        );
        self.store.replace_all(loaded);

        let lookups = movie_ids.into_iter().map(|id| {
            let movies = Arc::clone(&self.movies);
            async move {
                match movies.details(id).await {
                    Ok(details) => Some(details.movie),
                    Err(e) => {
                        debug!("detail lookup failed for {}: {}", id, e);
                        None
                    }
                }
            }
        });

        let warmed = futures::future::join_all(lookups).await;
        self.cache.insert_all(warmed.into_iter().flatten());
    }
}
