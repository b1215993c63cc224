//! Recommendation chat pipeline
//!
//! One run per user utterance: append the user turn and an in-progress
//! placeholder, stream the model response into the placeholder, extract
//! bolded titles from the final text, resolve each against movie search
//! concurrently, then finalize the turn with the resolved ids and persist
//! both rows best-effort.
//!
//! The `generating` gate on the conversation store is the only concurrency
//! control: a second submission while a run is in flight is refused and the
//! conversation is left untouched. There is no cancellation; a backgrounded
//! run completes against the then-current tail, and the store's tail guard
//! silently drops its effects if the conversation was cleared meanwhile.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SendError;
use crate::extract::extract_titles;
use crate::gemini::{ChatTurn, Recommender, StreamEvent};
use crate::session::{ConversationStore, MovieCache, Role, Turn};
use crate::storage::{NewTurn, TurnStore};
use crate::tmdb::{Movie, MovieSource};

pub struct RecommendationPipeline {
    store: Arc<ConversationStore>,
    cache: Arc<MovieCache>,
    model: Arc<dyn Recommender>,
    movies: Arc<dyn MovieSource>,
    /// Absent when durable storage is not configured; the chat still works,
    /// it just doesn't survive the session.
    turns: Option<Arc<dyn TurnStore>>,
    user_id: String,
    streaming: bool,
}

impl RecommendationPipeline {
    pub fn new(
        store: Arc<ConversationStore>,
        cache: Arc<MovieCache>,
        model: Arc<dyn Recommender>,
        movies: Arc<dyn MovieSource>,
        turns: Option<Arc<dyn TurnStore>>,
        user_id: String,
    ) -> Self {
        Self { store, cache, model, movies, turns, user_id, streaming: true }
    }

    /// Use the non-streaming completion endpoint instead of SSE. The reply
    /// lands in the placeholder turn in one piece once the model finishes.
    pub fn without_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    /// Run the full pipeline for one user utterance.
    ///
    /// Returns `Err` only for inputs rejected before the run starts (empty
    /// text, or a response already in flight). A model failure is not an
    /// `Err`: it surfaces as an error turn in the conversation and the
    /// pipeline returns to idle.
    pub async fn send(&self, text: &str) -> Result<(), SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        if !self.store.try_begin_generating() {
            return Err(SendError::Busy);
        }

        // History is everything before this run, blanks dropped.
        let history = collect_history(&self.store.turns());

        self.store.append(Turn::user(self.store.next_local_id(), text));
        self.store.append(Turn::placeholder(self.store.next_local_id()));

        let response = match self.run_model(&history, text).await {
            Ok(full_text) => full_text,
            Err(message) => {
                self.fail(&message);
                return Ok(());
            }
        };

        let titles = extract_titles(&response);
        let movie_ids = self.resolve_titles(&titles).await;

        self.store.finalize(movie_ids.clone());
        self.store.set_generating(false);

        self.persist(text, &response, movie_ids).await;
        Ok(())
    }

    /// Produce the model response into the placeholder turn, returning the
    /// full text. Streaming applies deltas strictly in receipt order and the
    /// accumulator only ever grows; the non-streaming path writes the
    /// placeholder once with the complete reply.
    async fn run_model(&self, history: &[ChatTurn], input: &str) -> Result<String, String> {
        if !self.streaming {
            let text = self
                .model
                .complete(history, input)
                .await
                .map_err(|e| e.to_string())?;
            self.store.update_in_progress_content(&text);
            return Ok(text);
        }

        let mut rx = self
            .model
            .complete_stream(history, input)
            .await
            .map_err(|e| e.to_string())?;

        let mut accumulated = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::TextDelta(delta) => {
                    accumulated.push_str(&delta);
                    self.store.update_in_progress_content(&accumulated);
                }
                StreamEvent::Error(message) => return Err(message),
                StreamEvent::Done => break,
            }
        }

        Ok(accumulated)
    }

    /// Fan out one search per extracted title and wait for all to settle.
    /// A failed or empty resolution degrades that one title; ids come back
    /// in extraction order, filtered to successes.
    async fn resolve_titles(&self, titles: &[String]) -> Vec<i64> {
        if titles.is_empty() {
            return Vec::new();
        }

        let lookups = titles.iter().map(|title| {
            let movies = Arc::clone(&self.movies);
            async move {
                match movies.search_first(title).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        debug!("resolution failed for '{}': {}", title, e);
                        None
                    }
                }
            }
        });

        let resolved: Vec<Movie> = futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect();

        let movie_ids = resolved.iter().map(|m| m.id).collect();
        self.cache.insert_all(resolved);
        movie_ids
    }

    /// Replace the placeholder with a user-visible error turn and go idle.
    fn fail(&self, message: &str) {
        warn!("model call failed: {}", message);
        self.store
            .update_in_progress_content(&format!("Sorry, I encountered an error: {message}"));
        self.store.finalize(Vec::new());
        self.store.set_generating(false);
    }

    /// Best-effort persistence of the completed exchange. Failure is logged
    /// and swallowed; memory stays the source of truth for the session.
    async fn persist(&self, user_text: &str, model_text: &str, movie_ids: Vec<i64>) {
        let Some(turns) = &self.turns else { return };

        let rows = [
            NewTurn {
                user_id: self.user_id.clone(),
                role: Role::User,
                content: user_text.to_string(),
                movie_ids: Vec::new(),
            },
            NewTurn {
                user_id: self.user_id.clone(),
                role: Role::Model,
                content: model_text.to_string(),
                movie_ids,
            },
        ];

        if let Err(e) = turns.insert_turns(&rows).await {
            warn!("failed to persist chat turns: {}", e);
        }
    }

    /// Clear the conversation and mirror the destruction to storage.
    pub async fn clear(&self) {
        self.store.clear();
        if let Some(turns) = &self.turns {
            if let Err(e) = turns.delete_turns(&self.user_id).await {
                warn!("failed to delete chat history: {}", e);
            }
        }
    }
}

/// Prior turns mapped to the model's history shape, blanks dropped.
fn collect_history(turns: &[Turn]) -> Vec<ChatTurn> {
    turns
        .iter()
        .filter(|t| !t.content.trim().is_empty())
        .map(|t| ChatTurn { role: t.role, text: t.content.clone() })
        .collect()
}
