// tests/history_loading.rs
// Session-start hydration: turn mapping, the 50-turn bound, cache warming.


use std::sync::Arc;

use chrono::{Duration, Utc};

use cinemate::history::HistoryLoader;
use cinemate::session::{ConversationStore, MovieCache, Role};
use cinemate::storage::{StoredTurn, TurnStore};
use cinemate::tmdb::MovieSource;

use test_helpers::{RecordingTurnStore, StaticMovies};

const HISTORY_CAP: usize = 50;

fn stored(n: usize, role: Role, content: &str, movie_ids: Vec<i64>) -> StoredTurn {
    StoredTurn {
        id: format!("db-{n}"),
        user_id: "u-test".into(),
        role,
        content: content.into(),
        movie_ids,
        created_at: Utc::now() + Duration::seconds(n as i64),
    }
}

fn loader(
    turns: Arc<RecordingTurnStore>,
    movies: StaticMovies,
    store: Arc<ConversationStore>,
    cache: Arc<MovieCache>,
) -> HistoryLoader {
    HistoryLoader::new(
        turns as Arc<dyn TurnStore>,
        Arc::new(movies) as Arc<dyn MovieSource>,
        store,
        cache,
        HISTORY_CAP,
    )
}

#[tokio::test]
async fn test_load_replaces_conversation_and_warms_cache() {
    let turns = Arc::new(RecordingTurnStore {
        stored: vec![
            stored(0, Role::User, "something tense", vec![]),
            stored(1, Role::Model, "Try **Heat** (1995) or **Ronin** (1998).", vec![949, 8195]),
        ],
        ..Default::default()
    });
    let movies = StaticMovies::with(&[(949, "Heat"), (8195, "Ronin")]);
    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    loader(turns, movies, Arc::clone(&store), Arc::clone(&cache)).load("u-test").await;

    let loaded = store.turns();
    assert_eq!(loaded.len(), 2);
    // Persisted ids replace local ones; nothing is in progress after load.
    assert_eq!(loaded[0].id, "db-0");
    assert!(loaded.iter().all(|t| !t.in_progress));
    assert_eq!(loaded[1].movie_ids, vec![949, 8195]);

    assert!(cache.contains(949));
    assert!(cache.contains(8195));
}

#[tokio::test]
async fn test_load_never_exceeds_cap() {
    // Storage hands back more rows than the cap; the loader still bounds.
    let stored_rows: Vec<StoredTurn> =
        (0..80).map(|n| stored(n, Role::User, "older chatter", vec![])).collect();
    let turns = Arc::new(RecordingTurnStore { stored: stored_rows, ..Default::default() });
    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    loader(turns, StaticMovies::default(), Arc::clone(&store), Arc::clone(&cache))
        .load("u-test")
        .await;

    assert_eq!(store.len(), HISTORY_CAP);
}

#[tokio::test]
async fn test_detail_failures_are_isolated() {
    let turns = Arc::new(RecordingTurnStore {
        stored: vec![stored(0, Role::Model, "cards", vec![949, 404, 8195])],
        ..Default::default()
    });
    let mut movies = StaticMovies::with(&[(949, "Heat"), (8195, "Ronin")]);
    movies.failing_ids.insert(404);
    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    loader(turns, movies, Arc::clone(&store), Arc::clone(&cache)).load("u-test").await;

    assert!(cache.contains(949));
    assert!(cache.contains(8195));
    assert!(!cache.contains(404));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_duplicate_ids_warm_once() {
    let turns = Arc::new(RecordingTurnStore {
        stored: vec![
            stored(0, Role::Model, "first", vec![949]),
            stored(1, Role::Model, "again", vec![949, 949]),
        ],
        ..Default::default()
    });
    let movies = StaticMovies::with(&[(949, "Heat")]);
    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    loader(turns, movies, Arc::clone(&store), Arc::clone(&cache)).load("u-test").await;

    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_degrades_to_empty_conversation() {
    let turns = Arc::new(RecordingTurnStore { fail_fetch: true, ..Default::default() });
    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    loader(turns, StaticMovies::default(), Arc::clone(&store), Arc::clone(&cache))
        .load("u-test")
        .await;

    assert!(store.is_empty());
    assert!(cache.is_empty());
}
