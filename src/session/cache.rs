//! Shared movie-metadata cache
//!
//! Keyed by TMDB id, populated incrementally by the pipeline and the history
//! loader, read by anything rendering movie cards. Last write wins; entries
//! are immutable-once-fetched display data, so overlapping writers would
//! write identical values. Never evicted within a session.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::tmdb::Movie;

#[derive(Default)]
pub struct MovieCache {
    movies: RwLock<HashMap<i64, Movie>>,
}

impl MovieCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, movie: Movie) {
        let mut movies = self.movies.write().expect("movie cache lock");
        movies.insert(movie.id, movie);
    }

    pub fn insert_all(&self, batch: impl IntoIterator<Item = Movie>) {
        let mut movies = self.movies.write().expect("movie cache lock");
        for movie in batch {
            movies.insert(movie.id, movie);
        }
    }

    pub fn get(&self, id: i64) -> Option<Movie> {
        self.movies.read().expect("movie cache lock").get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.movies.read().expect("movie cache lock").contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.movies.read().expect("movie cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = MovieCache::new();
        cache.insert(movie(603, "The Matrix"));
        assert_eq!(cache.get(603).unwrap().title, "The Matrix");
        assert!(cache.get(604).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = MovieCache::new();
        cache.insert(movie(11, "Star Wars"));
        cache.insert_all([movie(11, "Star Wars (1977)"), movie(1891, "The Empire Strikes Back")]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(11).unwrap().title, "Star Wars (1977)");
    }
}
