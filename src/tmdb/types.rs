//! TMDB wire types

use serde::{Deserialize, Serialize};

/// One movie as returned by the list/search endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl Movie {
    /// Four-digit release year, if the date is populated.
    pub fn release_year(&self) -> Option<&str> {
        let year = self.release_date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }
}

/// Paged response envelope shared by search, trending, and discover.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    pub page: i64,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_results: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Full movie record from the detail endpoint. A superset of `Movie`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year() {
        let movie = Movie {
            release_date: "2010-07-16".into(),
            ..Default::default()
        };
        assert_eq!(movie.release_year(), Some("2010"));

        let blank = Movie::default();
        assert_eq!(blank.release_year(), None);
    }

    #[test]
    fn test_detail_deserializes_list_fields() {
        let json = serde_json::json!({
            "id": 27205,
            "title": "Inception",
            "overview": "A thief who steals corporate secrets...",
            "poster_path": "/abc.jpg",
            "release_date": "2010-07-16",
            "vote_average": 8.4,
            "runtime": 148,
            "genres": [{"id": 28, "name": "Action"}],
            "tagline": "Your mind is the scene of the crime."
        });
        let details: MovieDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.movie.id, 27205);
        assert_eq!(details.runtime, Some(148));
        assert_eq!(details.genres[0].name, "Action");
    }
}
