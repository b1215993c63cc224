//! TMDB API client
//!
//! Thin wrapper over the v3 REST API: api_key query auth (not the v4 Bearer
//! scheme), `language=en-US`, `include_adult=false` on every request. The
//! pipeline only needs search-by-title and detail-by-id; both sit behind the
//! `MovieSource` trait so runs can be driven by mocks in tests.

mod types;

pub use types::{Genre, Movie, MovieDetails, MoviePage};

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::config::Config;

/// Placeholder shown when a movie has no poster.
const PLACEHOLDER_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";
/// Placeholder shown when a movie has no backdrop.
const PLACEHOLDER_BACKDROP_URL: &str = "https://via.placeholder.com/1280x720?text=No+Image";

/// Image width tokens accepted by the TMDB image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
    Original,
    Backdrop,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "w185",
            ImageSize::Medium => "w342",
            ImageSize::Large => "w500",
            ImageSize::Original => "original",
            ImageSize::Backdrop => "w1280",
        }
    }
}

/// Metadata lookup boundary used by the pipeline and the history loader.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Resolve a free-text title to the service's top search hit, if any.
    async fn search_first(&self, title: &str) -> Result<Option<Movie>>;

    /// Full record for a known movie id.
    async fn details(&self, id: i64) -> Result<MovieDetails>;
}

pub struct TmdbClient {
    client: HttpClient,
    api_key: String,
    base_url: String,
    image_base_url: String,
    timeout: Duration,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: HttpClient::new(),
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.clone(),
            image_base_url: config.tmdb_image_base_url.clone(),
            timeout: Duration::from_secs(config.tmdb_timeout),
        }
    }

    async fn get_page(&self, path: &str, extra: &[(&str, String)]) -> Result<MoviePage> {
        let url = format!("{}{}", self.base_url, path);
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("language", "en-US".to_string()),
            ("include_adult", "false".to_string()),
        ];
        query.extend(extra.iter().cloned());

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TMDB API error: {} - {}", status, body);
        }

        Ok(response.json().await?)
    }

    /// Search movies by free-text query. Page numbers start at 1.
    pub async fn search_movies(&self, query: &str, page: i64) -> Result<MoviePage> {
        self.get_page(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Trending movies for the week.
    pub async fn trending_movies(&self, page: i64) -> Result<MoviePage> {
        self.get_page("/trending/movie/week", &[("page", page.to_string())]).await
    }

    /// Full detail record for one movie.
    pub async fn movie_details(&self, id: i64) -> Result<MovieDetails> {
        let url = format!("{}/movie/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
                ("include_adult", "false"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TMDB API error: {} - {}", status, body);
        }

        Ok(response.json().await?)
    }

    /// Absolute poster URL for a relative path from the API.
    pub fn poster_url(&self, path: Option<&str>, size: ImageSize) -> String {
        match path {
            Some(p) if !p.is_empty() => {
                format!("{}/{}{}", self.image_base_url, size.as_str(), p)
            }
            _ => PLACEHOLDER_POSTER_URL.to_string(),
        }
    }

    /// Absolute backdrop URL, always at the backdrop width.
    pub fn backdrop_url(&self, path: Option<&str>) -> String {
        match path {
            Some(p) if !p.is_empty() => {
                format!("{}/{}{}", self.image_base_url, ImageSize::Backdrop.as_str(), p)
            }
            _ => PLACEHOLDER_BACKDROP_URL.to_string(),
        }
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn search_first(&self, title: &str) -> Result<Option<Movie>> {
        let page = self.search_movies(title, 1).await?;
        Ok(page.results.into_iter().next())
    }

    async fn details(&self, id: i64) -> Result<MovieDetails> {
        self.movie_details(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TmdbClient {
        let mut config = Config::from_env();
        config.tmdb_api_key = "test-key".into();
        config.tmdb_base_url = "https://api.themoviedb.org/3".into();
        config.tmdb_image_base_url = "https://image.tmdb.org/t/p".into();
        TmdbClient::new(&config)
    }

    #[test]
    fn test_poster_url_sizes() {
        let tmdb = test_client();
        assert_eq!(
            tmdb.poster_url(Some("/abc.jpg"), ImageSize::Medium),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
        assert_eq!(
            tmdb.poster_url(Some("/abc.jpg"), ImageSize::Original),
            "https://image.tmdb.org/t/p/original/abc.jpg"
        );
    }

    #[test]
    fn test_missing_path_yields_placeholder() {
        let tmdb = test_client();
        assert_eq!(tmdb.poster_url(None, ImageSize::Large), PLACEHOLDER_POSTER_URL);
        assert_eq!(tmdb.poster_url(Some(""), ImageSize::Large), PLACEHOLDER_POSTER_URL);
        assert_eq!(tmdb.backdrop_url(None), PLACEHOLDER_BACKDROP_URL);
    }

    #[test]
    fn test_backdrop_uses_backdrop_width() {
        let tmdb = test_client();
        assert_eq!(
            tmdb.backdrop_url(Some("/bg.jpg")),
            "https://image.tmdb.org/t/p/w1280/bg.jpg"
        );
    }
}
