//! Durable storage over Supabase's PostgREST interface
//!
//! Two tables back the app: `chat_messages` (append-only turn log, read back
//! ascending by creation time) and `watchlist` (keyed by user_id + movie_id).
//! Both sit behind traits so the pipeline and history loader can be tested
//! without a network. The client is constructed once in main and injected;
//! there is no lazy global.
//!
//! Every write here is best-effort from the caller's point of view: the
//! in-memory conversation is the source of truth for the active session.

mod types;

pub use types::{NewTurn, StoredTurn, WatchlistEntry};

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::config::Config;

const TURNS_TABLE: &str = "chat_messages";
const WATCHLIST_TABLE: &str = "watchlist";

/// Chat-turn persistence boundary.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Append-only insert of one or more turn rows.
    async fn insert_turns(&self, rows: &[NewTurn]) -> Result<()>;

    /// Most recent `limit` turns for a user, ascending by creation time.
    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>>;

    /// Destructive: delete every turn row for a user.
    async fn delete_turns(&self, user_id: &str) -> Result<()>;
}

/// Watchlist persistence boundary.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn add_to_watchlist(&self, entry: &WatchlistEntry) -> Result<()>;
    async fn remove_from_watchlist(&self, user_id: &str, movie_id: i64) -> Result<()>;
    /// All entries for a user, most recently added first.
    async fn watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>>;
}

pub struct SupabaseClient {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self> {
        if !config.storage_configured() {
            anyhow::bail!("SUPABASE_URL / SUPABASE_ANON_KEY not set");
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.supabase_anon_key)?;
        headers.insert("apikey", key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.supabase_anon_key))?,
        );

        let client = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.supabase_timeout),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase error: {} - {}", status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl TurnStore for SupabaseClient {
    async fn insert_turns(&self, rows: &[NewTurn]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .post(self.table_url(TURNS_TABLE))
            .header("Prefer", "return=minimal")
            .json(rows)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>> {
        let response = self
            .client
            .get(self.table_url(TURNS_TABLE))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.asc".to_string()),
                ("limit", limit.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_turns(&self, user_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.table_url(TURNS_TABLE))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for SupabaseClient {
    async fn add_to_watchlist(&self, entry: &WatchlistEntry) -> Result<()> {
        let response = self
            .client
            .post(self.table_url(WATCHLIST_TABLE))
            .header("Prefer", "return=minimal")
            .json(entry)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove_from_watchlist(&self, user_id: &str, movie_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.table_url(WATCHLIST_TABLE))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("movie_id", format!("eq.{movie_id}")),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>> {
        let response = self
            .client
            .get(self.table_url(WATCHLIST_TABLE))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "added_at.desc".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> SupabaseClient {
        let mut config = Config::from_env();
        config.supabase_url = "https://example.supabase.co/".into();
        config.supabase_anon_key = "anon-key".into();
        SupabaseClient::new(&config).unwrap()
    }

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let supabase = test_client();
        assert_eq!(
            supabase.table_url("chat_messages"),
            "https://example.supabase.co/rest/v1/chat_messages"
        );
    }

    #[test]
    fn test_unconfigured_is_rejected() {
        let mut config = Config::from_env();
        config.supabase_url = String::new();
        config.supabase_anon_key = String::new();
        assert!(SupabaseClient::new(&config).is_err());
    }
}
