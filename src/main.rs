// src/main.rs

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use cinemate::config::Config;
use cinemate::error::SendError;
use cinemate::gemini::GeminiClient;
use cinemate::history::HistoryLoader;
use cinemate::pipeline::RecommendationPipeline;
use cinemate::session::{ConversationStore, MovieCache, Role};
use cinemate::storage::{SupabaseClient, TurnStore, WatchlistEntry, WatchlistStore};
use cinemate::tmdb::{ImageSize, MovieSource, TmdbClient};

const SUGGESTED_PROMPTS: &[(&str, &str)] = &[
    ("Feel-Good", "Suggest some feel-good movies that will make me smile"),
    ("Horror", "What are the scariest horror movies of all time?"),
    ("Romance", "Recommend romantic movies for a cozy night in"),
    ("Sci-Fi", "What are the best sci-fi movies with mind-bending plots?"),
];

#[derive(Parser)]
#[command(name = "cinemate", about = "Movie-recommendation chat in your terminal")]
struct Args {
    /// User id for chat history and watchlist (overrides CINEMATE_USER_ID)
    #[arg(long)]
    user: Option<String>,

    /// Skip loading persisted chat history at startup
    #[arg(long)]
    no_history: bool,

    /// Wait for the full reply instead of streaming it
    #[arg(long)]
    no_stream: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level.parse().unwrap_or(tracing::Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let user_id = args.user.unwrap_or_else(|| config.session_user_id());
    info!("Starting CineMate (user: {})", user_id);

    let tmdb = Arc::new(TmdbClient::new(&config));
    let gemini = Arc::new(GeminiClient::new(&config)?);
    let supabase = match SupabaseClient::new(&config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("chat history disabled: {}", e);
            None
        }
    };

    let store = Arc::new(ConversationStore::new());
    let cache = Arc::new(MovieCache::new());

    if let Some(supabase) = &supabase {
        if !args.no_history {
            let loader = HistoryLoader::new(
                Arc::clone(supabase) as Arc<dyn TurnStore>,
                Arc::clone(&tmdb) as Arc<dyn MovieSource>,
                Arc::clone(&store),
                Arc::clone(&cache),
                config.history_message_cap,
            );
            loader.load(&user_id).await;
        }
    }

    let mut pipeline = RecommendationPipeline::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        gemini,
        Arc::clone(&tmdb) as Arc<dyn MovieSource>,
        supabase
            .as_ref()
            .map(|s| Arc::clone(s) as Arc<dyn TurnStore>),
        user_id.clone(),
    );
    if args.no_stream {
        pipeline = pipeline.without_streaming();
    }

    print_banner(&tmdb, &store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nyou> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                pipeline.clear().await;
                println!("History cleared.");
                continue;
            }
            "/watchlist" => {
                show_watchlist(supabase.as_deref(), &tmdb, &user_id).await;
                continue;
            }
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("/save ") {
            save_from_last_turn(supabase.as_deref(), &store, &cache, &user_id, rest).await;
            continue;
        }
        if let Some(rest) = line.strip_prefix("/unsave ") {
            if let (Some(supabase), Ok(movie_id)) = (supabase.as_deref(), rest.trim().parse::<i64>())
            {
                match supabase.remove_from_watchlist(&user_id, movie_id).await {
                    Ok(()) => println!("Removed from your watchlist."),
                    Err(e) => warn!("could not update watchlist: {}", e),
                }
            } else {
                println!("Usage: /unsave <movie id>");
            }
            continue;
        }

        match pipeline.send(&line).await {
            Ok(()) => print_reply(&store, &cache, &tmdb),
            Err(SendError::Busy) => {} // refused by design, nothing to show
            Err(SendError::EmptyMessage) => {}
        }
    }

    Ok(())
}

/// Trending rail plus suggested prompts for an empty conversation.
async fn print_banner(tmdb: &TmdbClient, store: &ConversationStore) {
    println!("CineMate AI — ask me anything about movies.");
    println!("Commands: /clear /watchlist /save <n> /unsave <id> /quit");

    match tmdb.trending_movies(1).await {
        Ok(page) => {
            println!("\nTrending this week:");
            for movie in page.results.iter().take(5) {
                let year = movie.release_year().unwrap_or("—");
                println!("  {} ({}) ★{:.1}", movie.title, year, movie.vote_average);
            }
        }
        Err(e) => warn!("could not load trending movies: {}", e),
    }

    if store.is_empty() {
        println!("\nTry one of these:");
        for (label, prompt) in SUGGESTED_PROMPTS {
            println!("  [{label}] {prompt}");
        }
    }
}

/// Print the finalized model turn and its resolved movie cards.
fn print_reply(store: &ConversationStore, cache: &MovieCache, tmdb: &TmdbClient) {
    let Some(tail) = store.tail() else { return };
    if tail.role != Role::Model {
        return;
    }

    println!("\ncinemate> {}", tail.content);
    for (n, id) in tail.movie_ids.iter().enumerate() {
        if let Some(movie) = cache.get(*id) {
            let year = movie.release_year().unwrap_or("—");
            println!(
                "  [{}] {} ({}) ★{:.1}  {}",
                n + 1,
                movie.title,
                year,
                movie.vote_average,
                tmdb.poster_url(movie.poster_path.as_deref(), ImageSize::Medium),
            );
        }
    }
}

/// `/save <n>`: add the n-th card of the last reply to the watchlist.
async fn save_from_last_turn(
    supabase: Option<&SupabaseClient>,
    store: &ConversationStore,
    cache: &MovieCache,
    user_id: &str,
    arg: &str,
) {
    let Some(supabase) = supabase else {
        println!("Watchlist requires Supabase to be configured.");
        return;
    };
    let Ok(n) = arg.trim().parse::<usize>() else {
        println!("Usage: /save <n>");
        return;
    };

    let Some(movie) = store
        .turns()
        .iter()
        .rev()
        .find(|t| t.role == Role::Model && !t.movie_ids.is_empty())
        .and_then(|t| t.movie_ids.get(n.wrapping_sub(1)).copied())
        .and_then(|id| cache.get(id))
    else {
        println!("No such movie card.");
        return;
    };

    let entry = WatchlistEntry {
        user_id: user_id.to_string(),
        movie_id: movie.id,
        movie_title: movie.title.clone(),
        movie_poster: movie.poster_path.clone(),
        added_at: None,
    };
    match supabase.add_to_watchlist(&entry).await {
        Ok(()) => println!("Added {} to your watchlist.", movie.title),
        Err(e) => warn!("could not save to watchlist: {}", e),
    }
}

async fn show_watchlist(supabase: Option<&SupabaseClient>, tmdb: &TmdbClient, user_id: &str) {
    let Some(supabase) = supabase else {
        println!("Watchlist requires Supabase to be configured.");
        return;
    };
    match supabase.watchlist(user_id).await {
        Ok(entries) if entries.is_empty() => println!("Your watchlist is empty."),
        Ok(entries) => {
            println!("Your watchlist:");
            for entry in entries {
                println!(
                    "  {}  {}",
                    entry.movie_title,
                    tmdb.poster_url(entry.movie_poster.as_deref(), ImageSize::Small),
                );
            }
        }
        Err(e) => warn!("could not load watchlist: {}", e),
    }
}
