//! clubcache - run club queries through the TTL cache from the command line.
//!
//! Useful for checking remote connectivity and watching hits and misses:
//!
//! ```text
//! RUST_LOG=clubcache_core=debug clubcache players --category 4 --repeat 3
//! ```

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clubcache_core::cache::format_age;
use clubcache_core::queries::{
    CategoryQuery, DashboardQuery, EventQuery, PlayerQuery, SessionQuery, StaffQuery,
};
use clubcache_core::{CacheOptions, CacheStore, ClubQueries, Config, QueryResult, RestRemote};

const USAGE: &str = "\
Usage: clubcache <command> [options]

Commands:
  players      Players with their category and age
  sessions     Training sessions with attendance stats
  events       Club events
  staff        Staff with the categories they coach
  categories   Categories with player counts
  dashboard    Dashboard counters
  config-path  Print where the config file lives

Options:
  --category <ID>   Scope to one category (players, sessions, events, dashboard)
  --no-cache        Always fetch from the remote
  --repeat <N>      Run the query N times to observe cache hits (default 1)
  -h, --help        Show this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Players,
    Sessions,
    Events,
    Staff,
    Categories,
    Dashboard,
    ConfigPath,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "players" => Some(Command::Players),
            "sessions" => Some(Command::Sessions),
            "events" => Some(Command::Events),
            "staff" => Some(Command::Staff),
            "categories" => Some(Command::Categories),
            "dashboard" => Some(Command::Dashboard),
            "config-path" => Some(Command::ConfigPath),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    category_id: Option<i64>,
    no_cache: bool,
    repeat: u32,
}

/// Parse arguments (without the program name). `Ok(None)` means help was requested.
fn parse_args<I>(args: I) -> Result<Option<Args>>
where
    I: IntoIterator<Item = String>,
{
    let mut command = None;
    let mut category_id = None;
    let mut no_cache = false;
    let mut repeat = 1;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--no-cache" => no_cache = true,
            "--category" => {
                let value = args.next().context("--category needs a value")?;
                category_id = Some(value.parse().with_context(|| format!("bad category id `{}`", value))?);
            }
            "--repeat" => {
                let value = args.next().context("--repeat needs a value")?;
                repeat = value.parse().with_context(|| format!("bad repeat count `{}`", value))?;
            }
            other if command.is_none() => {
                command = Some(Command::parse(other).with_context(|| format!("unknown command `{}`", other))?);
            }
            other => bail!("unexpected argument `{}`", other),
        }
    }

    match command {
        Some(command) => Ok(Some(Args {
            command,
            category_id,
            no_cache,
            repeat: repeat.max(1),
        })),
        None => Ok(None),
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr through a non-blocking writer so stdout stays clean JSON.
/// The returned guard flushes pending lines on drop.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = match parse_args(std::env::args().skip(1))? {
        Some(args) => args,
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let _guard = init_tracing();

    if args.command == Command::ConfigPath {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    let config = Config::load()?;
    let mut remote = RestRemote::new(config.remote_url()?)?;
    if let Some(ref key) = config.api_key {
        remote = remote.with_api_key(key.clone());
    }

    let store = Arc::new(CacheStore::new());
    let queries = ClubQueries::new(Arc::clone(&store), Arc::new(remote))
        .with_ttl_policy(config.ttl_policy());
    let options = if args.no_cache || !config.cache_enabled {
        CacheOptions::no_cache()
    } else {
        CacheOptions::default()
    };

    info!(command = ?args.command, repeat = args.repeat, cache = options.use_cache, "clubcache starting");

    for run in 1..=args.repeat {
        let started = Instant::now();
        let printed = run_command(&queries, &args, options, run == args.repeat).await?;
        eprintln!("run {}: {} in {}", run, printed, format_elapsed(started.elapsed()));
    }

    let stats = queries.get_stats();
    eprintln!("cache: {} entr{}", stats.size, if stats.size == 1 { "y" } else { "ies" });
    for key in &stats.keys {
        match store.age_of(key) {
            Some(age) => eprintln!("  {} ({})", key, format_age(age)),
            None => eprintln!("  {}", key),
        }
    }
    Ok(())
}

/// Run one query; print its JSON when `print` is set. Returns a short summary.
async fn run_command(
    queries: &ClubQueries<RestRemote>,
    args: &Args,
    options: CacheOptions,
    print: bool,
) -> Result<String> {
    let category_id = args.category_id;
    match args.command {
        Command::Players => {
            let query = PlayerQuery { category_id, ..PlayerQuery::default() };
            emit(queries.get_players_with_categories(&query, options).await, print, |r| r.len())
        }
        Command::Sessions => {
            let query = SessionQuery { category_id, ..SessionQuery::default() };
            emit(queries.get_sessions_with_stats(&query, options).await, print, |r| r.len())
        }
        Command::Events => {
            let query = EventQuery { category_id, ..EventQuery::default() };
            emit(queries.get_events(&query, options).await, print, |r| r.len())
        }
        Command::Staff => {
            emit(queries.get_staff_with_categories(&StaffQuery::default(), options).await, print, |r| r.len())
        }
        Command::Categories => {
            let query = CategoryQuery::default();
            emit(queries.get_categories_with_counts(&query, options).await, print, |r| r.len())
        }
        Command::Dashboard => {
            let query = DashboardQuery { category_id };
            emit(queries.get_dashboard_stats(&query, options).await, print, |_| 1)
        }
        Command::ConfigPath => Ok(String::new()),
    }
}

fn emit<T, F>(result: QueryResult<Arc<T>>, print: bool, count: F) -> Result<String>
where
    T: Serialize,
    F: Fn(&T) -> usize,
{
    let data = result?;
    if print {
        println!("{}", serde_json::to_string_pretty(&*data)?);
    }
    let n = count(&data);
    Ok(format!("{} item{}", n, if n == 1 { "" } else { "s" }))
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_millis() >= 1000 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Option<Args>> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["players", "--category", "4", "--repeat", "3"]).unwrap().unwrap();
        assert_eq!(
            parsed,
            Args {
                command: Command::Players,
                category_id: Some(4),
                no_cache: false,
                repeat: 3,
            }
        );

        let parsed = args(&["--no-cache", "dashboard"]).unwrap().unwrap();
        assert_eq!(parsed.command, Command::Dashboard);
        assert!(parsed.no_cache);
        assert_eq!(parsed.repeat, 1);
    }

    #[test]
    fn test_parse_args_help_and_errors() {
        assert!(args(&[]).unwrap().is_none());
        assert!(args(&["staff", "--help"]).unwrap().is_none());
        assert!(args(&["teams"]).is_err());
        assert!(args(&["players", "--category"]).is_err());
        assert!(args(&["players", "--category", "u12"]).is_err());
        assert!(args(&["players", "events"]).is_err());
    }

    #[test]
    fn test_repeat_zero_runs_once() {
        assert_eq!(args(&["events", "--repeat", "0"]).unwrap().unwrap().repeat, 1);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(42)), "42ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50s");
    }
}
