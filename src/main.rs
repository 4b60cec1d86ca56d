// Stress and demo entrypoint: hammers one keyed cache per configured entry.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use refcache::config::{CacheConfig, Config};
use refcache::refresh::telemetry;
use refcache::time::CachedClock;
use refcache::Store;

const CONFIG_PATH: &str = "cfg/refcache.cfg.yaml";
const DEMO_CACHE: &str = "demo";

/// refcache - TTL refresh cache stress runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Reader threads per cache
    #[arg(short, long, default_value_t = 8)]
    readers: usize,

    /// How long to run, e.g. 30s or 2m
    #[arg(short, long, default_value = "30s", value_parser = humantime::parse_duration)]
    duration: Duration,

    /// Distinct keys readers pick from
    #[arg(short, long, default_value_t = 1000)]
    keys: u32,

    /// Simulated latency of one source call
    #[arg(long, default_value = "20ms", value_parser = humantime::parse_duration)]
    build_delay: Duration,

    /// Interval between stats lines
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    stats_every: Duration,
}

/// Loads the configuration struct from YAML file, falling back to defaults
/// when no file is given and the default one is absent.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok(with_demo_cache(cfg));
    }

    match Config::load(PathBuf::from(CONFIG_PATH)) {
        Ok(cfg) => Ok(with_demo_cache(cfg)),
        Err(_) => Ok(with_demo_cache(Config::default())),
    }
}

fn with_demo_cache(mut cfg: Config) -> Config {
    if cfg.caches.is_empty() {
        cfg.caches.insert(
            DEMO_CACHE.to_string(),
            CacheConfig {
                ttl: Duration::from_secs(10),
                check_interval: Some(Duration::from_secs(5)),
            },
        );
    }
    cfg
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_level()));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

/// Read totals for one cache.
#[derive(Default)]
struct Tally {
    reads: AtomicU64,
    hits: AtomicU64,
}

/// Cheap xorshift so readers spread over the key space without a shared RNG.
fn next_key(state: &mut u64, keys: u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    (*state % u64::from(keys.max(1))) as u32
}

fn spawn_readers(
    token: &CancellationToken,
    store: &Arc<Store<u32, String>>,
    tally: &Arc<Tally>,
    readers: usize,
    keys: u32,
) -> Vec<JoinHandle<()>> {
    (0..readers)
        .map(|i| {
            let token = token.clone();
            let store = store.clone();
            let tally = tally.clone();
            tokio::task::spawn_blocking(move || {
                let mut state = 0x9E37_79B9_7F4A_7C15u64 ^ (i as u64 + 1);
                while !token.is_cancelled() {
                    let key = next_key(&mut state, keys);
                    if store.get(&key).is_some() {
                        tally.hits.fetch_add(1, Ordering::Relaxed);
                    }
                    tally.reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let cfg = load_cfg(args.cfg.clone())?;
    configure_logger(&cfg);

    // Second resolution is all expiry arithmetic needs.
    let (clock, clock_token) = CachedClock::start(Duration::from_millis(100));

    let mut stores = BTreeMap::new();
    let mut readers = Vec::new();
    for (name, cache_cfg) in &cfg.caches {
        let delay = args.build_delay;
        let label = name.clone();
        let source = move |key: &u32, _: &()| {
            std::thread::sleep(delay);
            // Every seventh key is unknown to the source.
            (key % 7 != 0).then(|| format!("{label}:{key}"))
        };

        let opts = cache_cfg.options(name).clock(clock.clone());
        let store: Arc<Store<u32, String>> =
            Arc::new(Store::with_options(source, opts).with_context(|| format!("create cache {name}"))?);
        let tally = Arc::new(Tally::default());

        tokio::task::spawn(telemetry::logger(
            shutdown_token.clone(),
            Arc::from(name.as_str()),
            store.counters(),
            args.stats_every,
        ));
        readers.extend(spawn_readers(&shutdown_token, &store, &tally, args.readers, args.keys));
        stores.insert(name.clone(), (store, tally));
    }

    info!(
        component = "main",
        caches = stores.len(),
        readers = args.readers,
        keys = args.keys,
        duration = ?args.duration,
        "stress run started"
    );

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!(component = "main", error = %err, "failed to listen for ctrl-c");
            }
            info!(component = "main", "interrupted");
        }
        _ = tokio::time::sleep(args.duration) => {}
    }
    shutdown_token.cancel();

    for reader in readers {
        if let Err(err) = reader.await {
            error!(component = "main", error = %err, "reader failed");
        }
    }

    for (name, (store, tally)) in &stores {
        store.close();
        info!(
            component = "main",
            name = %name,
            reads = tally.reads.load(Ordering::Relaxed),
            hits = tally.hits.load(Ordering::Relaxed),
            keys_held = store.size(),
            "stress run finished"
        );
    }
    clock_token.cancel();

    Ok(())
}
