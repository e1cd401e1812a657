//! zdb client with a per-pool TTL cache
//!
//! `ZdbClient::get_pool` runs `zdb -C <pool>`, parses the output and memoizes
//! the record by pool identity. Concurrent misses on the same key are not
//! coalesced: each caller runs zdb and the last one to finish wins the slot.

use chrono::Duration;
use log::debug;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{cache_key, TtlCache};
use crate::command::{CommandError, LocalRunner, ToolCommand};
use crate::config::ClientOptions;
use crate::data::{parse_named_pool_output, ParseError, PoolRecord};

/// Arguments passed to zdb ahead of the pool name
const ZDB_ARGS: &[&str] = &["-C"];

/// Errors that can occur when fetching a pool
#[derive(Debug, Error)]
pub enum ZdbError {
    /// Running zdb failed
    #[error(transparent)]
    Command(#[from] CommandError),

    /// zdb output could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Client for reading pool configuration trees from zdb
#[derive(Debug)]
pub struct ZdbClient {
    command: ToolCommand,
    cache: TtlCache<PoolRecord>,
}

impl ZdbClient {
    /// Creates a client around `command`, caching results for `ttl`
    ///
    /// A TTL of zero or less disables caching.
    pub fn new(command: ToolCommand, ttl: Duration) -> Self {
        Self {
            command,
            cache: TtlCache::new(ttl),
        }
    }

    /// Creates a client from options, running zdb on the local host
    pub fn from_options(opts: &ClientOptions) -> Self {
        let runner = match opts.command_timeout {
            Some(timeout) => LocalRunner::with_timeout(timeout),
            None => LocalRunner::new(),
        };
        let command = ToolCommand::new(&opts.zdb_bin)
            .with_sudo(opts.sudo)
            .with_runner(Arc::new(runner));
        Self {
            command,
            cache: TtlCache::with_ttl_secs(opts.cache_ttl_secs()),
        }
    }

    pub fn cache(&self) -> &TtlCache<PoolRecord> {
        &self.cache
    }

    /// Fetches the configuration tree of pool `name`
    ///
    /// `guid` may be empty. It is part of the cache key and is copied verbatim
    /// into the returned record; zdb output is not checked against it.
    ///
    /// # Returns
    /// * `Ok(Arc<PoolRecord>)` from the cache when a live entry exists, otherwise freshly parsed
    /// * `Err(ZdbError)` if zdb fails or its output cannot be parsed; the cache is left untouched
    pub fn get_pool(&self, name: &str, guid: &str) -> Result<Arc<PoolRecord>, ZdbError> {
        let key = cache_key(name, guid);

        if let Some(pool) = self.cache.read(&key) {
            debug!("zdb cache hit for {key}");
            return Ok(pool);
        }
        debug!("zdb cache miss for {key}");

        let mut args: Vec<&str> = ZDB_ARGS.to_vec();
        args.push(name);
        let text = self.command.run_text(&args)?;

        let mut pool = parse_named_pool_output(name, &text)?;
        pool.guid = guid.to_string();

        let pool = Arc::new(pool);
        self.cache.write(&key, Arc::clone(&pool));
        Ok(pool)
    }

    /// Drops the cached record for a pool so the next lookup re-runs zdb
    pub fn invalidate(&self, name: &str, guid: &str) -> bool {
        self.cache.remove(&cache_key(name, guid))
    }
}
