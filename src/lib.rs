//! zdbtree library
//!
//! Parses the pool configuration tree printed by `zdb -C` and caches parsed
//! pools per identity so repeated lookups do not re-run zdb.

pub mod cache;
pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod data;

pub use client::{ZdbClient, ZdbError};
pub use config::ClientOptions;
pub use data::{parse_pool_output, Node, ParseError, PoolRecord};
