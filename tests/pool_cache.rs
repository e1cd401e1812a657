//! Integration tests for cached pool lookups
//!
//! Drives `ZdbClient` with a recording fake runner to observe how often zdb
//! would actually be invoked.

use chrono::Duration;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration as StdDuration;

use zdbtree::command::{CommandError, Output, Runner, ToolCommand};
use zdbtree::{ParseError, ZdbClient, ZdbError};

const ZDB_OUTPUT: &str = "version: 5000
name: tank
\ttype: root
\t\tid: 0
\t\tguid: 12345678901234567890
\t\tpath: /dev/ada0p3
\t\twhole_disk: 0
\t\tmetaslab_array: 71
\t\tmetaslab_shift: 24
\t\tashift: 9
\t\tasize: 10737418240
\t\tis_log: 0
\t\tcreate_txg: 4";

/// Fake runner keyed by the full command line, recording every call
#[derive(Default)]
struct MockRunner {
    responses: Mutex<HashMap<String, Output>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn add_command(&self, cmd: &str, stdout: &str, status: i32) {
        self.responses.lock().unwrap().insert(
            cmd.to_string(),
            Output {
                stdout: stdout.to_string(),
                stderr: if status == 0 { String::new() } else { "zdb: failure".to_string() },
                status,
            },
        );
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> Option<String> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Runner for MockRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        let cmd = format!("{program} {}", args.join(" "));
        self.calls.lock().unwrap().push(cmd.clone());

        self.responses
            .lock()
            .unwrap()
            .get(&cmd)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("mock command not found: {cmd}")))
    }
}

fn client(runner: &Arc<MockRunner>, ttl: Duration) -> ZdbClient {
    let command = ToolCommand::new("zdb").with_runner(runner.clone());
    ZdbClient::new(command, ttl)
}

#[test]
fn test_get_pool_parses_zdb_output() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    let client = client(&runner, Duration::zero());

    let pool = client.get_pool("tank", "").expect("Should fetch pool");

    assert_eq!(runner.last_call().as_deref(), Some("zdb -C tank"));
    assert_eq!(pool.name, "tank");
    assert_eq!(pool.guid, "");
    assert_eq!(pool.version, "5000");
    assert_eq!(pool.nodes.len(), 1);
    assert_eq!(pool.nodes[0].guid, Some(12345678901234567890));
    assert_eq!(pool.nodes[0].create_txg, Some(4));
}

#[test]
fn test_cache_hit_then_expiry() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    let client = client(&runner, Duration::milliseconds(100));

    let first = client.get_pool("tank", "").expect("first call should succeed");
    assert_eq!(runner.call_count(), 1);

    let second = client.get_pool("tank", "").expect("second call should succeed");
    assert_eq!(runner.call_count(), 1, "second call should be served from cache");
    assert!(Arc::ptr_eq(&first, &second));

    thread::sleep(StdDuration::from_millis(150));

    let third = client.get_pool("tank", "").expect("call after expiry should succeed");
    assert_eq!(runner.call_count(), 2, "expired entry should trigger a new zdb run");
    assert_eq!(*first, *third);
}

#[test]
fn test_disabled_cache_always_runs_zdb() {
    for ttl in [Duration::zero(), Duration::seconds(-1)] {
        let runner = MockRunner::new();
        runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
        let client = client(&runner, ttl);

        for _ in 0..3 {
            client.get_pool("tank", "").expect("Should fetch pool");
        }

        assert_eq!(runner.call_count(), 3);
        assert!(client.cache().is_empty());
    }
}

#[test]
fn test_failed_fetch_is_not_cached() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", "", 1);
    let client = client(&runner, Duration::seconds(60));

    let err = client.get_pool("tank", "").unwrap_err();
    assert!(matches!(err, ZdbError::Command(CommandError::Failed { status: 1, .. })));
    assert!(client.cache().is_empty());

    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    client.get_pool("tank", "").expect("retry should succeed");
    assert_eq!(runner.call_count(), 2, "the failure must not be served from cache");
}

#[test]
fn test_parse_failure_keeps_previous_entry() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    let client = client(&runner, Duration::milliseconds(50));

    client.get_pool("tank", "").expect("Should fetch pool");
    thread::sleep(StdDuration::from_millis(80));

    runner.add_command("zdb -C tank", "name: tank\n\ttype: root\n\t\tguid: not-a-number\n", 0);
    let err = client.get_pool("tank", "").unwrap_err();
    match err {
        ZdbError::Parse(ParseError::InvalidField { field, pool, .. }) => {
            assert_eq!(field, "guid");
            assert_eq!(pool, "tank");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let stale = client.cache().peek("tank").expect("old entry should remain");
    assert!(stale.is_expired);
    assert_eq!(stale.data.nodes[0].guid, Some(12345678901234567890));
}

#[test]
fn test_unknown_pool_propagates_runner_error() {
    let runner = MockRunner::new();
    let client = client(&runner, Duration::seconds(60));

    let err = client.get_pool("missing", "").unwrap_err();

    assert!(matches!(err, ZdbError::Command(CommandError::Spawn { .. })));
    assert!(err.to_string().contains("zdb -C missing"));
}

#[test]
fn test_clients_do_not_share_cache() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    let first = client(&runner, Duration::seconds(60));
    let second = client(&runner, Duration::seconds(60));

    first.get_pool("tank", "").expect("Should fetch pool");
    second.get_pool("tank", "").expect("Should fetch pool");

    assert_eq!(runner.call_count(), 2);
}

#[test]
fn test_concurrent_lookups_share_one_client() {
    let runner = MockRunner::new();
    runner.add_command("zdb -C tank", ZDB_OUTPUT, 0);
    let client = Arc::new(client(&runner, Duration::seconds(60)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.get_pool("tank", "").map(|pool| pool.nodes.len()))
        })
        .collect();

    for handle in handles {
        let nodes = handle.join().expect("worker panicked").expect("lookup failed");
        assert_eq!(nodes, 1);
    }

    // Misses racing on the same key may each run zdb; at least one must have.
    let calls = runner.call_count();
    assert!((1..=8).contains(&calls), "unexpected call count {calls}");
    assert_eq!(client.cache().len(), 1);
}
