//! Integration tests for the local session store

use std::sync::Arc;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use proptest::prelude::*;
use sessionstore::{LocalStore, StrategySession};
use tempfile::TempDir;

fn session(user: &str, id: &str, timestamp: &str) -> StrategySession {
    StrategySession {
        session_id: id.to_string(),
        user_id: user.to_string(),
        problem: format!("problem {}", id),
        context: "Industry: Retail".to_string(),
        response: format!("# Plan {}", id),
        timestamp: timestamp.to_string(),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_appends_lose_nothing() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(LocalStore::new(temp.path().join("sessions.json")));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..5 {
                    let s = StrategySession::new(format!("user-{}", t), format!("problem {}", i), "", "plan");
                    store.append(&s).expect("append failed");
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("writer thread panicked");
    }

    assert_eq!(store.count().unwrap(), 40);
    for t in 0..8 {
        assert_eq!(store.list(&format!("user-{}", t), 100).unwrap().len(), 5);
    }
}

// =============================================================================
// Ordering and limits
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_list_is_limited_and_newest_first(
        days in proptest::collection::vec(1u32..28, 0..12),
        limit in 0usize..15,
    ) {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("sessions.json"));

        for (i, day) in days.iter().enumerate() {
            let ts = format!("2024-01-{:02}T00:00:{:02}.000000Z", day, i);
            store.append(&session("u1", &format!("s{}", i), &ts)).unwrap();
        }
        store.append(&session("other", "foreign", "2099-01-01T00:00:00.000000Z")).unwrap();

        let listed = store.list("u1", limit).unwrap();

        prop_assert!(listed.len() <= limit);
        prop_assert_eq!(listed.len(), limit.min(days.len()));
        prop_assert!(listed.iter().all(|s| s.user_id == "u1"));
        prop_assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}

// =============================================================================
// CLI
// =============================================================================

#[test]
fn test_cli_count_and_list() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sessions.json");
    let store = LocalStore::new(&path);
    store.append(&session("u1", "abc", "2024-01-01T00:00:00.000000Z")).unwrap();

    Command::cargo_bin("ss")
        .unwrap()
        .arg("--file")
        .arg(&path)
        .arg("count")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions in"))
        .stdout(predicate::str::contains("1"));

    Command::cargo_bin("ss")
        .unwrap()
        .arg("--file")
        .arg(&path)
        .args(["list", "--user", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abc"))
        .stdout(predicate::str::contains("problem abc"));
}

#[test]
fn test_cli_show_missing_session_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sessions.json");

    Command::cargo_bin("ss")
        .unwrap()
        .arg("--file")
        .arg(&path)
        .args(["show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found"));
}
