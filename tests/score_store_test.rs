//! Integration tests for the adaptive score store

mod common;

use common::create_test_storage;
use memebot_core::{MemebotError, ScoreQueue, StorageBackend, TouchedWord};

#[tokio::test]
async fn test_score_accumulation_is_order_independent() {
    let store = create_test_storage().await;

    store.storage.get_or_create_word("bar", "foo").await.unwrap();
    store.storage.apply_score_delta("bar", 3).await.unwrap();
    let forward = store.storage.apply_score_delta("bar", -1).await.unwrap();

    store.storage.get_or_create_word("baz", "foo").await.unwrap();
    store.storage.apply_score_delta("baz", -1).await.unwrap();
    let reverse = store.storage.apply_score_delta("baz", 3).await.unwrap();

    assert_eq!(forward.score, 2);
    assert_eq!(reverse.score, 2);
    assert_eq!(store.storage.get_word("bar").await.unwrap().mutated, "foo");
}

#[tokio::test]
async fn test_concurrent_deltas_are_not_lost() {
    let store = create_test_storage().await;
    store.storage.get_or_create_word("bar", "foo").await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let storage = store.storage.clone();
        let delta = if i % 2 == 0 { 3 } else { -1 };
        tasks.push(tokio::spawn(async move {
            storage.apply_score_delta("bar", delta).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // 10 × 3 + 10 × -1
    assert_eq!(store.storage.get_word("bar").await.unwrap().score, 20);
}

#[tokio::test]
async fn test_score_queue_serializes_updates() {
    let store = create_test_storage().await;
    let (queue, _worker) = ScoreQueue::spawn(store.backend());
    let word = TouchedWord {
        word: "Hello,".to_string(),
        mutated: "Foo,".to_string(),
    };

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let queue = queue.clone();
        let word = word.clone();
        tasks.push(tokio::spawn(async move { queue.apply(&word, 2).await.unwrap() }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let record = store.storage.get_word("Hello,").await.unwrap();
    assert_eq!(record.score, 20);
    assert_eq!(record.mutated, "Foo,");
}

#[tokio::test]
async fn test_missing_records_are_reported() {
    let store = create_test_storage().await;
    assert!(matches!(
        store.storage.get_word("nothing").await,
        Err(MemebotError::RecordNotFound(_))
    ));
    assert!(matches!(
        store.storage.get_server("nowhere").await,
        Err(MemebotError::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_top_words_ranking() {
    let store = create_test_storage().await;
    for (word, score) in [("alpha", 1), ("bravo", 7), ("charlie", -3), ("delta", 7)] {
        store.storage.get_or_create_word(word, "x").await.unwrap();
        store.storage.apply_score_delta(word, score).await.unwrap();
    }

    let top = store.storage.top_words(3).await.unwrap();
    let names: Vec<&str> = top.iter().map(|w| w.original.as_str()).collect();
    assert_eq!(names, vec!["bravo", "delta", "alpha"]);
}

#[tokio::test]
async fn test_storage_survives_reopen() {
    let store = create_test_storage().await;
    let path = store.dir.path().join("memebot_test.db");
    store.storage.apply_score_delta("kept", 5).await.unwrap();
    store.storage.record_mutation("g1").await.unwrap();

    let reopened = memebot_core::SqliteStorage::open(&path, 10).await.unwrap();
    assert_eq!(reopened.get_word("kept").await.unwrap().score, 5);
    let stats = reopened.global_stats().await.unwrap();
    assert_eq!(stats.mutation_count, 1);
    assert_eq!(stats.total_servers, 1);
}
