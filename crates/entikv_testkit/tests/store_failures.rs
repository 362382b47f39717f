//! Behaviour when the store fails: surfaced once, never retried, never
//! partially applied.

use entikv_core::{AttributeRecord, ClientConfig, CoreError, CreateOptions, EntityCollection, StoreClient};
use entikv_store::{InMemoryStore, KvStore, StoreError};
use entikv_testkit::prelude::*;
use std::sync::Arc;

struct Harness {
    memory: Arc<InMemoryStore>,
    recording: Arc<RecordingStore>,
    categories: EntityCollection,
    workspaces: EntityCollection,
}

fn harness(kind: StoreCall, nth: usize) -> Harness {
    init_tracing();
    let memory = Arc::new(InMemoryStore::new().with_table(TEST_TABLE));
    let faulty = Arc::new(FaultyStore::new(memory.clone(), kind, nth));
    let recording = Arc::new(RecordingStore::new(faulty));
    let client = StoreClient::connect(recording.clone(), ClientConfig::new(TEST_TABLE)).unwrap();
    let (category, workspace) = scenarios::category_and_workspace();
    Harness {
        memory,
        recording,
        categories: EntityCollection::new(client.clone(), category),
        workspaces: EntityCollection::new(client, workspace),
    }
}

fn rows(memory: &InMemoryStore) -> usize {
    memory.describe_table(TEST_TABLE).unwrap().item_count
}

#[test]
fn failed_create_is_not_retried_and_leaves_nothing() {
    let h = harness(StoreCall::TransactWrite, 1);

    let err = h
        .categories
        .create(None, AttributeRecord::new("red"), CreateOptions::new())
        .unwrap_err();

    assert!(matches!(err, CoreError::Backend(StoreError::Unavailable(_))));
    assert_eq!(h.recording.count(StoreCall::TransactWrite), 1);
    assert_eq!(rows(&h.memory), 0);

    // the label is still free afterwards
    h.categories
        .create(None, AttributeRecord::new("red"), CreateOptions::new())
        .unwrap();
    assert_eq!(rows(&h.memory), 2);
}

#[test]
fn failed_get_surfaces_backend_error() {
    let h = harness(StoreCall::GetItem, 1);
    let item = h
        .categories
        .create(None, AttributeRecord::new("red"), CreateOptions::new())
        .unwrap();

    assert!(matches!(h.categories.get(&item), Err(CoreError::Backend(_))));
    assert_eq!(h.recording.count(StoreCall::GetItem), 1);
    assert!(h.categories.get(&item).is_ok());
}

#[test]
fn scan_failure_mid_listing_fails_the_whole_listing() {
    // six rows at two per page; the second page fails
    let memory = Arc::new(InMemoryStore::new().with_table(TEST_TABLE));
    let faulty = Arc::new(FaultyStore::new(memory.clone(), StoreCall::Scan, 2));
    let client = StoreClient::connect(
        faulty,
        ClientConfig::new(TEST_TABLE).scan_page_size(Some(2)),
    )
    .unwrap();
    let (category, _) = scenarios::category_and_workspace();
    let categories = EntityCollection::new(client, category);
    for label in ["a", "b", "c"] {
        categories
            .create(None, AttributeRecord::new(label), CreateOptions::new())
            .unwrap();
    }

    assert!(matches!(categories.all(None, &[]), Err(CoreError::Backend(_))));
    assert_eq!(categories.all(None, &[]).unwrap().len(), 3);
}

#[test]
fn failed_counter_update_changes_nothing() {
    let h = harness(StoreCall::TransactWrite, 2);
    let item = h
        .categories
        .create(None, AttributeRecord::new("red"), CreateOptions::new())
        .unwrap();

    assert!(h.categories.increment(&item, "hits").is_err());
    assert_eq!(h.categories.get(&item).unwrap().get("hits"), None);
    assert_eq!(h.recording.count(StoreCall::TransactWrite), 2);
}

#[test]
fn failed_child_create_does_not_bump_parent_counter() {
    let h = harness(StoreCall::TransactWrite, 2);
    let parent = h
        .categories
        .create(None, AttributeRecord::new("P"), CreateOptions::new())
        .unwrap();

    let options = CreateOptions::new().with_parent_counter("child_count");
    assert!(h
        .workspaces
        .create(Some(&parent), AttributeRecord::new("red"), options)
        .is_err());

    assert_eq!(h.categories.get(&parent).unwrap().get("child_count"), None);
    assert_eq!(rows(&h.memory), 2);
}

#[test]
fn connect_fails_when_describe_fails() {
    let memory = Arc::new(InMemoryStore::new().with_table(TEST_TABLE));
    let faulty = Arc::new(FaultyStore::new(memory, StoreCall::DescribeTable, 1));
    let err = StoreClient::connect(faulty, ClientConfig::new(TEST_TABLE)).unwrap_err();
    assert!(matches!(err, CoreError::Backend(StoreError::Unavailable(_))));
}
