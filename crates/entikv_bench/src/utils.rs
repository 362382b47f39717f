//! Benchmark utilities.

use entikv_codec::Value;
use entikv_core::{
    AttributeRecord, ClientConfig, CreateOptions, EntityCollection, EntityItem, EntityType,
    StoreClient,
};
use entikv_store::InMemoryStore;
use rand::Rng;
use std::sync::Arc;

/// Table used by every benchmark.
pub const BENCH_TABLE: &str = "entikv-bench";

/// Generate a random alphanumeric string of the specified length.
pub fn random_text(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Generate a record with `fields` random text attributes.
pub fn random_record(label: impl Into<String>, fields: usize) -> AttributeRecord {
    let mut rng = rand::thread_rng();
    (0..fields).fold(AttributeRecord::new(label), |record, i| {
        let value = if rng.gen_bool(0.5) {
            Value::Integer(rng.gen())
        } else {
            Value::Text(random_text(16))
        };
        record.with_attribute(format!("field_{i}"), value)
    })
}

/// A fresh in-memory table with "category" and "workspace" collections.
pub fn collections(page_size: Option<usize>) -> (EntityCollection, EntityCollection) {
    let store = Arc::new(InMemoryStore::new().with_table(BENCH_TABLE));
    let client = StoreClient::connect(
        store,
        ClientConfig::new(BENCH_TABLE).scan_page_size(page_size),
    )
    .expect("in-memory table exists");
    let category = EntityType::new("wc").expect("valid prefix");
    let workspace = EntityType::composite("w", &category).expect("valid composite type");
    (
        EntityCollection::new(client.clone(), category),
        EntityCollection::new(client, workspace),
    )
}

/// Create one category holding `children` workspaces.
pub fn populate(
    categories: &EntityCollection,
    workspaces: &EntityCollection,
    children: usize,
) -> EntityItem {
    let parent = categories
        .create(None, random_record(random_text(12), 2), CreateOptions::new())
        .expect("create category");
    for i in 0..children {
        workspaces
            .create(
                Some(&parent),
                random_record(format!("w-{i}"), 4),
                CreateOptions::new(),
            )
            .expect("create workspace");
    }
    parent
}
