use cvfolio::core::CvError;
use cvfolio::reconcile::{
    EditedCollection, OrderedRecord, ReconcilePlan, load_ordered, reconcile, serde_mapper,
};
use cvfolio::storage::{Document, DocumentStore, FlakyStore, MemoryDocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

const ITEMS: &str = "items";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    label: String,
}

fn item(label: &str) -> Item {
    Item {
        label: label.to_string(),
    }
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn labels(records: &[OrderedRecord<Item>]) -> Vec<&str> {
    records.iter().map(|r| r.payload.label.as_str()).collect()
}

fn orders(records: &[OrderedRecord<Item>]) -> Vec<u32> {
    records.iter().map(|r| r.order).collect()
}

/// Seeds `items` with the given labels in order and returns the stored records.
async fn seed<S: DocumentStore>(store: &S, names: &[&str]) -> Vec<OrderedRecord<Item>> {
    let edited: Vec<_> = names.iter().map(|n| OrderedRecord::new(item(n))).collect();
    reconcile(store, ITEMS, &edited, serde_mapper::<Item>)
        .await
        .unwrap()
        .records
}

#[tokio::test]
async fn mixed_edit_deletes_updates_and_creates_in_one_save() {
    let store = MemoryDocumentStore::new();
    store.set(ITEMS, "A", doc(json!({"label": "a", "order": 0}))).await.unwrap();
    store.set(ITEMS, "B", doc(json!({"label": "b", "order": 1}))).await.unwrap();
    store.set(ITEMS, "C", doc(json!({"label": "c", "order": 2}))).await.unwrap();

    let edited = vec![
        OrderedRecord::persisted("A", 0, item("X")),
        OrderedRecord::new(item("Y")),
        OrderedRecord::persisted("B", 1, item("Z")),
    ];
    let outcome = reconcile(&store, ITEMS, &edited, serde_mapper::<Item>)
        .await
        .unwrap();

    assert_eq!(outcome.deleted, vec!["C".to_string()]);
    assert_eq!(outcome.updated, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.receipt.deletes, 1);
    assert_eq!(outcome.receipt.writes, 3);

    assert_eq!(labels(&outcome.records), vec!["X", "Y", "Z"]);
    assert_eq!(orders(&outcome.records), vec![0, 1, 2]);
    assert_eq!(outcome.records[0].id.as_deref(), Some("A"));
    assert_eq!(outcome.records[1].id.as_ref(), outcome.created.first());
    assert_eq!(outcome.records[2].id.as_deref(), Some("B"));
    assert!(store.get(ITEMS, "C").await.unwrap().is_none());
}

#[tokio::test]
async fn orders_are_contiguous_after_every_save() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["a", "b", "c", "d", "e"]).await;
    assert_eq!(orders(&records), vec![0, 1, 2, 3, 4]);

    // Drop two from the middle, add one at the front.
    let mut edited = EditedCollection::from_records(records);
    edited.remove(3).unwrap();
    edited.remove(1).unwrap();
    edited.append(item("f"));
    edited.move_item(3, 0).unwrap();

    let outcome = reconcile(&store, ITEMS, edited.records(), serde_mapper::<Item>)
        .await
        .unwrap();
    assert_eq!(labels(&outcome.records), vec!["f", "a", "c", "e"]);
    assert_eq!(orders(&outcome.records), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn every_identity_left_out_is_deleted() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["a", "b", "c"]).await;
    let kept = records[1].clone();

    let outcome = reconcile(&store, ITEMS, &[kept.clone()], serde_mapper::<Item>)
        .await
        .unwrap();

    let remaining: HashSet<String> = store.list_ids(ITEMS).await.unwrap();
    assert_eq!(remaining, HashSet::from([kept.id.clone().unwrap()]));
    assert_eq!(outcome.deleted.len(), 2);
    assert_eq!(store.document_count(ITEMS).await, 1);
}

#[tokio::test]
async fn saving_an_empty_list_clears_the_collection() {
    let store = MemoryDocumentStore::new();
    seed(&store, &["a", "b"]).await;

    let outcome = reconcile::<_, Item, _>(&store, ITEMS, &[], serde_mapper::<Item>)
        .await
        .unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.deleted.len(), 2);
    assert!(store.list_ids(ITEMS).await.unwrap().is_empty());
}

#[tokio::test]
async fn new_records_receive_distinct_identities() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["a", "b", "c", "d"]).await;

    let ids: HashSet<_> = records.iter().filter_map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), 4);
    assert!(records.iter().all(|r| !r.is_new()));
}

#[tokio::test]
async fn failed_commit_writes_nothing() {
    let store = FlakyStore::new(MemoryDocumentStore::new());
    let before = seed(&store, &["a", "b", "c"]).await;

    let mut edited = EditedCollection::from_records(before.clone());
    edited.remove(0).unwrap();
    edited.replace(0, item("changed")).unwrap();
    edited.append(item("new"));
    let snapshot = edited.clone();

    store.fail_next_commits(1);
    let err = reconcile(&store, ITEMS, edited.records(), serde_mapper::<Item>)
        .await
        .unwrap_err();
    assert!(matches!(err, CvError::Persistence(_)), "{err:?}");

    let after: Vec<OrderedRecord<Item>> = load_ordered(&store, ITEMS).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(edited, snapshot);

    // The same edited list succeeds on retry.
    let outcome = reconcile(&store, ITEMS, edited.records(), serde_mapper::<Item>)
        .await
        .unwrap();
    assert_eq!(labels(&outcome.records), vec!["changed", "c", "new"]);
    assert_eq!(store.commit_attempts(), 3);
}

#[tokio::test]
async fn unreadable_store_fails_before_any_write() {
    let store = FlakyStore::new(MemoryDocumentStore::new());
    seed(&store, &["a"]).await;

    store.fail_next_reads(1);
    let err = reconcile(&store, ITEMS, &[OrderedRecord::new(item("b"))], serde_mapper::<Item>)
        .await
        .unwrap_err();
    assert!(matches!(err, CvError::Fetch(_)), "{err:?}");
    assert_eq!(store.commit_attempts(), 1);
    assert_eq!(store.inner().document_count(ITEMS).await, 1);
}

#[tokio::test]
async fn moving_back_and_forth_is_a_no_op() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["a", "b", "c", "d"]).await;

    let mut edited = EditedCollection::from_records(records.clone());
    edited.move_item(0, 3).unwrap();
    edited.move_item(3, 0).unwrap();
    assert_eq!(edited.records(), records.as_slice());

    let outcome = reconcile(&store, ITEMS, edited.records(), serde_mapper::<Item>)
        .await
        .unwrap();
    assert_eq!(outcome.records, records);
    assert!(outcome.created.is_empty());
    assert!(outcome.deleted.is_empty());
}

#[tokio::test]
async fn saved_list_reloads_unchanged() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["x", "y", "z"]).await;

    let reloaded: Vec<OrderedRecord<Item>> = load_ordered(&store, ITEMS).await.unwrap();
    assert_eq!(reloaded, records);

    let again = reconcile(&store, ITEMS, &reloaded, serde_mapper::<Item>)
        .await
        .unwrap();
    assert_eq!(again.records, records);
}

#[tokio::test]
async fn duplicate_identities_are_rejected_before_touching_the_store() {
    let store = FlakyStore::new(MemoryDocumentStore::new());
    let records = seed(&store, &["a", "b"]).await;

    let edited = vec![records[0].clone(), records[1].clone(), records[0].clone()];
    let err = reconcile(&store, ITEMS, &edited, serde_mapper::<Item>)
        .await
        .unwrap_err();

    match err {
        CvError::Validation(errors) => assert!(errors.has("[2].id")),
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(store.commit_attempts(), 1);
}

#[tokio::test]
async fn identity_missing_from_the_store_is_recreated() {
    let store = MemoryDocumentStore::new();
    let records = seed(&store, &["a"]).await;
    let id = records[0].id.clone().unwrap();

    // Someone deleted it between load and save.
    store.delete(ITEMS, &id).await.unwrap();

    let outcome = reconcile(&store, ITEMS, &records, serde_mapper::<Item>)
        .await
        .unwrap();
    assert_eq!(outcome.records, records);
    assert_eq!(outcome.updated, vec![id]);
}

#[test]
fn plan_lists_deletes_before_writes() {
    let persisted = HashSet::from(["A".to_string(), "B".to_string(), "C".to_string()]);
    let edited = vec![
        OrderedRecord::persisted("A", 0, item("X")),
        OrderedRecord::new(item("Y")),
        OrderedRecord::persisted("B", 1, item("Z")),
    ];
    let plan = ReconcilePlan::compute(&persisted, &edited, || "N".to_string()).unwrap();
    assert_eq!(plan.deletes, vec!["C".to_string()]);

    let writes: Vec<(&str, u32, bool)> = plan
        .writes
        .iter()
        .map(|w| (w.id.as_str(), w.order, w.created))
        .collect();
    assert_eq!(writes, vec![("A", 0, false), ("N", 1, true), ("B", 2, false)]);

    let batch = plan.to_batch(ITEMS, &edited, &serde_mapper::<Item>).unwrap();
    assert_eq!(batch.len(), 4);
}
