//! Collection store integration tests
//!
//! Exercises persistence, filtering, ranking, and deletion invariants with
//! hand-built vectors; no embedding model required.

use notedex::store::{
    CollectionSpec, CollectionStore, DocumentRecord, DocumentSet, EntryMetadata, EntryRecord,
    IMAGE_COLLECTION, TEXT_COLLECTION,
};
use notedex::NotedexError;
use std::path::PathBuf;
use tempfile::TempDir;

const DIM: usize = 4;

fn specs() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec {
            name: TEXT_COLLECTION.to_string(),
            dimension: DIM,
            model: "stub-text".to_string(),
        },
        CollectionSpec {
            name: IMAGE_COLLECTION.to_string(),
            dimension: DIM,
            model: "stub-image".to_string(),
        },
    ]
}

fn db_path(temp: &TempDir) -> PathBuf {
    temp.path().join("store.sqlite")
}

fn open(temp: &TempDir) -> CollectionStore {
    CollectionStore::open(&db_path(temp), &specs()).unwrap()
}

fn document(id: &str, name: &str) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        name: name.to_string(),
        origin: "text".to_string(),
        created_at: 1_700_000_000,
    }
}

fn entry(id: &str, doc: &str, index: usize, vector: Vec<f32>, text: &str) -> EntryRecord {
    EntryRecord {
        id: id.to_string(),
        vector,
        text: text.to_string(),
        metadata: EntryMetadata {
            document_id: doc.to_string(),
            document_name: format!("{}.txt", doc),
            sequence_index: index,
            content_type: "text".to_string(),
        },
    }
}

fn allowed(ids: &[&str]) -> DocumentSet {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn insert_and_search_ranks_by_cosine() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[
                entry("c1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "east"),
                entry("c2", "a", 1, vec![0.0, 1.0, 0.0, 0.0], "north"),
                entry("c3", "a", 2, vec![0.9, 0.1, 0.0, 0.0], "mostly east"),
            ],
        )
        .unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &[1.0, 0.0, 0.0, 0.0], 3, &allowed(&["a"]))
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "c1");
    assert_eq!(hits[1].id, "c3");
    assert_eq!(hits[2].id, "c2");
    assert!(hits[0].score > 0.99);
    assert!(hits[1].score > 0.9);
    assert!(hits[2].score.abs() < 1e-6);
    assert!(hits[0].score <= 1.0 + 1e-6);
}

#[test]
fn vectors_are_normalized_on_insert() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    // magnitude must not affect similarity
    store
        .insert(
            TEXT_COLLECTION,
            &[entry("c1", "a", 0, vec![20.0, 0.0, 0.0, 0.0], "scaled")],
        )
        .unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &[0.5, 0.0, 0.0, 0.0], 1, &allowed(&["a"]))
        .unwrap();
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn duplicate_id_rolls_back_whole_batch() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[entry("c1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "first")],
        )
        .unwrap();

    let result = store.insert(
        TEXT_COLLECTION,
        &[
            entry("c2", "a", 1, vec![0.0, 1.0, 0.0, 0.0], "new"),
            entry("c1", "a", 2, vec![0.0, 0.0, 1.0, 0.0], "conflict"),
        ],
    );

    match result {
        Err(NotedexError::DuplicateId { collection, id }) => {
            assert_eq!(collection, TEXT_COLLECTION);
            assert_eq!(id, "c1");
        }
        other => panic!("expected DuplicateId, got {:?}", other.err()),
    }

    // c2 must not have survived the failed batch
    assert_eq!(store.count(TEXT_COLLECTION).unwrap(), 1);
}

#[test]
fn same_id_in_both_collections_is_allowed() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[entry("e1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "text")],
        )
        .unwrap();
    store
        .insert(
            IMAGE_COLLECTION,
            &[entry("e1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "a diagram")],
        )
        .unwrap();

    assert_eq!(store.count(TEXT_COLLECTION).unwrap(), 1);
    assert_eq!(store.count(IMAGE_COLLECTION).unwrap(), 1);
}

#[test]
fn dimension_mismatch_is_rejected_on_insert_and_search() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    let result = store.insert(
        TEXT_COLLECTION,
        &[entry("c1", "a", 0, vec![1.0, 0.0], "too short")],
    );
    assert!(matches!(
        result,
        Err(NotedexError::DimensionMismatch { expected: 4, actual: 2, .. })
    ));

    let result = store.search(TEXT_COLLECTION, &[1.0, 0.0], 1, &allowed(&["a"]));
    assert!(matches!(
        result,
        Err(NotedexError::DimensionMismatch { expected: 4, actual: 2, .. })
    ));
}

#[test]
fn empty_filter_returns_empty_result() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[entry("c1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "content")],
        )
        .unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &[1.0, 0.0, 0.0, 0.0], 5, &DocumentSet::default())
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn filter_isolates_documents() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "biology")).unwrap();
    store.register_document(&document("b", "chemistry")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[
                // b's entry matches the query exactly; a's barely at all
                entry("a1", "a", 0, vec![0.1, 0.9, 0.0, 0.0], "a content"),
                entry("b1", "b", 0, vec![1.0, 0.0, 0.0, 0.0], "b content"),
            ],
        )
        .unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &[1.0, 0.0, 0.0, 0.0], 5, &allowed(&["a"]))
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.document_id, "a");
}

#[test]
fn equal_scores_rank_by_insertion_order() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    let same = vec![0.0, 0.0, 1.0, 0.0];
    store
        .insert(
            TEXT_COLLECTION,
            &[
                entry("first", "a", 0, same.clone(), "inserted first"),
                entry("second", "a", 1, same.clone(), "inserted second"),
                entry("third", "a", 2, same.clone(), "inserted third"),
            ],
        )
        .unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &same, 3, &allowed(&["a"]))
        .unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn k_truncates_results() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    let entries: Vec<EntryRecord> = (0..10)
        .map(|i| {
            entry(
                &format!("c{}", i),
                "a",
                i,
                vec![1.0, i as f32 * 0.01, 0.0, 0.0],
                "chunk",
            )
        })
        .collect();
    store.insert(TEXT_COLLECTION, &entries).unwrap();

    let hits = store
        .search(TEXT_COLLECTION, &[1.0, 0.0, 0.0, 0.0], 3, &allowed(&["a"]))
        .unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn delete_cascades_and_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("a", "notes")).unwrap();
    store.register_document(&document("b", "slides")).unwrap();
    store
        .insert(
            TEXT_COLLECTION,
            &[
                entry("a1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "one"),
                entry("a2", "a", 1, vec![0.0, 1.0, 0.0, 0.0], "two"),
                entry("a3", "a", 2, vec![0.0, 0.0, 1.0, 0.0], "three"),
                entry("b1", "b", 0, vec![0.0, 0.0, 0.0, 1.0], "other"),
            ],
        )
        .unwrap();
    store
        .insert(
            IMAGE_COLLECTION,
            &[entry("ai1", "a", 0, vec![1.0, 0.0, 0.0, 0.0], "a figure")],
        )
        .unwrap();

    let report = store.delete(&allowed(&["a"])).unwrap();
    assert_eq!(report.documents, 1);
    assert_eq!(report.text_entries, 3);
    assert_eq!(report.image_entries, 1);
    assert_eq!(report.total_entries(), 4);

    // every trace of "a" is gone, "b" is untouched
    let hits = store
        .search(TEXT_COLLECTION, &[1.0, 0.0, 0.0, 0.0], 10, &allowed(&["a", "b"]))
        .unwrap();
    assert!(hits.iter().all(|h| h.metadata.document_id == "b"));

    let docs = store.list_documents().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document_id, "b");

    // deleting again is a no-op, not an error
    let report = store.delete(&allowed(&["a"])).unwrap();
    assert_eq!(report.documents, 0);
    assert_eq!(report.total_entries(), 0);
}

#[test]
fn list_documents_preserves_ingestion_order() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    store.register_document(&document("z", "last-alphabetically")).unwrap();
    store.register_document(&document("a", "first-alphabetically")).unwrap();

    let docs = store.list_documents().unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.document_id.as_str()).collect();
    assert_eq!(ids, vec!["z", "a"]);
}

#[test]
fn store_survives_reopen() {
    let temp = TempDir::new().unwrap();

    {
        let store = open(&temp);
        store.register_document(&document("a", "notes")).unwrap();
        store
            .insert(
                TEXT_COLLECTION,
                &[entry("c1", "a", 0, vec![0.0, 1.0, 0.0, 0.0], "persisted")],
            )
            .unwrap();
    }

    let store = open(&temp);
    let hits = store
        .search(TEXT_COLLECTION, &[0.0, 1.0, 0.0, 0.0], 1, &allowed(&["a"]))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "persisted");
    assert_eq!(store.list_documents().unwrap().len(), 1);
}

#[test]
fn reopening_with_changed_dimension_fails() {
    let temp = TempDir::new().unwrap();
    {
        let _store = open(&temp);
    }

    let mut changed = specs();
    changed[0].dimension = 8;
    let result = CollectionStore::open(&db_path(&temp), &changed);
    assert!(matches!(
        result,
        Err(NotedexError::DimensionMismatch { expected: 8, actual: 4, .. })
    ));
}

#[test]
fn reopening_with_changed_model_fails() {
    let temp = TempDir::new().unwrap();
    {
        let _store = open(&temp);
    }

    let mut changed = specs();
    changed[1].model = "other-model".to_string();
    let result = CollectionStore::open(&db_path(&temp), &changed);
    assert!(matches!(result, Err(NotedexError::Config(_))));
}

#[test]
fn unknown_collection_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    let result = store.search("audio_transcripts", &[0.0; 4], 1, &allowed(&["a"]));
    assert!(matches!(result, Err(NotedexError::UnknownCollection(_))));
}

#[test]
fn commit_document_is_atomic() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp);

    let text_entries = vec![
        entry("t1", "doc", 0, vec![1.0, 0.0, 0.0, 0.0], "alpha"),
        entry("t1", "doc", 1, vec![0.0, 1.0, 0.0, 0.0], "duplicate id"),
    ];
    let result = store.commit_document(
        &document("doc", "broken"),
        &[(TEXT_COLLECTION, text_entries.as_slice())],
    );
    assert!(matches!(result, Err(NotedexError::DuplicateId { .. })));

    // neither the document nor the first entry became visible
    let stats = store.stats().unwrap();
    assert_eq!(stats.documents, 0);
    assert_eq!(stats.text_entries, 0);

    // a clean commit on the same store works
    let text_entries = vec![entry("t1", "doc", 0, vec![1.0, 0.0, 0.0, 0.0], "alpha")];
    store
        .commit_document(
            &document("doc", "fixed"),
            &[(TEXT_COLLECTION, text_entries.as_slice())],
        )
        .unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.text_entries, 1);
}
