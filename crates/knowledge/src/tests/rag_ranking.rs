//! Ranking behaviour of vector search over the SQLite index.

use crate::chunk::ChunkMetadata;
use crate::index::SqliteIndex;
use crate::parser::ContentType;
use crate::rag::SearchFilters;
use crate::types::{DocumentRecord, DocumentStatus, KnowledgeChunk};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use tempfile::TempDir;

fn open_index(temp: &TempDir) -> SqliteIndex {
    SqliteIndex::open(&temp.path().join("index.sqlite")).unwrap()
}

fn add_document(index: &SqliteIndex, id: &str) {
    index
        .insert_document(&DocumentRecord {
            id: id.to_string(),
            filename: format!("{}.txt", id),
            file_type: ContentType::PlainText,
            path: format!("/docs/{}.txt", id),
            content_hash: format!("hash-{}", id),
            size_bytes: 100,
            status: DocumentStatus::Completed,
            error_message: None,
            chunk_count: 0,
            strategy: Some("simple".to_string()),
            created_at: Utc::now(),
            processed_at: Some(Utc::now()),
        })
        .unwrap();
}

fn test_chunk(id: &str, document_id: &str, position: u32, embedding: Vec<f32>) -> KnowledgeChunk {
    KnowledgeChunk {
        id: id.to_string(),
        document_id: document_id.to_string(),
        position,
        text: format!("Text of {}", id),
        embedding: Some(embedding),
        metadata: ChunkMetadata {
            chunk_index: position as usize,
            ..Default::default()
        },
    }
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[test]
fn test_relevant_chunk_ranks_first() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");

    index
        .upsert_chunks(&[
            test_chunk("rent", "lease", 0, normalize(&[1.0, 0.5, 0.2, 0.1])),
            test_chunk("pets", "lease", 1, normalize(&[-0.3, -0.8, 0.4, -0.2])),
        ])
        .unwrap();

    let query = normalize(&[0.9, 0.4, 0.3, 0.1]);
    let results = index.search(&query, &SearchFilters::new()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, "rent", "Most relevant chunk should be first");
    assert!(results[0].1 > 0.8, "Relevant chunk score should be high: {}", results[0].1);
    assert!(results[0].1 > results[1].1);
}

#[test]
fn test_orthogonal_chunk_scores_low() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");

    index
        .upsert_chunk(&test_chunk("rent", "lease", 0, normalize(&[1.0, 0.0, 0.0, 0.0])))
        .unwrap();

    let query = normalize(&[0.0, 1.0, 0.0, 0.0]);
    let results = index.search(&query, &SearchFilters::new()).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].1.abs() < 1e-6, "Orthogonal score: {}", results[0].1);
}

#[test]
fn test_scores_are_ordered_descending() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");

    index
        .upsert_chunks(&[
            test_chunk("a", "lease", 0, normalize(&[1.0, 0.0, 0.0])),
            test_chunk("b", "lease", 1, normalize(&[0.7, 0.7, 0.0])),
            test_chunk("c", "lease", 2, normalize(&[0.0, 1.0, 0.0])),
            test_chunk("d", "lease", 3, normalize(&[-1.0, 0.0, 0.0])),
        ])
        .unwrap();

    let query = normalize(&[1.0, 0.0, 0.0]);
    let results = index
        .search(&query, &SearchFilters::new().with_limit(10))
        .unwrap();

    let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    for pair in results.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
    assert!(results[0].1 > 0.99, "Perfect match should score near 1.0");
    assert!(results[3].1 < -0.9, "Opposite vector should score near -1.0");
}

#[test]
fn test_min_score_drops_opposite_chunks() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");

    index
        .upsert_chunks(&[
            test_chunk("same", "lease", 0, normalize(&[1.0, 0.0])),
            test_chunk("opposite", "lease", 1, normalize(&[-1.0, 0.0])),
        ])
        .unwrap();

    let filters = SearchFilters::new().with_min_score(0.0);
    let results = index.search(&normalize(&[1.0, 0.0]), &filters).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.id, "same");
}

#[test]
fn test_document_filter_restricts_results() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");
    add_document(&index, "insurance");

    index
        .upsert_chunks(&[
            test_chunk("lease-0", "lease", 0, normalize(&[1.0, 0.0])),
            test_chunk("insurance-0", "insurance", 0, normalize(&[1.0, 0.1])),
            test_chunk("insurance-1", "insurance", 1, normalize(&[0.5, 0.5])),
        ])
        .unwrap();

    let filters = SearchFilters::new().with_document("insurance");
    let results = index.search(&normalize(&[1.0, 0.0]), &filters).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(c, _)| c.document_id == "insurance"));
    assert_eq!(results[0].0.id, "insurance-0");
}

#[test]
fn test_empty_index_returns_no_results() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp);

    let results = index
        .search(&normalize(&[1.0, 0.0, 0.0]), &SearchFilters::new())
        .unwrap();
    assert!(results.is_empty(), "Empty index should return no results");
}

#[test]
fn test_limit_respected() {
    let temp = TempDir::new().unwrap();
    let mut index = open_index(&temp);
    add_document(&index, "lease");

    let chunks: Vec<KnowledgeChunk> = (0..10)
        .map(|i| {
            test_chunk(
                &format!("chunk{}", i),
                "lease",
                i,
                normalize(&[1.0, i as f32 / 10.0, 0.0]),
            )
        })
        .collect();
    index.upsert_chunks(&chunks).unwrap();

    let results = index
        .search(&normalize(&[1.0, 0.0, 0.0]), &SearchFilters::new().with_limit(3))
        .unwrap();

    assert_eq!(results.len(), 3, "Should return exactly limit results");
    assert_eq!(results[0].0.id, "chunk0");
}
