use chrono::Utc;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::Embedding;
use ragdb_core::Error;
use ragdb_vector::InMemoryVectorStore;

fn embedding(id: &str, chunk_id: &str, vector: Vec<f32>) -> Embedding {
    Embedding {
        id: id.to_string(),
        chunk_id: chunk_id.to_string(),
        vector,
        model: "test".to_string(),
        tokens_used: 1,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn upsert_by_id_is_idempotent() {
    let store = InMemoryVectorStore::new();
    store.save_embedding(embedding("a", "c1", vec![1.0, 0.0])).await.unwrap();
    store.save_embedding(embedding("a", "c1", vec![0.0, 1.0])).await.unwrap();
    assert_eq!(store.len().await, 1);
    let got = store.get_embedding("a").await.unwrap();
    assert_eq!(got.vector, vec![0.0, 1.0], "second save wins");
}

#[tokio::test]
async fn missing_id_is_not_found() {
    let store = InMemoryVectorStore::new();
    let err = store.get_embedding("nope").await.expect_err("absent id");
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn search_orders_by_descending_similarity() {
    let store = InMemoryVectorStore::new();
    store
        .save_embeddings(vec![
            embedding("exact", "c1", vec![1.0, 0.0, 0.0]),
            embedding("close", "c2", vec![0.9, 0.1, 0.0]),
            embedding("far", "c3", vec![0.0, 0.0, 1.0]),
        ])
        .await
        .unwrap();

    let hits = store.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "close", "far"]);

    let top1 = store.search(&[1.0, 0.0, 0.0], 1).await.unwrap();
    assert_eq!(top1.len(), 1);
    assert_eq!(top1[0].id, "exact");
}

#[tokio::test]
async fn delete_by_chunk_removes_every_derived_embedding() {
    let store = InMemoryVectorStore::new();
    store
        .save_embeddings(vec![
            embedding("a", "chunk-1", vec![1.0, 0.0]),
            embedding("b", "chunk-1", vec![0.0, 1.0]),
            embedding("c", "chunk-2", vec![0.5, 0.5]),
        ])
        .await
        .unwrap();

    store.delete_by_chunk_id("chunk-1").await.unwrap();
    assert_eq!(store.len().await, 1);
    assert!(store.get_embedding("c").await.is_ok());
}

#[tokio::test]
async fn delete_embedding_is_tolerant_of_absent_ids() {
    let store = InMemoryVectorStore::new();
    store.save_embedding(embedding("a", "c", vec![1.0])).await.unwrap();
    store.delete_embedding("a").await.unwrap();
    store.delete_embedding("a").await.unwrap();
    assert!(store.is_empty().await);
}
