use esl_rag::{
    Collection, DuckdbVectorRepository, Embedding, MetadataFilter, VectorDocument, VectorQuery,
    VectorRepository,
};
use tempfile::tempdir;

fn unit_vector(dim: usize, hot_index: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot_index] = 1.0;
    v
}

fn template_doc(id: i64, class_id: i64, level: &str) -> VectorDocument {
    VectorDocument::new(
        format!("homework_template_{}", id),
        Collection::HomeworkTemplates,
        format!("Template Name: Template {}", id),
    )
    .with_metadata_value("template_id", id.to_string())
    .with_metadata_value("class_id", class_id.to_string())
    .with_metadata_value("proficiency_level", level)
    .stamped()
}

fn embedding_for(doc: &VectorDocument, hot_index: usize) -> Embedding {
    Embedding::new(
        doc.id().to_string(),
        unit_vector(384, hot_index),
        "mock".to_string(),
    )
}

#[tokio::test]
async fn duckdb_vector_repository_can_upsert_and_search() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = DuckdbVectorRepository::new(&db_path).expect("duckdb init");

    let docs = vec![template_doc(1, 1, "Beginner"), template_doc(2, 1, "Advanced")];
    let embeddings = vec![embedding_for(&docs[0], 0), embedding_for(&docs[1], 1)];
    repo.upsert(Collection::HomeworkTemplates, &docs, &embeddings)
        .await
        .expect("upsert");

    let query = VectorQuery::new("travel").with_limit(2);
    let results = repo
        .search(Collection::HomeworkTemplates, &unit_vector(384, 1), &query)
        .await
        .expect("search");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document().id(), "homework_template_2");
    assert!(results[0].score() > 0.99, "expected near-identical score");
    assert_eq!(results[0].record_id("template_id"), Some(2));
    assert!(results[0].document().content_hash().is_some());
}

#[tokio::test]
async fn search_applies_metadata_filters_before_limit() {
    let repo = DuckdbVectorRepository::in_memory().expect("duckdb init");

    let docs = vec![
        template_doc(1, 1, "Beginner"),
        template_doc(2, 1, "Beginner"),
        template_doc(3, 2, "Beginner"),
    ];
    let embeddings: Vec<_> = docs
        .iter()
        .enumerate()
        .map(|(i, d)| embedding_for(d, i))
        .collect();
    repo.upsert(Collection::HomeworkTemplates, &docs, &embeddings)
        .await
        .expect("upsert");

    let query = VectorQuery::new("q")
        .with_limit(1)
        .with_filter(MetadataFilter::eq("class_id", "2"));
    let results = repo
        .search(Collection::HomeworkTemplates, &unit_vector(384, 0), &query)
        .await
        .expect("search");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document().id(), "homework_template_3");

    let query = VectorQuery::new("q")
        .with_limit(5)
        .with_filter(MetadataFilter::not_eq("template_id", "1"));
    let results = repo
        .search(Collection::HomeworkTemplates, &unit_vector(384, 0), &query)
        .await
        .expect("search");
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.document().id() != "homework_template_1"));
}

#[tokio::test]
async fn upsert_replaces_and_delete_removes() {
    let repo = DuckdbVectorRepository::in_memory().expect("duckdb init");
    let doc = template_doc(1, 1, "Beginner");
    repo.upsert(
        Collection::HomeworkTemplates,
        std::slice::from_ref(&doc),
        &[embedding_for(&doc, 0)],
    )
    .await
    .expect("upsert");

    let renamed = VectorDocument::new(doc.id(), Collection::HomeworkTemplates, "Renamed")
        .with_metadata_value("template_id", "1")
        .stamped();
    repo.upsert(
        Collection::HomeworkTemplates,
        std::slice::from_ref(&renamed),
        &[embedding_for(&renamed, 3)],
    )
    .await
    .expect("upsert again");

    assert_eq!(repo.count(Collection::HomeworkTemplates).await.expect("count"), 1);
    let stored = repo
        .get(Collection::HomeworkTemplates, doc.id())
        .await
        .expect("get")
        .expect("present");
    assert_eq!(stored.text(), "Renamed");
    assert_eq!(stored.metadata_value("template_id"), Some("1"));

    repo.delete(Collection::HomeworkTemplates, doc.id())
        .await
        .expect("delete");
    assert_eq!(repo.count(Collection::HomeworkTemplates).await.expect("count"), 0);
    assert!(repo
        .get(Collection::HomeworkTemplates, doc.id())
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn list_ids_returns_every_stored_document() {
    let repo = DuckdbVectorRepository::in_memory().expect("duckdb init");
    assert!(repo
        .list_ids(Collection::HomeworkTemplates)
        .await
        .expect("list")
        .is_empty());

    let docs = vec![
        template_doc(2, 1, "Beginner"),
        template_doc(1, 1, "Beginner"),
        template_doc(3, 2, "Advanced"),
    ];
    let embeddings: Vec<_> = docs
        .iter()
        .enumerate()
        .map(|(i, d)| embedding_for(d, i))
        .collect();
    repo.upsert(Collection::HomeworkTemplates, &docs, &embeddings)
        .await
        .expect("upsert");
    repo.delete(Collection::HomeworkTemplates, "homework_template_3")
        .await
        .expect("delete");

    let ids = repo
        .list_ids(Collection::HomeworkTemplates)
        .await
        .expect("list");
    assert_eq!(ids, vec!["homework_template_1", "homework_template_2"]);
    assert!(repo
        .list_ids(Collection::StudentProfiles)
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn namespaces_and_collections_are_isolated() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");

    {
        let spring = DuckdbVectorRepository::new_with_namespace(&db_path, "spring").expect("init");
        let doc = template_doc(1, 1, "Beginner");
        spring
            .upsert(
                Collection::HomeworkTemplates,
                std::slice::from_ref(&doc),
                &[embedding_for(&doc, 0)],
            )
            .await
            .expect("upsert");
        assert_eq!(spring.count(Collection::ActivityTemplates).await.expect("count"), 0);
    }

    let fall = DuckdbVectorRepository::new_with_namespace(&db_path, "fall").expect("init");
    assert_eq!(fall.count(Collection::HomeworkTemplates).await.expect("count"), 0);
}

#[tokio::test]
async fn rejects_wrong_embedding_dimensions() {
    let repo = DuckdbVectorRepository::in_memory().expect("duckdb init");
    let doc = template_doc(1, 1, "Beginner");
    let short = Embedding::new(doc.id().to_string(), vec![1.0; 8], "mock".to_string());

    let err = repo
        .upsert(Collection::HomeworkTemplates, &[doc], &[short])
        .await
        .expect_err("dimension mismatch");
    assert!(!err.is_storage_error());
}
