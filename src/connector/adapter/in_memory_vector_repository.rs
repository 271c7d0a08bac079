use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    Collection, DomainError, Embedding, VectorDocument, VectorMatch, VectorQuery,
};

type Entries = HashMap<String, (VectorDocument, Vec<f32>)>;

pub struct InMemoryVectorRepository {
    collections: Arc<Mutex<HashMap<Collection, Entries>>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryVectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn ensure_collections(&self) -> Result<(), DomainError> {
        let mut collections = self.collections.lock().await;
        for collection in Collection::ALL {
            collections.entry(collection).or_default();
        }
        Ok(())
    }

    async fn upsert(
        &self,
        collection: Collection,
        documents: &[VectorDocument],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        if documents.len() != embeddings.len() {
            return Err(DomainError::invalid_input(
                "Document and embedding count mismatch",
            ));
        }

        let mut collections = self.collections.lock().await;
        let entries = collections.entry(collection).or_default();
        for (document, embedding) in documents.iter().zip(embeddings) {
            entries.insert(
                document.id().to_string(),
                (document.clone(), embedding.vector().to_vec()),
            );
        }

        debug!("Saved {} documents to memory ({})", documents.len(), collection);
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<VectorDocument>, DomainError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(&collection)
            .and_then(|entries| entries.get(id))
            .map(|(document, _)| document.clone()))
    }

    async fn list_ids(&self, collection: Collection) -> Result<Vec<String>, DomainError> {
        let collections = self.collections.lock().await;
        let mut ids: Vec<String> = collections
            .get(&collection)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DomainError> {
        let mut collections = self.collections.lock().await;
        if let Some(entries) = collections.get_mut(&collection) {
            entries.remove(id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        query: &VectorQuery,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        let collections = self.collections.lock().await;
        let Some(entries) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<VectorMatch> = entries
            .values()
            .filter(|(document, _)| document.matches(query.filters()))
            .map(|(document, vector)| {
                VectorMatch::new(document.clone(), cosine_similarity(query_embedding, vector))
            })
            .collect();

        results.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document().id().cmp(b.document().id()))
        });
        results.truncate(query.limit());

        Ok(results)
    }

    async fn count(&self, collection: Collection) -> Result<u64, DomainError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(&collection)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetadataFilter;

    fn doc(id: &str, level: &str) -> VectorDocument {
        VectorDocument::new(id, Collection::StudentProfiles, id)
            .with_metadata_value("proficiency_level", level)
    }

    fn emb(id: &str, vector: Vec<f32>) -> Embedding {
        Embedding::new(id.to_string(), vector, "test".to_string())
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_filters() {
        let repo = InMemoryVectorRepository::new();
        repo.upsert(
            Collection::StudentProfiles,
            &[doc("a", "Beginner"), doc("b", "Advanced"), doc("c", "Advanced")],
            &[
                emb("a", vec![1.0, 0.0]),
                emb("b", vec![0.6, 0.8]),
                emb("c", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

        let all = repo
            .search(Collection::StudentProfiles, &[1.0, 0.0], &VectorQuery::new("q"))
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|m| m.document().id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let advanced = repo
            .search(
                Collection::StudentProfiles,
                &[1.0, 0.0],
                &VectorQuery::new("q")
                    .with_limit(1)
                    .with_filter(MetadataFilter::eq("proficiency_level", "Advanced")),
            )
            .await
            .unwrap();
        assert_eq!(advanced.len(), 1);
        assert_eq!(advanced[0].document().id(), "b");
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let repo = InMemoryVectorRepository::new();
        let collection = Collection::StudentProfiles;
        repo.upsert(collection, &[doc("a", "Beginner")], &[emb("a", vec![1.0])])
            .await
            .unwrap();
        repo.upsert(collection, &[doc("a", "Advanced")], &[emb("a", vec![1.0])])
            .await
            .unwrap();

        assert_eq!(repo.count(collection).await.unwrap(), 1);
        let stored = repo.get(collection, "a").await.unwrap().unwrap();
        assert_eq!(stored.metadata_value("proficiency_level"), Some("Advanced"));

        repo.delete(collection, "a").await.unwrap();
        assert_eq!(repo.count(collection).await.unwrap(), 0);
    }
}
