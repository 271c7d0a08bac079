use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chromadb::client::{ChromaAuthMethod, ChromaClient, ChromaClientOptions};
use chromadb::collection::{CollectionEntries, GetOptions, QueryOptions};
use chromadb::ChromaCollection;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    Collection, DomainError, Embedding, MetadataFilter, VectorDocument, VectorMatch, VectorQuery,
};

/// Vector collections hosted by a Chroma server.
pub struct ChromaVectorRepository {
    client: ChromaClient,
    prefix: String,
    collections: Mutex<HashMap<Collection, Arc<ChromaCollection>>>,
}

impl ChromaVectorRepository {
    /// Connects to `url`. Collections of a namespace other than `main` are
    /// prefixed with `{namespace}_`.
    pub async fn new(url: &str, namespace: &str) -> Result<Self, DomainError> {
        let client = ChromaClient::new(ChromaClientOptions {
            url: Some(url.to_string()),
            database: "default_database".to_string(),
            auth: ChromaAuthMethod::None,
        })
        .await
        .map_err(|e| DomainError::internal(format!("Failed to connect to ChromaDB: {}", e)))?;

        debug!("Connected to ChromaDB at {}", url);

        let prefix = match namespace.trim() {
            "" | "main" => String::new(),
            ns => format!("{}_", ns),
        };

        Ok(Self {
            client,
            prefix,
            collections: Mutex::new(HashMap::new()),
        })
    }

    fn collection_name(&self, collection: Collection) -> String {
        format!("{}{}", self.prefix, collection.name())
    }

    async fn collection(
        &self,
        collection: Collection,
    ) -> Result<Arc<ChromaCollection>, DomainError> {
        let mut cache = self.collections.lock().await;
        if let Some(existing) = cache.get(&collection) {
            return Ok(Arc::clone(existing));
        }

        let name = self.collection_name(collection);
        let handle = self
            .client
            .get_or_create_collection(&name, None)
            .await
            .map_err(|e| {
                DomainError::internal(format!("Failed to get/create collection {}: {}", name, e))
            })?;
        debug!("Using ChromaDB collection: {}", name);

        let handle = Arc::new(handle);
        cache.insert(collection, Arc::clone(&handle));
        Ok(handle)
    }

    fn to_chroma_metadata(metadata: &BTreeMap<String, String>) -> Map<String, Value> {
        metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    fn from_chroma_metadata(metadata: Option<Map<String, Value>>) -> BTreeMap<String, String> {
        metadata
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect()
    }

    /// Translates metadata filters into a Chroma `where` clause.
    fn where_clause(filters: &[MetadataFilter]) -> Option<Value> {
        let mut clauses: Vec<Value> = filters
            .iter()
            .map(|filter| {
                let condition = match filter {
                    MetadataFilter::Eq(_, v) => json!(v),
                    MetadataFilter::NotEq(_, v) => json!({ "$ne": v }),
                };
                let mut clause = Map::new();
                clause.insert(filter.key().to_string(), condition);
                Value::Object(clause)
            })
            .collect();

        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(json!({ "$and": clauses })),
        }
    }
}

#[async_trait]
impl VectorRepository for ChromaVectorRepository {
    async fn ensure_collections(&self) -> Result<(), DomainError> {
        for collection in Collection::ALL {
            self.collection(collection).await?;
        }
        Ok(())
    }

    async fn upsert(
        &self,
        collection: Collection,
        documents: &[VectorDocument],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        if documents.is_empty() {
            return Ok(());
        }
        if documents.len() != embeddings.len() {
            return Err(DomainError::invalid_input(
                "Document and embedding count mismatch",
            ));
        }

        let handle = self.collection(collection).await?;

        let entries = CollectionEntries {
            ids: documents.iter().map(|d| d.id()).collect(),
            embeddings: Some(embeddings.iter().map(|e| e.vector().to_vec()).collect()),
            metadatas: Some(
                documents
                    .iter()
                    .map(|d| Self::to_chroma_metadata(d.metadata()))
                    .collect(),
            ),
            documents: Some(documents.iter().map(|d| d.text()).collect()),
        };

        handle
            .upsert(entries, None)
            .await
            .map_err(|e| DomainError::internal(format!("Failed to upsert documents: {}", e)))?;

        debug!("Upserted {} documents into ChromaDB {}", documents.len(), collection);
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<VectorDocument>, DomainError> {
        let handle = self.collection(collection).await?;
        let result = handle
            .get(GetOptions {
                ids: vec![id.to_string()],
                where_metadata: None,
                limit: Some(1),
                offset: None,
                where_document: None,
                include: Some(vec!["documents".into(), "metadatas".into()]),
            })
            .await
            .map_err(|e| DomainError::internal(format!("Failed to get document: {}", e)))?;

        if result.ids.is_empty() {
            return Ok(None);
        }

        let text = result
            .documents
            .and_then(|d| d.into_iter().next())
            .flatten()
            .unwrap_or_default();
        let metadata = result
            .metadatas
            .and_then(|m| m.into_iter().next())
            .flatten();

        Ok(Some(
            VectorDocument::new(id, collection, text)
                .with_metadata(Self::from_chroma_metadata(metadata)),
        ))
    }

    async fn list_ids(&self, collection: Collection) -> Result<Vec<String>, DomainError> {
        let handle = self.collection(collection).await?;
        let result = handle
            .get(GetOptions {
                ids: vec![],
                where_metadata: None,
                limit: None,
                offset: None,
                where_document: None,
                include: Some(vec![]),
            })
            .await
            .map_err(|e| DomainError::internal(format!("Failed to list documents: {}", e)))?;
        Ok(result.ids)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DomainError> {
        let handle = self.collection(collection).await?;
        handle
            .delete(Some(vec![id]), None, None)
            .await
            .map_err(|e| DomainError::internal(format!("Failed to delete document: {}", e)))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        query: &VectorQuery,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        let handle = self.collection(collection).await?;

        let query_options = QueryOptions {
            query_texts: None,
            query_embeddings: Some(vec![query_embedding.to_vec()]),
            where_metadata: Self::where_clause(query.filters()),
            where_document: None,
            n_results: Some(query.limit()),
            include: Some(vec!["distances", "metadatas", "documents"]),
        };

        let result = handle
            .query(query_options, None)
            .await
            .map_err(|e| DomainError::internal(format!("Failed to search embeddings: {}", e)))?;

        let ids = result.ids.into_iter().next().unwrap_or_default();
        let distances = result
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = result
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();
        let documents = result
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let mut matches = Vec::new();
        for ((id, distance), (metadata, text)) in ids
            .into_iter()
            .zip(distances)
            .zip(metadatas.into_iter().zip(documents))
        {
            let document = VectorDocument::new(id, collection, text)
                .with_metadata(Self::from_chroma_metadata(metadata));
            if !document.matches(query.filters()) {
                continue;
            }
            matches.push(VectorMatch::new(document, 1.0 / (1.0 + distance)));
        }

        Ok(matches)
    }

    async fn count(&self, collection: Collection) -> Result<u64, DomainError> {
        let handle = self.collection(collection).await?;
        let result = handle
            .count()
            .await
            .map_err(|e| DomainError::internal(format!("Failed to count documents: {}", e)))?;
        Ok(result as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_combines_filters() {
        assert_eq!(ChromaVectorRepository::where_clause(&[]), None);
        assert_eq!(
            ChromaVectorRepository::where_clause(&[MetadataFilter::eq("class_id", "1")]),
            Some(json!({"class_id": "1"}))
        );
        assert_eq!(
            ChromaVectorRepository::where_clause(&[
                MetadataFilter::eq("class_id", "1"),
                MetadataFilter::not_eq("student_id", "4"),
            ]),
            Some(json!({"$and": [{"class_id": "1"}, {"student_id": {"$ne": "4"}}]}))
        );
    }

    #[test]
    fn metadata_round_trips_as_strings() {
        let mut metadata = BTreeMap::new();
        metadata.insert("template_id".to_string(), "3".to_string());

        let chroma = ChromaVectorRepository::to_chroma_metadata(&metadata);
        let back = ChromaVectorRepository::from_chroma_metadata(Some(chroma));

        assert_eq!(back, metadata);
    }
}
