use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    Collection, DomainError, Embedding, VectorDocument, VectorMatch, VectorQuery,
};

const VECTOR_DIMENSIONS: usize = 384;

/// Vector collections stored as DuckDB tables, one per collection, inside a
/// namespace schema.
pub struct DuckdbVectorRepository {
    conn: Arc<Mutex<Connection>>,
    namespace: String,
}

impl DuckdbVectorRepository {
    pub fn new(path: &Path) -> Result<Self, DomainError> {
        Self::new_with_namespace(path, "main")
    }

    pub fn new_with_namespace(path: &Path, namespace: &str) -> Result<Self, DomainError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        let namespace = Self::schema_name(namespace);
        Self::initialize(&conn, &namespace)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            namespace,
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e)))?;
        let namespace = Self::schema_name("main");
        Self::initialize(&conn, &namespace)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            namespace,
        })
    }

    fn schema_name(namespace: &str) -> String {
        let schema = namespace.trim();
        if schema.is_empty() {
            "main".to_string()
        } else {
            schema.replace('"', "")
        }
    }

    fn initialize(conn: &Connection, schema: &str) -> Result<(), DomainError> {
        debug!("Initializing DuckDB vector store with schema: {}", schema);
        conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS \"{}\";", schema))
            .map_err(|e| {
                DomainError::storage(format!("Failed to create DuckDB schema {}: {}", schema, e))
            })?;

        for collection in Collection::ALL {
            Self::create_collection_table(conn, schema, collection)?;
        }
        Ok(())
    }

    fn create_collection_table(
        conn: &Connection,
        schema: &str,
        collection: Collection,
    ) -> Result<(), DomainError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\".{} (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                metadata TEXT NOT NULL,
                vector FLOAT[{}] NOT NULL,
                model TEXT NOT NULL
            );",
            schema,
            collection.name(),
            VECTOR_DIMENSIONS
        ))
        .map_err(|e| {
            DomainError::storage(format!(
                "Failed to create collection table {}: {}",
                collection, e
            ))
        })
    }

    fn table(&self, collection: Collection) -> String {
        format!("\"{}\".{}", self.namespace, collection.name())
    }

    fn vector_to_array_literal(vector: &[f32]) -> Result<String, DomainError> {
        if vector.len() != VECTOR_DIMENSIONS {
            return Err(DomainError::invalid_input(format!(
                "Expected embedding dimension {}, got {}",
                VECTOR_DIMENSIONS,
                vector.len()
            )));
        }
        let values = vector
            .iter()
            .map(|v| format!("{}", v))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("[{}]::FLOAT[{}]", values, VECTOR_DIMENSIONS))
    }

    fn decode_metadata(raw: &str) -> Result<BTreeMap<String, String>, DomainError> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::storage(format!("Corrupt document metadata: {}", e)))
    }
}

#[async_trait]
impl VectorRepository for DuckdbVectorRepository {
    async fn ensure_collections(&self) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        Self::initialize(&conn, &self.namespace)
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

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        for (document, embedding) in documents.iter().zip(embeddings) {
            let array_lit = Self::vector_to_array_literal(embedding.vector())?;
            let metadata = serde_json::to_string(document.metadata())?;
            // FLOAT[N] values cannot be bound as parameters.
            let sql = format!(
                "INSERT OR REPLACE INTO {} (id, document, metadata, vector, model) \
                 VALUES (?, ?, ?, {}, ?)",
                self.table(collection),
                array_lit
            );
            tx.execute(
                &sql,
                params![document.id(), document.text(), metadata, embedding.model()],
            )
            .map_err(|e| {
                DomainError::storage(format!("Failed to upsert document {}: {}", document.id(), e))
            })?;
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Upserted {} documents into {}", documents.len(), collection);
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<VectorDocument>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT document, metadata FROM {} WHERE id = ?",
                self.table(collection)
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let row = match stmt.query_row(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        }) {
            Ok(row) => row,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to get document {}: {}",
                    id, e
                )))
            }
        };

        let (text, metadata) = row;
        Ok(Some(
            VectorDocument::new(id, collection, text).with_metadata(Self::decode_metadata(&metadata)?),
        ))
    }

    async fn list_ids(&self, collection: Collection) -> Result<Vec<String>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT id FROM {} ORDER BY id", self.table(collection)))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DomainError::storage(format!("Failed to list ids: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::storage(format!("Failed to read id: {}", e)))?;
        Ok(ids)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", self.table(collection)),
            params![id],
        )
        .map_err(|e| DomainError::storage(format!("Failed to delete document: {}", e)))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        query: &VectorQuery,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        let array_lit = Self::vector_to_array_literal(query_embedding)?;
        let mut sql = format!(
            "SELECT id, document, metadata, \
                array_cosine_similarity(vector, {array_lit})::DOUBLE AS score \
             FROM {table} ORDER BY score DESC",
            array_lit = array_lit,
            table = self.table(collection)
        );
        // Metadata filters run in Rust, so only unfiltered searches can be
        // limited in SQL.
        if query.filters().is_empty() {
            sql.push_str(&format!(" LIMIT {}", query.limit()));
        }

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare search: {}", e)))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| DomainError::storage(format!("Failed to run search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| DomainError::storage(format!("Failed to read id: {}", e)))?;
            let text: String = row
                .get(1)
                .map_err(|e| DomainError::storage(format!("Failed to read document: {}", e)))?;
            let metadata: String = row
                .get(2)
                .map_err(|e| DomainError::storage(format!("Failed to read metadata: {}", e)))?;
            let score: f64 = row
                .get(3)
                .map_err(|e| DomainError::storage(format!("Failed to read score: {}", e)))?;

            let document = VectorDocument::new(id, collection, text)
                .with_metadata(Self::decode_metadata(&metadata)?);
            if !document.matches(query.filters()) {
                continue;
            }

            results.push(VectorMatch::new(document, score as f32));
            if results.len() >= query.limit() {
                break;
            }
        }

        debug!(
            "DuckDB search in {} returned {} results",
            collection,
            results.len()
        );
        Ok(results)
    }

    async fn count(&self, collection: Collection) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", self.table(collection)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count {}: {}", collection, e)))?;
        Ok(count as u64)
    }
}
