use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::application::{EmbeddingService, StudentRepository, TemplateRepository, VectorRepository};
use crate::domain::{compute_content_hash, Collection, DomainError, VectorDocument};

/// Outcome of synchronizing one collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSync {
    pub collection: Collection,
    /// Every relational id now present in the collection.
    pub synced_ids: Vec<i64>,
    /// Documents whose text changed (or was new) and were re-embedded.
    pub written: usize,
    /// Documents left untouched because their content hash matched.
    pub unchanged: usize,
    /// Stored documents with no remaining relational row, deleted.
    pub removed: usize,
}

impl CollectionSync {
    pub fn total(&self) -> usize {
        self.synced_ids.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub homework_templates: CollectionSync,
    pub activity_templates: CollectionSync,
    pub student_profiles: CollectionSync,
    pub duration_secs: f64,
}

/// Copies relational rows into the vector store, one document per row.
pub struct SyncRecordsUseCase {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SyncRecordsUseCase {
    pub fn new(
        student_repo: Arc<dyn StudentRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            student_repo,
            template_repo,
            vector_repo,
            embedding_service,
        }
    }

    pub async fn execute(&self, force: bool) -> Result<SyncReport, DomainError> {
        let start_time = Instant::now();
        self.vector_repo.ensure_collections().await?;

        let homework_templates = self.sync_homework_templates(force).await?;
        let activity_templates = self.sync_activity_templates(force).await?;
        let student_profiles = self.sync_student_profiles(force).await?;

        let duration_secs = start_time.elapsed().as_secs_f64();
        info!(
            "Sync complete: {} homework templates, {} activity templates, {} student profiles in {:.2}s",
            homework_templates.total(),
            activity_templates.total(),
            student_profiles.total(),
            duration_secs
        );

        Ok(SyncReport {
            homework_templates,
            activity_templates,
            student_profiles,
            duration_secs,
        })
    }

    pub async fn sync_homework_templates(&self, force: bool) -> Result<CollectionSync, DomainError> {
        let documents = self
            .template_repo
            .list_homework_templates()
            .await?
            .iter()
            .map(|t| Ok((t.id()?, t.to_vector_document()?)))
            .collect::<Result<Vec<_>, DomainError>>()?;

        self.sync_collection(Collection::HomeworkTemplates, documents, force)
            .await
    }

    pub async fn sync_activity_templates(&self, force: bool) -> Result<CollectionSync, DomainError> {
        let documents = self
            .template_repo
            .list_activity_templates()
            .await?
            .iter()
            .map(|t| Ok((t.id()?, t.to_vector_document()?)))
            .collect::<Result<Vec<_>, DomainError>>()?;

        self.sync_collection(Collection::ActivityTemplates, documents, force)
            .await
    }

    pub async fn sync_student_profiles(&self, force: bool) -> Result<CollectionSync, DomainError> {
        let documents = self
            .student_repo
            .list()
            .await?
            .iter()
            .map(|s| Ok((s.id()?, s.to_vector_document()?)))
            .collect::<Result<Vec<_>, DomainError>>()?;

        self.sync_collection(Collection::StudentProfiles, documents, force)
            .await
    }

    async fn sync_collection(
        &self,
        collection: Collection,
        documents: Vec<(i64, VectorDocument)>,
        force: bool,
    ) -> Result<CollectionSync, DomainError> {
        info!("Syncing {} records into {}", documents.len(), collection);

        let progress_bar = ProgressBar::new(documents.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| DomainError::internal(format!("Invalid progress bar template: {}", e)))?
                .progress_chars("#>-"),
        );
        progress_bar.set_message(collection.name());

        let mut synced_ids = Vec::with_capacity(documents.len());
        let mut current_ids = HashSet::with_capacity(documents.len());
        let mut pending = Vec::new();
        let mut unchanged = 0usize;

        for (id, document) in documents {
            synced_ids.push(id);
            current_ids.insert(document.id().to_string());

            if !force && self.is_unchanged(collection, &document).await? {
                debug!("Skipping unchanged document {}", document.id());
                unchanged += 1;
                progress_bar.inc(1);
                continue;
            }

            pending.push(document.stamped());
        }

        if !pending.is_empty() {
            let embeddings = self.embedding_service.embed_documents(&pending).await?;
            self.vector_repo
                .upsert(collection, &pending, &embeddings)
                .await?;
            progress_bar.inc(pending.len() as u64);
        }

        progress_bar.finish_and_clear();

        let removed = self.prune_orphans(collection, &current_ids).await?;

        info!(
            "{}: {} written, {} unchanged, {} removed",
            collection,
            pending.len(),
            unchanged,
            removed
        );

        Ok(CollectionSync {
            collection,
            synced_ids,
            written: pending.len(),
            unchanged,
            removed,
        })
    }

    /// Deletes documents whose ids are not in `current_ids`.
    async fn prune_orphans(
        &self,
        collection: Collection,
        current_ids: &HashSet<String>,
    ) -> Result<usize, DomainError> {
        let stale: Vec<String> = self
            .vector_repo
            .list_ids(collection)
            .await?
            .into_iter()
            .filter(|id| !current_ids.contains(id))
            .collect();

        for id in &stale {
            debug!("Removing orphaned document {}", id);
            self.vector_repo.delete(collection, id).await?;
        }
        Ok(stale.len())
    }

    async fn is_unchanged(
        &self,
        collection: Collection,
        document: &VectorDocument,
    ) -> Result<bool, DomainError> {
        let stored = self.vector_repo.get(collection, document.id()).await?;
        let current_hash = compute_content_hash(document.text());
        Ok(stored
            .as_ref()
            .and_then(VectorDocument::content_hash)
            .is_some_and(|hash| hash == current_hash))
    }
}
