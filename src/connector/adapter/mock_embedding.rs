use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, Embedding, EmbeddingConfig, VectorDocument};

/// Deterministic offline embeddings.
///
/// Every lowercase word maps to a seeded random unit vector and a text embeds
/// as the normalized sum of its words, so texts sharing vocabulary score
/// closer than unrelated ones.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::default(),
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), dimensions, 512),
        }
    }

    fn word_vector(&self, word: &str) -> Vec<f32> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(word_seed(word));
        (0..self.config.dimensions())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect()
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.config.dimensions()];

        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase);
        for word in words {
            for (acc, v) in vector.iter_mut().zip(self.word_vector(&word)) {
                *acc += v;
            }
        }

        if vector.iter().all(|x| *x == 0.0) {
            vector = self.word_vector(text);
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

/// First eight bytes of the word's SHA-256 digest; stable across Rust releases.
fn word_seed(word: &str) -> u64 {
    let digest = Sha256::digest(word.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed_document(&self, document: &VectorDocument) -> Result<Embedding, DomainError> {
        let vector = self.generate_embedding(document.text());

        debug!(
            "Generated mock embedding for {} with {} dimensions",
            document.id(),
            vector.len()
        );

        Ok(Embedding::new(
            document.id().to_string(),
            vector,
            self.config.model_name().to_string(),
        ))
    }

    async fn embed_documents(
        &self,
        documents: &[VectorDocument],
    ) -> Result<Vec<Embedding>, DomainError> {
        let results: Vec<Embedding> = documents
            .iter()
            .map(|document| {
                Embedding::new(
                    document.id().to_string(),
                    self.generate_embedding(document.text()),
                    self.config.model_name().to_string(),
                )
            })
            .collect();

        debug!("Generated {} mock embeddings", results.len());

        Ok(results)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.generate_embedding(query))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn word_seed_is_derived_from_sha256() {
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(word_seed("hello"), 0x0ea3_b05f_ba4d_f22c);
        assert_ne!(word_seed("hello"), word_seed("world"));
    }

    #[tokio::test]
    async fn separate_instances_agree() {
        let a = MockEmbedding::new().embed_query("Business email").await.unwrap();
        let b = MockEmbedding::new().embed_query("business EMAIL").await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_mock_embedding_consistency() {
        let service = MockEmbedding::new();

        let embedding1 = service.embed_query("hello world").await.unwrap();
        let embedding2 = service.embed_query("hello world").await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_mock_embedding_dimensions() {
        let service = MockEmbedding::with_dimensions(128);

        let embedding = service.embed_query("test").await.unwrap();

        assert_eq!(embedding.len(), 128);
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let service = MockEmbedding::new();

        for text in ["test", "", "!!!"] {
            let embedding = service.embed_query(text).await.unwrap();
            let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((magnitude - 1.0).abs() < 0.001, "{:?} not normalized", text);
        }
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_closer() {
        let service = MockEmbedding::new();

        let query = service.embed_query("business email writing").await.unwrap();
        let related = service
            .embed_query("Business English: professional email writing")
            .await
            .unwrap();
        let unrelated = service
            .embed_query("Ordering food at a restaurant")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }
}
