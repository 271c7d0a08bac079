use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::application::EmbeddingService;
use crate::domain::{DomainError, Embedding, EmbeddingConfig, VectorDocument};

const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_DIMENSIONS: usize = 384;
const DEFAULT_MAX_SEQ_LENGTH: usize = 256;
const BATCH_SIZE: usize = 32;

/// Sentence embeddings computed locally with ONNX Runtime.
pub struct OrtEmbedding {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: EmbeddingConfig,
}

impl OrtEmbedding {
    /// Downloads (or reuses the cached) model from the Hugging Face hub.
    pub fn new(model_id: Option<&str>) -> Result<Self, DomainError> {
        let model_id = model_id.unwrap_or(DEFAULT_MODEL_ID);
        info!("Initializing ORT embedding service with model: {}", model_id);

        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_progress(true)
            .build()
            .map_err(|e| DomainError::embedding(format!("Failed to create HF API: {}", e)))?;
        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| DomainError::embedding(format!("Failed to download tokenizer: {}", e)))?;
        let model_path = repo
            .get("model.onnx")
            .or_else(|_| repo.get("onnx/model.onnx"))
            .map_err(|e| DomainError::embedding(format!("Failed to download ONNX model: {}", e)))?;

        Self::from_paths(model_path, tokenizer_path, model_id)
    }

    pub fn from_paths(
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        model_name: &str,
    ) -> Result<Self, DomainError> {
        info!("Loading ONNX model from: {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| DomainError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DomainError::embedding(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load ONNX model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config: EmbeddingConfig::new(
                model_name.to_string(),
                DEFAULT_DIMENSIONS,
                DEFAULT_MAX_SEQ_LENGTH,
            ),
        })
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| DomainError::embedding(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.config.max_sequence_length());

        let shape = [batch_size, seq_len];
        let input_ids = Tensor::from_array((shape, padded(&encodings, seq_len, Encoding::get_ids)))
            .map_err(|e| DomainError::embedding(format!("Failed to create input_ids tensor: {}", e)))?;
        let attention_mask = Tensor::from_array((
            shape,
            padded(&encodings, seq_len, Encoding::get_attention_mask),
        ))
        .map_err(|e| DomainError::embedding(format!("Failed to create attention_mask tensor: {}", e)))?;
        let token_type_ids =
            Tensor::from_array((shape, padded(&encodings, seq_len, Encoding::get_type_ids)))
                .map_err(|e| {
                    DomainError::embedding(format!("Failed to create token_type_ids tensor: {}", e))
                })?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DomainError::embedding(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| DomainError::embedding(format!("Inference failed: {}", e)))?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| DomainError::embedding("No output tensor found"))?;
        let (output_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::embedding(format!("Failed to extract output tensor: {}", e)))?;
        let output_shape: Vec<usize> = output_shape.iter().map(|&x| x as usize).collect();
        debug!("Output tensor shape: {:?}", output_shape);

        match output_shape.as_slice() {
            // Token embeddings: mean-pool over the attention mask.
            [_, tokens, hidden] => Ok(encodings
                .iter()
                .enumerate()
                .map(|(i, encoding)| {
                    let offset = i * tokens * hidden;
                    mean_pool(
                        &data[offset..offset + tokens * hidden],
                        encoding.get_attention_mask(),
                        (*tokens).min(seq_len),
                        *hidden,
                    )
                })
                .collect()),
            // Already pooled sentence embeddings.
            [_, hidden] => Ok((0..batch_size)
                .map(|i| normalized(data[i * hidden..(i + 1) * hidden].to_vec()))
                .collect()),
            other => Err(DomainError::embedding(format!(
                "Unexpected output tensor shape: {:?}",
                other
            ))),
        }
    }
}

fn padded(encodings: &[Encoding], seq_len: usize, field: fn(&Encoding) -> &[u32]) -> Vec<i64> {
    let mut values = Vec::with_capacity(encodings.len() * seq_len);
    for encoding in encodings {
        let source = field(encoding);
        let len = source.len().min(seq_len);
        values.extend(source[..len].iter().map(|&x| x as i64));
        values.extend(std::iter::repeat_n(0i64, seq_len - len));
    }
    values
}

fn mean_pool(token_data: &[f32], mask: &[u32], tokens: usize, hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;

    for (t, &m) in mask.iter().enumerate().take(tokens) {
        if m == 0 {
            continue;
        }
        let row = &token_data[t * hidden..(t + 1) * hidden];
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for v in &mut pooled {
            *v /= count;
        }
    }
    normalized(pooled)
}

fn normalized(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

#[async_trait]
impl EmbeddingService for OrtEmbedding {
    async fn embed_document(&self, document: &VectorDocument) -> Result<Embedding, DomainError> {
        let vector = self
            .embed_texts(&[document.text()])?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("Failed to embed document"))?;

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
        let mut embeddings = Vec::with_capacity(documents.len());

        for batch in documents.chunks(BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(VectorDocument::text).collect();
            let vectors = self.embed_texts(&texts)?;

            for (document, vector) in batch.iter().zip(vectors) {
                embeddings.push(Embedding::new(
                    document.id().to_string(),
                    vector,
                    self.config.model_name().to_string(),
                ));
            }
        }

        debug!("Embedded {} documents", embeddings.len());
        Ok(embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_texts(&[query])?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("Failed to generate query embedding"))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_ignores_padding() {
        let data = [1.0, 0.0, 3.0, 0.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 1, 0], 3, 2);

        assert!((pooled[0] - 1.0).abs() < 1e-6);
        assert!(pooled[1].abs() < 1e-6);
    }

    #[tokio::test]
    #[ignore = "Requires model download"]
    async fn test_ort_embedding_service() {
        let service = OrtEmbedding::new(None).expect("Failed to create service");

        let embedding = service
            .embed_query("Practice professional email writing")
            .await
            .unwrap();

        assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }
}
