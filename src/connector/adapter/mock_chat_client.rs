use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ChatClient;
use crate::domain::DomainError;

const CANNED_RESPONSE: &str = "Question 1: Describe a typical day at your job.\n\
Instructions: Write five sentences using the present simple.\n\
Expected Answer: Five present simple sentences about a working day.\n\n\
Question 2: Write a short message inviting a colleague to share your favourite hobby.\n\
Instructions: Use at least two modal verbs.\n\
Expected Answer: A friendly invitation that uses modal verbs correctly.";

/// Offline [`ChatClient`] returning a fixed response and recording prompts.
pub struct MockChatClient {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::with_response(CANNED_RESPONSE)
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// User prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, DomainError> {
        debug!("MockChatClient: received {} prompt chars", user.len());
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(user.to_string());
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}
