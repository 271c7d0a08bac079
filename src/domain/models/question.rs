use serde::{Deserialize, Serialize};

/// A single homework question with its optional instructions and answer key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
}

impl Question {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            instructions: None,
            expected_answer: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_expected_answer(mut self, expected_answer: impl Into<String>) -> Self {
        self.expected_answer = Some(expected_answer.into());
        self
    }

    /// True when no part carries text; blank values count as absent.
    pub fn is_empty(&self) -> bool {
        self.question.trim().is_empty()
            && is_blank(&self.instructions)
            && is_blank(&self.expected_answer)
    }

    /// Trims every part and turns blank optional parts into `None`.
    pub fn normalized(self) -> Self {
        Self {
            question: self.question.trim().to_string(),
            instructions: non_blank(self.instructions),
            expected_answer: non_blank(self.expected_answer),
        }
    }

    /// Labelled block used inside template documents.
    pub fn document_block(&self) -> String {
        format!(
            "Question: {}\nInstructions: {}\nExpected Answer: {}",
            self.question,
            self.instructions.as_deref().unwrap_or(""),
            self.expected_answer.as_deref().unwrap_or("")
        )
    }

    /// Numbered block used in personalization prompts; absent parts are
    /// left out.
    pub fn prompt_block(&self, number: usize) -> String {
        let mut block = format!("Question {}: {}\n", number, self.question);
        if let Some(instructions) = &self.instructions {
            block.push_str(&format!("Instructions: {}\n", instructions));
        }
        if let Some(answer) = &self.expected_answer {
            block.push_str(&format!("Expected Answer: {}\n", answer));
        }
        block
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_block_skips_missing_parts() {
        let question = Question::new("Describe your job.").with_expected_answer("A paragraph.");

        assert_eq!(
            question.prompt_block(2),
            "Question 2: Describe your job.\nExpected Answer: A paragraph.\n"
        );
    }

    #[test]
    fn document_block_always_has_three_labels() {
        let block = Question::new("Describe your job.").document_block();

        assert_eq!(
            block,
            "Question: Describe your job.\nInstructions: \nExpected Answer: "
        );
    }

    #[test]
    fn blank_parts_count_as_absent() {
        let blank = Question {
            question: " ".to_string(),
            instructions: Some(String::new()),
            expected_answer: Some("  ".to_string()),
        };
        assert!(blank.is_empty());

        let normalized = Question {
            question: " Describe your job. ".to_string(),
            instructions: Some(" ".to_string()),
            expected_answer: Some(" A paragraph.".to_string()),
        }
        .normalized();
        assert_eq!(
            normalized,
            Question::new("Describe your job.").with_expected_answer("A paragraph.")
        );
    }
}
