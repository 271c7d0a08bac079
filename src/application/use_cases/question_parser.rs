use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::Question;

fn question_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Question(?:\s\d+)?:").expect("valid question label regex"))
}

fn next_question() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Question\s").expect("valid question boundary regex"))
}

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```$").expect("valid code fence regex")
    })
}

/// Recovers structured questions from free-form LLM output.
///
/// Tries, in order: a JSON array of question objects, `Question:` labelled
/// blocks, and finally a line-by-line scan. Returns an empty list when none
/// of them yields a question.
pub fn extract_questions(text: &str) -> Vec<Question> {
    let text = strip_code_fence(text.trim());

    if let Some(questions) = parse_json_questions(text) {
        debug!("Extracted {} questions from JSON output", questions.len());
        return questions;
    }

    let questions = parse_labelled_blocks(text);
    if !questions.is_empty() {
        debug!("Extracted {} questions from labelled blocks", questions.len());
        return questions;
    }

    let questions = parse_lines(text);
    debug!("Extracted {} questions with the line scanner", questions.len());
    questions
}

fn strip_code_fence(text: &str) -> &str {
    code_fence()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

fn parse_json_questions(text: &str) -> Option<Vec<Question>> {
    if !(text.starts_with('[') && text.ends_with(']')) {
        return None;
    }
    let questions: Vec<Question> = serde_json::from_str(text).ok()?;
    Some(
        questions
            .into_iter()
            .map(Question::normalized)
            .filter(|q| !q.is_empty())
            .collect(),
    )
}

/// Splits at every `Question:` / `Question N:` label; each block runs to the
/// next label.
fn parse_labelled_blocks(text: &str) -> Vec<Question> {
    let starts: Vec<usize> = question_label().find_iter(text).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            parse_block(text[start..end].trim())
        })
        .collect()
}

fn parse_block(block: &str) -> Option<Question> {
    let question = question_label()
        .find(block)
        .and_then(|m| capture_until(&block[m.end()..], &["Instructions:"]));
    let instructions = find_label(block, "Instructions:")
        .and_then(|rest| capture_until(rest, &["Expected Answer:"]));
    let expected_answer =
        find_label(block, "Expected Answer:").and_then(|rest| capture_until(rest, &[]));

    let parsed = Question {
        question: question.unwrap_or_default(),
        instructions,
        expected_answer,
    };

    (!parsed.is_empty()).then_some(parsed)
}

fn find_label<'a>(block: &'a str, label: &str) -> Option<&'a str> {
    block.find(label).map(|pos| &block[pos + label.len()..])
}

/// Text up to the first of `terminators` or the next `Question ` marker,
/// trimmed. Blank captures count as absent.
fn capture_until(rest: &str, terminators: &[&str]) -> Option<String> {
    let mut end = next_question().find(rest).map(|m| m.start()).unwrap_or(rest.len());
    for terminator in terminators {
        if let Some(pos) = rest.find(terminator) {
            end = end.min(pos);
        }
    }

    let value = rest[..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Clone, Copy)]
enum Field {
    Question,
    Instructions,
    ExpectedAnswer,
}

/// Line-oriented scan for outputs such as `Question 1 - ...` where labels are
/// not colon-terminated. Unlabelled lines continue the current field.
fn parse_lines(text: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut current: Option<Question> = None;
    let mut field: Option<Field> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("Question:") || line.starts_with("Question ") {
            if let Some(done) = current.take() {
                questions.push(done);
            }
            current = Some(Question::new(label_value(line, "Question")));
            field = Some(Field::Question);
        } else if line.starts_with("Instructions:") || line.starts_with("Instructions ") {
            if let Some(q) = current.as_mut() {
                q.instructions = Some(label_value(line, "Instructions"));
                field = Some(Field::Instructions);
            }
        } else if line.starts_with("Expected Answer:") || line.starts_with("Expected Answer ") {
            if let Some(q) = current.as_mut() {
                q.expected_answer = Some(label_value(line, "Expected Answer"));
                field = Some(Field::ExpectedAnswer);
            }
        } else if let (Some(q), Some(f)) = (current.as_mut(), field) {
            let target = match f {
                Field::Question => &mut q.question,
                Field::Instructions => q.instructions.get_or_insert_with(String::new),
                Field::ExpectedAnswer => q.expected_answer.get_or_insert_with(String::new),
            };
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(line);
        }
    }

    questions.extend(current);
    questions
        .into_iter()
        .map(Question::normalized)
        .filter(|q| !q.is_empty())
        .collect()
}

/// Drops the label, an optional number and separator punctuation.
fn label_value(line: &str, label: &str) -> String {
    line.strip_prefix(label)
        .unwrap_or(line)
        .trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(|c: char| matches!(c, ':' | '-' | '.' | ')') || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_labelled_fields() {
        let text = "Question 1: Write an email to your team lead about the sprint.\n\
                    Instructions: Use formal register.\n\
                    Expected Answer: A short formal email.\n\n\
                    Question 2: Describe your favourite football club.\n\
                    Instructions: Use the present simple.\n\
                    Expected Answer: Three sentences.";

        let questions = extract_questions(text);

        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[0].question,
            "Write an email to your team lead about the sprint."
        );
        assert_eq!(
            questions[0].instructions.as_deref(),
            Some("Use formal register.")
        );
        assert_eq!(
            questions[1].expected_answer.as_deref(),
            Some("Three sentences.")
        );
    }

    #[test]
    fn unnumbered_labels_are_accepted() {
        let text = "Question: Order a coffee.\nExpected Answer: I'd like a latte, please.";

        let questions = extract_questions(text);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Order a coffee.");
        assert_eq!(questions[0].instructions, None);
        assert_eq!(
            questions[0].expected_answer.as_deref(),
            Some("I'd like a latte, please.")
        );
    }

    #[test]
    fn preamble_before_first_label_is_ignored() {
        let text = "Here are the personalized questions:\n\nQuestion 1: Describe a recipe.";

        let questions = extract_questions(text);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Describe a recipe.");
    }

    #[test]
    fn multiline_fields_are_kept_whole() {
        let text = "Question 1: Read the dialogue.\nThen answer the questions below.\n\
                    Instructions: Work alone.";

        let questions = extract_questions(text);

        assert_eq!(
            questions[0].question,
            "Read the dialogue.\nThen answer the questions below."
        );
    }

    #[test]
    fn json_array_is_used_directly() {
        let text = "```json\n[{\"question\": \"Q1\", \"instructions\": \"I1\"}, {\"question\": \"Q2\"}]\n```";

        let questions = extract_questions(text);

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].instructions.as_deref(), Some("I1"));
        assert_eq!(questions[1].question, "Q2");
    }

    #[test]
    fn line_scanner_handles_dash_separated_labels() {
        let text = "Question 1 - Talk about your job\nmore detail here\nInstructions: Speak for a minute";

        let questions = extract_questions(text);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Talk about your job more detail here");
        assert_eq!(
            questions[0].instructions.as_deref(),
            Some("Speak for a minute")
        );
    }

    #[test]
    fn bare_labels_without_text_are_dropped() {
        let text = "Question 1\nInstructions:\nQuestion 2 - Name three fruits\nExpected Answer:";

        let questions = extract_questions(text);

        assert_eq!(questions, vec![Question::new("Name three fruits")]);
    }

    #[test]
    fn blank_json_entries_are_dropped() {
        let text = r#"[{"question": "", "instructions": " "}, {"question": "Q1", "expected_answer": ""}]"#;

        let questions = extract_questions(text);

        assert_eq!(questions, vec![Question::new("Q1")]);
    }

    #[test]
    fn text_without_questions_yields_nothing() {
        assert!(extract_questions("I cannot help with that.").is_empty());
        assert!(extract_questions("").is_empty());
    }
}
