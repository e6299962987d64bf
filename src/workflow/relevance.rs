use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::models::{RankedChunk, RelevanceLabel};

const MAX_TOKENS: u32 = 1000;

/// State-free classifier deciding whether the retrieved chunks justify
/// attempting an answer at all.
pub struct RelevanceGate {
    model: Arc<dyn TextGenerator>,
}

impl RelevanceGate {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    /// Classify the question against the top-k retrieved chunks.
    ///
    /// No chunks means `NoMatch` without spending a model call. A model
    /// failure also means `NoMatch`: when we cannot judge coverage we
    /// refuse rather than guess.
    pub async fn classify(&self, question: &str, chunks: &[RankedChunk], k: usize) -> RelevanceLabel {
        if chunks.is_empty() {
            tracing::debug!("No chunks retrieved; classifying as NO_MATCH without a model call");
            return RelevanceLabel::NoMatch;
        }

        let document_content = chunks
            .iter()
            .take(k)
            .map(|c| c.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = build_prompt(question, &document_content);

        let raw = match self.model.complete(&prompt, MAX_TOKENS).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Relevance classification call failed: {e}");
                return RelevanceLabel::NoMatch;
            }
        };

        let label = parse_label(&raw);
        tracing::info!("Relevance classification: {label:?}");
        label
    }
}

fn build_prompt(question: &str, document_content: &str) -> String {
    format!(
        "You are an AI relevance checker between a user's question and provided document content.\n\n\
         **Instructions:**\n\
         - Classify how well the document content addresses the user's question.\n\
         - Respond with only one of the following labels: CAN_ANSWER, PARTIAL, NO_MATCH.\n\
         - Do not include any additional text or explanation.\n\n\
         **Labels:**\n\
         1) \"CAN_ANSWER\": The passages contain enough explicit information to fully answer the question.\n\
         2) \"PARTIAL\": The passages mention or discuss the question's topic but do not provide all the details needed for a complete answer.\n\
         3) \"NO_MATCH\": The passages do not discuss or mention the question's topic at all.\n\n\
         **Important:** If the passages mention or reference the topic or timeframe of the question in any way, even if incomplete, respond with \"PARTIAL\" instead of \"NO_MATCH\".\n\n\
         **Question:** {question}\n\
         **Passages:** {document_content}\n\n\
         **Respond ONLY with one of the following labels: CAN_ANSWER, PARTIAL, NO_MATCH**"
    )
}

/// Substring match against the uppercased raw output, checked in order
/// CAN_ANSWER, PARTIAL, NO_MATCH; first match wins. Anything
/// unrecognizable defaults to PARTIAL so a mumbling classifier does not
/// turn into a false refusal; verification backstops the attempt.
fn parse_label(raw: &str) -> RelevanceLabel {
    let upper = raw.to_uppercase();
    if upper.contains("CAN_ANSWER") {
        RelevanceLabel::CanAnswer
    } else if upper.contains("PARTIAL") {
        RelevanceLabel::Partial
    } else if upper.contains("NO_MATCH") {
        RelevanceLabel::NoMatch
    } else {
        tracing::warn!("Could not parse relevance response, defaulting to PARTIAL");
        RelevanceLabel::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_labels() {
        assert_eq!(parse_label("CAN_ANSWER"), RelevanceLabel::CanAnswer);
        assert_eq!(parse_label("PARTIAL"), RelevanceLabel::Partial);
        assert_eq!(parse_label("NO_MATCH"), RelevanceLabel::NoMatch);
    }

    #[test]
    fn test_parse_tolerates_surrounding_text() {
        assert_eq!(
            parse_label("The label is: NO_MATCH, because nothing matches."),
            RelevanceLabel::NoMatch
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_label("can_answer"), RelevanceLabel::CanAnswer);
    }

    #[test]
    fn test_parse_multiple_labels_resolves_in_check_order() {
        // CAN_ANSWER is checked first, so it wins even when NO_MATCH also
        // appears in the response.
        assert_eq!(
            parse_label("NO_MATCH or maybe CAN_ANSWER"),
            RelevanceLabel::CanAnswer
        );
        assert_eq!(
            parse_label("PARTIAL... definitely not NO_MATCH"),
            RelevanceLabel::Partial
        );
    }

    #[test]
    fn test_parse_garbage_defaults_to_partial() {
        assert_eq!(parse_label("I am not sure."), RelevanceLabel::Partial);
        assert_eq!(parse_label(""), RelevanceLabel::Partial);
    }

    #[test]
    fn test_prompt_contains_question_and_passages() {
        let prompt = build_prompt("What is the deadline?", "Section 2: deadlines.");
        assert!(prompt.contains("What is the deadline?"));
        assert!(prompt.contains("Section 2: deadlines."));
    }
}
