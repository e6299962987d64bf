use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::models::{RankedChunk, Verdict};

const MAX_TOKENS: u32 = 2000;

/// Checks a drafted answer against the full chunk set for factual support
/// and relevance. Inability to confirm support is never treated as
/// success: every failure path produces a fail-closed verdict.
pub struct Verifier {
    model: Arc<dyn TextGenerator>,
}

impl Verifier {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    pub async fn check(&self, answer: &str, chunks: &[RankedChunk]) -> Verdict {
        // Verification reads the plain chunk text, not the tagged research
        // context, and all of it rather than a top-k slice.
        let context = chunks
            .iter()
            .map(|c| c.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        tracing::debug!("Verification context length: {} characters", context.len());

        let prompt = build_prompt(answer, &context);

        let raw = match self.model.complete(&prompt, MAX_TOKENS).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Verification call failed: {e}");
                return Verdict::fail_closed(format!("Model error: {e}"));
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Verdict::fail_closed("Empty response from the model.");
        }

        match parse_verdict(trimmed) {
            Some(verdict) => verdict,
            None => {
                tracing::warn!("Verification response did not match the expected format");
                Verdict::fail_closed("Failed to parse the model's response.")
            }
        }
    }
}

fn build_prompt(answer: &str, context: &str) -> String {
    format!(
        "You are an AI assistant designed to verify the accuracy and relevance of answers based on provided context.\n\n\
         **Instructions:**\n\
         - Verify the following answer against the provided context.\n\
         - Check for:\n\
         1. Direct/indirect factual support (YES/NO)\n\
         2. Unsupported claims (list any if present)\n\
         3. Contradictions (list any if present)\n\
         4. Relevance to the question (YES/NO)\n\
         - Provide additional details or explanations where relevant.\n\
         - Respond in the exact format specified below without adding any unrelated information.\n\n\
         **Format:**\n\
         Supported: YES/NO\n\
         Unsupported Claims: [item1, item2, ...]\n\
         Contradictions: [item1, item2, ...]\n\
         Relevant: YES/NO\n\
         Additional Details: [Any extra information or explanations]\n\n\
         **Answer:** {answer}\n\
         **Context:**\n{context}\n\n\
         **Respond ONLY with the above format.**"
    )
}

/// Line-oriented, tolerant parse of the five-field verdict format.
///
/// Keys match case-insensitively with surrounding `*` markers stripped, so
/// a report rendered by [`format_report`] parses back to the same four
/// structured fields. Missing fields default to NO / empty. Returns `None`
/// only when no recognizable field is present at all.
pub fn parse_verdict(raw: &str) -> Option<Verdict> {
    let mut verdict = Verdict {
        supported: false,
        unsupported_claims: Vec::new(),
        contradictions: Vec::new(),
        relevant: false,
        notes: String::new(),
    };
    let mut matched_any = false;

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('*').trim().to_lowercase();
        let value = value.trim().trim_start_matches('*').trim();

        match key.as_str() {
            "supported" => {
                verdict.supported = is_yes(value);
                matched_any = true;
            }
            "unsupported claims" => {
                verdict.unsupported_claims = parse_list(value);
                matched_any = true;
            }
            "contradictions" => {
                verdict.contradictions = parse_list(value);
                matched_any = true;
            }
            "relevant" => {
                verdict.relevant = is_yes(value);
                matched_any = true;
            }
            "additional details" => {
                verdict.notes = value.to_string();
                matched_any = true;
            }
            _ => {}
        }
    }

    matched_any.then_some(verdict)
}

fn is_yes(value: &str) -> bool {
    value.to_uppercase().starts_with("YES")
}

/// List values must be bracketed and comma-separated; anything else
/// (including the formatter's `None`) reads as empty.
fn parse_list(value: &str) -> Vec<String> {
    let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
        return Vec::new();
    };
    inner
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Render a verdict as the user-facing verification report.
pub fn format_report(verdict: &Verdict) -> String {
    let mut report = format!("**Supported:** {}\n", yes_no(verdict.supported));

    if verdict.unsupported_claims.is_empty() {
        report.push_str("**Unsupported Claims:** None\n");
    } else {
        report.push_str(&format!(
            "**Unsupported Claims:** [{}]\n",
            verdict.unsupported_claims.join(", ")
        ));
    }

    if verdict.contradictions.is_empty() {
        report.push_str("**Contradictions:** None\n");
    } else {
        report.push_str(&format!(
            "**Contradictions:** [{}]\n",
            verdict.contradictions.join(", ")
        ));
    }

    report.push_str(&format!("**Relevant:** {}\n", yes_no(verdict.relevant)));

    if verdict.notes.is_empty() {
        report.push_str("**Additional Details:** None\n");
    } else {
        report.push_str(&format!("**Additional Details:** {}\n", verdict.notes));
    }

    report
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}
