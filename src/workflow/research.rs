use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::models::{Answer, RankedChunk, SourceRef};

const MAX_TOKENS: u32 = 4000;

/// Fixed draft used when generation fails or returns nothing, so the
/// workflow can still terminate cleanly.
pub const FALLBACK_ANSWER: &str =
    "I cannot answer this question based on the provided documents.";

/// Drafts an answer from the question and the retrieved chunks, citing
/// numbered sources.
pub struct Researcher {
    model: Arc<dyn TextGenerator>,
}

impl Researcher {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    pub async fn draft(&self, question: &str, chunks: &[RankedChunk]) -> Answer {
        let (context, sources) = build_context_with_sources(chunks);
        tracing::debug!("Research context length: {} characters", context.len());

        let prompt = build_prompt(question, &context);

        let draft = match self.model.complete(&prompt, MAX_TOKENS).await {
            Ok(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    trimmed
                }
            }
            Err(e) => {
                tracing::warn!("Draft generation failed: {e}");
                FALLBACK_ANSWER.to_string()
            }
        };

        Answer {
            draft,
            sources,
            context_used: context,
        }
    }
}

/// Interleave each chunk with a numbered source tag and collect the
/// parallel citation list. The list is positional: entry N describes the
/// `[Source N: ...]` tag embedded in the prompt, so the two must never
/// drift apart.
pub fn build_context_with_sources(chunks: &[RankedChunk]) -> (String, Vec<SourceRef>) {
    let mut context_parts = Vec::with_capacity(chunks.len());
    let mut sources = Vec::with_capacity(chunks.len());

    for (i, ranked) in chunks.iter().enumerate() {
        let chunk = &ranked.chunk;
        let source_ref = match chunk.page {
            Some(page) => format!("[Source {}: {}, Page {}]", i + 1, chunk.source, page),
            None => format!("[Source {}: {}]", i + 1, chunk.source),
        };
        sources.push(SourceRef {
            index: i + 1,
            source: chunk.source.clone(),
            page: chunk.page,
        });
        context_parts.push(format!("{source_ref}\n{}", chunk.content));
    }

    (context_parts.join("\n\n"), sources)
}

fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an AI assistant designed to provide precise and factual answers based on the given context.\n\n\
         **Instructions:**\n\
         - Answer the following question using only the provided context.\n\
         - Be clear, concise, and factual.\n\
         - Return as much information as you can get from the context.\n\
         - When referencing specific information, cite the source using [Source X, Page Y] format.\n\n\
         **Question:** {question}\n\
         **Context:**\n{context}\n\n\
         **Provide your answer below:**"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use std::collections::BTreeMap;

    fn ranked(content: &str, source: &str, page: Option<u32>) -> RankedChunk {
        RankedChunk {
            chunk: Chunk {
                content: content.to_string(),
                source: source.to_string(),
                page,
                section: BTreeMap::new(),
            },
            lexical_score: 0.0,
            semantic_score: 0.0,
            combined_score: 0.0,
        }
    }

    #[test]
    fn test_context_tags_with_page() {
        let (context, sources) =
            build_context_with_sources(&[ranked("termination text", "contract.pdf", Some(5))]);
        assert!(context.contains("[Source 1: contract.pdf, Page 5]\ntermination text"));
        assert_eq!(
            sources,
            vec![SourceRef {
                index: 1,
                source: "contract.pdf".to_string(),
                page: Some(5),
            }]
        );
    }

    #[test]
    fn test_context_tags_without_page() {
        let (context, sources) =
            build_context_with_sources(&[ranked("intro text", "notes.md", None)]);
        assert!(context.contains("[Source 1: notes.md]\nintro text"));
        assert_eq!(sources[0].page, None);
    }

    #[test]
    fn test_numbering_stays_in_lockstep_with_sources() {
        let chunks = vec![
            ranked("first", "a.pdf", Some(1)),
            ranked("second", "b.pdf", None),
            ranked("third", "a.pdf", Some(9)),
        ];
        let (context, sources) = build_context_with_sources(&chunks);

        for (i, source) in sources.iter().enumerate() {
            assert_eq!(source.index, i + 1);
            assert!(context.contains(&format!("[Source {}: {}", i + 1, source.source)));
        }
    }

    #[test]
    fn test_empty_chunks_build_empty_context() {
        let (context, sources) = build_context_with_sources(&[]);
        assert!(context.is_empty());
        assert!(sources.is_empty());
    }
}
