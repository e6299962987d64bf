use anyhow::{Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{NumericOptions, Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, TantivyDocument};

use crate::models::Chunk;

/// Term-frequency (BM25) index over one chunk set, built on tantivy.
///
/// The index lives entirely in RAM and is rebuilt from scratch for every
/// retriever build; only the chunk ordinal is stored, the caller maps hits
/// back to chunks.
pub struct LexicalIndex {
    index: Index,
    f_ordinal: tantivy::schema::Field,
    f_content: tantivy::schema::Field,
}

impl LexicalIndex {
    pub fn build(chunks: &[Chunk]) -> Result<Self> {
        let mut schema_builder = Schema::builder();
        let f_ordinal =
            schema_builder.add_u64_field("ordinal", NumericOptions::default() | STORED);
        let f_content = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        for (ordinal, chunk) in chunks.iter().enumerate() {
            writer.add_document(doc!(
                f_ordinal => ordinal as u64,
                f_content => chunk.content.clone(),
            ))?;
        }

        writer.commit().context("Failed to commit lexical index")?;

        Ok(Self {
            index,
            f_ordinal,
            f_content,
        })
    }

    /// Search and return `(chunk ordinal, BM25 score)` pairs, best first.
    /// An empty result is a normal outcome, not an error.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<(usize, f32)>> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create reader")?;

        let searcher = reader.searcher();

        // Questions are natural language, not tantivy query syntax; the
        // lenient parser drops unparseable fragments instead of failing.
        let query_parser = QueryParser::for_index(&self.index, vec![self.f_content]);
        let (query, _errors) = query_parser.parse_query_lenient(query_str);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Lexical search failed")?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;
            let Some(ordinal) = doc.get_first(self.f_ordinal).and_then(|v| v.as_u64()) else {
                continue;
            };
            hits.push((ordinal as usize, score));
        }

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: "doc.pdf".to_string(),
            page: None,
            section: BTreeMap::new(),
        }
    }

    #[test]
    fn test_build_and_search_ranks_matching_chunk_first() {
        let chunks = vec![
            chunk("The quarterly revenue grew by twelve percent."),
            chunk("Section 5: termination requires 30 days notice."),
            chunk("Appendix A lists the contact addresses."),
        ];
        let index = LexicalIndex::build(&chunks).unwrap();

        let hits = index.search("termination notice", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].0, 1);
    }

    #[test]
    fn test_no_match_returns_empty_not_error() {
        let index = LexicalIndex::build(&[chunk("alpha beta gamma")]).unwrap();
        let hits = index.search("zzzzunrelated", 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_natural_language_punctuation_is_tolerated() {
        let index = LexicalIndex::build(&[chunk("termination clause text")]).unwrap();
        // Colons and question marks are query-syntax chars in tantivy.
        let hits = index.search("What is the termination clause?", 10).unwrap();
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_limit_respected() {
        let chunks: Vec<Chunk> = (0..20)
            .map(|i| chunk(&format!("shared term plus filler number {i}")))
            .collect();
        let index = LexicalIndex::build(&chunks).unwrap();
        let hits = index.search("shared term", 5).unwrap();
        assert_eq!(hits.len(), 5);
    }
}
