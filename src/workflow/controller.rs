use std::collections::HashSet;
use std::sync::Arc;

use crate::config::WorkflowConfig;
use crate::error::RetrievalError;
use crate::llm::TextGenerator;
use crate::models::{Answer, RankedChunk, RelevanceLabel, SourceRef, Verdict};
use crate::search::retriever::HybridRetriever;
use crate::workflow::relevance::RelevanceGate;
use crate::workflow::research::Researcher;
use crate::workflow::verification::{format_report, Verifier};

/// Fixed refusal returned when the gate finds no relevant material.
pub const REFUSAL_MESSAGE: &str = "This question isn't related (or there's no data) for your \
     query. Please ask another question relevant to the uploaded document(s).";

/// Workflow phases. The control graph is
/// `CheckRelevance → (End | Research) → Verify → (Research | End)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CheckRelevance,
    Research,
    Verify,
    End,
}

/// Decisions emitted by each phase, driving the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Gate: enough material to attempt an answer.
    Relevant,
    /// Gate: nothing relevant; refuse.
    Irrelevant,
    /// Research produced a draft.
    Drafted,
    /// Verification passed.
    Accept,
    /// Verification failed; re-draft.
    Retry,
    /// Verification still failing at the iteration bound; stop anyway.
    GiveUp,
}

/// Transition table for the answer state machine.
pub fn next_phase(phase: Phase, decision: Decision) -> Phase {
    match (phase, decision) {
        (Phase::CheckRelevance, Decision::Relevant) => Phase::Research,
        (Phase::CheckRelevance, Decision::Irrelevant) => Phase::End,
        (Phase::Research, Decision::Drafted) => Phase::Verify,
        (Phase::Verify, Decision::Retry) => Phase::Research,
        (Phase::Verify, Decision::Accept) => Phase::End,
        (Phase::Verify, Decision::GiveUp) => Phase::End,
        // A phase never emits another phase's decision; stop rather than
        // loop if that invariant is ever broken.
        _ => Phase::End,
    }
}

/// Mutable context threaded through one `answer` call. Never shared across
/// concurrent questions.
struct WorkflowState {
    question: String,
    chunks: Vec<RankedChunk>,
    answer: Option<Answer>,
    verdict: Option<Verdict>,
    is_relevant: bool,
    iterations: usize,
}

/// Final result handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub draft_answer: String,
    pub verification_report: String,
    pub sources: Vec<SourceRef>,
}

/// Sequences gate → research → verify, looping back to research while
/// verification rejects the draft, and bounding the loop so a stubbornly
/// unsupported answer still terminates.
pub struct Workflow {
    gate: RelevanceGate,
    researcher: Researcher,
    verifier: Verifier,
    config: WorkflowConfig,
}

impl Workflow {
    pub fn new(model: Arc<dyn TextGenerator>, config: WorkflowConfig) -> Self {
        Self {
            gate: RelevanceGate::new(model.clone()),
            researcher: Researcher::new(model.clone()),
            verifier: Verifier::new(model),
            config,
        }
    }

    /// Answer `question` against the retriever's chunk set.
    ///
    /// Retrieval failure is the only error that escapes; every model
    /// failure downstream resolves to a refusal or a fail-closed report.
    pub async fn answer(
        &self,
        question: &str,
        retriever: &HybridRetriever,
    ) -> Result<AnswerOutcome, RetrievalError> {
        let chunks = retriever.retrieve(question, self.config.relevance_k).await?;
        tracing::info!("Retrieved {} chunks for the question", chunks.len());

        let mut state = WorkflowState {
            question: question.to_string(),
            chunks,
            answer: None,
            verdict: None,
            is_relevant: false,
            iterations: 0,
        };
        let mut bound_hit = false;
        let mut phase = Phase::CheckRelevance;

        while phase != Phase::End {
            phase = match phase {
                Phase::CheckRelevance => {
                    let label = self
                        .gate
                        .classify(&state.question, &state.chunks, self.config.relevance_k)
                        .await;
                    let decision = match label {
                        RelevanceLabel::NoMatch => Decision::Irrelevant,
                        RelevanceLabel::CanAnswer | RelevanceLabel::Partial => Decision::Relevant,
                    };
                    state.is_relevant = decision == Decision::Relevant;
                    next_phase(phase, decision)
                }
                Phase::Research => {
                    state.iterations += 1;
                    tracing::info!("Research pass {}", state.iterations);
                    let answer = self.researcher.draft(&state.question, &state.chunks).await;
                    state.answer = Some(answer);
                    next_phase(phase, Decision::Drafted)
                }
                Phase::Verify => {
                    let draft = state
                        .answer
                        .as_ref()
                        .map(|a| a.draft.as_str())
                        .unwrap_or_default();
                    let verdict = self.verifier.check(draft, &state.chunks).await;
                    let passed = verdict.passes();
                    state.verdict = Some(verdict);

                    let decision = if passed {
                        tracing::info!("Verification passed, ending workflow");
                        Decision::Accept
                    } else if state.iterations >= self.config.max_iterations {
                        tracing::warn!(
                            "Verification still failing after {} research passes; \
                             returning the last draft",
                            state.iterations
                        );
                        bound_hit = true;
                        Decision::GiveUp
                    } else {
                        tracing::info!("Verification rejected the draft; re-drafting");
                        Decision::Retry
                    };
                    next_phase(phase, decision)
                }
                Phase::End => Phase::End,
            };
        }

        Ok(self.finalize(state, bound_hit))
    }

    fn finalize(&self, state: WorkflowState, bound_hit: bool) -> AnswerOutcome {
        if !state.is_relevant {
            return AnswerOutcome {
                draft_answer: REFUSAL_MESSAGE.to_string(),
                verification_report: String::new(),
                sources: Vec::new(),
            };
        }

        let (draft_answer, sources) = match state.answer {
            Some(answer) => (answer.draft, dedup_sources(answer.sources)),
            None => (REFUSAL_MESSAGE.to_string(), Vec::new()),
        };

        let mut verification_report = state
            .verdict
            .as_ref()
            .map(format_report)
            .unwrap_or_default();
        if bound_hit {
            verification_report.push_str(&format!(
                "\nVerification did not fully pass within {} research passes; \
                 returning the last draft.\n",
                self.config.max_iterations
            ));
        }

        AnswerOutcome {
            draft_answer,
            verification_report,
            sources,
        }
    }
}

/// Deduplicate citations by `(source, page)` in first-seen order. Content
/// is deliberately not part of the key: identical text appearing in two
/// documents still credits both documents.
fn dedup_sources(sources: Vec<SourceRef>) -> Vec<SourceRef> {
    let mut seen: HashSet<(String, Option<u32>)> = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert((s.source.clone(), s.page)))
        .collect()
}
