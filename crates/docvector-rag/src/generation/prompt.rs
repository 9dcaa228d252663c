//! Prompt templates for RAG queries

use crate::retrieval::RetrievedChunk;

/// Prompt builder for grounded question answering
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from retrieved chunks
    pub fn build_context(results: &[RetrievedChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n{}\n\n",
                i + 1,
                result.chunk.source.format_citation(),
                result.chunk.content
            ));
        }

        context
    }

    /// Render the fixed grounded-answer prompt
    ///
    /// The model is instructed to answer strictly from the supplied context
    /// and to admit not knowing rather than fabricate.
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Use the pieces of information provided in the context to answer the user's question.
If you don't know the answer, just say that you don't know. Don't try to make up an answer.
Don't provide anything out of the given context.

Context:
{context}

Question: {question}

Start the answer directly. No small talk please."#,
            context = context,
            question = question
        )
    }
}
