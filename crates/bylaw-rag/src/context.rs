//! Prompt context assembly from retrieved chunks.

use crate::retriever::RetrievedDocument;

/// Renders retrieved chunks as the grounding block of the answer prompt:
/// each chunk is a `[Source: ...]` line followed by its text, chunks
/// separated by blank lines.
#[must_use]
pub fn format_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| format!("[Source: {}]\n{}", doc.source, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
