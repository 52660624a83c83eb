use tokenizers::{EncodeInput, Tokenizer};

use crate::error::RerankerError;

/// How a (query, document) pair is turned into model input before scoring.
#[derive(Debug, Clone)]
pub enum PromptTemplate {
    /// `<Instruct>: {instruction}\n<Query>: {query}\n<Document>: {document}`,
    /// the format `zhiqing/Qwen3-Reranker-*-ONNX` expects: a single sequence,
    /// no sentence-pair structure.
    Qwen3 { instruction: String },
    /// Plain BERT-style cross-encoder: the tokenizer builds
    /// `[CLS] query [SEP] document [SEP]` from a sentence pair.
    ClsSepSep,
}

impl PromptTemplate {
    pub fn default_qwen3() -> Self {
        PromptTemplate::Qwen3 {
            instruction: "Given a web search query, retrieve relevant passages that answer the query".into(),
        }
    }

    pub(crate) fn encode(
        &self,
        tokenizer: &Tokenizer,
        query: &str,
        document: &str,
    ) -> Result<tokenizers::Encoding, RerankerError> {
        let input: EncodeInput = match self {
            PromptTemplate::Qwen3 { instruction } => {
                format!("<Instruct>: {instruction}\n<Query>: {query}\n<Document>: {document}").into()
            }
            PromptTemplate::ClsSepSep => (query.to_string(), document.to_string()).into(),
        };

        tokenizer
            .encode(input, true)
            .map_err(|err| RerankerError::ProviderFailure {
                message: format!("tokenize (query, document) pair failed: {err}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qwen3_template_embeds_instruction_query_and_document_markers() {
        let template = PromptTemplate::default_qwen3();
        let text = match &template {
            PromptTemplate::Qwen3 { instruction } => {
                format!("<Instruct>: {instruction}\n<Query>: what is rust\n<Document>: rust is a systems language")
            }
            PromptTemplate::ClsSepSep => unreachable!(),
        };
        assert!(text.contains("<Instruct>:"));
        assert!(text.contains("<Query>: what is rust"));
        assert!(text.contains("<Document>: rust is a systems language"));
    }
}
