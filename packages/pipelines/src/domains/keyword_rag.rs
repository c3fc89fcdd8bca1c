//! Single-shot keyword retrieval: pick keywords, look them up, answer.
//!
//! Treats the input as the first message of a conversation. Used for batch
//! evaluation of a knowledge base against a list of questions.

use std::sync::Arc;

use anyhow::{Context, Result};
use keyword_db::KeywordStore;
use openai_client::Message;
use tracing::debug;

use crate::domains::helpdesk::KeywordSelection;
use crate::kernel::{extract, BaseLLM};

/// Keyword pick prompt; descriptions are listed for keywords that have one.
pub fn keyword_prompt(store: &dyn KeywordStore, user_input: &str) -> Vec<Message> {
    let keywords = store.keywords();
    let list = keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");

    let described: Vec<String> = keywords
        .iter()
        .filter_map(|k| {
            store
                .description(k)
                .filter(|d| !d.trim().is_empty())
                .map(|d| format!("- {} : {}", k, d))
        })
        .collect();

    let mut instruction = format!(
        "Sélectionne tous les mots clés qui correspondent à peu près à la situation de l'utilisateur.\
\nChoisis uniquement parmi la liste suivante : [{}]",
        list
    );
    if !described.is_empty() {
        instruction.push_str("\n\nPrécisions sur les mots clés :\n");
        instruction.push_str(&described.join("\n"));
    }

    vec![Message::system(instruction), Message::user(user_input)]
}

/// Answer prompt with the retrieved notes as knowledge.
pub fn answer_prompt(knowledge: &[String], user_input: &str) -> Vec<Message> {
    vec![
        Message::system(format!(
            "Réponds à la demande de l'utilisateur. Appuie-toi sur tes connaissances si elles sont pertinentes.\
\nConnaissances :\n{}",
            knowledge.join("\n")
        )),
        Message::user(user_input),
    ]
}

/// One retrieval-and-answer run, with what was retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagAnswer {
    pub keywords: Vec<String>,
    pub documents: Vec<String>,
    pub answer: String,
}

pub struct KeywordRag {
    llm: Arc<dyn BaseLLM>,
    store: Arc<dyn KeywordStore>,
    keyword_model: String,
    answer_model: String,
}

impl KeywordRag {
    pub fn new(
        llm: Arc<dyn BaseLLM>,
        store: Arc<dyn KeywordStore>,
        keyword_model: impl Into<String>,
        answer_model: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            store,
            keyword_model: keyword_model.into(),
            answer_model: answer_model.into(),
        }
    }

    /// Run retrieval and answer, keeping the intermediate results.
    pub async fn run(&self, user_input: &str) -> Result<RagAnswer> {
        let selection: KeywordSelection = extract(
            self.llm.as_ref(),
            &self.keyword_model,
            keyword_prompt(self.store.as_ref(), user_input),
        )
        .await
        .context("Keyword selection failed")?;

        let documents: Vec<String> = self.store.lookup(&selection.keywords).into_iter().collect();
        debug!(
            keywords = ?selection.keywords,
            documents = documents.len(),
            "Retrieved knowledge"
        );

        let answer = self
            .llm
            .complete(&self.answer_model, answer_prompt(&documents, user_input))
            .await
            .context("Answer generation failed")?;

        Ok(RagAnswer {
            keywords: selection.keywords,
            documents,
            answer,
        })
    }

    /// Answer `user_input` as the first message of a conversation.
    pub async fn respond(&self, user_input: &str) -> Result<String> {
        Ok(self.run(user_input).await?.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LlmCallKind, MockLLM};
    use keyword_db::JsonKeywordDb;

    fn store() -> Arc<dyn KeywordStore> {
        let mut db = JsonKeywordDb::new();
        db.insert_keyword("vpn", "le VPN ne se lance pas");
        db.insert_keyword("wifi", "");
        db.insert_document("note vpn", &["vpn".to_string()]);
        db.insert_document("note wifi", &["wifi".to_string()]);
        Arc::new(db)
    }

    #[test]
    fn test_keyword_prompt_lists_descriptions() {
        let prompt = keyword_prompt(store().as_ref(), "mon vpn");
        assert!(prompt[0].content.contains("[\"vpn\", \"wifi\"]"));
        assert!(prompt[0].content.contains("- vpn : le VPN ne se lance pas"));
        assert!(!prompt[0].content.contains("- wifi"));
        assert_eq!(prompt[1].content, "mon vpn");
    }

    #[tokio::test]
    async fn test_respond_uses_selected_documents() {
        let llm = Arc::new(
            MockLLM::new()
                .with_structured(&KeywordSelection {
                    keywords: vec!["vpn".into()],
                })
                .with_completion("Relancez le client."),
        );
        let rag = KeywordRag::new(llm.clone(), store(), "small", "large");

        let result = rag.run("mon vpn").await.unwrap();
        assert_eq!(result.documents, vec!["note vpn".to_string()]);
        assert_eq!(result.answer, "Relancez le client.");

        let calls = llm.calls();
        assert_eq!(calls[0].kind, LlmCallKind::Structured);
        assert_eq!(calls[0].model, "small");
        assert_eq!(calls[1].model, "large");
        assert!(calls[1].prompt_text().contains("Connaissances :\nnote vpn"));
        assert!(!calls[1].prompt_text().contains("note wifi"));
    }

    #[tokio::test]
    async fn test_respond_with_no_keywords() {
        let llm = Arc::new(
            MockLLM::new()
                .with_structured(&KeywordSelection { keywords: vec![] })
                .with_completion("Bonjour"),
        );
        let rag = KeywordRag::new(llm, store(), "small", "large");
        assert_eq!(rag.respond("bonjour").await.unwrap(), "Bonjour");
    }
}
