//! Answer generation and document chat.

use super::context::{format_context_for_prompt, format_sources};
use super::{ContextBuilder, ContextChunk, GREETING, NO_ANSWER};
use crate::config::{Prompts, Settings};
use crate::error::{ItineraError, Result};
use crate::openai::create_client;
use crate::session::{ChatEntry, EntryKind, Role};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A chat model that answers one system + user prompt pair.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn answer(&self, system: &str, user: &str) -> Result<String>;
}

/// [`AnswerModel`] backed by the chat completions API.
pub struct OpenAIAnswerModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIAnswerModel {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            create_client(&settings.openai)?,
            settings.rag.model.clone(),
            settings.rag.temperature,
        ))
    }
}

#[async_trait]
impl AnswerModel for OpenAIAnswerModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn answer(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| ItineraError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| ItineraError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| ItineraError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ItineraError::OpenAI(format!("Failed to generate response: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ItineraError::Rag("Empty response from LLM".to_string()))
    }
}

/// Retrieval-augmented question answering.
pub struct RagEngine {
    context_builder: ContextBuilder,
    model: Arc<dyn AnswerModel>,
    prompts: Prompts,
}

impl RagEngine {
    pub fn new(context_builder: ContextBuilder, model: Arc<dyn AnswerModel>) -> Self {
        Self {
            context_builder,
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a question from the indexed documents.
    ///
    /// When nothing is retrieved the model is not called.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        info!("Answering question from documents");

        let sources = self.context_builder.build(question).await?;
        if sources.is_empty() {
            return Ok(RagResponse {
                answer: NO_ANSWER.to_string(),
                sources,
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&sources));

        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &HashMap::new());
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let answer = self.model.answer(&system, &user).await?;
        debug!("Generated answer from {} chunks", sources.len());

        Ok(RagResponse { answer, sources })
    }
}

/// An answer and the chunks it was drawn from.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Chunks given to the model, most similar first.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// The answer followed by a `Sources:` line when anything was retrieved.
    pub fn format_for_display(&self) -> String {
        if self.sources.is_empty() {
            return self.answer.clone();
        }
        format!("{}\n\nSources: {}", self.answer, format_sources(&self.sources))
    }
}

/// A document chat with history.
pub struct DocChat {
    engine: RagEngine,
    history: Vec<ChatEntry>,
}

impl DocChat {
    /// Start a chat that opens with the greeting.
    pub fn new(engine: RagEngine) -> Self {
        let mut chat = Self {
            engine,
            history: Vec::new(),
        };
        chat.reset();
        chat
    }

    /// History, oldest first.
    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    /// Drop everything but the greeting.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(assistant(GREETING.to_string(), EntryKind::Message));
    }

    /// Ask a question and record both sides in the history.
    ///
    /// Each question is answered on its own; earlier turns are not sent to
    /// the model.
    pub async fn ask(&mut self, question: &str) -> Result<RagResponse> {
        self.history.push(ChatEntry {
            role: Role::User,
            content: question.to_string(),
            kind: EntryKind::Message,
            trace: None,
        });

        match self.engine.ask(question).await {
            Ok(response) => {
                self.history
                    .push(assistant(response.format_for_display(), EntryKind::Answer));
                Ok(response)
            }
            Err(e) => {
                self.history
                    .push(assistant(format!("Error: {}", e), EntryKind::Failure));
                Err(e)
            }
        }
    }
}

fn assistant(content: String, kind: EntryKind) -> ChatEntry {
    ChatEntry {
        role: Role::Assistant,
        content,
        kind,
        trace: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::{KeywordEmbedder, RecordingModel};
    use crate::documents::TextChunk;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};

    async fn store_with(chunks: &[(&str, Option<u32>, &str)]) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = KeywordEmbedder;
        let mut docs = Vec::new();
        for (i, (source, page, content)) in chunks.iter().enumerate() {
            let chunk = TextChunk {
                content: content.to_string(),
                source: source.to_string(),
                page: *page,
                index: i as i32,
            };
            docs.push(Document::new("docs", chunk, embedder.vector(content)));
        }
        store.upsert_batch(&docs).await.unwrap();
        store
    }

    fn engine(store: Arc<MemoryVectorStore>, model: Arc<RecordingModel>) -> RagEngine {
        let builder = ContextBuilder::new(store, Arc::new(KeywordEmbedder), "docs");
        RagEngine::new(builder, model)
    }

    #[tokio::test]
    async fn test_empty_store_answers_without_model() {
        let model = Arc::new(RecordingModel::new("unused"));
        let engine = engine(Arc::new(MemoryVectorStore::new()), model.clone());

        let response = engine.ask("What about Rome?").await.unwrap();

        assert_eq!(response.answer, NO_ANSWER);
        assert_eq!(response.format_for_display(), NO_ANSWER);
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_answer_cites_sources() {
        let store = store_with(&[
            ("rome.pdf", Some(2), "The Rome museum opens at nine."),
            ("notes.txt", None, "Paris trip notes."),
            ("rome.pdf", Some(2), "Rome museum tickets cost 18 euros."),
        ])
        .await;
        let model = Arc::new(RecordingModel::new("It opens at nine."));
        let engine = engine(store, model.clone());

        let response = engine.ask("When does the Rome museum open?").await.unwrap();

        assert_eq!(response.sources.len(), 3);
        assert_eq!(
            response.format_for_display(),
            "It opens at nine.\n\nSources: rome.pdf:p2; notes.txt"
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        let (system, user) = &prompts[0];
        assert!(system.contains("ONLY"));
        assert!(user.starts_with("Question: When does the Rome museum open?\n\nContext:\n"));
        assert!(user.contains("opens at nine.\n\n"));
    }

    #[tokio::test]
    async fn test_retrieves_at_most_four_chunks() {
        let chunks: Vec<(&str, Option<u32>, &str)> = (1..=6)
            .map(|_| ("guide.pdf", Some(1), "Rome museum"))
            .collect();
        let store = store_with(&chunks).await;
        let model = Arc::new(RecordingModel::new("ok"));

        let response = engine(store, model).ask("Rome").await.unwrap();
        assert_eq!(response.sources.len(), 4);
    }

    #[tokio::test]
    async fn test_doc_chat_history() {
        let store = store_with(&[("notes.txt", None, "Paris museum")]).await;
        let model = Arc::new(RecordingModel::new("Yes."));
        let mut chat = DocChat::new(engine(store, model));

        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.history()[0].content, GREETING);

        chat.ask("Is there a museum?").await.unwrap();
        let history = chat.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[2].content, "Yes.\n\nSources: notes.txt");

        chat.reset();
        assert_eq!(chat.history().len(), 1);
    }

    #[tokio::test]
    async fn test_doc_chat_records_errors() {
        let store = store_with(&[("notes.txt", None, "Paris")]).await;
        let model = Arc::new(RecordingModel::failing("rate limited"));
        let mut chat = DocChat::new(engine(store, model));

        assert!(chat.ask("Paris?").await.is_err());
        let last = chat.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Failure);
        assert!(last.content.starts_with("Error: "));
        assert!(last.content.contains("rate limited"));
    }
}
