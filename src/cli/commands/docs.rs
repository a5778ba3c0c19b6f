//! Document chat commands: ingest, ask, chat.

use crate::cli::preflight::{self, Operation};
use crate::cli::{DocsAction, Output};
use crate::config::{Prompts, Settings};
use crate::documents::TextSplitter;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::rag::{ContextBuilder, DocChat, Indexer, OpenAIAnswerModel, RagEngine};
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Run a docs subcommand.
pub async fn run_docs(action: &DocsAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Docs, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    match action {
        DocsAction::Ingest { files } => {
            let store = open_store(&settings, false)?;
            ingest(files, &settings, store).await?;
        }

        DocsAction::Ask {
            question,
            show_context,
        } => {
            let store = open_store(&settings, false)?;
            let engine = build_engine(&settings, store)?;

            let spinner = Output::spinner("Searching your documents…");
            let response = engine.ask(question).await;
            spinner.finish_and_clear();
            let response = response?;

            println!("\n{}", response.format_for_display());
            if *show_context {
                for chunk in &response.sources {
                    Output::source_chunk(&chunk.citation(), chunk.score, &chunk.content);
                }
            }
            println!();
        }

        DocsAction::Chat { files, memory } => {
            let store = open_store(&settings, *memory)?;
            if !files.is_empty() {
                ingest(files, &settings, store.clone()).await?;
            }
            let engine = build_engine(&settings, store)?;
            chat_loop(DocChat::new(engine)).await?;
        }

        DocsAction::List => {
            let store = open_store(&settings, false)?;
            let sources = store.list_sources(&settings.rag.collection).await?;
            if sources.is_empty() {
                Output::info("No documents indexed yet. Run 'itinera docs ingest <files>'.");
                return Ok(());
            }
            Output::header(&format!("Collection '{}'", settings.rag.collection));
            for source in sources {
                let pages = source
                    .pages
                    .map(|p| format!(", {} pages", p))
                    .unwrap_or_default();
                Output::list_item(&format!(
                    "{} ({} chunks{})",
                    style(&source.source).bold(),
                    source.chunk_count,
                    pages
                ));
            }
        }
    }

    Ok(())
}

fn open_store(settings: &Settings, memory: bool) -> Result<Arc<dyn VectorStore>> {
    if memory {
        return Ok(Arc::new(MemoryVectorStore::new()));
    }
    Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?))
}

fn embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?))
}

fn build_engine(settings: &Settings, store: Arc<dyn VectorStore>) -> Result<RagEngine> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let context = ContextBuilder::new(store, embedder(settings)?, &settings.rag.collection)
        .with_top_k(settings.rag.top_k);
    let model = Arc::new(OpenAIAnswerModel::from_settings(settings)?);
    Ok(RagEngine::new(context, model).with_prompts(prompts))
}

async fn ingest(files: &[PathBuf], settings: &Settings, store: Arc<dyn VectorStore>) -> Result<()> {
    let splitter = TextSplitter::new(settings.rag.chunk_size, settings.rag.chunk_overlap)?;
    let indexer = Indexer::new(splitter, embedder(settings)?, store, &settings.rag.collection);

    let spinner = Output::spinner(&format!("Indexing {} files…", files.len()));
    let report = indexer.index_files(files).await;
    spinner.finish_and_clear();

    Output::success(&report?.to_string());
    Ok(())
}

async fn chat_loop(mut chat: DocChat) -> Result<()> {
    println!("\n{}", style("File Q&A").bold().cyan());
    println!("{}\n", style("Type 'reset' to start over, 'exit' to quit.").dim());
    if let Some(greeting) = chat.history().first() {
        println!("{} {}\n", style("Assistant:").cyan().bold(), greeting.content);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }
        if question.eq_ignore_ascii_case("reset") {
            chat.reset();
            Output::info("Conversation reset.");
            continue;
        }

        let spinner = Output::spinner("Thinking…");
        let result = chat.ask(question).await;
        spinner.finish_and_clear();

        let reply = chat
            .history()
            .last()
            .map(|entry| entry.content.clone())
            .unwrap_or_default();
        match result {
            Ok(_) => println!("\n{} {}\n", style("Assistant:").cyan().bold(), reply),
            Err(_) => Output::error(&reply),
        }
    }

    Ok(())
}
