//! Interactive pipeline turns.
//!
//! The history lives here, as the host would keep it: every user line and
//! every streamed answer is appended and sent back in full on the next turn.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use futures::StreamExt;
use pipelines_core::domains::helpdesk::knowledge;
use pipelines_core::kernel::OpenAICompatibleLLM;
use pipelines_core::server::build_registry;
use pipelines_core::{PipeBody, PipeEvent, PipeInput, PipeMessage, PipelineRegistry};
use tracing::{debug, info};

use crate::context::AppContext;

fn registry(ctx: &AppContext) -> Result<PipelineRegistry> {
    let store = knowledge::load(ctx.config.knowledge_base_path.as_deref())?;
    let llm = Arc::new(OpenAICompatibleLLM::from_valves(ctx.valves()));
    Ok(build_registry(llm, store, ctx.valves()))
}

pub fn list_pipelines(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Pipelines");
    for pipeline in registry(ctx)?.iter() {
        println!("  {} {}", style(pipeline.id()).cyan(), style(pipeline.name()).dim());
    }
    Ok(())
}

pub async fn run(ctx: &AppContext, pipeline_id: &str) -> Result<()> {
    let registry = registry(ctx)?;
    let pipeline = registry.get(pipeline_id).with_context(|| {
        format!(
            "Unknown pipeline '{}' (available: {})",
            pipeline_id,
            registry.ids().join(", ")
        )
    })?;

    ctx.print_header(&format!("Chat: {}", pipeline.name()));
    ctx.print_info("Empty line or /quit to leave, /reset to start over, /doc <name> <file> to attach a document");

    let mut history: Vec<PipeMessage> = Vec::new();
    let mut documents: Vec<(String, String)> = Vec::new();

    loop {
        let line = ctx.ask("Vous")?;
        let line = line.trim();

        match line {
            "" | "/quit" => return Ok(()),
            "/reset" => {
                history.clear();
                documents.clear();
                ctx.print_success("Conversation reset");
                continue;
            }
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("/doc ") {
            match attach(rest) {
                Ok(doc) => {
                    ctx.print_success(&format!("Attached {}", doc.0));
                    documents.push(doc);
                }
                Err(e) => ctx.print_warning(&format!("{:#}", e)),
            }
            continue;
        }

        history.push(PipeMessage::user(line));

        let mut messages = Vec::with_capacity(history.len() + 1);
        if !documents.is_empty() {
            messages.push(source_context(&documents));
        }
        messages.extend(history.iter().cloned());

        let input = PipeInput::from_body(PipeBody {
            stream: true,
            model: pipeline_id.to_string(),
            messages,
            user: None,
        });

        info!(
            pipeline = pipeline_id,
            messages = history.len(),
            documents = documents.len(),
            "Sending turn"
        );
        let mut events = pipeline.pipe(input).await.into_stream();
        let mut answer = String::new();
        let mut stdout = std::io::stdout();

        while let Some(event) = events.next().await {
            match event {
                PipeEvent::Text(text) => {
                    print!("{}", text);
                    stdout.flush()?;
                    answer.push_str(&text);
                }
                PipeEvent::Status { description, done } => {
                    if !done {
                        println!("{}", style(format!("… {}", description)).dim());
                    }
                }
            }
        }
        println!();
        debug!(answer_length = answer.len(), "Turn finished");

        history.push(PipeMessage::assistant(answer));
    }
}

/// `<name> <file>`: read a file to attach as an uploaded document.
fn attach(args: &str) -> Result<(String, String)> {
    let (name, path) = args
        .trim()
        .split_once(' ')
        .context("Usage: /doc <name> <file>")?;
    let content = std::fs::read_to_string(path.trim())
        .with_context(|| format!("Failed to read {}", path.trim()))?;
    Ok((name.to_string(), content))
}

/// Leading system message carrying the attached documents, the way the
/// host injects uploads.
fn source_context(documents: &[(String, String)]) -> PipeMessage {
    let blocks: Vec<String> = documents
        .iter()
        .enumerate()
        .map(|(i, (name, content))| {
            format!("<source id=\"{}\" name=\"{}\">{}</source>", i + 1, name, content)
        })
        .collect();
    PipeMessage::system(blocks.join("\n"))
}
