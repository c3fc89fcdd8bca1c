//! Batch evaluation of a knowledge base with single-shot keyword retrieval.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use pipelines_core::domains::helpdesk::knowledge;
use pipelines_core::domains::keyword_rag::KeywordRag;
use pipelines_core::kernel::OpenAICompatibleLLM;
use pipelines_core::Valve;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::utils::{preview, question_lines};

pub async fn run(ctx: &AppContext, questions: &Path, db: &Path, verbose: bool) -> Result<()> {
    let valves = ctx.valves();
    valves
        .require(&[Valve::ApiKey, Valve::ModelNameChat, Valve::ModelNameAnalyze])
        .context("Evaluation needs the model valves")?;

    let contents = std::fs::read_to_string(questions)
        .with_context(|| format!("Failed to read {}", questions.display()))?;
    let lines = question_lines(&contents);

    let rag = KeywordRag::new(
        Arc::new(OpenAICompatibleLLM::from_valves(valves)),
        knowledge::load(Some(db))?,
        valves.model_name_analyze.trim(),
        valves.model_name_chat.trim(),
    );

    info!(questions = lines.len(), db = %db.display(), "Starting evaluation");
    ctx.print_header(&format!("Evaluating {} question(s)", lines.len()));

    let mut failures = 0;
    for (i, question) in lines.iter().enumerate() {
        println!();
        println!("{} {}", format!("Q{}", i + 1).bright_cyan().bold(), question);

        match rag.run(question).await {
            Ok(result) => {
                if verbose {
                    println!("{} {}", "keywords:".dimmed(), result.keywords.join(", "));
                    for document in &result.documents {
                        println!("{} {}", "document:".dimmed(), preview(document, 100));
                    }
                }
                println!("{}", result.answer);
            }
            Err(e) => {
                failures += 1;
                warn!(question = %question, error = %e, "Question failed");
                println!("{} {:#}", "error:".red(), e);
            }
        }
    }

    println!();
    if failures == 0 {
        ctx.print_success(&format!("{} question(s) answered", lines.len()));
    } else {
        ctx.print_warning(&format!("{} of {} question(s) failed", failures, lines.len()));
    }

    Ok(())
}
