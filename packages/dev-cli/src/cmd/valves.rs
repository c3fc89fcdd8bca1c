use anyhow::Result;
use console::style;
use pipelines_core::Valve;

use crate::context::AppContext;

/// Print every valve, secrets masked, flagging the unset ones.
pub fn show(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Valves");

    let valves = ctx.valves();
    for (valve, (key, shown)) in Valve::ALL.iter().zip(valves.masked()) {
        let marker = if valves.is_set(*valve) {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {:<22} {}", marker, key, shown);
    }

    match &ctx.config.knowledge_base_path {
        Some(path) => ctx.print_info(&format!("Knowledge base: {}", path.display())),
        None => ctx.print_info("Knowledge base: embedded"),
    }
    ctx.print_info(&format!("Workspace: {}", ctx.repo.display()));

    Ok(())
}
