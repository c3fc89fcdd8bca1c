//! Application context with shared state and utilities

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use pipelines_core::{ServerConfig, Valves};
use std::path::PathBuf;

use crate::utils::repo_root;

/// Application context passed to all commands
pub struct AppContext {
    pub repo: PathBuf,
    pub quiet: bool,
    pub config: ServerConfig,
}

impl AppContext {
    pub fn new(quiet: bool) -> Result<Self> {
        let repo = repo_root()?;
        // The workspace .env is picked up even when run from elsewhere
        let _ = dotenvy::from_path(repo.join(".env"));
        let config = ServerConfig::from_env()?;
        Ok(Self {
            repo,
            quiet,
            config,
        })
    }

    pub fn valves(&self) -> &Valves {
        &self.config.valves
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    /// One line from the user; empty input is allowed.
    pub fn ask(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }
}
