use super::{load_page, load_registry};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_document::check_invariants;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Page file or stored page id
    pub page: String,
}

pub async fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = load_registry(&config, cwd)?;
    let document = load_page(&args.page, &config, cwd).await?;

    println!(
        "{} {} ({} nodes)",
        "🔍 Validating".bright_blue().bold(),
        args.page,
        document.len()
    );

    let violations = check_invariants(&document, &registry);
    if violations.is_empty() {
        println!("{}", "✅ No problems found".green().bold());
        return Ok(());
    }

    for violation in &violations {
        println!("  {} {}", "✗".red(), violation);
    }
    Err(anyhow!("{} structural problem(s) found", violations.len()))
}
