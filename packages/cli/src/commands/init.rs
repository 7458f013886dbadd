use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{DocumentStore, EditSession, FileStore, NodeTemplate, Props};
use pagecraft_schema::standard_registry;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Page storage directory
    #[arg(short, long, default_value = "pages")]
    pub storage_dir: String,

    /// Skip writing the example page
    #[arg(long)]
    pub no_example: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub async fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Pagecraft project...".bright_blue().bold());

    let config = Config {
        storage_dir: args.storage_dir.clone(),
        ..Config::default()
    };

    let storage_dir = config.get_storage_dir(cwd);
    if !storage_dir.exists() {
        fs::create_dir_all(&storage_dir)?;
        println!("  {} Created {}/", "✓".green(), args.storage_dir);
    }

    if !args.no_example {
        let store = FileStore::new(&storage_dir);
        let path = store.path_for("home")?;
        if !path.exists() {
            let document = example_page(&config)?;
            store.save("home", &document).await?;
            println!("  {} Created {}/home.json", "✓".green(), args.storage_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: pagecraft validate home");
    println!("  2. Run: pagecraft export home");
    println!("  3. Check output in dist/");

    Ok(())
}

/// A hero section and a two-column block, built through the editor
fn example_page(config: &Config) -> Result<pagecraft_editor::Document> {
    let props = |value| serde_json::from_value::<Props>(value);

    let mut session = EditSession::new(
        "home",
        pagecraft_editor::Document::new(),
        Arc::new(standard_registry()),
        config.editor.clone(),
    )?;

    session.insert_subtree(
        None,
        None,
        0,
        &NodeTemplate::new("Section")
            .with_props(props(json!({
                "label": "Hero",
                "style": { "padding": 64, "textAlign": "center" }
            }))?)
            .child(
                NodeTemplate::new("Heading").with_props(props(json!({ "text": "Welcome" }))?),
            )
            .child(NodeTemplate::new("Text").with_props(props(
                json!({ "text": "Edit this page and export it with pagecraft export." }),
            )?)),
    )?;

    session.insert_subtree(
        None,
        None,
        1,
        &NodeTemplate::new("Columns")
            .with_props(props(json!({
                "style": {
                    "display": "flex",
                    "gap": 24,
                    "@media (max-width: 600px)": { "flexDirection": "column" }
                }
            }))?)
            .child(
                NodeTemplate::new("Image")
                    .in_zone("left")
                    .with_props(props(json!({ "src": "/images/feature.png", "alt": "Feature" }))?),
            )
            .child(
                NodeTemplate::new("Button")
                    .in_zone("right")
                    .with_props(props(json!({ "text": "Get started", "href": "/signup" }))?),
            ),
    )?;

    Ok(session.document().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::check_invariants;

    #[tokio::test]
    async fn test_init_creates_project() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            storage_dir: "pages".into(),
            no_example: false,
            force: false,
        };
        init(args, dir.path()).await.unwrap();

        assert!(dir.path().join(DEFAULT_CONFIG_NAME).exists());
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());

        let page = FileStore::new(dir.path().join("pages"))
            .load("home")
            .await
            .unwrap();
        assert_eq!(page.root_children().len(), 2);
        assert!(check_invariants(&page, &standard_registry()).is_empty());
    }

    #[test]
    fn test_example_page_exports() {
        let page = example_page(&Config::default()).unwrap();
        let bundle =
            pagecraft_bundle::compile_bundle(&page, &standard_registry(), &Default::default())
                .unwrap();
        assert!(bundle.markup.contains("Welcome"));
        assert_eq!(bundle.assets.len(), 1);
    }
}
