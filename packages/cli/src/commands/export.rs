use super::{load_page, load_registry};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_bundle::ExportBundle;
use pagecraft_compiler_html::{compile_page, PageShell};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Page file or stored page id
    pub page: String,

    /// Output directory
    #[arg(short, long, default_value = "dist")]
    pub out: String,

    /// Number of top-level children treated as above the fold
    #[arg(long)]
    pub fold: Option<usize>,

    /// Readable output instead of minified
    #[arg(long)]
    pub pretty: bool,
}

pub async fn export(args: ExportArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = load_registry(&config, cwd)?;
    let document = load_page(&args.page, &config, cwd).await?;

    let mut options = config.export.clone();
    if let Some(fold) = args.fold {
        options.fold_count = fold;
    }
    if args.pretty {
        options.pretty = true;
        options.minify = false;
    }

    println!("{}", "🔨 Exporting page...".bright_blue().bold());

    let bundle = pagecraft_bundle::export(&document, &registry, &options)
        .await
        .with_context(|| format!("Export of '{}' failed", args.page))?;

    let out_dir = cwd.join(&args.out);
    let written = write_bundle(&bundle, &out_dir, &page_title(&args.page))?;
    for (path, bytes) in written {
        println!(
            "  {} {} ({} bytes)",
            "✓".green(),
            path.strip_prefix(cwd).unwrap_or(&path).display(),
            bytes
        );
    }

    println!();
    println!(
        "{} {} assets, fold at {} top-level children",
        "✅ Export complete:".green().bold(),
        bundle.assets.len(),
        options.fold_count
    );
    Ok(())
}

/// Write `index.html`, `critical.css`, `deferred.css` and `assets.json`
pub fn write_bundle(
    bundle: &ExportBundle,
    out_dir: &Path,
    title: &str,
) -> Result<Vec<(PathBuf, usize)>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Cannot create {}", out_dir.display()))?;

    let shell = PageShell {
        title: title.to_string(),
        critical_css: bundle.critical_styles.clone(),
        deferred_href: (!bundle.deferred_styles.is_empty()).then(|| "deferred.css".to_string()),
        ..PageShell::default()
    };

    let files = [
        ("index.html", compile_page(&bundle.markup, &shell)),
        ("critical.css", bundle.critical_styles.clone()),
        ("deferred.css", bundle.deferred_styles.clone()),
        ("assets.json", serde_json::to_string_pretty(&bundle.assets)?),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = out_dir.join(name);
        fs::write(&path, &content).with_context(|| format!("Cannot write {}", path.display()))?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote bundle file");
        written.push((path, content.len()));
    }
    Ok(written)
}

fn page_title(page: &str) -> String {
    Path::new(page)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(page)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_bundle::AssetRef;
    use pagecraft_schema::AssetKind;

    #[test]
    fn test_write_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ExportBundle {
            markup: "<div data-pc-id=\"a\" class=\"pc-1\"></div>".into(),
            critical_styles: ".pc-1{height:32px}".into(),
            deferred_styles: ".pc-2{color:red}".into(),
            assets: vec![AssetRef {
                id: "asset-1".into(),
                url: "/a.png".into(),
                kind: AssetKind::Image,
            }],
        };

        let written = write_bundle(&bundle, dir.path(), "home").unwrap();
        assert_eq!(written.len(), 4);

        let index = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("<title>home</title>"));
        assert!(index.contains("<style>.pc-1{height:32px}</style>"));
        assert!(index.contains("href=\"deferred.css\""));

        let assets: Vec<AssetRef> =
            serde_json::from_str(&fs::read_to_string(dir.path().join("assets.json")).unwrap())
                .unwrap();
        assert_eq!(assets, bundle.assets);
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("pages/about.json"), "about");
        assert_eq!(page_title("home"), "home");
    }
}
