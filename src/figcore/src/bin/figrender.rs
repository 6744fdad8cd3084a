use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figcore::{FigDocument, Id, NodeType, RenderOptions};

#[derive(Debug, Parser)]
#[command(name = "figrender")]
#[command(version)]
#[command(about = "Inspect and render fig archive documents")]
struct Cli {
    /// Path to the `.fig` archive
    file: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the document's pages (CANVAS children of the root)
    Pages,
    /// Print a node's fields
    Show {
        /// Node id, `session:local` or `session-local`
        id: String,
    },
    /// Search nodes by type and/or name substring
    Find {
        #[arg(long)]
        r#type: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Render a subtree to SVG
    Render {
        /// Node id to render; defaults to the document root
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long)]
        background: Option<String>,
        #[arg(long)]
        no_text: bool,
        #[arg(long)]
        no_images: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let bytes = std::fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let doc = FigDocument::open(&bytes).context("parsing fig archive")?;

    match cli.cmd {
        Command::Pages => {
            for page in doc.pages() {
                println!("{} {}", page.id, page.name);
            }
        }
        Command::Show { id } => {
            let id = Id::parse(&id)?;
            let node = doc.resolve(id)?;
            println!("{node:#?}");
        }
        Command::Find { r#type, name } => {
            let ty = r#type.as_deref().map(NodeType::from_tag);
            for node in doc.find(ty, name.as_deref()) {
                println!("{} {:?} {}", node.id, node.node_type, node.name);
            }
        }
        Command::Render { id, out, scale, background, no_text, no_images } => {
            let root = match id {
                Some(s) => Id::parse(&s)?,
                None => doc.root(),
            };
            let options = RenderOptions {
                scale,
                background,
                include_text: !no_text,
                include_images: !no_images,
                ..RenderOptions::default()
            };
            let result = doc.render_subtree(root, &options)?;
            for warning in &result.warnings {
                tracing::warn!(%warning, "render warning");
            }
            match out {
                Some(path) => std::fs::write(&path, result.output).with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", result.output),
            }
        }
    }

    Ok(())
}
