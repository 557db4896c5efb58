//! NoteCanvas command-line front end.
//!
//! Operates on a vault directory: lists canvases, notes and links, creates
//! canvases and text notes, and renames note files. Every command ends with
//! a workspace shutdown so pending saves and the layout reach disk.

use anyhow::Context;
use clap::{Parser, Subcommand};
use nc_cli::workspace::Workspace;
use nc_core::{CanvasId, NoteId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notecanvas")]
#[command(version)]
#[command(about = "Infinite-canvas notes stored as plain files")]
struct Cli {
    /// Vault directory
    #[arg(long, default_value = ".")]
    vault: PathBuf,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List canvases, home first
    Canvases,

    /// List the notes placed on a canvas
    Notes { canvas: String },

    /// List resolved [[links]] between notes on a canvas
    Links { canvas: String },

    /// Create a canvas
    NewCanvas { name: String },

    /// Create a text note file and place it on a canvas
    AddText { canvas: String, title: String },

    /// Delete a canvas layout (the home canvas is kept)
    DeleteCanvas { name: String },

    /// Rename a note's backing file
    Rename {
        canvas: String,
        note_id: String,
        new_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut ws = Workspace::open(&cli.vault)
        .await
        .with_context(|| format!("opening vault {}", cli.vault.display()))?;
    let result = run(&mut ws, cli.command).await;
    ws.shutdown().await?;
    result
}

async fn run(ws: &mut Workspace, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Canvases => {
            for id in ws.canvases() {
                let marker = if id.is_home() { " (home)" } else { "" };
                println!("{id}{marker}");
            }
        }
        Command::Notes { canvas } => {
            ws.switch_canvas(&CanvasId::new(canvas)).await?;
            for note in ws.session().notes().iter() {
                println!(
                    "{}\t{}\t({:.0}, {:.0})\t{}",
                    note.id,
                    note.kind.tag(),
                    note.world_x,
                    note.world_y,
                    note.title.as_deref().or(note.file_name()).unwrap_or("-"),
                );
            }
        }
        Command::Links { canvas } => {
            ws.switch_canvas(&CanvasId::new(canvas)).await?;
            let edges = ws.links();
            let label = |id: NoteId| {
                ws.session()
                    .note(id)
                    .and_then(|n| n.file_name().or(n.title.as_deref()))
                    .map(str::to_string)
                    .unwrap_or_else(|| id.to_string())
            };
            for edge in edges {
                println!("{} -> {}", label(edge.from), label(edge.to));
            }
        }
        Command::NewCanvas { name } => {
            let id = ws.create_canvas(&name).await?;
            println!("{id}");
        }
        Command::DeleteCanvas { name } => {
            ws.delete_canvas(&CanvasId::new(name)).await?;
        }
        Command::AddText { canvas, title } => {
            ws.switch_canvas(&CanvasId::new(canvas)).await?;
            let id = ws.add_text_note(&title).await?;
            println!("{id}");
        }
        Command::Rename {
            canvas,
            note_id,
            new_name,
        } => {
            ws.switch_canvas(&CanvasId::new(canvas)).await?;
            let path = ws
                .rename_note_file(NoteId::intern(&note_id), &new_name)
                .await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
