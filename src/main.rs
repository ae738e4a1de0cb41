use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pg_funcsync::parser::ParsedDefinition;
use pg_funcsync::sync::SqlFile;
use pg_funcsync::{ensure_marker, parse_definition, sync_directory, InMemoryCatalog, SyncOptions};

#[derive(Parser)]
#[command(name = "pg-funcsync")]
#[command(author, version, about = "PostgreSQL function and procedure script sync")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CREATE FUNCTION/PROCEDURE script and print its metadata
    Parse {
        /// Path to the .sql file
        file: PathBuf,
    },

    /// Insert or update the @GUID marker of a script
    Mark {
        /// Path to the .sql file
        file: PathBuf,

        /// Identifier to embed, with or without braces
        #[arg(long)]
        id: String,

        /// Rewrite the file instead of printing the result
        #[arg(long)]
        in_place: bool,
    },

    /// Synchronize a database library folder with an in-memory catalog
    Sync {
        /// Library root containing the routine folders
        root: PathBuf,

        /// Sub-folder to scan (repeatable, defaults to functions and procedures)
        #[arg(long = "folder")]
        folders: Vec<String>,

        /// File name pattern
        #[arg(long, default_value = "*.sql")]
        pattern: String,

        /// Report marker rewrites without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    match cli.command {
        Commands::Parse { file } => {
            let sql = SqlFile::read(&file)?;
            let Some(definition) = parse_definition(&sql.content) else {
                bail!(
                    "No CREATE FUNCTION or CREATE PROCEDURE statement in {}",
                    file.display()
                );
            };
            print_definition(&definition);
        }
        Commands::Mark { file, id, in_place } => {
            let sql = SqlFile::read(&file)?;
            let updated = ensure_marker(&sql.content, &id);
            if in_place {
                if updated != sql.content {
                    sql.write(&updated)?;
                }
            } else {
                print!("{}", updated);
            }
        }
        Commands::Sync {
            root,
            folders,
            pattern,
            dry_run,
        } => {
            let defaults = SyncOptions::default();
            let options = SyncOptions {
                root,
                folders: if folders.is_empty() {
                    defaults.folders
                } else {
                    folders
                },
                pattern,
                dry_run,
            };

            let mut catalog = InMemoryCatalog::new();
            let report = sync_directory(&options, &mut catalog)?;

            println!("Files scanned: {}", report.files_scanned);
            println!("Created:       {}", report.created);
            println!("Updated:       {}", report.updated);
            println!("Unchanged:     {}", report.unchanged);
            for path in &report.rewritten {
                println!("Marker written: {}", path.display());
            }
            for path in &report.skipped {
                println!("Skipped: {}", path.display());
            }
            for id in &report.removed {
                println!("Removed: {}", id);
            }
        }
    }

    Ok(())
}

fn print_definition(definition: &ParsedDefinition) {
    println!("Kind:       {}", definition.kind());
    println!("Name:       {}", definition.qualified_name);
    println!("Arguments:  {}", definition.argument_list);
    if !definition.returns.is_empty() {
        println!("Returns:    {}", definition.returns);
    }
    println!("Language:   {}", definition.language);
    if definition.is_security_definer {
        println!("Security:   DEFINER");
    }
    if let Some(attrs) = definition.function_attributes() {
        println!("Volatility: {}", attrs.volatility);
        println!("Parallel:   {}", attrs.parallel);
        if attrs.is_strict {
            println!("Strict:     yes");
        }
        if attrs.is_leakproof {
            println!("Leakproof:  yes");
        }
        if attrs.is_window {
            println!("Window:     yes");
        }
        if let Some(cost) = &attrs.cost {
            println!("Cost:       {}", cost);
        }
        if let Some(rows) = &attrs.rows {
            println!("Rows:       {}", rows);
        }
    }
    if let Some(id) = &definition.correlation_id {
        println!("Identifier: {}", id);
    }
    if let Some(comment) = &definition.trailing_comment {
        println!("Comment:    {}", comment);
    }
    println!();
    println!("{}", definition.body_text());
}
