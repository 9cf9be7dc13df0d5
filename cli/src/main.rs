//! docextract CLI - pull text, links, images, tables and metadata out of documents

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docextract::pipeline::process_file;
use docextract::{
    Category, DatabaseConfig, Diagnostics, DocumentReport, Event, Extractor, FilesystemSink,
    LogDiagnostics, MemoryDiagnostics, Outcome, PipelineError, RelationalSink, Sink,
};

#[derive(Parser)]
#[command(name = "docextract")]
#[command(version)]
#[command(about = "Extract PDF, DOCX and PPTX content into files and SQL tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every artifact category and persist it
    Extract {
        /// Input documents (.pdf, .docx, .pptx)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output directory; each document gets its own subdirectory
        #[arg(short, long, value_name = "DIR", default_value = "extracted")]
        output: PathBuf,

        /// Do not write files
        #[arg(long)]
        no_fs: bool,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Show format, metadata and artifact counts without persisting
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct DbArgs {
    /// MySQL host; enables the database sink
    #[arg(long, env = "DOCEXTRACT_DB_HOST", conflicts_with = "sqlite")]
    db_host: Option<String>,

    /// MySQL port
    #[arg(long, env = "DOCEXTRACT_DB_PORT", default_value_t = DatabaseConfig::MYSQL_PORT)]
    db_port: u16,

    /// MySQL user
    #[arg(long, env = "DOCEXTRACT_DB_USER", default_value = "root")]
    db_user: String,

    /// MySQL password
    #[arg(long, env = "DOCEXTRACT_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// MySQL database name
    #[arg(long, env = "DOCEXTRACT_DB_NAME", default_value = "docextract")]
    db_name: String,

    /// SQLite database file; enables the database sink
    #[arg(long, value_name = "PATH", env = "DOCEXTRACT_SQLITE")]
    sqlite: Option<PathBuf>,
}

impl DbArgs {
    fn config(&self) -> Option<DatabaseConfig> {
        if let Some(path) = &self.sqlite {
            return Some(DatabaseConfig::sqlite(path));
        }

        let host = self.db_host.as_ref()?;
        let mut config = DatabaseConfig::mysql(host, &self.db_user, &self.db_name).with_port(self.db_port);
        if let Some(password) = &self.db_password {
            config = config.with_password(password);
        }
        Some(config)
    }
}

/// Logs every event and keeps a copy for the summary.
#[derive(Default)]
struct Recorder {
    memory: MemoryDiagnostics,
}

impl Recorder {
    fn events_for(&self, document: &Path) -> Vec<Event> {
        let id = document.display().to_string();
        self.memory
            .events()
            .into_iter()
            .filter(|e| e.document == id)
            .collect()
    }
}

impl Diagnostics for Recorder {
    fn record(&self, event: Event) {
        LogDiagnostics.record(event.clone());
        self.memory.record(event);
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            files,
            output,
            no_fs,
            db,
        } => cmd_extract(&files, &output, no_fs, &db),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when at least one document failed terminally.
fn cmd_extract(
    files: &[PathBuf],
    output: &Path,
    no_fs: bool,
    db: &DbArgs,
) -> Result<bool, Box<dyn std::error::Error>> {
    let recorder = Arc::new(Recorder::default());
    let diagnostics: Arc<dyn Diagnostics> = recorder.clone();

    let mut database = match db.config() {
        Some(config) => Some(RelationalSink::connect(&config, diagnostics.clone())?),
        None => None,
    };
    if no_fs && database.is_none() {
        return Err("--no-fs needs a database (--db-host or --sqlite)".into());
    }
    if let Some(sink) = &database {
        log::info!("persisting to {:?} database", sink.backend());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        pb.set_message(file.display().to_string());
        log::debug!("processing {}", file.display());

        let mut fs_sink = if no_fs {
            None
        } else {
            let stem = file.file_stem().unwrap_or_default();
            Some(FilesystemSink::new(output.join(stem), diagnostics.clone())?)
        };

        let mut sinks: Vec<&mut dyn Sink> = Vec::new();
        if let Some(sink) = fs_sink.as_mut() {
            sinks.push(sink);
        }
        if let Some(sink) = database.as_mut() {
            sinks.push(sink);
        }

        results.push(process_file(file, &mut sinks, diagnostics.clone(), None));
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(mut sink) = database {
        sink.close()?;
    }

    let mut all_ok = true;
    println!("{}", "Extraction Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for result in &results {
        match result {
            Ok(report) => print_document(report, &recorder.events_for(&report.path)),
            Err(e) => {
                all_ok = false;
                print_failure(e);
            }
        }
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    println!();
    if failed == 0 {
        println!("{} {} documents processed", "Done!".green().bold(), results.len());
    } else {
        println!(
            "{} {} of {} documents failed",
            "Done.".yellow().bold(),
            failed,
            results.len()
        );
    }
    if !no_fs {
        println!("{} {}", "Output:".bold(), output.display());
    }

    Ok(all_ok)
}

fn print_document(report: &DocumentReport, events: &[Event]) {
    let mark = if report.is_complete() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!("{} {} ({})", mark, report.path.display(), report.format);

    for save in &report.saves {
        let saved = save.results().iter().filter(|(_, r)| r.is_ok()).count();
        println!(
            "  {} {}: {}/{} categories",
            "├─".dimmed(),
            save.sink(),
            saved,
            save.results().len()
        );
        for (category, error) in save.failures() {
            println!("  {}   {} {}: {}", "│".dimmed(), "✗".red(), category, error);
        }
    }

    let skipped: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e.outcome, Outcome::Skipped { .. }))
        .collect();
    if skipped.is_empty() {
        println!("  {} no skipped items", "└─".dimmed());
    } else {
        println!("  {} {} skipped items", "└─".dimmed(), skipped.len());
        for event in skipped {
            if let Outcome::Skipped { item, reason } = &event.outcome {
                let category = event.category.map(|c| c.to_string()).unwrap_or_default();
                println!("       {} {} #{}: {}", event.stage, category, item, reason.dimmed());
            }
        }
    }
}

fn print_failure(error: &PipelineError) {
    println!("{} {}", "✗".red(), error.path.display());
    println!("  {} {} failed: {}", "└─".dimmed(), error.stage, error.source);
}

fn cmd_info(input: &Path, json: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let extractor = Extractor::open_with(input, Arc::new(LogDiagnostics))?;

    let metadata = extractor.extract_metadata();
    let counts: Vec<(Category, Result<usize, String>)> = vec![
        (
            Category::Text,
            extractor.extract_text().map(|t| t.chars().count()).map_err(|e| e.to_string()),
        ),
        (
            Category::Links,
            extractor.extract_links().map(|l| l.len()).map_err(|e| e.to_string()),
        ),
        (
            Category::Images,
            extractor.extract_images().map(|i| i.len()).map_err(|e| e.to_string()),
        ),
        (
            Category::Tables,
            extractor.extract_tables().map(|t| t.len()).map_err(|e| e.to_string()),
        ),
    ];

    if json {
        let mut value = serde_json::json!({
            "file": input.display().to_string(),
            "format": extractor.format(),
        });
        value["metadata"] = match &metadata {
            Ok(metadata) => serde_json::to_value(metadata)?,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        for (category, count) in &counts {
            value[category.as_str()] = match count {
                Ok(n) => serde_json::json!(n),
                Err(e) => serde_json::json!({ "error": e }),
            };
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(true);
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), extractor.format());

    match &metadata {
        Ok(metadata) => {
            for (key, value) in metadata.entries() {
                if let Some(value) = value {
                    println!("{}: {}", key.bold(), value);
                }
            }
        }
        Err(e) => println!("{}: {}", "Metadata".bold(), e.to_string().red()),
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (category, count) in &counts {
        let label = match category {
            Category::Text => "Characters",
            Category::Links => "Links",
            Category::Images => "Images",
            Category::Tables => "Tables",
            Category::Metadata => "Metadata",
        };
        match count {
            Ok(n) => println!("{}: {}", label.bold(), n),
            Err(e) => println!("{}: {}", label.bold(), e.red()),
        }
    }

    Ok(true)
}
