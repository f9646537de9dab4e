use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use schemacraft::config::Settings;
use schemacraft::import::ImportFormat;
use schemacraft::share;
use schemacraft::sql::Dialect;
use schemacraft::workspace::Workspace;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemacraft")]
#[command(about = "Convert between schema text, SQL DDL and diagram documents")]
struct Cli {
    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a .dbml, .sql or .json file to schema text
    Import {
        input: PathBuf,
        /// Input format (default: from the extension, then the content)
        #[arg(short, long)]
        format: Option<FormatArg>,
        /// Write SQL DDL instead of schema text
        #[arg(long)]
        to_sql: bool,
        /// Dialect for --to-sql (default: detected from SQL input, then config)
        #[arg(short, long, requires = "to_sql")]
        dialect: Option<String>,
    },
    /// Generate SQL DDL from schema text
    Generate {
        input: PathBuf,
        /// postgresql, mysql, sqlite or sqlserver (default: from config)
        #[arg(short, long)]
        dialect: Option<String>,
    },
    /// Write the JSON diagram document for schema text
    ExportJson { input: PathBuf },
    /// Print the laid-out canvas (nodes and edges) as JSON
    Canvas { input: PathBuf },
    /// Print a share link (or iframe embed code) carrying schema text
    Share {
        input: PathBuf,
        /// Page the link points at
        #[arg(long, default_value = "http://localhost:8080")]
        origin: String,
        #[arg(long)]
        embed: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Dbml,
    Sql,
    Json,
}

impl From<FormatArg> for ImportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Dbml => ImportFormat::Dbml,
            FormatArg::Sql => ImportFormat::Sql,
            FormatArg::Json => ImportFormat::Json,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let output = match cli.command {
        Command::Import {
            input,
            format,
            to_sql,
            dialect,
        } => {
            let content = read(&input)?;
            let format = format
                .map(ImportFormat::from)
                .or_else(|| ImportFormat::from_file_name(&input))
                .unwrap_or_else(|| ImportFormat::detect(&content));
            let mut workspace = Workspace::with_text(settings, "");
            workspace.import(format, &content)?;
            if to_sql {
                let dialect = match dialect {
                    Some(name) => Dialect::parse(&name)?,
                    None => format
                        .source_dialect(&content)
                        .unwrap_or(workspace.settings().export.default_dialect),
                };
                tracing::info!(dialect = dialect.name(), "writing SQL");
                workspace.export_sql(dialect)
            } else {
                workspace.text().to_string()
            }
        }
        Command::Generate { input, dialect } => {
            let workspace = Workspace::with_text(settings, read(&input)?);
            match dialect {
                Some(name) => workspace.export_sql(Dialect::parse(&name)?),
                None => workspace.export_default_sql(),
            }
        }
        Command::ExportJson { input } => {
            Workspace::with_text(settings, read(&input)?).export_json()?
        }
        Command::Canvas { input } => {
            let workspace = Workspace::with_text(settings, read(&input)?);
            serde_json::to_string_pretty(&workspace.canvas().view())?
        }
        Command::Share {
            input,
            origin,
            embed,
        } => {
            let link = Workspace::with_text(settings, read(&input)?).share_link(&origin);
            if embed {
                share::embed_code(&link)
            } else {
                format!("{}\n", link)
            }
        }
    };

    match cli.output {
        Some(path) => fs::write(&path, output)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?,
        None => print!("{}", output),
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}
