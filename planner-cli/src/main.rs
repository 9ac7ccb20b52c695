use clap::{Parser, Subcommand, ValueEnum};
use planner::calendar::WeekKey;
use planner::storage::open_backend;
use planner::{
    progress, summary, DocPath, Namespace, PlannerConfig, PlannerSession, PlannerStore, Storage,
    StorageBackend,
};
use std::path::{Path, PathBuf};
use std::process;

/// Planner CLI: inspect and edit planner data from the command line
#[derive(Parser)]
#[command(name = "planner", version, about)]
struct Cli {
    /// Path to the data directory (default: $PLANNER_DATA_DIR, then the current directory)
    #[arg(long)]
    data_dir: Option<String>,

    /// Storage backend (overrides planner.yaml)
    #[arg(long)]
    backend: Option<BackendArg>,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => StorageBackend::File,
            BackendArg::Sqlite => StorageBackend::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Read the value at a dotted path (omit the path for the whole document)
    Get {
        #[arg(default_value = "")]
        path: String,
    },

    /// Write a value at a dotted path and recompute derived fields
    Set {
        path: String,
        /// JSON value; anything that doesn't parse as JSON is stored as text
        value: String,
        /// Store the value as text even if it parses as JSON
        #[arg(long)]
        text: bool,
    },

    /// Print the whole document as pretty JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replace the whole document with exported JSON
    Import {
        /// File to read (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Delete all planner data
    Clear,

    /// Recalculate and show one calendar week
    Calendar {
        /// Any date in the week (default: this week)
        #[arg(long)]
        week: Option<String>,
        /// Weeks to move forward (positive) or back (negative) from that week
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
        /// Print unformatted hours instead of the display view
        #[arg(long)]
        raw: bool,
    },

    /// Recalculate and show the 36-month projection
    Financials {
        /// Only show this month
        #[arg(long)]
        month: Option<u32>,
        /// Print unformatted amounts instead of the display view
        #[arg(long)]
        raw: bool,
    },

    /// Show completion statistics per namespace
    Progress,

    /// Render the consolidated plan as Markdown
    Summary {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show storage info and document stats
    Status,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var("PLANNER_DATA_DIR").ok())
        .unwrap_or_else(|| ".".to_string());
    let data_dir = PathBuf::from(data_dir);

    let mut config = PlannerConfig::load(&data_dir)?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    log::debug!("Using {:?} backend in {}", config.backend, data_dir.display());
    let storage = open_backend(config.backend, &data_dir)?;
    let mut store = PlannerStore::with_config(storage, &config);

    match cli.command {
        Command::Get { path } => {
            let value = store
                .get(path.as_str())
                .ok_or_else(|| format!("No value at '{path}'"))?;
            print_output(&value, &cli.format)?;
        }

        Command::Set { path, value, text } => {
            let path = DocPath::parse(&path);
            let value = parse_value(&value, text);
            let week = week_of(&path).unwrap_or_else(WeekKey::current);

            let mut session = PlannerSession::new(store, week);
            let recomputed = session.edit(path.clone(), value)?;
            session.close()?;
            let stored = session.store().get(&path).unwrap_or_default();
            let mut output = serde_json::json!({ "ok": true, "path": path.to_string(), "value": stored });
            if !recomputed.warnings.is_empty() {
                output["warnings"] = serde_json::json!(recomputed.warnings);
            }
            print_output(&output, &cli.format)?;
        }

        Command::Export { output } => {
            let text = store.export_data()?;
            match output {
                Some(file) => {
                    std::fs::write(&file, text + "\n")?;
                    print_output(
                        &serde_json::json!({ "ok": true, "exported": file.display().to_string() }),
                        &cli.format,
                    )?;
                }
                None => println!("{text}"),
            }
        }

        Command::Import { file } => {
            let text = read_input(file.as_deref())?;
            store.try_import(text)?;
            store.flush()?;
            print_output(
                &serde_json::json!({
                    "ok": true,
                    "lastModified": store.get("lastModified"),
                }),
                &cli.format,
            )?;
        }

        Command::Clear => {
            store.clear()?;
            print_output(&serde_json::json!({ "ok": true, "cleared": store.storage_key() }), &cli.format)?;
        }

        Command::Calendar { week, offset, raw } => {
            let week = match week {
                Some(raw) => raw.parse::<WeekKey>()?,
                None => WeekKey::current(),
            };
            let target = week.offset(offset);
            let mut session = PlannerSession::new(store, target);
            let summary = session.select_week(target)?;
            session.close()?;
            let value = if raw {
                serde_json::to_value(&summary)?
            } else {
                serde_json::to_value(summary.display())?
            };
            print_output(&value, &cli.format)?;
        }

        Command::Financials { month, raw } => {
            let projection = planner::financials::recalc_all(&mut store)?;
            store.flush()?;
            let value = match month {
                Some(m) => {
                    let totals = projection
                        .month(m)
                        .ok_or_else(|| format!("Month {m} is outside 1..=36"))?;
                    if raw {
                        serde_json::to_value(totals)?
                    } else {
                        serde_json::to_value(totals.display())?
                    }
                }
                None if raw => serde_json::to_value(&projection)?,
                None => serde_json::to_value(projection.display())?,
            };
            print_output(&value, &cli.format)?;
        }

        Command::Progress => {
            let report = progress::report(store.get_all());
            print_output(&serde_json::to_value(&report)?, &cli.format)?;
        }

        Command::Summary { output } => {
            let today = chrono::Local::now().date_naive();
            let markdown = summary::render(store.get_all(), today);
            match output {
                Some(file) => {
                    std::fs::write(&file, &markdown)?;
                    print_output(
                        &serde_json::json!({ "ok": true, "written": file.display().to_string() }),
                        &cli.format,
                    )?;
                }
                None => print!("{markdown}"),
            }
        }

        Command::Status => {
            let status = status(&store, &config, &data_dir)?;
            print_output(&status, &cli.format)?;
        }
    }

    Ok(())
}

fn print_output(value: &serde_json::Value, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Parse as JSON (numbers, booleans, arrays, objects), falling back to a string.
fn parse_value(raw: &str, force_text: bool) -> serde_json::Value {
    if force_text {
        return serde_json::Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// The week a `calendar.<week>...` path points into
fn week_of(path: &DocPath) -> Option<WeekKey> {
    if path.namespace() != Some(Namespace::Calendar) {
        return None;
    }
    path.segments().get(1)?.parse().ok()
}

fn read_input(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read import file '{}': {e}", path.display()).into()),
        None => {
            use std::io::Read;
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn status<S: Storage>(
    store: &PlannerStore<S>,
    config: &PlannerConfig,
    data_dir: &Path,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let doc = store.get_all();
    let persisted_bytes = store
        .storage()
        .get_item(store.storage_key())?
        .map(|raw| raw.len())
        .unwrap_or(0);
    let report = progress::report(doc);
    let namespaces: serde_json::Map<String, serde_json::Value> = Namespace::ALL
        .iter()
        .map(|ns| (ns.key().to_string(), serde_json::json!(doc.namespace(*ns).len())))
        .collect();

    Ok(serde_json::json!({
        "data_dir": data_dir.display().to_string(),
        "backend": config.backend,
        "storage_key": store.storage_key(),
        "version": doc.version,
        "last_modified": store.get("lastModified"),
        "persisted_bytes": persisted_bytes,
        "top_level_keys": namespaces,
        "extra_keys": doc.extra.keys().collect::<Vec<_>>(),
        "progress_percent": report.overall_percent,
    }))
}
