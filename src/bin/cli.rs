//! Binary entry point for the Dungeoneer catalog CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dungeoneer::{
    catalog::{seed_demo, stats, Catalog, OpenOptions, StatsReport},
    cli::import_export::{run_export, run_import, CliError, ExportConfig, ImportConfig},
    collection::Collection,
    guest::GuestStore,
    model::{ItemKind, ItemSummary},
    notify::{NoticeKind, Notices},
    server::{serve, ServeOptions},
};

use config::CliConfig;
use ui::{Theme, Ui};

const DEFAULT_PORT: u16 = 7878;

#[derive(Parser, Debug)]
#[command(
    name = "dungeoneer",
    version,
    about = "Catalog and collection tracker for instanced content",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "DUNGEONEER_CONFIG",
        value_name = "PATH",
        help = "Path to the CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Theme::Auto,
        help = "Terminal color theme"
    )]
    theme: Theme,

    #[arg(long, global = true, help = "Suppress decorative output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InitCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SeedDemoCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(long, help = "Create the database if it does not exist")]
    create: bool,
}

#[derive(Args, Debug)]
struct ImportCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "CSV file containing duties")]
    instances: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "CSV file containing collectables")]
    items: Option<PathBuf>,

    #[arg(long, help = "Create the database if it does not exist")]
    create: bool,
}

#[derive(Args, Debug)]
struct ExportCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Output CSV for duties")]
    instances: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Output CSV for collectables")]
    items: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(long, value_name = "HOST", help = "Bind address host")]
    host: Option<IpAddr>,

    #[arg(long, value_name = "PORT", help = "Bind port")]
    port: Option<u16>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory overriding the bundled static assets"
    )]
    assets: Option<PathBuf>,

    #[arg(long, help = "Disable the ownership mutations")]
    read_only: bool,

    #[arg(
        long = "allow-origin",
        value_name = "ORIGIN",
        action = ArgAction::Append,
        help = "Additional CORS origin to allow (repeatable)"
    )]
    allow_origins: Vec<String>,
}

#[derive(Args, Debug)]
#[command(allow_missing_positional = true)]
struct ToggleCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(value_name = "KIND", help = "Collectable kind, e.g. minion or mounts")]
    kind: String,

    #[arg(value_name = "ITEM")]
    item_id: String,

    #[arg(
        long,
        value_name = "USER",
        help = "Toggle against this user's server-side collection"
    )]
    user: Option<String>,

    #[arg(long, value_name = "DIR", help = "Guest collection directory override")]
    guest_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(allow_missing_positional = true)]
struct CollectionCmd {
    #[arg(value_name = "DB")]
    db_path: Option<PathBuf>,

    #[arg(value_name = "KIND", help = "Collectable kind, e.g. minion or mounts")]
    kind: String,

    #[arg(long, value_name = "USER", help = "List this user's server-side collection")]
    user: Option<String>,

    #[arg(long, value_name = "DIR", help = "Guest collection directory override")]
    guest_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Create an empty catalog database")]
    Init(InitCmd),

    #[command(about = "Populate the demo catalog (every kind represented)")]
    SeedDemo(SeedDemoCmd),

    #[command(about = "Import duties/collectables from CSV files")]
    Import(ImportCmd),

    #[command(about = "Export duties/collectables to CSV files")]
    Export(ExportCmd),

    #[command(about = "Print catalog counts and file metadata")]
    Stats {
        #[arg(value_name = "DB")]
        db_path: Option<PathBuf>,
    },

    #[command(about = "Serve the browse pages and RPC API")]
    Serve(ServeCmd),

    #[command(about = "Toggle ownership of one collectable")]
    Toggle(ToggleCmd),

    #[command(about = "List a collection's entries for one kind")]
    Collection(CollectionCmd),

    #[command(about = "Generate shell completion scripts")]
    Completions {
        #[arg(value_enum, value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let cfg = CliConfig::load(cli.config.clone())?;
    let ui = Ui::new(cli.theme, cli.quiet);

    match cli.command {
        Command::Init(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let catalog = Catalog::open(&db_path, &OpenOptions::default())?;
            ui.success(&format!("Catalog ready at {}", catalog.path().display()));
        }
        Command::SeedDemo(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let options = if cmd.create {
                OpenOptions::default()
            } else {
                OpenOptions::existing()
            };
            let mut catalog = Catalog::open(&db_path, &options)?;
            let summary = seed_demo(&mut catalog)?;
            emit(&cli.format, &summary, || {
                ui.success(&format!(
                    "Seeded {} duties and {} collectables into {}",
                    summary.instances,
                    summary.items,
                    db_path.display()
                ));
            })?;
        }
        Command::Import(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let import_cfg = ImportConfig {
                db_path,
                create_if_missing: cmd.create,
                instances: cmd.instances,
                items: cmd.items,
            };
            let task = ui.task("Importing catalog data");
            let summary = run_import(&import_cfg).map_err(into_boxed_error)?;
            let elapsed = task.finish();
            ui.success(&format!(
                "Imported {} duties and {} collectables in {}",
                summary.instances_imported,
                summary.items_imported,
                ui::format_duration(elapsed)
            ));
        }
        Command::Export(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let export_cfg = ExportConfig {
                db_path,
                instances_out: cmd.instances,
                items_out: cmd.items,
            };
            let summary = run_export(&export_cfg).map_err(into_boxed_error)?;
            ui.success(&format!(
                "Exported {} duties and {} collectables",
                summary.instances_exported, summary.items_exported
            ));
        }
        Command::Stats { db_path } => {
            let db_path = resolve_db_path(db_path, &cfg)?;
            let report = stats(&db_path)?;
            emit(&cli.format, &report, || print_stats_text(&ui, &report))?;
        }
        Command::Serve(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let host = cmd
                .host
                .or_else(|| cfg.server_host())
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
            let port = cmd.port.or_else(|| cfg.server_port()).unwrap_or(DEFAULT_PORT);
            let options = ServeOptions {
                db_path,
                host,
                port,
                assets_dir: cmd.assets,
                read_only: cmd.read_only,
                allow_origins: cmd.allow_origins,
            };
            if let Err(err) = serve(options).await {
                eprintln!("catalog server terminated: {err}");
                return Err(Box::new(err));
            }
        }
        Command::Toggle(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let kind = parse_kind(&cmd.kind)?;
            let mut catalog = Catalog::open(&db_path, &OpenOptions::existing())?;
            let found = catalog.find_item(kind, &cmd.item_id)?;
            let summary = ItemSummary {
                id: found.id,
                name: found.name,
                kind,
            };

            let guest = guest_store(&cmd.guest_dir, &cfg)?;
            let currently_owned = match &cmd.user {
                Some(user) => catalog.is_owned(user, &summary.id)?,
                None => guest.contains(kind, &summary.id)?,
            };

            let collection = Collection::new(cmd.user, guest, Notices::new());
            let outcome = collection.toggle(&mut catalog, &summary, currently_owned);
            print_notices(&ui, &collection);
            if outcome.is_err() {
                std::process::exit(2);
            }
        }
        Command::Collection(cmd) => {
            let db_path = resolve_db_path(cmd.db_path, &cfg)?;
            let kind = parse_kind(&cmd.kind)?;
            let catalog = Catalog::open(&db_path, &OpenOptions::existing())?;
            let guest = guest_store(&cmd.guest_dir, &cfg)?;
            let collection = Collection::new(cmd.user, guest, Notices::new());
            let ids = collection.owned_ids(&catalog, kind)?;
            emit(&cli.format, &ids, || {
                if ids.is_empty() {
                    ui.info(&format!("No {} collected yet.", kind.plural()));
                } else {
                    let entries = ids.iter().map(|id| match catalog.find_item(kind, id) {
                        Ok(item) => format!("{} ({id})", item.name),
                        Err(_) => id.clone(),
                    });
                    ui.list(&format!("Collected {}", kind.plural()), entries);
                }
            })?;
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

fn resolve_db_path(explicit: Option<PathBuf>, cfg: &CliConfig) -> Result<PathBuf, Box<dyn Error>> {
    explicit
        .or_else(|| cfg.default_db_path().cloned())
        .ok_or_else(|| "no database path given (pass DB or set [database] default in the config)".into())
}

fn guest_store(
    override_dir: &Option<PathBuf>,
    cfg: &CliConfig,
) -> Result<GuestStore, Box<dyn Error>> {
    if let Some(dir) = override_dir.as_ref().or_else(|| cfg.guest_dir()) {
        return Ok(GuestStore::open(dir));
    }
    Ok(GuestStore::default_location()?)
}

fn parse_kind(token: &str) -> Result<ItemKind, Box<dyn Error>> {
    let lowered = token.trim().to_ascii_lowercase();
    ItemKind::from_token(&lowered)
        .or_else(|| ItemKind::from_plural(&lowered))
        .ok_or_else(|| {
            let kinds = ItemKind::ALL.map(|kind| kind.as_str()).join("|");
            format!("unknown collectable kind '{token}' (expected one of {kinds})").into()
        })
}

fn print_notices(ui: &Ui, collection: &Collection) {
    for notice in collection.notices().snapshot() {
        match notice.kind {
            NoticeKind::Success => ui.success(&notice.message),
            NoticeKind::Info => ui.info(&notice.message),
            NoticeKind::Warning | NoticeKind::Error => ui.warn(&notice.message),
        }
    }
}

fn print_stats_text(ui: &Ui, report: &StatsReport) {
    ui.section(
        "Database",
        [
            ("path", report.database.path.clone()),
            ("size", format!("{} bytes", report.database.size_bytes)),
        ],
    );
    ui.spacer();
    ui.section(
        "Collectables",
        report.items.iter().map(|entry| (entry.kind, entry.count)),
    );
    ui.spacer();
    ui.section(
        "Duties",
        report.instances.iter().map(|entry| (entry.kind, entry.count)),
    );
    ui.spacer();
    ui.section(
        "Ownership",
        [("users", report.users), ("rows", report.ownership_rows)],
    );
}

fn into_boxed_error(err: CliError) -> Box<dyn Error> {
    Box::new(err)
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
