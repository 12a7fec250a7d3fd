use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arcadia_api::{AdminApi, HttpApi};
use arcadia_console::{AdminConsole, AuthContext, Notice, NoticeLevel};
use arcadia_core::config::ConsoleConfig;
use arcadia_core::media::accept_pending_file;
use arcadia_core::registry::{describe, FieldType, Required};
use arcadia_core::{RecordId, ResourceKind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "arcadiactl", version, about = "Arcadia admin console CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Backend base URL (overrides ARCADIA_API_URL)
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Base URL stored image paths resolve against (overrides ARCADIA_MEDIA_BASE)
    #[arg(long = "media-base", global = true)]
    media_base: Option<String>,

    /// Email of the operator; required for every command that talks to the backend
    #[arg(long = "as-email", env = "ARCADIA_AS_EMAIL", global = true)]
    as_email: Option<String>,

    /// Role of the operator
    #[arg(long = "as-role", env = "ARCADIA_AS_ROLE", global = true, default_value = "user")]
    as_role: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show resource kinds and their form fields
    Kinds,
    /// List records of a kind
    Ls {
        /// games, news, community or users
        kind: ResourceKind,
    },
    /// Create a record
    Create {
        kind: ResourceKind,
        /// Field value, e.g. --set title=Hades (repeatable)
        #[arg(long = "set", value_parser = parse_kv)]
        set: Vec<(String, String)>,
        /// Image file to upload with the record
        #[arg(long = "image")]
        image: Option<PathBuf>,
    },
    /// Edit an existing record; fields not given keep their current value
    Edit {
        kind: ResourceKind,
        id: String,
        #[arg(long = "set", value_parser = parse_kv)]
        set: Vec<(String, String)>,
        #[arg(long = "image")]
        image: Option<PathBuf>,
    },
    /// Delete one or more records
    Rm {
        kind: ResourceKind,
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(long = "yes", short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("ARCADIA_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ARCADIA_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ARCADIA_METRICS_ADDR; expected host:port");
        }
    }
}

fn parse_kv(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected field=value, got {s:?}")),
    }
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut cfg = ConsoleConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        let media_follows = cfg.media_base == cfg.api_url;
        cfg.api_url = url.trim().trim_end_matches('/').to_string();
        if media_follows {
            cfg.media_base = cfg.api_url.clone();
        }
    }
    if let Some(base) = &cli.media_base {
        cfg.media_base = base.trim().trim_end_matches('/').to_string();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn auth_context(cli: &Cli) -> Result<AuthContext> {
    match cli.as_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => Ok(AuthContext::signed_in(email, cli.as_role.clone())),
        _ => bail!("operator email required: pass --as-email or set ARCADIA_AS_EMAIL"),
    }
}

/// Wait for outstanding requests; Ctrl-C abandons them.
async fn settle(console: &mut AdminConsole) -> Result<()> {
    tokio::select! {
        _ = console.settle() => Ok(()),
        _ = signal::ctrl_c() => {
            warn!("interrupted; abandoning outstanding requests");
            bail!("interrupted")
        }
    }
}

/// Print notices to stderr; error when any of them reports a failure.
fn report_notices(notices: &[Notice], output: Output) -> Result<()> {
    if output == Output::Json {
        eprintln!("{}", serde_json::to_string(notices)?);
    } else {
        for n in notices {
            let tag = match n.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warn => "warn",
                NoticeLevel::Error => "error",
            };
            eprintln!("[{tag}] {}", n.text);
        }
    }
    match notices.iter().find(|n| matches!(n.level, NoticeLevel::Warn | NoticeLevel::Error)) {
        Some(n) => Err(anyhow!(n.text.clone())),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct FieldOut {
    name: &'static str,
    label: &'static str,
    ty: String,
    required: &'static str,
}

#[derive(Serialize)]
struct KindOut {
    kind: ResourceKind,
    endpoint: &'static str,
    label: &'static str,
    editable: bool,
    fields: Vec<FieldOut>,
}

fn kinds_table() -> Vec<KindOut> {
    ResourceKind::ALL
        .iter()
        .map(|&k| {
            let d = describe(k);
            let fields = d
                .fields
                .iter()
                .map(|f| FieldOut {
                    name: f.name,
                    label: f.label,
                    ty: match f.ty {
                        FieldType::Enum(opts) => format!("enum({})", opts.join("|")),
                        FieldType::Number { .. } => "number".into(),
                        FieldType::Image { .. } => "image".into(),
                        other => format!("{other:?}").to_ascii_lowercase(),
                    },
                    required: match f.required {
                        Required::Always => "always",
                        Required::OnCreate => "on-create",
                        Required::Never => "no",
                    },
                })
                .collect();
            KindOut { kind: k, endpoint: d.endpoint, label: d.label, editable: d.editable, fields }
        })
        .collect()
}

async fn open(api: &Arc<dyn AdminApi>, cli: &Cli, cfg: &ConsoleConfig, kind: ResourceKind) -> Result<AdminConsole> {
    let mut console = AdminConsole::open_at(api.clone(), auth_context(cli)?, cfg, kind)?;
    settle(&mut console).await?;
    if let Some(e) = console.list_error() {
        bail!("failed to load {kind}: {e}");
    }
    Ok(console)
}

async fn write_record(
    console: &mut AdminConsole,
    set: &[(String, String)],
    image: Option<&PathBuf>,
    output: Output,
) -> Result<()> {
    for (k, v) in set {
        console.set_field(k, v.clone())?;
    }
    if let Some(path) = image {
        console.attach_image(accept_pending_file(path)?)?;
    }
    console.submit()?;
    settle(console).await?;
    report_notices(&console.take_notices(), output)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    if let Commands::Kinds = cli.command {
        let table = kinds_table();
        match cli.output {
            Output::Human => {
                for k in table {
                    let mode = if k.editable { "editable" } else { "list/delete" };
                    println!("{} • {} • {}", k.kind, k.endpoint, mode);
                    for f in k.fields {
                        println!("    {} ({}) • {} • required: {}", f.name, f.label, f.ty, f.required);
                    }
                }
            }
            Output::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        }
        return Ok(());
    }

    let cfg = load_config(&cli)?;
    let api: Arc<dyn AdminApi> = Arc::new(HttpApi::new(&cfg).context("building HTTP client")?);
    info!(api_url = %cfg.api_url, "arcadiactl starting");

    match &cli.command {
        Commands::Kinds => {}
        Commands::Ls { kind } => {
            let console = open(&api, &cli, &cfg, *kind).await?;
            let rows = console.rows();
            match cli.output {
                Output::Human => {
                    for r in &rows {
                        let sub = if r.subtitle.is_empty() { String::new() } else { format!(" • {}", r.subtitle) };
                        println!("{} • {}{} • {}", r.id, r.title, sub, r.detail);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
        Commands::Create { kind, set, image } => {
            let mut console = open(&api, &cli, &cfg, *kind).await?;
            console.add_new()?;
            write_record(&mut console, set, image.as_ref(), cli.output).await?;
        }
        Commands::Edit { kind, id, set, image } => {
            let mut console = open(&api, &cli, &cfg, *kind).await?;
            console.edit(&RecordId::new(id.as_str()))?;
            write_record(&mut console, set, image.as_ref(), cli.output).await?;
        }
        Commands::Rm { kind, ids, yes } => {
            let mut console = open(&api, &cli, &cfg, *kind).await?;
            let ids: Vec<RecordId> = ids.iter().map(|s| RecordId::new(s.as_str())).collect();
            if let [one] = ids.as_slice() {
                console.request_delete(one)?;
            } else {
                for id in &ids {
                    if !console.selection().is_selected(id) {
                        console.toggle(id)?;
                    }
                }
                console.request_bulk_delete()?;
            }
            if !*yes {
                let prompt = console.pending_deletion().map(|p| p.prompt()).unwrap_or_default();
                eprint!("{prompt} [y/N] ");
                std::io::stderr().flush()?;
                let mut answer = String::new();
                std::io::stdin().lock().read_line(&mut answer)?;
                if !matches!(answer.trim(), "y" | "Y" | "yes") {
                    console.cancel();
                    eprintln!("aborted");
                    return Ok(());
                }
            }
            console.confirm_delete()?;
            settle(&mut console).await?;
            report_notices(&console.take_notices(), cli.output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kv_splits_on_first_equals() {
        assert_eq!(parse_kv("genre=[\"A=B\"]").unwrap(), ("genre".to_string(), "[\"A=B\"]".to_string()));
        assert_eq!(parse_kv("password=").unwrap(), ("password".to_string(), String::new()));
        assert!(parse_kv("title").is_err());
        assert!(parse_kv("=x").is_err());
    }

    #[test]
    fn kinds_table_covers_every_kind() {
        let t = kinds_table();
        assert_eq!(t.len(), 4);
        let users = t.iter().find(|k| k.kind == ResourceKind::Account).expect("users");
        assert!(users.fields.iter().any(|f| f.name == "role" && f.ty == "enum(user|admin)"));
        assert!(!t.iter().find(|k| k.kind == ResourceKind::CommunityPost).expect("community").editable);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["arcadiactl", "-o", "json", "rm", "games", "1", "2", "--yes"]).expect("parse");
        assert_eq!(cli.output, Output::Json);
        match cli.command {
            Commands::Rm { kind, ids, yes } => {
                assert_eq!(kind, ResourceKind::Catalog);
                assert_eq!(ids, vec!["1", "2"]);
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["arcadiactl", "ls", "widgets"]).is_err());
    }

    #[test]
    fn operator_email_is_required() {
        let mut cli = Cli::try_parse_from(["arcadiactl", "ls", "games"]).expect("parse");
        cli.as_email = None;
        assert!(auth_context(&cli).is_err());
        cli.as_email = Some("  ".into());
        assert!(auth_context(&cli).is_err());

        cli.as_email = Some("ops@arcadia.test".into());
        cli.as_role = "admin".into();
        let auth = auth_context(&cli).expect("auth");
        assert!(auth.is_admin(&[]));
        cli.as_role = "user".into();
        assert!(!auth_context(&cli).expect("auth").is_admin(&["admin@gmail.com".to_string()]));
    }
}
