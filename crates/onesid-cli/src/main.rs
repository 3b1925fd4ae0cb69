mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use onesid_core::{
    AuthMode, BatchParser, ClientConfig, FilterField, NewUser, PageSize, ProcessList, Role,
    SortConfig, SortDirection, SortKey, SubmissionSchema, ViewState,
};
use onesid_panel::{Dashboard, PanelError, SettingsPanel};
use onesid_store::{FileSessionStore, SessionStore};
use onesid_sync::ApiClient;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "onesid", version)]
#[command(about = "Painel de monitoramento de subsídios OneSid")]
struct Cli {
    /// JSON client config (base URL, auth mode, timeout, routes).
    #[arg(long, global = true, env = "ONESID_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true, env = "ONESID_API_URL")]
    api_url: Option<String>,
    /// `bearer` or `cookie`.
    #[arg(long, global = true, env = "ONESID_AUTH")]
    auth: Option<AuthMode>,
    #[arg(long, global = true, env = "ONESID_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
    #[arg(long, global = true, env = "ONESID_SESSION_FILE")]
    session_file: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        username: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "ONESID_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    /// Show the backend's view of the current session.
    Whoami,
    /// Monitored processes, filtered, sorted and paged.
    Painel {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Archived processes.
    Historico {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Found and pending relevant items of one process.
    Detalhe { numero: String },
    /// Submit a pasted spreadsheet block (file or `-` for stdin).
    Enviar {
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SchemaArg::Quatro)]
        schema: SchemaArg,
        /// Office code that starts each four-column row.
        #[arg(long)]
        prefixo: Option<String>,
    },
    /// Add a single process.
    Adicionar {
        numero: String,
        #[arg(long)]
        executante: Option<String>,
    },
    /// Run the monitoring sweep now.
    Monitorar,
    /// Acknowledge a process awaiting acknowledgment.
    Arquivar { numero: String },
    /// Master list of relevant items (admin).
    Itens {
        #[command(subcommand)]
        command: ItensCommand,
    },
    /// Personal relevant-item toggles.
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
    /// User accounts (admin).
    Usuarios {
        #[command(subcommand)]
        command: UsuariosCommand,
    },
    Exportar {
        #[command(subcommand)]
        command: ExportCommand,
    },
    /// Pull new processes from Legal One.
    ImportarLegalOne,
    /// Collect process numbers into a newline-separated list.
    Lista {
        numbers: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ViewArgs {
    #[arg(long)]
    responsavel: Option<String>,
    #[arg(long)]
    numero: Option<String>,
    #[arg(long)]
    classificacao: Option<String>,
    /// id, numero, responsavel, classificacao, status or data.
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// 10, 25, 50 or 100.
    #[arg(long, default_value_t = 10)]
    page_size: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaArg {
    /// responsável, número
    Dois,
    /// escritório, responsável, número, classificação
    Quatro,
}

#[derive(Subcommand)]
enum ItensCommand {
    List,
    Add { names: Vec<String> },
    Remove { names: Vec<String> },
    /// Upload a file with one item per line.
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum PrefsCommand {
    List,
    Toggle { id: i64 },
}

#[derive(Subcommand)]
enum UsuariosCommand {
    List,
    Create {
        username: String,
        #[arg(long, env = "ONESID_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
}

#[derive(Subcommand)]
enum ExportCommand {
    Excel { out: PathBuf },
    Json { out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Local-only: no backend or session needed.
    if let Command::Lista { numbers, out } = &cli.command {
        return cmd_lista(numbers, out.as_deref());
    }

    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, auth = ?config.auth, "onesid v{}", env!("CARGO_PKG_VERSION"));
    let backend = Arc::new(ApiClient::new(&config).context("building HTTP client")?);
    let sessions: Arc<dyn SessionStore> = match &cli.session_file {
        Some(path) => Arc::new(FileSessionStore::new(path)),
        None => Arc::new(FileSessionStore::default_location()?),
    };
    let dash = Dashboard::new(backend.clone(), sessions);

    if let Command::Login { username, password } = &cli.command {
        let password = match password {
            Some(p) => p.clone(),
            None => read_password()?,
        };
        let session = dash.login(username, &password).await?;
        println!(
            "Conectado como {} ({})",
            session.username.as_deref().unwrap_or(username),
            session.role()
        );
        if config.auth == AuthMode::Cookie {
            warn!("cookie sessions are not persisted; later commands must run in bearer mode");
        }
        return Ok(());
    }

    if !dash.restore()? {
        bail!("Nenhuma sessão ativa. Use `onesid login <usuário>`.");
    }

    let outcome = run(&cli.command, &dash, backend).await;
    if let Some(notice) = dash.notice() {
        display::print_notice(&notice);
    }
    outcome
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_slice::<ClientConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(auth) = cli.auth {
        config.auth = auth;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Senha: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Settings errors do not pass through the dashboard, so expiry is handled here.
fn settle<T>(dash: &Dashboard<ApiClient>, result: Result<T, PanelError>) -> anyhow::Result<T> {
    result.map_err(|e| {
        if e.is_session_expired() {
            dash.expire_session();
        }
        anyhow::Error::new(e)
    })
}

async fn run(
    command: &Command,
    dash: &Dashboard<ApiClient>,
    backend: Arc<ApiClient>,
) -> anyhow::Result<()> {
    match command {
        Command::Login { .. } | Command::Lista { .. } => Ok(()),
        Command::Logout => {
            dash.logout().await?;
            println!("Sessão encerrada.");
            Ok(())
        }
        Command::Whoami => {
            let profile = dash.whoami().await?;
            println!(
                "{} ({}) logado: {}",
                profile.username.as_deref().unwrap_or("-"),
                profile.role.unwrap_or_default(),
                if profile.logged_in { "sim" } else { "não" }
            );
            Ok(())
        }
        Command::Painel { view } => {
            dash.refresh().await?;
            apply_view(dash, view, false)?;
            dash.render(|v| display::print_panel(v, "Painel"));
            Ok(())
        }
        Command::Historico { view } => {
            dash.refresh_history().await?;
            apply_view(dash, view, true)?;
            dash.render_history(|v| display::print_panel(v, "Histórico"));
            Ok(())
        }
        Command::Detalhe { numero } => {
            tokio::try_join!(dash.refresh(), dash.refresh_history())?;
            let view = dash.open_detail(numero)?;
            let record = dash
                .selected()
                .with_context(|| format!("processo {numero} sem detalhe"))?;
            display::print_detail(&view, &record);
            Ok(())
        }
        Command::Enviar {
            input,
            schema,
            prefixo,
        } => {
            let text = read_input(input.as_deref())?;
            let parser = match (schema, prefixo) {
                (SchemaArg::Dois, _) => BatchParser::new(SubmissionSchema::TwoColumn),
                (SchemaArg::Quatro, Some(prefix)) => BatchParser::with_office_prefix(prefix.clone()),
                (SchemaArg::Quatro, None) => BatchParser::new(SubmissionSchema::FourColumn),
            };
            let report = dash.submit_paste(&parser, &text).await?;
            if report.discarded > 0 {
                warn!(
                    discarded = report.discarded,
                    "rows without all {} columns were skipped",
                    parser.schema().min_columns()
                );
            }
            println!("{} processo(s) enviados.", report.submitted);
            Ok(())
        }
        Command::Adicionar { numero, executante } => {
            dash.add_process(numero, executante.as_deref()).await?;
            Ok(())
        }
        Command::Monitorar => {
            dash.run_monitoring().await?;
            dash.render(|v| display::print_panel(v, "Painel"));
            Ok(())
        }
        Command::Arquivar { numero } => {
            dash.refresh().await?;
            dash.acknowledge(numero).await?;
            Ok(())
        }
        Command::ImportarLegalOne => {
            dash.import_legal_one().await?;
            Ok(())
        }
        Command::Exportar { command } => cmd_export(dash, command).await,
        Command::Itens { command } => {
            let mut settings = SettingsPanel::new(backend, dash.capabilities());
            let result = cmd_itens(&mut settings, command).await;
            report_settings(&settings);
            settle(dash, result)
        }
        Command::Prefs { command } => {
            let mut settings = SettingsPanel::new(backend, dash.capabilities());
            let result = cmd_prefs(&mut settings, command).await;
            report_settings(&settings);
            settle(dash, result)
        }
        Command::Usuarios { command } => {
            let mut settings = SettingsPanel::new(backend, dash.capabilities());
            let result = cmd_usuarios(&mut settings, command).await;
            report_settings(&settings);
            settle(dash, result)
        }
    }
}

fn apply_view(dash: &Dashboard<ApiClient>, args: &ViewArgs, history: bool) -> anyhow::Result<()> {
    let sort = match &args.sort {
        Some(raw) => {
            let key = SortKey::parse(raw).with_context(|| format!("coluna de ordenação desconhecida: {raw}"))?;
            let direction = if args.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            SortConfig::by(key, direction)
        }
        None => SortConfig::default(),
    };
    let page_size = PageSize::from_usize(args.page_size)
        .with_context(|| format!("tamanho de página inválido: {} (10, 25, 50 ou 100)", args.page_size))?;

    let configure = |v: &mut ViewState| {
        v.set_filter(FilterField::Responsavel, args.responsavel.clone().unwrap_or_default());
        v.set_filter(FilterField::NumeroProcesso, args.numero.clone().unwrap_or_default());
        v.set_filter(FilterField::Classificacao, args.classificacao.clone().unwrap_or_default());
        v.set_sort(sort);
        v.set_page_size(page_size);
    };
    if history {
        dash.update_history_view(configure);
        let total = dash.render_history(|v| v.total_pages);
        dash.update_history_view(|v| v.go_to_page(args.page, total));
    } else {
        dash.update_view(configure);
        let total = dash.render(|v| v.total_pages);
        dash.update_view(|v| v.go_to_page(args.page, total));
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading paste from stdin")?;
            Ok(text)
        }
    }
}

async fn cmd_export(dash: &Dashboard<ApiClient>, command: &ExportCommand) -> anyhow::Result<()> {
    match command {
        ExportCommand::Excel { out } => {
            let bytes = dash.export_excel().await?;
            std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("{} bytes gravados em {}", bytes.len(), out.display());
        }
        ExportCommand::Json { out } => {
            let data = dash.export_json().await?;
            let bytes = serde_json::to_vec_pretty(&data)?;
            std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("Exportado para {}", out.display());
        }
    }
    Ok(())
}

async fn cmd_itens(
    settings: &mut SettingsPanel<ApiClient>,
    command: &ItensCommand,
) -> Result<(), PanelError> {
    if !settings.is_master_mode() {
        return Err(PanelError::NotPermitted);
    }
    match command {
        ItensCommand::List => {
            settings.load().await?;
        }
        ItensCommand::Add { names } => {
            settings.load().await?;
            for name in names {
                settings.add_item(name)?;
            }
            settings.save().await?;
        }
        ItensCommand::Remove { names } => {
            settings.load().await?;
            for name in names {
                if !settings.remove_item(name)? {
                    warn!(item = %name, "item not in the master list");
                }
            }
            settings.save().await?;
        }
        ItensCommand::Import { file } => {
            let contents = std::fs::read(file)
                .map_err(|e| PanelError::Invalid(format!("{}: {e}", file.display())))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "itens.txt".to_string());
            settings.import_file(&name, contents).await?;
        }
    }
    if let Some(list) = settings.master().ready() {
        display::print_master(list);
    }
    Ok(())
}

async fn cmd_prefs(
    settings: &mut SettingsPanel<ApiClient>,
    command: &PrefsCommand,
) -> Result<(), PanelError> {
    if settings.is_master_mode() {
        return Err(PanelError::NotPermitted);
    }
    settings.load().await?;
    if let PrefsCommand::Toggle { id } = command {
        let pref = settings.toggle(*id).await?;
        info!(id, enabled = pref.is_enabled, "preference updated");
    }
    if let Some(prefs) = settings.preferences().ready() {
        display::print_preferences(prefs);
    }
    Ok(())
}

async fn cmd_usuarios(
    settings: &mut SettingsPanel<ApiClient>,
    command: &UsuariosCommand,
) -> Result<(), PanelError> {
    match command {
        UsuariosCommand::List => settings.load_users().await?,
        UsuariosCommand::Create {
            username,
            password,
            role,
        } => {
            settings
                .create_user(NewUser {
                    username: username.clone(),
                    password: password.clone(),
                    role: Role::parse(role),
                })
                .await?;
        }
    }
    if let Some(users) = settings.users().ready() {
        display::print_users(users);
    }
    Ok(())
}

fn report_settings(settings: &SettingsPanel<ApiClient>) {
    if let Some(notice) = settings.notice() {
        display::print_notice(notice);
    }
}

fn cmd_lista(numbers: &[String], out: Option<&Path>) -> anyhow::Result<()> {
    let mut list = ProcessList::default();
    for n in numbers {
        if let Err(e) = list.add(n) {
            warn!(numero = %n, "{e}");
        }
    }
    let text = list.export_text()?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} processo(s) gravados em {}", list.len(), path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
