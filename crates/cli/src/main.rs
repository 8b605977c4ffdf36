use clap::{Parser, Subcommand};
use lib::llm::CompletionBackend;

#[derive(Parser)]
#[command(name = "warelay")]
#[command(about = "WhatsApp completion relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config, session directory).
    Init {
        /// Config file path (default: WARELAY_CONFIG_PATH or ~/.warelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the relay: connect to WhatsApp (QR pairing on first run) and answer incoming messages via the completion API.
    Run {
        /// Config file path (default: WARELAY_CONFIG_PATH or ~/.warelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Only answer messages starting with this literal prefix (overrides config)
        #[arg(long)]
        prefix: Option<String>,

        /// Model identifier to request (overrides config)
        #[arg(long)]
        model: Option<String>,
    },

    /// Chat with the configured completion model from the terminal (no paired phone needed).
    Chat {
        /// Config file path (default: WARELAY_CONFIG_PATH or ~/.warelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("warelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            config,
            prefix,
            model,
        }) => {
            if let Err(e) = run_relay(config, prefix, model).await {
                log::error!("relay failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn build_backend(config: &lib::config::Config) -> anyhow::Result<lib::llm::OpenAiClient> {
    let api_key = lib::config::resolve_api_key(config).ok_or_else(|| {
        anyhow::anyhow!("completion API key not configured (set OPENAI_API_KEY or completion.apiKey)")
    })?;
    Ok(lib::llm::OpenAiClient::new(
        api_key,
        lib::config::resolve_base_url(config),
    ))
}

async fn run_relay(
    config_path: Option<std::path::PathBuf>,
    prefix: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let backend = build_backend(&config)?;
    let settings = lib::relay::RelaySettings {
        model: model.unwrap_or_else(|| lib::config::resolve_model(&config)),
        prefix: prefix.unwrap_or_else(|| lib::config::resolve_prefix(&config)),
        fallback_reply: lib::config::resolve_fallback_reply(&config),
    };
    let session_dir = lib::config::resolve_session_dir(&config);
    log::info!(
        "starting relay (model {}, prefix {:?})",
        settings.model,
        settings.prefix
    );
    start_transport(session_dir, backend, settings).await
}

#[cfg(feature = "whatsapp")]
async fn start_transport(
    session_dir: std::path::PathBuf,
    backend: lib::llm::OpenAiClient,
    settings: lib::relay::RelaySettings,
) -> anyhow::Result<()> {
    use lib::session::{FsSessionStore, SessionStore};
    use std::sync::Arc;

    let factory = lib::channels::WhatsAppTransport::new(&session_dir);
    let store: Arc<dyn SessionStore> = Arc::new(FsSessionStore::new(session_dir));
    lib::relay::run_supervised(&factory, store, Arc::new(backend), settings).await
}

#[cfg(not(feature = "whatsapp"))]
async fn start_transport(
    _session_dir: std::path::PathBuf,
    _backend: lib::llm::OpenAiClient,
    _settings: lib::relay::RelaySettings,
) -> anyhow::Result<()> {
    anyhow::bail!(
        "this build does not include the WhatsApp transport; rebuild with `--features whatsapp`"
    )
}

async fn run_chat(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = lib::config::load_config(config_path)?;
    let backend = build_backend(&config)?;
    let model = lib::config::resolve_model(&config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        match backend
            .complete(&model, vec![lib::llm::ChatMessage::user(input)])
            .await
        {
            Ok(reply) => {
                println!("< {}", reply.trim());
            }
            Err(e) => {
                eprintln!("chat error: {}", e);
            }
        }
    }

    Ok(())
}
