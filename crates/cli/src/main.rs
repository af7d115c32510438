use clap::{Parser, Subcommand};
use lib::channels::OutboundSms;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smsai")]
#[command(about = "Answer inbound SMS with a hosted chat model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: SMSAI_CONFIG_PATH or ~/.smsai/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook server the SMS gateway posts inbound messages to.
    Serve {
        /// Config file path (default: SMSAI_CONFIG_PATH or ~/.smsai/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one SMS through the configured gateway.
    Send {
        /// Config file path (default: SMSAI_CONFIG_PATH or ~/.smsai/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Recipient phone number
        #[arg(long)]
        to: String,

        /// Message text
        #[arg(long, short)]
        message: String,

        /// Sender id or shortcode (default: sms.shortcode)
        #[arg(long)]
        from: Option<String>,
    },

    /// Ask the model and print the formatted SMS reply without sending it.
    Ask {
        /// Config file path (default: SMSAI_CONFIG_PATH or ~/.smsai/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Message text, as if received by SMS
        text: String,
    },
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("reading .env failed: {}", e);
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("smsai {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            to,
            message,
            from,
        }) => {
            if let Err(e) = run_send(config, to, message, from).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { config, text }) => {
            if let Err(e) = run_ask(config, text).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting server on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_send(
    config_path: Option<PathBuf>,
    to: String,
    message: String,
    from: Option<String>,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::gateway::sms_client(&config)?;
    let report = client
        .send_message(&OutboundSms::new(to, message, from.as_deref()))
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_ask(config_path: Option<PathBuf>, text: String) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::gateway::model_client(&config)?;
    let messages = lib::gateway::build_prompt(&config.model.system_prompt, &[], &text);
    let raw = client.chat(messages).await?;
    let parts = lib::reply::format_reply(&raw, &config.reply);
    for (i, part) in parts.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, parts.len(), part);
    }
    Ok(())
}
