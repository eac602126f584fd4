//! qrpay
//!
//! Command line wallet for QR payment requests on Kaia.
//!
//! - `request` renders a payment request as a QR code
//! - `pay` decodes a scanned request, confirms it and submits the transfer
//! - `send` submits a transfer typed in by hand
//! - `balances`, `history` and `tokens` show wallet state

mod camera;
mod commands;
mod confirm;
mod input;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qrpay_core::HISTORY_LIMIT;
use qrpay_wallet::WalletConfig;

#[derive(Parser)]
#[command(name = "qrpay", about = "QR code payment requests for Kaia wallets")]
struct Cli {
    /// JSON-RPC endpoint.
    #[arg(long, global = true, env = "QRPAY_RPC_URL")]
    rpc_url: Option<String>,
    /// Token list replacing the built-in registry.
    #[arg(long, global = true, env = "QRPAY_TOKENS_FILE")]
    tokens_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported tokens.
    Tokens(TokensArgs),
    /// Create a payment request QR code.
    Request(RequestArgs),
    /// Pay a scanned payment request.
    Pay(PayArgs),
    /// Send tokens to an address.
    Send(SendArgs),
    /// Show token balances.
    Balances(BalancesArgs),
    /// Show recent transfers.
    History(HistoryArgs),
}

/// QR output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Unicode blocks printed to the terminal.
    Terminal,
    Svg,
    Png,
}

#[derive(Args)]
struct TokensArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RequestArgs {
    /// Token symbol, e.g. USDT.
    #[arg(long)]
    token: String,
    /// Amount in whole tokens, e.g. 12.5.
    #[arg(long)]
    amount: String,
    /// Receiving address; defaults to the configured wallet.
    #[arg(long)]
    recipient: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    format: OutputFormat,
    /// Output file for svg/png.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct PayArgs {
    /// Payment request JSON as read from the QR code.
    #[arg(long, conflicts_with = "scan")]
    payload: Option<String>,
    /// Read scanned payloads from stdin.
    #[arg(long)]
    scan: bool,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Args)]
struct SendArgs {
    #[arg(long)]
    token: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: String,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Args)]
struct BalancesArgs {
    /// Account to inspect; defaults to the configured wallet.
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Account to inspect; defaults to the configured wallet.
    #[arg(long)]
    address: Option<String>,
    /// Token to list; defaults to QRPAY_HISTORY_TOKEN.
    #[arg(long)]
    token: Option<String>,
    #[arg(long, default_value_t = HISTORY_LIMIT)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrpay=info,qrpay_core=info,qrpay_wallet=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = WalletConfig::from_env()?;
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(tokens_file) = cli.tokens_file {
        config.tokens_file = Some(tokens_file);
    }

    match cli.command {
        Commands::Tokens(args) => commands::tokens(&config, args),
        Commands::Request(args) => commands::request(&config, args),
        Commands::Pay(args) => commands::pay(&config, args).await,
        Commands::Send(args) => commands::send(&config, args).await,
        Commands::Balances(args) => commands::balances(&config, args).await,
        Commands::History(args) => commands::history(&config, args).await,
    }
}
