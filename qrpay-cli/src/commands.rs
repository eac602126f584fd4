use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use qrpay_core::qr::{download_file_name, render, QrFormat, QrImage, QrOptions};
use qrpay_core::{
    decode, encode, explorer_tx_url, from_base_units, parse_recipient, scan_payment,
    validate_form, Address, Direction, DispatchReceipt, PaymentController, PaymentIntent,
    ScanOutcome, SubmitOutcome, TokenDescriptor, TokenRegistry, WalletSigner,
};
use qrpay_wallet::{fetch_balances, fetch_history, ChainReader, EthersWallet, WalletConfig};
use serde_json::json;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::camera::LineCamera;
use crate::confirm::{Confirm, ConfirmingSigner};
use crate::input::LineInput;
use crate::{BalancesArgs, HistoryArgs, OutputFormat, PayArgs, RequestArgs, SendArgs, TokensArgs};

fn lookup_token<'a>(registry: &'a TokenRegistry, symbol: &str) -> Result<&'a TokenDescriptor> {
    registry.get(symbol).ok_or_else(|| {
        let supported: Vec<&str> = registry.iter().map(|t| t.symbol.as_str()).collect();
        anyhow!(
            "Unsupported token {symbol}; supported: {}",
            supported.join(", ")
        )
    })
}

/// `--address` if given, otherwise the configured wallet's address
fn resolve_address(config: &WalletConfig, address: Option<&str>) -> Result<Address> {
    match address {
        Some(address) => Ok(parse_recipient(address)?),
        None => Ok(EthersWallet::connect(config)
            .context("Pass --address or set QRPAY_PRIVATE_KEY")?
            .address()),
    }
}

fn print_receipt(config: &WalletConfig, receipt: &DispatchReceipt) {
    println!("Transaction submitted: {}", receipt.tx_hash_hex());
    println!("{}", explorer_tx_url(&config.explorer_url, receipt.tx_hash));
}

fn finish(config: &WalletConfig, outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Submitted(receipt) => {
            print_receipt(config, &receipt);
            Ok(())
        }
        SubmitOutcome::Ignored => bail!("Another payment is already in progress"),
    }
}

pub fn tokens(config: &WalletConfig, args: TokensArgs) -> Result<()> {
    let registry = config.registry()?;

    if args.json {
        let tokens: Vec<_> = registry
            .iter()
            .map(|t| {
                json!({
                    "symbol": t.symbol,
                    "name": t.display_name,
                    "address": t.wire_address_hex(),
                    "decimals": t.decimals,
                    "native": t.kind.is_native(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }

    for token in registry.iter() {
        let address = if token.kind.is_native() {
            "(native)".to_string()
        } else {
            token.wire_address_hex()
        };
        println!(
            "{:<8} {:<16} {:>3}  {}",
            token.symbol, token.display_name, token.decimals, address
        );
    }
    Ok(())
}

pub fn request(config: &WalletConfig, args: RequestArgs) -> Result<()> {
    let registry = config.registry()?;
    let token = lookup_token(&registry, &args.token)?;

    let recipient = match args.recipient {
        Some(recipient) => recipient,
        None => format!("{:#x}", resolve_address(config, None)?),
    };
    let intent = PaymentIntent::request_now(token, &args.amount, &recipient)?;
    let payload = encode(&intent);

    let format = match args.format {
        OutputFormat::Terminal => QrFormat::Terminal,
        OutputFormat::Svg => QrFormat::Svg,
        OutputFormat::Png => QrFormat::Png,
    };
    let options = QrOptions::for_token(token).with_format(format);
    let image = render(&payload, &options)?;

    match image {
        QrImage::Terminal(text) => println!("{text}"),
        QrImage::Svg(svg) => match &args.out {
            Some(path) => write_file(path, svg.as_bytes())?,
            None => println!("{svg}"),
        },
        QrImage::Png(png) => {
            let path = args
                .out
                .clone()
                .unwrap_or_else(|| PathBuf::from(download_file_name(&intent)));
            write_file(&path, &png)?;
        }
    }

    eprintln!("Request: {}", intent.summary());
    eprintln!("Payload: {payload}");
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved QR code to {}", path.display());
    Ok(())
}

/// Confirmation through `input`, or none with `--yes`
fn confirmation<R>(input: LineInput<R>, assume_yes: bool) -> Option<Box<dyn Confirm>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    if assume_yes {
        None
    } else {
        Some(Box::new(input))
    }
}

async fn scan_input<R>(input: &LineInput<R>) -> Result<PaymentIntent>
where
    R: AsyncBufRead + Unpin + Send,
{
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut camera = LineCamera::new(input.clone());
    let outcome = scan_payment(&mut camera, &cancel).await;
    ctrl_c.abort();

    match outcome? {
        ScanOutcome::Intent(intent) => Ok(intent),
        ScanOutcome::Cancelled => bail!("Scan cancelled"),
        ScanOutcome::Closed => bail!("No payment request was scanned"),
        ScanOutcome::Unrecognised { error, .. } => {
            bail!("{} ({})", error.user_message(), error)
        }
    }
}

pub async fn pay(config: &WalletConfig, args: PayArgs) -> Result<()> {
    let controller = PaymentController::new(config.registry()?);
    let input = LineInput::stdin();

    let intent = match &args.payload {
        Some(payload) => decode(payload).map_err(|e| anyhow!("{} ({})", e.user_message(), e))?,
        None => scan_input(&input).await?,
    };
    println!("Payment request: {}", intent.summary());

    let wallet = EthersWallet::connect(config)?;
    let signer = ConfirmingSigner::new(wallet, intent.summary(), confirmation(input, args.yes));

    controller.hold_scanned(intent);
    match controller.pay_scanned(&signer).await {
        Ok(outcome) => finish(config, outcome),
        Err(e) => {
            error!("Payment failed: {}", e);
            bail!(e.user_message())
        }
    }
}

pub async fn send(config: &WalletConfig, args: SendArgs) -> Result<()> {
    let controller = PaymentController::new(config.registry()?);
    let request = validate_form(&args.token, &args.to, &args.amount, controller.registry())
        .map_err(|e| anyhow!("{} ({})", e.user_message(), e))?;

    let summary = format!(
        "{} {} to {:#x}",
        from_base_units(request.amount_base_units, request.token.decimals),
        request.token.symbol,
        request.recipient
    );
    let wallet = EthersWallet::connect(config)?;
    let signer =
        ConfirmingSigner::new(wallet, summary, confirmation(LineInput::stdin(), args.yes));

    match controller.submit(&request, &signer).await {
        Ok(outcome) => finish(config, outcome),
        Err(e) => {
            error!("Transfer failed: {}", e);
            bail!(e.user_message())
        }
    }
}

pub async fn balances(config: &WalletConfig, args: BalancesArgs) -> Result<()> {
    let registry = config.registry()?;
    let owner = resolve_address(config, args.address.as_deref())?;
    let reader = ChainReader::connect(&config.rpc_url)?;

    let balances = fetch_balances(&reader, &registry, owner).await;

    if args.json {
        let rows: Vec<_> = balances
            .iter()
            .map(|b| {
                json!({
                    "symbol": b.symbol,
                    "balance": b.display,
                    "baseUnits": b.base_units.to_string(),
                    "fetched": b.fetched,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Balances for {owner:#x}");
    for balance in balances {
        let note = if balance.fetched { "" } else { "  (unavailable)" };
        println!("{:<8} {:>24}{}", balance.symbol, balance.display, note);
    }
    Ok(())
}

pub async fn history(config: &WalletConfig, args: HistoryArgs) -> Result<()> {
    let registry = config.registry()?;
    let symbol = args.token.as_deref().unwrap_or(&config.history_token);
    let token = lookup_token(&registry, symbol)?;
    let owner = resolve_address(config, args.address.as_deref())?;
    let reader = ChainReader::connect(&config.rpc_url)?;

    let rows = fetch_history(&reader, token, owner, config.history_from_block, args.limit).await;
    if rows.is_empty() {
        println!("No {} transfers found for {owner:#x}", token.symbol);
        return Ok(());
    }

    for row in rows {
        let time = row
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let preposition = match row.direction {
            Direction::Sent => "to",
            Direction::Received => "from",
        };
        println!(
            "{time}  {:<8} {:>16} {} {preposition} {:#x}",
            row.direction.as_str(),
            row.amount,
            row.token_symbol,
            row.counterparty
        );
        println!("    {}", explorer_tx_url(&config.explorer_url, row.tx_hash));
    }
    Ok(())
}
