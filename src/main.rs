#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use std::{sync::Arc, time::Duration, time::SystemTime};

use color_eyre::eyre::{Result, eyre};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use school_wallet_agent::{
    api::{WalletApi, client::HttpWalletApi},
    cli::{CliArgs, Command, PayArgs, RecipientArgs},
    config::Settings,
    domain::{
        intent::{PaymentIntent, payload},
        props::{IntentSource, Pin, RecipientId},
        wizard::aggregate::WizardServices,
    },
    history::print_history_csv,
    query::wizard::{WizardPhase, WizardView},
    scan::{
        controller::ScanController,
        error::ScanError,
        piped::{StdinCamera, TextFrameDecoder},
    },
    session::{SessionStatus, SessionWatcher},
    store::in_memory_event_pool,
    transfer::{TransferError, TransferSession},
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli_args = CliArgs::load()?;
    let settings = Settings::load(cli_args.config.as_deref())?;
    debug!("Using backend {}", settings.api_base_url);

    match cli_args.command {
        Command::Pay(args) => pay(&settings, args).await,
        Command::Balance => balance(&settings).await,
        Command::History => print_history_csv(&wallet_api(&settings)?).await,
        Command::QrPayload(args) => qr_payload(args),
        Command::Watch => watch(&settings).await,
    }
}

fn wallet_api(settings: &Settings) -> Result<HttpWalletApi> {
    HttpWalletApi::from_settings(settings).map_err(|e| eyre!(e))
}

async fn pay(settings: &Settings, args: PayArgs) -> Result<()> {
    let api: Arc<dyn WalletApi> = Arc::new(wallet_api(settings)?);
    let session = TransferSession::new(
        in_memory_event_pool().await?,
        api,
        WizardServices {
            local_pin_check: settings.local_pin_check,
        },
        &session_id(),
    );

    if args.scan {
        let intent = scan_stdin().await?;
        session.stage_intent(intent).await
    } else {
        match &args.qr {
            Some(qr) => session.stage_scanned(qr).await,
            None => session.stage_manual(args.manual_entry()).await,
        }
    }
    .map_err(user_error)?;

    session
        .update_draft(&args.amount, &args.description)
        .await
        .map_err(user_error)?;
    session.confirm().await.map_err(user_error)?;

    let view = session
        .authorize(Pin(args.pin))
        .await
        .map_err(user_error)?;

    report(view)
}

async fn scan_stdin() -> Result<PaymentIntent> {
    let mut controller = ScanController::new(Arc::new(StdinCamera), Arc::new(TextFrameDecoder));
    let scan_error = |e: ScanError| eyre!("{}", e.user_message());

    controller.request_camera_access().await.map_err(scan_error)?;
    controller.start_scanning(None).await.map_err(scan_error)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    controller
        .scan(&cancel)
        .await
        .map_err(scan_error)?
        .ok_or_else(|| eyre!("Scan cancelled"))
}

fn report(view: WizardView) -> Result<()> {
    match view.phase {
        WizardPhase::Complete => {
            let (Some(result), Some(draft)) = (view.result, view.draft) else {
                return Err(eyre!("Transfer completed without a receipt"));
            };
            println!("Transfer successful");
            println!("transaction: {}", result.transaction_id);
            println!("recipient: {}", draft.intent.recipient_name);
            if let Some(amount) = draft.amount {
                println!("amount: {}", amount);
            }
            if !result.message.is_empty() {
                println!("message: {}", result.message);
            }
            Ok(())
        }
        WizardPhase::Failed => Err(eyre!(
            "{}",
            view.error.unwrap_or_else(|| "Transfer failed".to_owned())
        )),
        _ => Err(eyre!(
            "{}",
            view.notice
                .unwrap_or_else(|| "Transfer was not completed".to_owned())
        )),
    }
}

async fn balance(settings: &Settings) -> Result<()> {
    let user = wallet_api(settings)?
        .current_user()
        .await
        .map_err(|e| eyre!("{}", e.user_message()))?;

    println!("name: {}", user.name);
    println!("email: {}", user.email);
    match user.wallet_balance {
        Some(b) => println!("balance: {}", b),
        None => println!("balance: unknown"),
    }

    Ok(())
}

fn qr_payload(args: RecipientArgs) -> Result<()> {
    let intent = PaymentIntent {
        recipient_id: RecipientId(args.id),
        recipient_name: args.name,
        recipient_email: args.email,
        pin: Pin(args.pin),
        wallet_balance: args.wallet_balance,
        source: IntentSource::Scanned,
    };

    let encoded = payload::encode(&intent).map_err(|e| eyre!("{}", e.user_message()))?;
    println!("{}", encoded);

    Ok(())
}

async fn watch(settings: &Settings) -> Result<()> {
    let api: Arc<dyn WalletApi> = Arc::new(wallet_api(settings)?);
    let watcher = SessionWatcher::spawn(api, Duration::from_secs(settings.session_poll_secs));
    let mut status = watcher.status();

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
        }

        let current = status.borrow_and_update().clone();
        match current {
            SessionStatus::Pending => {}
            SessionStatus::Active(user) => println!("session active: {}", user.email),
            SessionStatus::Unreachable(reason) => println!("session unknown: {}", reason),
            SessionStatus::Expired => break Err(eyre!("Session expired. Please log in again.")),
        }
    };

    watcher.logout().await;
    outcome
}

fn user_error(e: TransferError) -> color_eyre::eyre::Report {
    debug!("Transfer step rejected: {}", e);
    eyre!("{}", e.user_message())
}

fn session_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", std::process::id(), nanos)
}
