use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use color_eyre::eyre::{Result, eyre};

use crate::domain::intent::manual::ManualEntryForm;

#[derive(Parser, Debug)]
#[command(author, version, about = "School wallet agent transfer client")]
pub struct CliArgs {
    /// Path to a TOML settings file (defaults to ./school-wallet.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pay a recipient identified by a scanned QR payload or manual entry
    Pay(PayArgs),
    /// Show the logged-in account and its wallet balance
    Balance,
    /// Print the transaction history as CSV
    History,
    /// Encode the QR payload a kid account displays for payment
    QrPayload(RecipientArgs),
    /// Keep validating the session until it expires or Ctrl-C
    Watch,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Decoded QR text (base64 JSON)
    #[arg(long, conflicts_with_all = ["recipient_id", "name", "email", "recipient_pin"])]
    pub qr: Option<String>,

    /// Read QR codes from stdin, one per line, as printed by an external reader
    #[arg(long, conflicts_with_all = ["qr", "recipient_id", "name", "email", "recipient_pin"])]
    pub scan: bool,

    #[arg(long)]
    pub recipient_id: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// PIN carried by the recipient's details
    #[arg(long)]
    pub recipient_pin: Option<String>,

    #[arg(long)]
    pub amount: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// PIN entered to authorize the transfer
    #[arg(long)]
    pub pin: String,
}

impl PayArgs {
    /// Missing flags become empty fields, which the form then rejects.
    pub fn manual_entry(&self) -> ManualEntryForm {
        ManualEntryForm {
            user_id: self.recipient_id.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            pin: self.recipient_pin.clone().unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug)]
pub struct RecipientArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub pin: String,
    #[arg(long)]
    pub wallet_balance: Option<rust_decimal::Decimal>,
}

impl CliArgs {
    pub fn load() -> Result<Self> {
        CliArgs::try_parse().or_else(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => Err(eyre!("{}", e.to_string().trim_end())),
        })
    }
}
