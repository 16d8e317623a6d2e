use serde::Deserialize;

use crate::domain::{
    intent::PaymentIntent,
    props::{Amount, Pin},
    wizard::draft::TransferOutcome,
};

#[derive(Debug, Clone, Deserialize)]
pub enum WizardCommand {
    StageIntent(StageIntentPayload),
    UpdateDraft(UpdateDraftPayload),
    ConfirmDraft,
    AuthorizeTransfer(AuthorizeTransferPayload),
    RecordOutcome(TransferOutcome),
    RetryAuthorization,
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageIntentPayload {
    pub intent: PaymentIntent,
    pub available_balance: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDraftPayload {
    /// Raw amount text as typed.
    pub amount: String,
    pub description: String,
}

// The entered PIN lives only in this command; no event carries it.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeTransferPayload {
    pub pin: Pin,
}
