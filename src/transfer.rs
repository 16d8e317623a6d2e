use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cqrs_es::{AggregateError, CqrsFramework, persist::PersistedEventStore};
use derive_more::{Display, From};
use rust_decimal::Decimal;
use sqlite_es::{SqliteEventRepository, sqlite_aggregate_cqrs};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    api::{TransferRequest, WalletApi},
    domain::{
        intent::{PaymentIntent, error::IntentError, manual::ManualEntryForm, payload},
        props::{Amount, Pin},
        wizard::{
            aggregate::{TransferWizard, WizardServices, wizard_aggregate_id},
            command::{AuthorizeTransferPayload, StageIntentPayload, UpdateDraftPayload, WizardCommand},
            draft::TransferOutcome,
            error::WizardError,
        },
    },
    query::wizard::{WizardPhase, WizardView, WizardViewStore},
};

#[derive(Debug, Display, From)]
pub enum TransferError {
    #[from]
    Intent(IntentError),
    #[from]
    Wizard(WizardError),
    Framework(String),
}

impl TransferError {
    pub fn user_message(&self) -> String {
        match self {
            TransferError::Intent(e) => e.user_message().to_owned(),
            TransferError::Wizard(e) => e.user_message().to_owned(),
            TransferError::Framework(_) => "Something went wrong. Please try again.".to_owned(),
        }
    }
}

impl std::error::Error for TransferError {}

// Drives one wizard instance. Coordinates the wizard aggregate and the wallet
// backend; the backend call happens here, between two aggregate commands.
pub struct TransferSession {
    cqrs: CqrsFramework<TransferWizard, PersistedEventStore<SqliteEventRepository, TransferWizard>>,
    views: WizardViewStore,
    api: Arc<dyn WalletApi>,
    aggregate_id: String,
    submitting: AtomicBool,
}

impl TransferSession {
    /// `event_pool` must already carry the event tables, see
    /// [`crate::store::in_memory_event_pool`].
    pub fn new(
        event_pool: SqlitePool,
        api: Arc<dyn WalletApi>,
        services: WizardServices,
        session_id: &str,
    ) -> Self {
        let views = WizardViewStore::default();
        let cqrs = sqlite_aggregate_cqrs(event_pool, vec![Box::new(views.clone())], services);

        TransferSession {
            cqrs,
            views,
            api,
            aggregate_id: wizard_aggregate_id(session_id),
            submitting: AtomicBool::new(false),
        }
    }

    pub async fn view(&self) -> WizardView {
        self.views.load(&self.aggregate_id).await
    }

    pub async fn stage_scanned(&self, qr_text: &str) -> Result<WizardView, TransferError> {
        let intent = payload::decode(qr_text)?;
        self.stage_intent(intent).await
    }

    pub async fn stage_manual(&self, form: ManualEntryForm) -> Result<WizardView, TransferError> {
        let intent = form.into_intent()?;
        self.stage_intent(intent).await
    }

    pub async fn stage_intent(&self, intent: PaymentIntent) -> Result<WizardView, TransferError> {
        info!("Staging transfer to {}", intent.recipient_name);

        let available_balance = self.agent_balance().await;
        self.execute(WizardCommand::StageIntent(StageIntentPayload {
            intent,
            available_balance,
        }))
        .await
    }

    pub async fn update_draft(
        &self,
        amount: &str,
        description: &str,
    ) -> Result<WizardView, TransferError> {
        self.execute(WizardCommand::UpdateDraft(UpdateDraftPayload {
            amount: amount.to_owned(),
            description: description.to_owned(),
        }))
        .await
    }

    pub async fn confirm(&self) -> Result<WizardView, TransferError> {
        self.execute(WizardCommand::ConfirmDraft).await
    }

    /// Authorizes with the entered PIN and, unless the local check cancels the
    /// transfer, submits it. At most one submission runs at a time.
    pub async fn authorize(&self, pin: Pin) -> Result<WizardView, TransferError> {
        let _in_flight = InFlight::acquire(&self.submitting)?;

        let view = self
            .execute(WizardCommand::AuthorizeTransfer(AuthorizeTransferPayload {
                pin: pin.clone(),
            }))
            .await?;

        if view.phase != WizardPhase::Submitting {
            info!("Transfer cancelled before submission");
            return Ok(view);
        }

        self.submit_and_record(&view, pin).await
    }

    // Runs once the wizard is in `Submitting`. Every path records an outcome so
    // the wizard never stays there.
    async fn submit_and_record(
        &self,
        view: &WizardView,
        pin: Pin,
    ) -> Result<WizardView, TransferError> {
        let outcome = match self.transfer_request(view, pin) {
            Ok(request) => self.submit(&request).await,
            Err(e) => {
                warn!("Transfer not sent: {}", e);
                TransferOutcome::Failed(e.user_message())
            }
        };

        self.execute(WizardCommand::RecordOutcome(outcome)).await
    }

    async fn submit(&self, request: &TransferRequest) -> TransferOutcome {
        match self.api.transfer(request).await {
            Ok(result) => {
                info!("Transfer {} completed", result.transaction_id);
                TransferOutcome::Completed(result)
            }
            Err(e) => {
                warn!("Transfer to {} failed: {}", request.recipient_id, e);
                TransferOutcome::Failed(e.user_message())
            }
        }
    }

    pub async fn retry(&self) -> Result<WizardView, TransferError> {
        self.execute(WizardCommand::RetryAuthorization).await
    }

    pub async fn reset(&self) -> Result<WizardView, TransferError> {
        self.execute(WizardCommand::Reset).await
    }

    async fn agent_balance(&self) -> Option<Amount> {
        match self.api.current_user().await {
            Ok(user) => user.wallet_balance.map(Amount),
            Err(e) => {
                warn!("Balance unavailable, skipping balance check: {}", e);
                None
            }
        }
    }

    fn transfer_request(&self, view: &WizardView, pin: Pin) -> Result<TransferRequest, TransferError> {
        let draft = view
            .draft
            .as_ref()
            .ok_or_else(|| TransferError::Framework("submitting without a draft".to_owned()))?;
        let amount: Decimal = draft
            .amount
            .map(|a| a.0)
            .ok_or_else(|| TransferError::Framework("submitting without an amount".to_owned()))?;

        Ok(TransferRequest {
            recipient_id: draft.intent.recipient_id.clone(),
            amount,
            description: draft.description.clone(),
            pin,
        })
    }

    async fn execute(&self, command: WizardCommand) -> Result<WizardView, TransferError> {
        self.cqrs
            .execute(&self.aggregate_id, command)
            .await
            .map_err(|e| match e {
                AggregateError::UserError(e) => TransferError::Wizard(e),
                other => TransferError::Framework(other.to_string()),
            })?;

        Ok(self.view().await)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, WizardError> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
