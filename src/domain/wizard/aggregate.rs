use async_trait::async_trait;
use cqrs_es::Aggregate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    props::{Amount, Pin},
    wizard::{
        command::{AuthorizeTransferPayload, StageIntentPayload, UpdateDraftPayload, WizardCommand},
        draft::{TransactionResult, TransferDraft, TransferOutcome},
        error::WizardError,
        event::{
            DraftUpdatedPayload, IntentStagedPayload, TransferCancelledPayload,
            TransferFailedPayload, WizardEvent,
        },
    },
};

pub const PIN_MISMATCH_MESSAGE: &str = "Invalid PIN. Transaction cancelled.";

// Aggregate
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub enum TransferWizard {
    #[default]
    Idle,
    Staged(TransferDraft),
    Authorizing(TransferDraft),
    Submitting(TransferDraft),
    Complete(CompletedTransfer),
    Failed(FailedTransfer),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompletedTransfer {
    pub draft: TransferDraft,
    pub result: TransactionResult,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailedTransfer {
    pub draft: TransferDraft,
    pub error: String,
}

pub struct WizardServices {
    /// Compare the entered PIN against the one carried by the intent before
    /// anything is sent. The backend verifies the PIN regardless.
    pub local_pin_check: bool,
}

impl Default for WizardServices {
    fn default() -> Self {
        WizardServices {
            local_pin_check: true,
        }
    }
}

#[async_trait]
impl Aggregate for TransferWizard {
    type Command = WizardCommand;
    type Event = WizardEvent;
    type Error = WizardError;
    type Services = WizardServices;

    fn aggregate_type() -> String {
        "TransferWizard".to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WizardCommand::StageIntent(p) => self.stage(p).await,
            WizardCommand::UpdateDraft(p) => self.update_draft(p).await,
            WizardCommand::ConfirmDraft => self.confirm().await,
            WizardCommand::AuthorizeTransfer(p) => self.authorize(p, services).await,
            WizardCommand::RecordOutcome(o) => self.record_outcome(o).await,
            WizardCommand::RetryAuthorization => self.retry().await,
            WizardCommand::Reset => self.reset().await,
        }
    }

    fn apply(&mut self, event: Self::Event) {
        let current = std::mem::take(self);

        *self = match (current, event) {
            (_, WizardEvent::IntentStaged(p)) => {
                TransferWizard::Staged(TransferDraft::new(p.intent, p.available_balance))
            }
            (TransferWizard::Staged(mut draft), WizardEvent::DraftUpdated(p)) => {
                draft.amount = p.amount;
                draft.description = p.description;
                TransferWizard::Staged(draft)
            }
            (TransferWizard::Staged(draft), WizardEvent::DraftConfirmed) => {
                TransferWizard::Authorizing(draft)
            }
            (TransferWizard::Authorizing(draft), WizardEvent::SubmissionStarted) => {
                TransferWizard::Submitting(draft)
            }
            (TransferWizard::Submitting(draft), WizardEvent::TransferCompleted(result)) => {
                TransferWizard::Complete(CompletedTransfer { draft, result })
            }
            (TransferWizard::Submitting(draft), WizardEvent::TransferFailed(p)) => {
                TransferWizard::Failed(FailedTransfer {
                    draft,
                    error: p.message,
                })
            }
            (TransferWizard::Failed(failed), WizardEvent::ReauthorizationRequested) => {
                TransferWizard::Authorizing(failed.draft)
            }
            (_, WizardEvent::TransferCancelled(_)) | (_, WizardEvent::WizardReset) => {
                TransferWizard::Idle
            }
            // Events are only emitted against the state they were validated on.
            (state, _) => state,
        };
    }
}

impl TransferWizard {
    pub fn draft(&self) -> Option<&TransferDraft> {
        match self {
            TransferWizard::Idle => None,
            TransferWizard::Staged(d)
            | TransferWizard::Authorizing(d)
            | TransferWizard::Submitting(d) => Some(d),
            TransferWizard::Complete(c) => Some(&c.draft),
            TransferWizard::Failed(f) => Some(&f.draft),
        }
    }

    async fn stage(
        &self,
        p: StageIntentPayload,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        debug!(
            "Staging {} intent for {}",
            p.intent.source, p.intent.recipient_id
        );

        require_idle(self)?;
        p.intent
            .require_complete()
            .map_err(|_| WizardError::IncompleteIntent)?;

        Ok(vec![WizardEvent::IntentStaged(IntentStagedPayload {
            intent: p.intent,
            available_balance: p.available_balance,
        })])
    }

    async fn update_draft(
        &self,
        p: UpdateDraftPayload,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        debug!("Updating draft amount to {:?}", p.amount);

        require_staged(self)?;

        Ok(vec![WizardEvent::DraftUpdated(DraftUpdatedPayload {
            amount: Amount::parse_input(&p.amount),
            description: p.description.trim().to_owned(),
        })])
    }

    async fn confirm(
        &self,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        let draft = require_staged(self)?;

        debug!(
            "Confirming {:?} to {}",
            draft.amount, draft.intent.recipient_id
        );

        require_legal_amount(draft)?;

        Ok(vec![WizardEvent::DraftConfirmed])
    }

    async fn authorize(
        &self,
        p: AuthorizeTransferPayload,
        services: &WizardServices,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        let draft = require_authorizing(self)?;

        debug!("Authorizing transfer to {}", draft.intent.recipient_id);

        require_well_formed_pin(&p.pin)?;

        if services.local_pin_check && p.pin != draft.intent.pin {
            return Ok(vec![WizardEvent::TransferCancelled(
                TransferCancelledPayload {
                    reason: PIN_MISMATCH_MESSAGE.to_owned(),
                },
            )]);
        }

        Ok(vec![WizardEvent::SubmissionStarted])
    }

    async fn record_outcome(
        &self,
        outcome: TransferOutcome,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        debug!("Recording submission outcome");

        require_submitting(self)?;

        let event = match outcome {
            TransferOutcome::Completed(result) => WizardEvent::TransferCompleted(result),
            TransferOutcome::Failed(message) => {
                WizardEvent::TransferFailed(TransferFailedPayload { message })
            }
        };

        Ok(vec![event])
    }

    async fn retry(
        &self,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        debug!("Re-entering authorization after failure");

        if !matches!(self, TransferWizard::Failed(_)) {
            return Err(WizardError::NotFailed);
        }

        Ok(vec![WizardEvent::ReauthorizationRequested])
    }

    async fn reset(
        &self,
    ) -> Result<Vec<<TransferWizard as Aggregate>::Event>, <TransferWizard as Aggregate>::Error>
    {
        debug!("Resetting wizard");

        match self {
            TransferWizard::Idle => Ok(vec![]),
            TransferWizard::Submitting(_) => Err(WizardError::SubmissionInFlight),
            _ => Ok(vec![WizardEvent::WizardReset]),
        }
    }
}

fn require_idle(wizard: &TransferWizard) -> Result<(), <TransferWizard as Aggregate>::Error> {
    match wizard {
        TransferWizard::Idle => Ok(()),
        _ => Err(WizardError::NotIdle),
    }
}

fn require_staged(
    wizard: &TransferWizard,
) -> Result<&TransferDraft, <TransferWizard as Aggregate>::Error> {
    match wizard {
        TransferWizard::Staged(draft) => Ok(draft),
        _ => Err(WizardError::NotStaged),
    }
}

fn require_authorizing(
    wizard: &TransferWizard,
) -> Result<&TransferDraft, <TransferWizard as Aggregate>::Error> {
    match wizard {
        TransferWizard::Authorizing(draft) => Ok(draft),
        TransferWizard::Submitting(_) => Err(WizardError::SubmissionInFlight),
        _ => Err(WizardError::NotAuthorizing),
    }
}

fn require_submitting(wizard: &TransferWizard) -> Result<(), <TransferWizard as Aggregate>::Error> {
    match wizard {
        TransferWizard::Submitting(_) => Ok(()),
        _ => Err(WizardError::NotSubmitting),
    }
}

fn require_legal_amount(draft: &TransferDraft) -> Result<(), <TransferWizard as Aggregate>::Error> {
    let amount = draft.amount.ok_or(WizardError::MissingAmount)?;

    if amount.0 <= Decimal::ZERO {
        return Err(WizardError::IllegalAmount);
    }

    if draft.available_balance.is_some_and(|b| amount.0 > b.0) {
        return Err(WizardError::AmountExceedsBalance);
    }

    Ok(())
}

fn require_well_formed_pin(pin: &Pin) -> Result<(), <TransferWizard as Aggregate>::Error> {
    if !pin.is_well_formed() {
        return Err(WizardError::MalformedPin);
    }

    Ok(())
}

pub fn wizard_aggregate_id(session_id: &str) -> String {
    format!("TransferWizard-{}", session_id)
}

#[cfg(test)]
mod tests {
    use cqrs_es::{Aggregate, test::TestFramework};
    use rust_decimal::dec;

    use crate::domain::{
        intent::PaymentIntent,
        props::{Amount, IntentSource, Pin, RecipientId, TransactionId},
        wizard::{
            aggregate::{PIN_MISMATCH_MESSAGE, TransferWizard, WizardServices},
            command::{
                AuthorizeTransferPayload, StageIntentPayload, UpdateDraftPayload, WizardCommand,
            },
            draft::{TransactionResult, TransferDraft, TransferOutcome},
            error::WizardError,
            event::{
                DraftUpdatedPayload, IntentStagedPayload, TransferCancelledPayload,
                TransferFailedPayload, WizardEvent,
            },
        },
    };

    type WizardTestFramework = TestFramework<TransferWizard>;

    fn jane() -> PaymentIntent {
        PaymentIntent {
            recipient_id: RecipientId("u1".to_owned()),
            recipient_name: "Jane".to_owned(),
            recipient_email: "j@x.com".to_owned(),
            pin: Pin("1234".to_owned()),
            wallet_balance: None,
            source: IntentSource::Scanned,
        }
    }

    fn staged(balance: Option<Amount>) -> WizardEvent {
        WizardEvent::IntentStaged(IntentStagedPayload {
            intent: jane(),
            available_balance: balance,
        })
    }

    fn amount(a: Option<Amount>) -> WizardEvent {
        WizardEvent::DraftUpdated(DraftUpdatedPayload {
            amount: a,
            description: "".to_owned(),
        })
    }

    fn authorizing() -> Vec<WizardEvent> {
        vec![
            staged(None),
            amount(Some(Amount(dec!(500)))),
            WizardEvent::DraftConfirmed,
        ]
    }

    fn submitting() -> Vec<WizardEvent> {
        let mut events = authorizing();
        events.push(WizardEvent::SubmissionStarted);
        events
    }

    fn failed() -> Vec<WizardEvent> {
        let mut events = submitting();
        events.push(WizardEvent::TransferFailed(TransferFailedPayload {
            message: "Insufficient funds".to_owned(),
        }));
        events
    }

    fn authorize(pin: &str) -> WizardCommand {
        WizardCommand::AuthorizeTransfer(AuthorizeTransferPayload {
            pin: Pin(pin.to_owned()),
        })
    }

    fn tx1() -> TransactionResult {
        TransactionResult {
            transaction_id: TransactionId("TX1".to_owned()),
            message: "ok".to_owned(),
        }
    }

    #[test]
    fn test_stage_from_idle() {
        WizardTestFramework::with(WizardServices::default())
            .given_no_previous_events()
            .when(WizardCommand::StageIntent(StageIntentPayload {
                intent: jane(),
                available_balance: Some(Amount(dec!(1000))),
            }))
            .then_expect_events(vec![staged(Some(Amount(dec!(1000))))]);
    }

    #[test]
    fn test_stage_incomplete_intent() {
        let intent = PaymentIntent {
            recipient_email: "".to_owned(),
            ..jane()
        };

        WizardTestFramework::with(WizardServices::default())
            .given_no_previous_events()
            .when(WizardCommand::StageIntent(StageIntentPayload {
                intent,
                available_balance: None,
            }))
            .then_expect_error(WizardError::IncompleteIntent);
    }

    #[test]
    fn test_stage_twice() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None)])
            .when(WizardCommand::StageIntent(StageIntentPayload {
                intent: jane(),
                available_balance: None,
            }))
            .then_expect_error(WizardError::NotIdle);
    }

    #[test]
    fn test_update_draft_parses_amount() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None)])
            .when(WizardCommand::UpdateDraft(UpdateDraftPayload {
                amount: " 500 ".to_owned(),
                description: " Lunch ".to_owned(),
            }))
            .then_expect_events(vec![WizardEvent::DraftUpdated(DraftUpdatedPayload {
                amount: Some(Amount(dec!(500))),
                description: "Lunch".to_owned(),
            })]);
    }

    #[test]
    fn test_update_draft_non_numeric_amount_clears_it() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None), amount(Some(Amount(dec!(5))))])
            .when(WizardCommand::UpdateDraft(UpdateDraftPayload {
                amount: "abc".to_owned(),
                description: "".to_owned(),
            }))
            .then_expect_events(vec![amount(None)]);
    }

    #[test]
    fn test_update_draft_outside_staged() {
        WizardTestFramework::with(WizardServices::default())
            .given(authorizing())
            .when(WizardCommand::UpdateDraft(UpdateDraftPayload {
                amount: "5".to_owned(),
                description: "".to_owned(),
            }))
            .then_expect_error(WizardError::NotStaged);
    }

    #[test]
    fn test_confirm_valid_amount() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None), amount(Some(Amount(dec!(500))))])
            .when(WizardCommand::ConfirmDraft)
            .then_expect_events(vec![WizardEvent::DraftConfirmed]);
    }

    #[test]
    fn test_confirm_blocked_without_amount() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None)])
            .when(WizardCommand::ConfirmDraft)
            .then_expect_error(WizardError::MissingAmount);
    }

    #[test]
    fn test_confirm_blocked_for_non_positive_amounts() {
        for a in [dec!(0), dec!(-1), dec!(-0.01)] {
            WizardTestFramework::with(WizardServices::default())
                .given(vec![staged(None), amount(Some(Amount(a)))])
                .when(WizardCommand::ConfirmDraft)
                .then_expect_error(WizardError::IllegalAmount);
        }
    }

    #[test]
    fn test_confirm_blocked_above_known_balance() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![
                staged(Some(Amount(dec!(499.99)))),
                amount(Some(Amount(dec!(500)))),
            ])
            .when(WizardCommand::ConfirmDraft)
            .then_expect_error(WizardError::AmountExceedsBalance);
    }

    #[test]
    fn test_confirm_allows_exact_balance() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![
                staged(Some(Amount(dec!(500)))),
                amount(Some(Amount(dec!(500)))),
            ])
            .when(WizardCommand::ConfirmDraft)
            .then_expect_events(vec![WizardEvent::DraftConfirmed]);
    }

    #[test]
    fn test_authorize_matching_pin() {
        WizardTestFramework::with(WizardServices::default())
            .given(authorizing())
            .when(authorize("1234"))
            .then_expect_events(vec![WizardEvent::SubmissionStarted]);
    }

    #[test]
    fn test_authorize_mismatched_pin_cancels() {
        WizardTestFramework::with(WizardServices::default())
            .given(authorizing())
            .when(authorize("9999"))
            .then_expect_events(vec![WizardEvent::TransferCancelled(
                TransferCancelledPayload {
                    reason: PIN_MISMATCH_MESSAGE.to_owned(),
                },
            )]);
    }

    #[test]
    fn test_authorize_mismatched_pin_without_local_check() {
        WizardTestFramework::with(WizardServices {
            local_pin_check: false,
        })
        .given(authorizing())
        .when(authorize("9999"))
        .then_expect_events(vec![WizardEvent::SubmissionStarted]);
    }

    #[test]
    fn test_authorize_malformed_pin() {
        for pin in ["", "123", "12345", "12a4"] {
            WizardTestFramework::with(WizardServices::default())
                .given(authorizing())
                .when(authorize(pin))
                .then_expect_error(WizardError::MalformedPin);
        }
    }

    #[test]
    fn test_authorize_while_submitting() {
        WizardTestFramework::with(WizardServices::default())
            .given(submitting())
            .when(authorize("1234"))
            .then_expect_error(WizardError::SubmissionInFlight);
    }

    #[test]
    fn test_authorize_before_confirm() {
        WizardTestFramework::with(WizardServices::default())
            .given(vec![staged(None), amount(Some(Amount(dec!(500))))])
            .when(authorize("1234"))
            .then_expect_error(WizardError::NotAuthorizing);
    }

    #[test]
    fn test_record_completed() {
        WizardTestFramework::with(WizardServices::default())
            .given(submitting())
            .when(WizardCommand::RecordOutcome(TransferOutcome::Completed(tx1())))
            .then_expect_events(vec![WizardEvent::TransferCompleted(tx1())]);
    }

    #[test]
    fn test_record_failed() {
        WizardTestFramework::with(WizardServices::default())
            .given(submitting())
            .when(WizardCommand::RecordOutcome(TransferOutcome::Failed(
                "Insufficient funds".to_owned(),
            )))
            .then_expect_events(vec![WizardEvent::TransferFailed(TransferFailedPayload {
                message: "Insufficient funds".to_owned(),
            })]);
    }

    #[test]
    fn test_record_outcome_outside_submission() {
        WizardTestFramework::with(WizardServices::default())
            .given(authorizing())
            .when(WizardCommand::RecordOutcome(TransferOutcome::Completed(tx1())))
            .then_expect_error(WizardError::NotSubmitting);
    }

    #[test]
    fn test_retry_after_failure() {
        WizardTestFramework::with(WizardServices::default())
            .given(failed())
            .when(WizardCommand::RetryAuthorization)
            .then_expect_events(vec![WizardEvent::ReauthorizationRequested]);
    }

    #[test]
    fn test_retry_without_failure() {
        WizardTestFramework::with(WizardServices::default())
            .given(authorizing())
            .when(WizardCommand::RetryAuthorization)
            .then_expect_error(WizardError::NotFailed);
    }

    #[test]
    fn test_reset_from_idle_is_noop() {
        WizardTestFramework::with(WizardServices::default())
            .given_no_previous_events()
            .when(WizardCommand::Reset)
            .then_expect_events(vec![]);
    }

    #[test]
    fn test_reset_while_submitting() {
        WizardTestFramework::with(WizardServices::default())
            .given(submitting())
            .when(WizardCommand::Reset)
            .then_expect_error(WizardError::SubmissionInFlight);
    }

    #[test]
    fn test_reset_after_failure() {
        WizardTestFramework::with(WizardServices::default())
            .given(failed())
            .when(WizardCommand::Reset)
            .then_expect_events(vec![WizardEvent::WizardReset]);
    }

    fn replay(events: Vec<WizardEvent>) -> TransferWizard {
        let mut wizard = TransferWizard::default();
        for e in events {
            wizard.apply(e);
        }
        wizard
    }

    #[test]
    fn applies_full_happy_path() {
        let mut events = submitting();
        events.push(WizardEvent::TransferCompleted(tx1()));

        match replay(events) {
            TransferWizard::Complete(c) => {
                assert_eq!(c.result, tx1());
                assert_eq!(c.draft.intent.recipient_name, "Jane");
                assert_eq!(c.draft.amount, Some(Amount(dec!(500))));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn failure_keeps_draft() {
        match replay(failed()) {
            TransferWizard::Failed(f) => {
                assert_eq!(f.error, "Insufficient funds");
                assert_eq!(f.draft.amount, Some(Amount(dec!(500))));
                assert_eq!(f.draft.intent.recipient_id, RecipientId("u1".to_owned()));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn retry_returns_to_authorizing_with_same_draft() {
        let mut events = failed();
        events.push(WizardEvent::ReauthorizationRequested);

        let expected = {
            let mut d = TransferDraft::new(jane(), None);
            d.amount = Some(Amount(dec!(500)));
            d
        };
        assert_eq!(replay(events), TransferWizard::Authorizing(expected));
    }

    #[test]
    fn reset_is_equivalent_to_fresh_idle() {
        let mut from_complete = submitting();
        from_complete.push(WizardEvent::TransferCompleted(tx1()));
        from_complete.push(WizardEvent::WizardReset);

        let mut from_failed = failed();
        from_failed.push(WizardEvent::WizardReset);
        from_failed.push(WizardEvent::WizardReset);

        assert_eq!(replay(from_complete), TransferWizard::default());
        assert_eq!(replay(from_failed), TransferWizard::default());
        assert_eq!(TransferWizard::default().draft(), None);
    }

    #[test]
    fn pin_mismatch_returns_to_idle() {
        let mut events = authorizing();
        events.push(WizardEvent::TransferCancelled(TransferCancelledPayload {
            reason: PIN_MISMATCH_MESSAGE.to_owned(),
        }));

        assert_eq!(replay(events), TransferWizard::Idle);
    }
}
