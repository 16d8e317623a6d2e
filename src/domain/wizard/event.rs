use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::domain::{
    intent::PaymentIntent,
    props::Amount,
    wizard::draft::TransactionResult,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WizardEvent {
    IntentStaged(IntentStagedPayload),
    DraftUpdated(DraftUpdatedPayload),
    DraftConfirmed,
    TransferCancelled(TransferCancelledPayload),
    SubmissionStarted,
    TransferCompleted(TransactionResult),
    TransferFailed(TransferFailedPayload),
    ReauthorizationRequested,
    WizardReset,
}

impl DomainEvent for WizardEvent {
    fn event_type(&self) -> String {
        let event_type: &str = match self {
            WizardEvent::IntentStaged(_) => "IntentStaged",
            WizardEvent::DraftUpdated(_) => "DraftUpdated",
            WizardEvent::DraftConfirmed => "DraftConfirmed",
            WizardEvent::TransferCancelled(_) => "TransferCancelled",
            WizardEvent::SubmissionStarted => "SubmissionStarted",
            WizardEvent::TransferCompleted(_) => "TransferCompleted",
            WizardEvent::TransferFailed(_) => "TransferFailed",
            WizardEvent::ReauthorizationRequested => "ReauthorizationRequested",
            WizardEvent::WizardReset => "WizardReset",
        };
        event_type.to_string()
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentStagedPayload {
    pub intent: PaymentIntent,
    pub available_balance: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftUpdatedPayload {
    pub amount: Option<Amount>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferCancelledPayload {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferFailedPayload {
    pub message: String,
}
