use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use cqrs_es::{EventEnvelope, Query, View};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::wizard::{
    aggregate::TransferWizard,
    draft::{TransactionResult, TransferDraft},
    event::WizardEvent,
};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum WizardPhase {
    #[default]
    Idle,
    Staged,
    Authorizing,
    Submitting,
    Complete,
    Failed,
}

/// What a front end renders: the current step plus whatever that step shows.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WizardView {
    pub phase: WizardPhase,
    pub draft: Option<TransferDraft>,
    pub result: Option<TransactionResult>,
    pub error: Option<String>,
    /// Last cancellation message, kept until the next intent is staged.
    pub notice: Option<String>,
}

impl View<TransferWizard> for WizardView {
    fn update(&mut self, event: &EventEnvelope<TransferWizard>) {
        match &event.payload {
            WizardEvent::IntentStaged(p) => {
                *self = WizardView {
                    phase: WizardPhase::Staged,
                    draft: Some(TransferDraft::new(p.intent.clone(), p.available_balance)),
                    ..WizardView::default()
                };
            }
            WizardEvent::DraftUpdated(p) => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.amount = p.amount;
                    draft.description = p.description.clone();
                }
            }
            WizardEvent::DraftConfirmed => {
                self.phase = WizardPhase::Authorizing;
            }
            WizardEvent::TransferCancelled(p) => {
                *self = WizardView {
                    notice: Some(p.reason.clone()),
                    ..WizardView::default()
                };
            }
            WizardEvent::SubmissionStarted => {
                self.phase = WizardPhase::Submitting;
                self.error = None;
            }
            WizardEvent::TransferCompleted(result) => {
                self.phase = WizardPhase::Complete;
                self.result = Some(result.clone());
            }
            WizardEvent::TransferFailed(p) => {
                self.phase = WizardPhase::Failed;
                self.error = Some(p.message.clone());
            }
            WizardEvent::ReauthorizationRequested => {
                self.phase = WizardPhase::Authorizing;
            }
            WizardEvent::WizardReset => {
                *self = WizardView::default();
            }
        }
    }
}

/// In-memory projection of wizard views, keyed by aggregate id.
/// Nothing here is ever written to disk.
#[derive(Clone, Default)]
pub struct WizardViewStore {
    views: Arc<RwLock<HashMap<String, WizardView>>>,
}

impl WizardViewStore {
    pub async fn load(&self, aggregate_id: &str) -> WizardView {
        self.views
            .read()
            .await
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Query<TransferWizard> for WizardViewStore {
    async fn dispatch(&self, aggregate_id: &str, events: &[EventEnvelope<TransferWizard>]) {
        let mut views = self.views.write().await;
        let view = views.entry(aggregate_id.to_owned()).or_default();
        for event in events {
            view.update(event);
        }
    }
}
