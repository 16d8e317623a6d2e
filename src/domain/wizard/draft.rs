use serde::{Deserialize, Serialize};

use crate::domain::{
    intent::PaymentIntent,
    props::{Amount, TransactionId},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferDraft {
    pub intent: PaymentIntent,
    /// `None` while the typed amount is empty or not a number.
    pub amount: Option<Amount>,
    pub description: String,
    /// Paying agent's own balance, when it could be resolved.
    pub available_balance: Option<Amount>,
}

impl TransferDraft {
    pub fn new(intent: PaymentIntent, available_balance: Option<Amount>) -> Self {
        TransferDraft {
            intent,
            amount: None,
            description: String::new(),
            available_balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionResult {
    pub transaction_id: TransactionId,
    pub message: String,
}

/// What the backend answered to a single submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TransferOutcome {
    Completed(TransactionResult),
    Failed(String),
}
