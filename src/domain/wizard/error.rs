use derive_more::Display;

#[derive(Debug, PartialEq, Display)]
pub enum WizardError {
    IncompleteIntent,
    NotIdle,
    NotStaged,
    NotAuthorizing,
    NotSubmitting,
    NotFailed,
    MissingAmount,
    IllegalAmount,
    AmountExceedsBalance,
    MalformedPin,
    SubmissionInFlight,
}

impl WizardError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WizardError::IncompleteIntent => "Please fill in all required fields",
            WizardError::NotIdle => "A transfer is already in progress",
            WizardError::NotStaged => "There is no transfer to edit",
            WizardError::NotAuthorizing => "The transfer is not waiting for a PIN",
            WizardError::NotSubmitting => "No transfer is being processed",
            WizardError::NotFailed => "Only a failed transfer can be retried",
            WizardError::MissingAmount => "Please enter an amount",
            WizardError::IllegalAmount => "Amount must be greater than zero",
            WizardError::AmountExceedsBalance => "Insufficient balance",
            WizardError::MalformedPin => "PIN must be 4 digits",
            WizardError::SubmissionInFlight => "Transfer is already being processed",
        }
    }
}

impl std::error::Error for WizardError {}
