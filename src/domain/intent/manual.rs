use serde::Deserialize;

use crate::domain::{
    intent::{PaymentIntent, error::IntentError},
    props::{IntentSource, Pin, RecipientId},
};

/// The manual-entry alternative to scanning. Fields are raw form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualEntryForm {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub pin: String,
}

impl ManualEntryForm {
    /// Builds an intent with an unknown wallet balance. The recipient is not
    /// looked up; the backend validates it on submission.
    pub fn into_intent(self) -> Result<PaymentIntent, IntentError> {
        let intent = PaymentIntent {
            recipient_id: RecipientId(self.user_id.trim().to_owned()),
            recipient_name: self.name.trim().to_owned(),
            recipient_email: self.email.trim().to_owned(),
            pin: Pin(self.pin.trim().to_owned()),
            wallet_balance: None,
            source: IntentSource::Manual,
        };

        intent.require_complete()?;

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        intent::{error::IntentError, manual::ManualEntryForm},
        props::IntentSource,
    };

    fn form() -> ManualEntryForm {
        ManualEntryForm {
            user_id: "u1".to_owned(),
            name: "Jane".to_owned(),
            email: "j@x.com".to_owned(),
            pin: "1234".to_owned(),
        }
    }

    #[test]
    fn complete_form_becomes_manual_intent() {
        let intent = form().into_intent().unwrap();

        assert_eq!(intent.source, IntentSource::Manual);
        assert!(intent.is_manual_entry());
        assert_eq!(intent.wallet_balance, None);
        assert_eq!(intent.recipient_name, "Jane");
    }

    #[test]
    fn empty_email_is_rejected() {
        let f = ManualEntryForm {
            email: "".to_owned(),
            ..form()
        };

        let err = f.into_intent().unwrap_err();
        assert_eq!(err, IntentError::MissingFields);
        assert_eq!(err.user_message(), "Please fill in all required fields");
    }

    #[test]
    fn whitespace_only_fields_count_as_empty() {
        for f in [
            ManualEntryForm {
                user_id: "  ".to_owned(),
                ..form()
            },
            ManualEntryForm {
                name: "\t".to_owned(),
                ..form()
            },
            ManualEntryForm {
                pin: " ".to_owned(),
                ..form()
            },
        ] {
            assert_eq!(f.into_intent(), Err(IntentError::MissingFields));
        }
    }
}
