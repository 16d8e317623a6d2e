use std::fmt;

use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

#[derive(Shrinkwrap, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Display, Hash)]
pub struct RecipientId(pub String);

#[derive(Shrinkwrap, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Display, Hash)]
pub struct TransactionId(pub String);

#[derive(Shrinkwrap, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, Hash)]
pub struct Amount(pub Decimal);

impl Amount {
    /// Parses user-typed amount text. Empty or non-numeric input yields `None`.
    pub fn parse_input(input: &str) -> Option<Amount> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<Decimal>().ok().map(Amount)
    }
}

/// A wallet PIN. Never printed, never logged.
#[derive(Shrinkwrap, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pin(pub String);

impl Pin {
    pub const LENGTH: usize = 4;

    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LENGTH && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
pub enum IntentSource {
    Scanned,
    Manual,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use crate::domain::props::{Amount, Pin};

    #[test]
    fn parses_amount_input() {
        assert_eq!(Amount::parse_input(" 500 "), Some(Amount(dec!(500))));
        assert_eq!(Amount::parse_input("12.50"), Some(Amount(dec!(12.50))));
        assert_eq!(Amount::parse_input("-3"), Some(Amount(dec!(-3))));
        assert_eq!(Amount::parse_input(""), None);
        assert_eq!(Amount::parse_input("   "), None);
        assert_eq!(Amount::parse_input("five"), None);
        assert_eq!(Amount::parse_input("5O0"), None);
    }

    #[test]
    fn pin_format() {
        assert!(Pin("1234".to_owned()).is_well_formed());
        assert!(Pin("0000".to_owned()).is_well_formed());
        assert!(!Pin("123".to_owned()).is_well_formed());
        assert!(!Pin("12345".to_owned()).is_well_formed());
        assert!(!Pin("12a4".to_owned()).is_well_formed());
        assert!(!Pin("".to_owned()).is_well_formed());
    }

    #[test]
    fn pin_debug_is_redacted() {
        let pin = Pin("1234".to_owned());
        assert!(!format!("{:?}", pin).contains("1234"));
    }
}
