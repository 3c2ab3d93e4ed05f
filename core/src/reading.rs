use std::time::SystemTime;

use crate::value::Value;

/// Marker stored in place of the last transaction when it could not be read.
pub const LAST_TRANSACTION_ERROR: &str = "error";

/// Information read from the card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CardReading {
    pub current_balance: String,

    /// Amount of the last transaction, or [`LAST_TRANSACTION_ERROR`].
    pub last_transaction: String,

    /// Set when only the balance could be read.
    pub error: bool,

    #[cfg_attr(feature = "serde", serde(serialize_with = "unix_millis::serialize"))]
    pub read_time: SystemTime,
}

impl CardReading {
    /// Creates a complete reading, stamped with the current time.
    pub fn new(current_balance: &Value, last_transaction: &Value) -> Self {
        Self {
            current_balance: current_balance.to_string(),
            last_transaction: last_transaction.to_string(),
            error: false,
            read_time: SystemTime::now(),
        }
    }

    /// Creates a reading that carries the balance only, stamped with the current time.
    pub fn balance_only(current_balance: &Value) -> Self {
        Self {
            current_balance: current_balance.to_string(),
            last_transaction: LAST_TRANSACTION_ERROR.to_owned(),
            error: true,
            read_time: SystemTime::now(),
        }
    }

    /// Returns true if the last transaction was read as well.
    pub fn is_complete(&self) -> bool {
        !self.error
    }
}

#[cfg(feature = "serde")]
mod unix_millis {
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        serializer.serialize_u64(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::decode;

    #[test]
    fn test_balance_only() {
        let reading = CardReading::balance_only(&decode(&[0x13, 0x88]));

        assert_eq!("5", reading.current_balance);
        assert_eq!("error", reading.last_transaction);
        assert!(reading.error);
        assert!(!reading.is_complete());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_shape() {
        use std::time::{Duration, UNIX_EPOCH};

        let mut reading = CardReading::new(&decode(&[0x13, 0x88]), &decode(&[0x00, 0x64]));
        reading.read_time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);

        assert_eq!(
            serde_json::json!({
                "currentBalance": "5",
                "lastTransaction": "0.1",
                "error": false,
                "readTime": 1_700_000_000_123u64,
            }),
            serde_json::to_value(&reading).unwrap(),
        );
    }
}
