use chrono::Utc;
use uuid::Uuid;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Source of human-readable order numbers.
///
/// Uniqueness is probabilistic; the store's unique constraint on
/// `order_number` is what rejects a collision.
pub trait OrderNumberGenerator: Send + Sync + 'static {
    fn next_order_number(&self) -> String;
}

/// `ORD-<unix millis>-<8 uppercase hex chars>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampOrderNumbers;

impl OrderNumberGenerator for TimestampOrderNumbers {
    fn next_order_number(&self) -> String {
        let token = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!(
            "{}-{}-{}",
            ORDER_NUMBER_PREFIX,
            Utc::now().timestamp_millis(),
            token
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn has_prefix_millis_and_uppercase_token() {
        let before = Utc::now().timestamp_millis();
        let number = TimestampOrderNumbers.next_order_number();
        let after = Utc::now().timestamp_millis();

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3, "unexpected shape: {}", number);
        assert_eq!(parts[0], "ORD");

        let millis: i64 = parts[1].parse().expect("millis segment");
        assert!(before <= millis && millis <= after);

        assert_eq!(parts[2].len(), 8);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn consecutive_numbers_differ() {
        let numbers: HashSet<String> = (0..1_000)
            .map(|_| TimestampOrderNumbers.next_order_number())
            .collect();
        assert_eq!(numbers.len(), 1_000);
    }
}
