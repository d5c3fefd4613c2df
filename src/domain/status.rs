use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

/// Lifecycle status of an order.
///
/// ```text
/// PENDING -> CONFIRMED -> PROCESSING -> SHIPPED -> DELIVERED
///    \           \             \           \
///     +-----------+-------------+-----------+---> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Items, addresses and notes may only change while the order is pending.
    pub fn is_editable(&self) -> bool {
        *self == OrderStatus::Pending
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing | Shipped, Cancelled)
        )
    }

    /// Validates `self -> next` and returns the new status.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.can_transition_to(next) {
            return Ok(next);
        }
        Err(match (self, next) {
            (OrderStatus::Cancelled, OrderStatus::Cancelled) => {
                DomainError::InvalidState("Order is already cancelled".to_string())
            }
            (OrderStatus::Delivered, OrderStatus::Cancelled) => {
                DomainError::InvalidState("Delivered orders cannot be cancelled".to_string())
            }
            (from, to) => DomainError::InvalidState(format!(
                "Cannot move order from {} to {}",
                from, to
            )),
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::InvalidInput(format!("Unknown order status '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn forward_path_is_allowed_one_step_at_a_time() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Confirmed.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Pending));
    }

    #[test]
    fn every_non_terminal_status_can_cancel() {
        for status in [Pending, Confirmed, Processing, Shipped] {
            assert_eq!(status.transition(Cancelled).unwrap(), Cancelled);
        }
    }

    #[test]
    fn terminal_statuses_have_no_outbound_transitions() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{} -> {} allowed", from, to);
            }
        }
    }

    #[test]
    fn cancel_rejections_carry_specific_messages() {
        let err = Cancelled.transition(Cancelled).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(ref m) if m.contains("already cancelled")));

        let err = Delivered.transition(Cancelled).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(ref m) if m.contains("Delivered")));
    }

    #[test]
    fn only_pending_is_editable() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_editable(), status == Pending);
        }
    }

    #[test]
    fn parses_status_tokens() {
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), Shipped);
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), Pending);
        assert!(matches!(
            "LOST".parse::<OrderStatus>(),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
