//! Order / sub-order state machines.
//!
//! The sub-order table is exhaustive: any pair not listed fails with
//! `InvalidSubOrderTransition`. The order-level table is derived from the
//! operations that move orders (payment, partner confirm, cancellation,
//! aggregate completion).

use super::errors::OrderError;
use super::status::{OrderStatus, SubOrderStatus};

/// State machine for per-shop sub-orders.
pub struct SubOrderStateMachine;

impl SubOrderStateMachine {
    /// Check if a sub-order transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: SubOrderStatus, to: SubOrderStatus) -> bool {
        use SubOrderStatus::{
            Cancelled, Completed, Confirmed, Delivered, Pending, Processing, ReadyToShip,
            Refunded, ReturnApproved, ReturnRequested, Returned, Shipping,
        };
        matches!(
            (from, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Cancelled)
                | (Processing, ReadyToShip)
                | (Processing, Cancelled)
                | (ReadyToShip, Shipping)
                | (Shipping, Delivered)
                | (Delivered, Completed)
                | (Delivered, ReturnRequested)
                | (ReturnRequested, ReturnApproved)
                | (ReturnRequested, Completed)
                | (ReturnApproved, Returned)
                | (Returned, Refunded)
        )
    }

    /// Validate a sub-order transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSubOrderTransition` if the pair is not in the table.
    pub fn validate_transition(
        from: SubOrderStatus,
        to: SubOrderStatus,
    ) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidSubOrderTransition { from, to })
        }
    }

    /// All valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: SubOrderStatus) -> Vec<SubOrderStatus> {
        use SubOrderStatus::{
            Cancelled, Completed, Confirmed, Delivered, Pending, Processing, ReadyToShip,
            Refunded, ReturnApproved, ReturnRequested, Returned, Shipping,
        };
        match from {
            Pending => vec![Confirmed, Cancelled],
            Confirmed => vec![Processing, Cancelled],
            Processing => vec![ReadyToShip, Cancelled],
            ReadyToShip => vec![Shipping],
            Shipping => vec![Delivered],
            Delivered => vec![Completed, ReturnRequested],
            ReturnRequested => vec![ReturnApproved, Completed],
            ReturnApproved => vec![Returned],
            Returned => vec![Refunded],
            Completed | Cancelled | Refunded => vec![],
        }
    }
}

/// State machine for the order aggregate.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if an order transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::{
            Cancelled, Completed, Confirmed, PaymentFailed, PendingPayment, Processing, Refunded,
        };
        matches!(
            (from, to),
            (PendingPayment, Confirmed)
                | (PendingPayment, Processing)
                | (PendingPayment, PaymentFailed)
                | (PendingPayment, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Cancelled)
                // COD orders complete straight from confirmed: payment
                // never moves them to processing.
                | (Confirmed, Completed)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (PaymentFailed, Cancelled)
                | (Cancelled, Refunded)
        )
    }

    /// Validate an order transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrderTransition` if the pair is not in the table.
    pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidOrderTransition { from, to })
        }
    }

    /// Aggregate completion rule: the order completes if and only if every
    /// sub-order is settled (delivered, completed, or cancelled) and at
    /// least one is not cancelled.
    #[must_use]
    pub fn is_aggregate_complete(sub_statuses: &[SubOrderStatus]) -> bool {
        !sub_statuses.is_empty()
            && sub_statuses.iter().all(SubOrderStatus::is_settled)
            && sub_statuses
                .iter()
                .any(|s| !matches!(s, SubOrderStatus::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_valid() {
        let path = [
            SubOrderStatus::Pending,
            SubOrderStatus::Confirmed,
            SubOrderStatus::Processing,
            SubOrderStatus::ReadyToShip,
            SubOrderStatus::Shipping,
            SubOrderStatus::Delivered,
            SubOrderStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                SubOrderStateMachine::is_valid_transition(pair[0], pair[1]),
                "expected {} -> {} to be valid",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn return_path_transitions_are_valid() {
        let path = [
            SubOrderStatus::Delivered,
            SubOrderStatus::ReturnRequested,
            SubOrderStatus::ReturnApproved,
            SubOrderStatus::Returned,
            SubOrderStatus::Refunded,
        ];
        for pair in path.windows(2) {
            assert!(SubOrderStateMachine::is_valid_transition(pair[0], pair[1]));
        }
    }

    #[test]
    fn return_request_can_still_complete() {
        assert!(SubOrderStateMachine::is_valid_transition(
            SubOrderStatus::ReturnRequested,
            SubOrderStatus::Completed
        ));
    }

    #[test]
    fn shipping_cannot_be_cancelled() {
        assert!(!SubOrderStateMachine::is_valid_transition(
            SubOrderStatus::Shipping,
            SubOrderStatus::Cancelled
        ));
        assert!(!SubOrderStateMachine::is_valid_transition(
            SubOrderStatus::ReadyToShip,
            SubOrderStatus::Cancelled
        ));
    }

    #[test]
    fn no_transitions_from_terminal_states() {
        for terminal in [
            SubOrderStatus::Completed,
            SubOrderStatus::Cancelled,
            SubOrderStatus::Refunded,
        ] {
            assert!(SubOrderStateMachine::valid_next_states(terminal).is_empty());
        }
    }

    #[test]
    fn every_listed_next_state_round_trips() {
        // valid_next_states and is_valid_transition must agree.
        let all = [
            SubOrderStatus::Pending,
            SubOrderStatus::Confirmed,
            SubOrderStatus::Processing,
            SubOrderStatus::ReadyToShip,
            SubOrderStatus::Shipping,
            SubOrderStatus::Delivered,
            SubOrderStatus::Completed,
            SubOrderStatus::Cancelled,
            SubOrderStatus::ReturnRequested,
            SubOrderStatus::ReturnApproved,
            SubOrderStatus::Returned,
            SubOrderStatus::Refunded,
        ];
        for from in all {
            for to in all {
                let listed = SubOrderStateMachine::valid_next_states(from).contains(&to);
                assert_eq!(listed, SubOrderStateMachine::is_valid_transition(from, to));
            }
        }
    }

    #[test]
    fn validate_transition_returns_error_for_invalid() {
        let err = SubOrderStateMachine::validate_transition(
            SubOrderStatus::Delivered,
            SubOrderStatus::Shipping,
        )
        .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidSubOrderTransition {
                from: SubOrderStatus::Delivered,
                to: SubOrderStatus::Shipping,
            }
        );
    }

    #[test]
    fn order_payment_transitions() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::PendingPayment,
            OrderStatus::Processing
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::PendingPayment,
            OrderStatus::PaymentFailed
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Processing
        ));
    }

    #[test]
    fn cancelled_order_can_be_refunded() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Refunded
        ));
    }

    #[test]
    fn aggregate_completes_when_all_settled_and_one_fulfilled() {
        assert!(OrderStateMachine::is_aggregate_complete(&[
            SubOrderStatus::Completed,
            SubOrderStatus::Cancelled,
        ]));
        assert!(OrderStateMachine::is_aggregate_complete(&[
            SubOrderStatus::Delivered,
        ]));
    }

    #[test]
    fn aggregate_does_not_complete_when_all_cancelled() {
        assert!(!OrderStateMachine::is_aggregate_complete(&[
            SubOrderStatus::Cancelled,
            SubOrderStatus::Cancelled,
        ]));
    }

    #[test]
    fn aggregate_does_not_complete_with_open_sub_order() {
        assert!(!OrderStateMachine::is_aggregate_complete(&[
            SubOrderStatus::Completed,
            SubOrderStatus::Shipping,
        ]));
    }

    #[test]
    fn aggregate_empty_is_not_complete() {
        assert!(!OrderStateMachine::is_aggregate_complete(&[]));
    }
}
