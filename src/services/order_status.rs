//! Order fulfillment state machine.
//!
//! The transition table is the single authority over the `status` column;
//! services call `validate_transition` before every write. Illegal jumps
//! are rejected with both states named.

use crate::entities::order::{OrderStatus, OrderType};
use crate::errors::ServiceError;

/// Checks whether `from → to` is a legal transition for the given order
/// type. A same-state transition is an allowed no-op.
pub fn validate_transition(
    from: OrderStatus,
    to: OrderStatus,
    order_type: OrderType,
) -> Result<(), ServiceError> {
    if from == to {
        return Ok(());
    }

    if from.is_terminal() {
        return Err(ServiceError::InvalidStatus(format!(
            "cannot transition from terminal status '{}' to '{}'",
            from, to
        )));
    }

    // Pickup orders never pass through the delivery legs and vice versa.
    match to {
        OrderStatus::ReadyPickup if order_type != OrderType::Pickup => {
            return Err(ServiceError::InvalidStatus(format!(
                "'{}' is only valid for pickup orders",
                to
            )));
        }
        OrderStatus::ReadyDelivery | OrderStatus::OutDelivery
            if order_type != OrderType::Delivery =>
        {
            return Err(ServiceError::InvalidStatus(format!(
                "'{}' is only valid for delivery orders",
                to
            )));
        }
        _ => {}
    }

    let allowed = match from {
        OrderStatus::AwaitingPayment | OrderStatus::PendingPayment => {
            matches!(to, OrderStatus::PaymentConfirmed | OrderStatus::Cancelled)
        }
        OrderStatus::PaymentConfirmed => {
            matches!(to, OrderStatus::Preparing | OrderStatus::Cancelled)
        }
        OrderStatus::Preparing => matches!(
            to,
            OrderStatus::ReadyPickup | OrderStatus::ReadyDelivery | OrderStatus::Cancelled
        ),
        OrderStatus::ReadyPickup => {
            matches!(to, OrderStatus::Delivered | OrderStatus::Cancelled)
        }
        OrderStatus::ReadyDelivery => {
            matches!(to, OrderStatus::OutDelivery | OrderStatus::Cancelled)
        }
        OrderStatus::OutDelivery => {
            matches!(to, OrderStatus::Delivered | OrderStatus::Cancelled)
        }
        OrderStatus::Delivered | OrderStatus::Cancelled => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatus(format!(
            "cannot transition from '{}' to '{}'",
            from, to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use OrderStatus::*;
    use OrderType::*;

    #[test_case(AwaitingPayment, PaymentConfirmed, Pickup => true)]
    #[test_case(AwaitingPayment, Cancelled, Pickup => true)]
    #[test_case(AwaitingPayment, Preparing, Pickup => false; "cannot skip payment confirmation")]
    #[test_case(PendingPayment, PaymentConfirmed, Delivery => true)]
    #[test_case(PendingPayment, Delivered, Delivery => false)]
    #[test_case(PaymentConfirmed, Preparing, Pickup => true)]
    #[test_case(PaymentConfirmed, Delivered, Pickup => false)]
    #[test_case(Preparing, ReadyPickup, Pickup => true)]
    #[test_case(Preparing, ReadyDelivery, Delivery => true)]
    #[test_case(Preparing, Cancelled, Delivery => true)]
    #[test_case(ReadyPickup, Delivered, Pickup => true)]
    #[test_case(ReadyDelivery, OutDelivery, Delivery => true)]
    #[test_case(ReadyDelivery, Delivered, Delivery => false; "delivery must go out first")]
    #[test_case(OutDelivery, Delivered, Delivery => true)]
    fn transition_table(from: OrderStatus, to: OrderStatus, order_type: OrderType) -> bool {
        validate_transition(from, to, order_type).is_ok()
    }

    #[test_case(Preparing, ReadyPickup, Delivery; "pickup leg on delivery order")]
    #[test_case(Preparing, ReadyDelivery, Pickup; "delivery leg on pickup order")]
    #[test_case(ReadyDelivery, OutDelivery, Pickup; "out for delivery on pickup order")]
    fn order_type_guard_rejects(from: OrderStatus, to: OrderStatus, order_type: OrderType) {
        let err = validate_transition(from, to, order_type).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));
    }

    #[test_case(Delivered)]
    #[test_case(Cancelled)]
    fn terminal_states_accept_no_transitions(from: OrderStatus) {
        for to in [
            AwaitingPayment,
            PendingPayment,
            PaymentConfirmed,
            Preparing,
            ReadyPickup,
            ReadyDelivery,
            OutDelivery,
            Delivered,
            Cancelled,
        ] {
            if to == from {
                assert!(validate_transition(from, to, Delivery).is_ok());
            } else {
                assert!(validate_transition(from, to, Delivery).is_err());
            }
        }
    }

    #[test]
    fn same_state_is_a_no_op() {
        assert!(validate_transition(Preparing, Preparing, Pickup).is_ok());
    }

    #[test]
    fn error_names_both_states() {
        let err = validate_transition(AwaitingPayment, Delivered, Delivery).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("awaiting_payment"));
        assert!(message.contains("delivered"));
    }
}
