//! Order domain: the customer order aggregate, per-shop sub-orders, and
//! their state machines.

pub mod errors;
pub mod events;
pub mod order;
pub mod rewards;
pub mod state_machine;
pub mod status;
pub mod sub_order;

pub use errors::OrderError;
pub use events::{DomainEvent, QueueName};
pub use order::{Order, OrderTotals, ShippingSnapshot};
pub use state_machine::{OrderStateMachine, SubOrderStateMachine};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus, SubOrderStatus};
pub use sub_order::{OrderItem, SubOrder, RETURN_WINDOW_DAYS};
