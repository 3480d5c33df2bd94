//! Order status state machine.
//!
//! ```text
//!            place
//!              │
//!              ▼
//!          ┌────────┐  cancel (owner/admin)   ┌───────────┐
//!          │Pending │────────────────────────▶│ Cancelled │
//!          └────────┘                         └───────────┘
//!           │    ▲ set-status (admin)
//!           ▼    │
//!      Completed / Cancelled / Pending
//! ```
//!
//! `Completed` and `Cancelled` are terminal: every event on them fails.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const INITIAL: OrderStatus = OrderStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn cancel(self) -> Result<OrderStatus, OrderError> {
        match self {
            OrderStatus::Pending => Ok(OrderStatus::Cancelled),
            from => Err(OrderError::InvalidTransition {
                from,
                event: "cancel",
            }),
        }
    }

    /// Admin override. Any recognised target is allowed, but only while the
    /// order is still pending.
    pub fn set_status(self, target: OrderStatus) -> Result<OrderStatus, OrderError> {
        if self.is_terminal() {
            return Err(OrderError::InvalidTransition {
                from: self,
                event: "set-status",
            });
        }
        Ok(target)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: only the three exact literals parse.
impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    InvalidOrder(&'static str),
    #[error("invalid status {0:?}, expected one of Pending, Completed, Cancelled")]
    InvalidStatus(String),
    #[error("cannot {event} an order that is {from}")]
    InvalidTransition {
        from: OrderStatus,
        event: &'static str,
    },
}

/// A validated order about to enter `Pending`. The only way to get one is
/// [`NewOrder::validate`], and it carries no status of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    user_id: i64,
    product_id: i64,
    quantity: i32,
}

impl NewOrder {
    /// `owner` must come from the authenticated caller, never the payload.
    pub fn validate(owner: i64, product_id: i64, quantity: i32) -> Result<Self, OrderError> {
        if owner <= 0 {
            return Err(OrderError::InvalidOrder("user ID is required"));
        }
        if product_id <= 0 {
            return Err(OrderError::InvalidOrder("product ID is required"));
        }
        if quantity <= 0 {
            return Err(OrderError::InvalidOrder("quantity must be greater than zero"));
        }
        Ok(Self {
            user_id: owner,
            product_id,
            quantity,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::INITIAL
    }
}
