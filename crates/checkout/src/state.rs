//! Placement state machine.

use serde::{Deserialize, Serialize};

/// The state of one placement request through its lifecycle.
///
/// State transitions:
/// ```text
/// Started ──► StockReserving ──┬──► StockReserved ──► OrderCreated ──┬──► FulfillmentConfirmed
///                              │                                     │
///                              └──► StockInsufficient                └──► FulfillmentFailed
///                                                                              │
///                                                    CompensatedFailure ◄── Compensating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// The request has been accepted and the cart snapshot loaded.
    #[default]
    Started,

    /// Per-product reservations are being taken under their locks.
    StockReserving,

    /// Every constituent reservation succeeded.
    StockReserved,

    /// The order aggregate has been created and the cart consumed.
    OrderCreated,

    /// The fulfillment gateway accepted the order (terminal success).
    FulfillmentConfirmed,

    /// A reservation was declined; nothing was committed (terminal failure).
    StockInsufficient,

    /// The gateway rejected the order; compensation is owed.
    FulfillmentFailed,

    /// Compensating actions are undoing the committed effects.
    Compensating,

    /// Compensation finished; pre-request state restored (terminal failure).
    CompensatedFailure,
}

impl PlacementState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn may_transition_to(self, next: PlacementState) -> bool {
        use PlacementState::*;
        matches!(
            (self, next),
            (Started, StockReserving)
                | (StockReserving, StockReserved)
                | (StockReserving, StockInsufficient)
                | (StockReserved, OrderCreated)
                | (OrderCreated, FulfillmentConfirmed)
                | (OrderCreated, FulfillmentFailed)
                | (FulfillmentFailed, Compensating)
                | (Compensating, CompensatedFailure)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlacementState::FulfillmentConfirmed
                | PlacementState::StockInsufficient
                | PlacementState::CompensatedFailure
        )
    }

    /// Returns true if this is the terminal success state.
    pub fn is_success(&self) -> bool {
        matches!(self, PlacementState::FulfillmentConfirmed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Started => "Started",
            PlacementState::StockReserving => "StockReserving",
            PlacementState::StockReserved => "StockReserved",
            PlacementState::OrderCreated => "OrderCreated",
            PlacementState::FulfillmentConfirmed => "FulfillmentConfirmed",
            PlacementState::StockInsufficient => "StockInsufficient",
            PlacementState::FulfillmentFailed => "FulfillmentFailed",
            PlacementState::Compensating => "Compensating",
            PlacementState::CompensatedFailure => "CompensatedFailure",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
