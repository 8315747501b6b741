//! Escrow events.
//!
//! Every successful state-changing call on the ledger appends exactly one
//! event. The log is what makes a sale auditable after the fact: who listed,
//! who paid, who approved, and how the funds left.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::property_registry::PropertyId;

/// The change an event records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscrowEventKind {
    /// The seller listed a property and the escrow took custody of its token.
    Listed {
        property: PropertyId,
        purchase_price: u64,
        escrow_amount: u64,
        buyer: Address,
    },
    /// The buyer attached earnest money to a listing.
    EarnestDeposited {
        property: PropertyId,
        buyer: Address,
        amount: u64,
    },
    /// Value sent to the escrow outside any listing (the lender's wire).
    FundsReceived { from: Address, amount: u64 },
    /// The inspector recorded an outcome.
    InspectionUpdated { property: PropertyId, passed: bool },
    /// Some address approved the sale.
    SaleApproved {
        property: PropertyId,
        approver: Address,
    },
    /// Funds went to the seller and the token to the buyer.
    SaleFinalized {
        property: PropertyId,
        seller: Address,
        buyer: Address,
        amount: u64,
    },
    /// The escrow balance was released after a cancellation.
    SaleCancelled {
        property: PropertyId,
        recipient: Address,
        amount: u64,
        inspection_passed: bool,
    },
}

/// A logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEvent {
    /// Position in the ledger's log, starting at 0.
    pub sequence: u64,
    /// Address whose call produced the event.
    pub caller: Address,
    /// What happened.
    #[serde(flatten)]
    pub kind: EscrowEventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

impl EscrowEventKind {
    /// The property the event concerns, if any.
    pub fn property(&self) -> Option<PropertyId> {
        match self {
            EscrowEventKind::Listed { property, .. }
            | EscrowEventKind::EarnestDeposited { property, .. }
            | EscrowEventKind::InspectionUpdated { property, .. }
            | EscrowEventKind::SaleApproved { property, .. }
            | EscrowEventKind::SaleFinalized { property, .. }
            | EscrowEventKind::SaleCancelled { property, .. } => Some(*property),
            EscrowEventKind::FundsReceived { .. } => None,
        }
    }
}
