//! # Estate Escrow Contracts
//!
//! Ledger logic for selling tokenized real estate through escrow. A seller
//! lists a property token, the buyer deposits earnest money, an inspector
//! attests to the inspection, a lender funds the balance, and funds and
//! ownership change hands only when every required approval is in.
//!
//! - **Escrow** — the role-gated sale state machine and the escrow balance.
//! - **Property Registry** — unique property tokens with owner-granted
//!   transfer approvals.
//! - **Value Transfer** — how value enters and leaves escrow custody.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. Wrapping arithmetic and
//!    money do not mix.
//! 2. State transitions are explicit: a sale's status is an enum, not
//!    something inferred from balances and token ownership.
//! 3. Every transition names its caller and the ledger decides whether that
//!    caller holds the required role.
//! 4. A failed call leaves the ledger exactly as it found it.
//! 5. Every public type is serializable (serde) for wire transport.

pub mod address;
pub mod config;
pub mod escrow;
pub mod events;
pub mod property_registry;
pub mod value_transfer;

pub use address::Address;
pub use config::{EscrowConfig, EscrowPolicy, EscrowRoles};
pub use escrow::{
    EscrowError, EscrowLedger, InMemoryLedger, Listing, Precondition, SaleStage, SaleStatus,
};
pub use events::{EscrowEvent, EscrowEventKind};
pub use property_registry::{OwnershipRegistry, PropertyId, PropertyRegistry, RegistryError};
pub use value_transfer::{AccountBook, TransferError, ValueTransfer};
