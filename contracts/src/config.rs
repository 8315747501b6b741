//! # Escrow Configuration
//!
//! The three fixed roles of a deployment (seller, inspector, lender) and the
//! policy switches that decide how strictly the ledger polices its callers.
//!
//! Roles are immutable once a ledger is constructed. There is no operation
//! that reassigns them; a new role set means a new deployment (and a new
//! escrow holder address).

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// First identifier handed out by the property registry. Token ids are
/// positive and sequential.
pub const FIRST_PROPERTY_ID: u64 = 1;

/// Events kept in the in-memory log before the oldest are discarded.
pub const MAX_EVENT_LOG: usize = 10_000;

/// The fixed participants of an escrow deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRoles {
    /// Lists properties and receives the purchase price.
    pub seller: Address,
    /// Attests to the inspection outcome.
    pub inspector: Address,
    /// Funds the balance between earnest and purchase price.
    pub lender: Address,
}

/// Switches for the permissive spots in the escrow rules.
///
/// [`EscrowPolicy::permissive`] (the default) reproduces the historical
/// behaviour: any earnest amount is accepted, anyone may approve, finalize or
/// cancel, and a property may be listed again while listed.
/// [`EscrowPolicy::hardened`] turns every check on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowPolicy {
    /// Earnest deposits must equal the listing's escrow amount.
    pub exact_earnest: bool,
    /// `escrow_amount <= purchase_price` is enforced at listing time.
    pub escrow_within_price: bool,
    /// A property that is currently listed cannot be listed again.
    pub reject_relist: bool,
    /// Only buyer, seller and lender may record an approval.
    pub parties_only_approve: bool,
    /// Only buyer, seller and lender may finalize or cancel.
    pub parties_only_settle: bool,
}

impl EscrowPolicy {
    /// Every check off.
    pub const fn permissive() -> Self {
        Self {
            exact_earnest: false,
            escrow_within_price: false,
            reject_relist: false,
            parties_only_approve: false,
            parties_only_settle: false,
        }
    }

    /// Every check on.
    pub const fn hardened() -> Self {
        Self {
            exact_earnest: true,
            escrow_within_price: true,
            reject_relist: true,
            parties_only_approve: true,
            parties_only_settle: true,
        }
    }
}

impl Default for EscrowPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

/// Everything a ledger needs at construction time apart from its
/// collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// The fixed roles.
    pub roles: EscrowRoles,
    /// How strictly callers are policed.
    #[serde(default)]
    pub policy: EscrowPolicy,
}

impl EscrowConfig {
    /// Config with the permissive policy.
    pub fn new(seller: Address, inspector: Address, lender: Address) -> Self {
        Self {
            roles: EscrowRoles {
                seller,
                inspector,
                lender,
            },
            policy: EscrowPolicy::permissive(),
        }
    }

    /// Replaces the policy.
    pub fn with_policy(mut self, policy: EscrowPolicy) -> Self {
        self.policy = policy;
        self
    }
}
