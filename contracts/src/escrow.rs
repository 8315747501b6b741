//! # Property Escrow Ledger
//!
//! Holds per-property escrow records and enforces the role-gated sale
//! lifecycle:
//!
//! 1. **List**: the seller puts a property up for a named buyer at a
//!    purchase price, with an earnest (escrow) amount. The ledger takes
//!    custody of the property token.
//! 2. **Deposit earnest**: the listed buyer attaches value.
//! 3. **Inspect**: the inspector records pass or fail.
//! 4. **Approve**: buyer, seller and lender each approve the sale. The
//!    lender wires the remaining balance with a plain [`receive`].
//! 5. **Finalize**: once inspection passed, all three approvals are in and
//!    the balance covers the price, anyone may settle. The seller is paid
//!    and the token moves to the buyer.
//!
//! [`cancel_sale`] is reachable from any listed state. Before a passed
//! inspection the whole escrow balance goes back to the buyer; after it the
//! whole balance goes to the seller.
//!
//! ## Atomicity
//!
//! Every transition runs checks, then ledger effects, then the external
//! interaction (registry or value transfer). If the interaction fails the
//! ledger state is restored before the error is returned, so a failed call
//! never leaves a partial update behind. Transitions take `&mut self`, which
//! rules out a payout re-entering the ledger mid-call.
//!
//! [`receive`]: EscrowLedger::receive
//! [`cancel_sale`]: EscrowLedger::cancel_sale

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::config::{EscrowConfig, EscrowPolicy, MAX_EVENT_LOG};
use crate::events::{EscrowEvent, EscrowEventKind};
use crate::property_registry::{OwnershipRegistry, PropertyId, PropertyRegistry, RegistryError};
use crate::value_transfer::{AccountBook, TransferError, ValueTransfer};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A finalization condition that is not yet satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Precondition {
    /// The inspector has not recorded a pass.
    InspectionNotPassed,
    /// The listed buyer has not approved.
    BuyerNotApproved,
    /// The seller has not approved.
    SellerNotApproved,
    /// The lender has not approved.
    LenderNotApproved,
    /// The escrow balance does not cover the purchase price.
    InsufficientFunds {
        /// Current escrow balance.
        balance: u64,
        /// Purchase price of the listing.
        required: u64,
    },
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::InspectionNotPassed => write!(f, "inspection has not passed"),
            Precondition::BuyerNotApproved => write!(f, "buyer has not approved"),
            Precondition::SellerNotApproved => write!(f, "seller has not approved"),
            Precondition::LenderNotApproved => write!(f, "lender has not approved"),
            Precondition::InsufficientFunds { balance, required } => {
                write!(f, "escrow holds {balance}, purchase price is {required}")
            }
        }
    }
}

/// Errors that can occur during escrow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// The caller does not hold the role this transition requires.
    #[error("unauthorized: {caller} may not {action}")]
    Unauthorized {
        /// The attempted operation.
        action: &'static str,
        /// Who attempted it.
        caller: Address,
    },

    /// A finalization condition is unmet.
    #[error("precondition not met: {0}")]
    PreconditionNotMet(Precondition),

    /// The property is not in a state that allows this operation.
    #[error("property {property} is {status}")]
    InvalidPropertyState {
        /// The property in question.
        property: PropertyId,
        /// Its current status.
        status: SaleStatus,
    },

    /// A payout or pull of value did not complete.
    #[error("value transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// The ownership registry refused a token operation.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Listings must name a real buyer.
    #[error("buyer must not be the zero address")]
    ZeroBuyer,

    /// The attached earnest does not match the listing (hardened policy).
    #[error("earnest must equal the escrow amount {expected}, got {attached}")]
    EarnestMismatch {
        /// The listing's escrow amount.
        expected: u64,
        /// The value attached to the call.
        attached: u64,
    },

    /// The escrow amount exceeds the purchase price (hardened policy).
    #[error("escrow amount {escrow_amount} exceeds purchase price {purchase_price}")]
    EscrowExceedsPrice {
        /// Requested escrow amount.
        escrow_amount: u64,
        /// Requested purchase price.
        purchase_price: u64,
    },

    /// The escrow balance would overflow.
    #[error("amount overflow: escrow balance would exceed u64::MAX")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a property in escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Never listed with this ledger.
    Unlisted,
    /// Listed and awaiting settlement.
    Listed,
    /// Settled: seller paid, token with the buyer.
    Finalized,
    /// Cancelled: escrow balance released to buyer or seller.
    Cancelled,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Unlisted => write!(f, "Unlisted"),
            SaleStatus::Listed => write!(f, "Listed"),
            SaleStatus::Finalized => write!(f, "Finalized"),
            SaleStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// How far a listed sale has progressed.
///
/// Steps are counted in order and stop at the first unmet one, so a listing
/// that was inspected before any earnest arrived still reports `Listed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStage {
    /// Never listed with this ledger.
    Unlisted,
    /// Listed, no earnest yet.
    Listed,
    /// Earnest deposited, inspection not passed.
    EarnestDeposited,
    /// Inspection passed, approvals outstanding.
    Inspected,
    /// Buyer, seller and lender approved; waiting on funds or settlement.
    Approved,
    /// Settled.
    Finalized,
    /// Cancelled.
    Cancelled,
}

/// A property listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The listed property.
    pub property: PropertyId,
    /// `false` once the sale is finalized.
    pub is_listed: bool,
    /// Full price the seller receives at finalization.
    pub purchase_price: u64,
    /// Earnest the buyer is expected to deposit.
    pub escrow_amount: u64,
    /// The only address allowed to deposit earnest for this property.
    pub buyer: Address,
    /// Earnest attached by the buyer so far.
    pub earnest_deposited: u64,
    /// Lifecycle status.
    pub status: SaleStatus,
    /// When the property was (last) listed.
    pub listed_at: DateTime<Utc>,
    /// Most recent change to this record.
    pub updated_at: DateTime<Utc>,
}

/// The ledger the node runs: in-memory registry and wallets.
pub type InMemoryLedger = EscrowLedger<PropertyRegistry, AccountBook>;

/// The escrow ledger.
///
/// Generic over its two collaborators so that the state machine can run
/// against any registry and any value-transfer mechanism.
#[derive(Debug, Clone)]
pub struct EscrowLedger<R, V> {
    config: EscrowConfig,
    /// The ledger's custody address.
    escrow_address: Address,
    registry: R,
    transfers: V,
    listings: BTreeMap<PropertyId, Listing>,
    /// Per-property set of addresses that approved the sale.
    approvals: BTreeMap<PropertyId, BTreeSet<Address>>,
    inspections: BTreeMap<PropertyId, bool>,
    /// Aggregate value held in escrow across all listings.
    balance: u64,
    events: Vec<EscrowEvent>,
    next_sequence: u64,
}

/// Ledger state touched by a single transition, captured so it can be put
/// back if the external interaction fails.
struct Checkpoint {
    property: PropertyId,
    listing: Option<Listing>,
    balance: u64,
}

impl<R: OwnershipRegistry, V: ValueTransfer> EscrowLedger<R, V> {
    /// Creates a ledger for a deployment.
    ///
    /// The escrow holder address is derived from the registry address and the
    /// three roles (see [`Address::escrow_holder`]).
    pub fn new(config: EscrowConfig, registry: R, transfers: V) -> Self {
        let roles = config.roles;
        let escrow_address = Address::escrow_holder(
            &registry.address(),
            &roles.seller,
            &roles.inspector,
            &roles.lender,
        );

        tracing::info!(
            escrow = %escrow_address,
            registry = %registry.address(),
            seller = %roles.seller,
            inspector = %roles.inspector,
            lender = %roles.lender,
            "escrow ledger deployed"
        );

        Self {
            config,
            escrow_address,
            registry,
            transfers,
            listings: BTreeMap::new(),
            approvals: BTreeMap::new(),
            inspections: BTreeMap::new(),
            balance: 0,
            events: Vec::new(),
            next_sequence: 0,
        }
    }

    // -- Transitions ---------------------------------------------------------

    /// Lists `property` for `buyer`. Seller only.
    ///
    /// Takes custody of the property token using the approval the seller
    /// granted the escrow address on the registry. Listing a property the
    /// ledger already holds overwrites the previous listing terms.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] unless `caller` is the seller.
    /// [`EscrowError::ZeroBuyer`] if `buyer` is the zero address.
    /// [`EscrowError::InvalidPropertyState`] if the sale was finalized, or
    /// (hardened) the property is still listed.
    /// [`EscrowError::Registry`] if the token cannot be moved into custody.
    pub fn list(
        &mut self,
        caller: Address,
        property: PropertyId,
        purchase_price: u64,
        escrow_amount: u64,
        buyer: Address,
    ) -> Result<(), EscrowError> {
        let result = self.try_list(caller, property, purchase_price, escrow_amount, buyer);
        log_rejection("list", Some(property), caller, result)
    }

    fn try_list(
        &mut self,
        caller: Address,
        property: PropertyId,
        purchase_price: u64,
        escrow_amount: u64,
        buyer: Address,
    ) -> Result<(), EscrowError> {
        if caller != self.config.roles.seller {
            return Err(EscrowError::Unauthorized {
                action: "list",
                caller,
            });
        }
        if buyer.is_zero() {
            return Err(EscrowError::ZeroBuyer);
        }
        if self.config.policy.escrow_within_price && escrow_amount > purchase_price {
            return Err(EscrowError::EscrowExceedsPrice {
                escrow_amount,
                purchase_price,
            });
        }
        match self.status(property) {
            SaleStatus::Finalized => {
                return Err(EscrowError::InvalidPropertyState {
                    property,
                    status: SaleStatus::Finalized,
                });
            }
            SaleStatus::Listed if self.config.policy.reject_relist => {
                return Err(EscrowError::InvalidPropertyState {
                    property,
                    status: SaleStatus::Listed,
                });
            }
            _ => {}
        }

        let in_custody = self.registry.owner_of(property)? == self.escrow_address;
        let checkpoint = self.checkpoint(property);

        let now = Utc::now();
        self.listings.insert(
            property,
            Listing {
                property,
                is_listed: true,
                purchase_price,
                escrow_amount,
                buyer,
                earnest_deposited: 0,
                status: SaleStatus::Listed,
                listed_at: now,
                updated_at: now,
            },
        );

        if !in_custody {
            let escrow = self.escrow_address;
            if let Err(e) = self.registry.transfer_from(escrow, caller, escrow, property) {
                self.restore(checkpoint);
                return Err(e.into());
            }
        }

        self.record(
            caller,
            EscrowEventKind::Listed {
                property,
                purchase_price,
                escrow_amount,
                buyer,
            },
        );
        Ok(())
    }

    /// The listed buyer attaches `value` as earnest money.
    ///
    /// Any amount, zero included, is accepted under the permissive policy and
    /// added to the escrow balance.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] unless `caller` is the listing's buyer
    /// (an unlisted property has no buyer, so every caller is rejected).
    /// [`EscrowError::InvalidPropertyState`] once the sale is finalized or
    /// cancelled.
    /// [`EscrowError::EarnestMismatch`] (hardened) if `value` differs from the
    /// escrow amount.
    /// [`EscrowError::TransferFailed`] if the value cannot be pulled.
    pub fn deposit_earnest(
        &mut self,
        caller: Address,
        property: PropertyId,
        value: u64,
    ) -> Result<(), EscrowError> {
        let result = self.try_deposit_earnest(caller, property, value);
        log_rejection("deposit_earnest", Some(property), caller, result)
    }

    fn try_deposit_earnest(
        &mut self,
        caller: Address,
        property: PropertyId,
        value: u64,
    ) -> Result<(), EscrowError> {
        let listing = match self.listings.get(&property) {
            Some(listing) if listing.buyer == caller => listing,
            _ => {
                return Err(EscrowError::Unauthorized {
                    action: "deposit earnest",
                    caller,
                })
            }
        };
        if listing.status != SaleStatus::Listed {
            return Err(EscrowError::InvalidPropertyState {
                property,
                status: listing.status,
            });
        }
        if self.config.policy.exact_earnest && value != listing.escrow_amount {
            return Err(EscrowError::EarnestMismatch {
                expected: listing.escrow_amount,
                attached: value,
            });
        }

        let balance = self
            .balance
            .checked_add(value)
            .ok_or(EscrowError::AmountOverflow)?;
        let earnest = listing
            .earnest_deposited
            .checked_add(value)
            .ok_or(EscrowError::AmountOverflow)?;

        let checkpoint = self.checkpoint(property);
        self.balance = balance;
        if let Some(listing) = self.listings.get_mut(&property) {
            listing.earnest_deposited = earnest;
            listing.updated_at = Utc::now();
        }

        if let Err(e) = self.transfers.pull(caller, value) {
            self.restore(checkpoint);
            return Err(e.into());
        }

        self.record(
            caller,
            EscrowEventKind::EarnestDeposited {
                property,
                buyer: caller,
                amount: value,
            },
        );
        Ok(())
    }

    /// Plain value transfer into the escrow. Anyone, any amount.
    ///
    /// This is how the lender wires the difference between the purchase price
    /// and the earnest.
    ///
    /// # Errors
    ///
    /// [`EscrowError::AmountOverflow`] if the balance would overflow.
    /// [`EscrowError::TransferFailed`] if the value cannot be pulled.
    pub fn receive(&mut self, caller: Address, value: u64) -> Result<(), EscrowError> {
        let result = self.try_receive(caller, value);
        log_rejection("receive", None, caller, result)
    }

    fn try_receive(&mut self, caller: Address, value: u64) -> Result<(), EscrowError> {
        let balance = self
            .balance
            .checked_add(value)
            .ok_or(EscrowError::AmountOverflow)?;

        let previous = self.balance;
        self.balance = balance;
        if let Err(e) = self.transfers.pull(caller, value) {
            self.balance = previous;
            return Err(e.into());
        }

        self.record(
            caller,
            EscrowEventKind::FundsReceived {
                from: caller,
                amount: value,
            },
        );
        Ok(())
    }

    /// Records `caller`'s approval of the sale of `property`.
    ///
    /// Under the permissive policy any address may approve, including for a
    /// property that is not listed. Only the buyer, seller and lender entries
    /// are ever consulted by [`finalize_sale`](Self::finalize_sale).
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] (hardened) if `caller` is not the
    /// buyer, seller or lender.
    pub fn approve_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        let result = self.try_approve_sale(caller, property);
        log_rejection("approve_sale", Some(property), caller, result)
    }

    fn try_approve_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        if self.config.policy.parties_only_approve && !self.is_party(property, &caller) {
            return Err(EscrowError::Unauthorized {
                action: "approve the sale",
                caller,
            });
        }

        self.approvals.entry(property).or_default().insert(caller);
        self.record(
            caller,
            EscrowEventKind::SaleApproved {
                property,
                approver: caller,
            },
        );
        Ok(())
    }

    /// Sets the inspection outcome. Inspector only.
    ///
    /// A pass can be revoked by setting `false` again.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] unless `caller` is the inspector.
    pub fn update_inspection_status(
        &mut self,
        caller: Address,
        property: PropertyId,
        passed: bool,
    ) -> Result<(), EscrowError> {
        if caller != self.config.roles.inspector {
            return log_rejection(
                "update_inspection_status",
                Some(property),
                caller,
                Err(EscrowError::Unauthorized {
                    action: "update the inspection status",
                    caller,
                }),
            );
        }

        self.inspections.insert(property, passed);
        if let Some(listing) = self.listings.get_mut(&property) {
            listing.updated_at = Utc::now();
        }
        self.record(
            caller,
            EscrowEventKind::InspectionUpdated { property, passed },
        );
        Ok(())
    }

    /// Settles the sale: pays the purchase price to the seller and moves the
    /// token to the buyer.
    ///
    /// Settlement is permissionless under the default policy: once the
    /// conditions hold, any address may trigger it. Conditions are checked
    /// in a fixed order and the first unmet one is reported: inspection,
    /// buyer approval, seller approval, lender approval, funds.
    ///
    /// Exactly `purchase_price` leaves the escrow; anything above it stays in
    /// the balance.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] (hardened) if `caller` is not a party.
    /// [`EscrowError::InvalidPropertyState`] unless the property is listed.
    /// [`EscrowError::PreconditionNotMet`] naming the first unmet condition.
    /// [`EscrowError::Registry`] if the escrow no longer holds the token, or
    /// the registry refuses the handover to the buyer; the payout is pulled
    /// back from the seller and the ledger is left as it was.
    /// [`EscrowError::TransferFailed`] if the seller payout fails; the ledger
    /// is left as it was.
    pub fn finalize_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        let result = self.try_finalize_sale(caller, property);
        log_rejection("finalize_sale", Some(property), caller, result)
    }

    fn try_finalize_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        if self.config.policy.parties_only_settle && !self.is_party(property, &caller) {
            return Err(EscrowError::Unauthorized {
                action: "finalize the sale",
                caller,
            });
        }

        let status = self.status(property);
        if status != SaleStatus::Listed {
            return Err(EscrowError::InvalidPropertyState { property, status });
        }
        if let Some(unmet) = self.unmet_precondition(property) {
            return Err(EscrowError::PreconditionNotMet(unmet));
        }

        let owner = self.registry.owner_of(property)?;
        if owner != self.escrow_address {
            return Err(RegistryError::NotOwner {
                id: property,
                from: self.escrow_address,
                owner,
            }
            .into());
        }

        let (price, buyer) = match self.listings.get(&property) {
            Some(listing) => (listing.purchase_price, listing.buyer),
            None => {
                return Err(EscrowError::InvalidPropertyState {
                    property,
                    status: SaleStatus::Unlisted,
                })
            }
        };
        let seller = self.config.roles.seller;

        // Effects.
        let checkpoint = self.checkpoint(property);
        self.balance -= price;
        if let Some(listing) = self.listings.get_mut(&property) {
            listing.is_listed = false;
            listing.status = SaleStatus::Finalized;
            listing.updated_at = Utc::now();
        }

        // Interactions.
        if let Err(e) = self.transfers.push(seller, price) {
            self.restore(checkpoint);
            return Err(e.into());
        }
        let escrow = self.escrow_address;
        if let Err(e) = self.registry.transfer_from(escrow, escrow, buyer, property) {
            // Reverse the seller payout.
            if let Err(reclaim) = self.transfers.pull(seller, price) {
                tracing::error!(
                    property,
                    seller = %seller,
                    error = %reclaim,
                    "token handover failed and seller payout could not be reclaimed"
                );
            }
            self.restore(checkpoint);
            return Err(e.into());
        }

        self.record(
            caller,
            EscrowEventKind::SaleFinalized {
                property,
                seller,
                buyer,
                amount: price,
            },
        );
        Ok(())
    }

    /// Cancels the sale and releases the whole escrow balance.
    ///
    /// Before a passed inspection the balance is refunded to the listing's
    /// buyer; after it the balance goes to the seller. Listing, approvals and
    /// inspection are left as they are and the token stays in escrow custody
    /// (the seller may list it again). Cancelling an already cancelled sale
    /// is allowed and moves whatever the balance holds at that point.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] (hardened) if `caller` is not a party.
    /// [`EscrowError::InvalidPropertyState`] if the property was never
    /// listed or the sale was finalized.
    /// [`EscrowError::TransferFailed`] if the payout fails; the ledger is
    /// left as it was.
    pub fn cancel_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        let result = self.try_cancel_sale(caller, property);
        log_rejection("cancel_sale", Some(property), caller, result)
    }

    fn try_cancel_sale(&mut self, caller: Address, property: PropertyId) -> Result<(), EscrowError> {
        if self.config.policy.parties_only_settle && !self.is_party(property, &caller) {
            return Err(EscrowError::Unauthorized {
                action: "cancel the sale",
                caller,
            });
        }

        let buyer = match self.listings.get(&property) {
            Some(listing) if listing.status != SaleStatus::Finalized => listing.buyer,
            Some(listing) => {
                return Err(EscrowError::InvalidPropertyState {
                    property,
                    status: listing.status,
                })
            }
            None => {
                return Err(EscrowError::InvalidPropertyState {
                    property,
                    status: SaleStatus::Unlisted,
                })
            }
        };

        let inspection_passed = self.inspection_passed(property);
        let recipient = if inspection_passed {
            self.config.roles.seller
        } else {
            buyer
        };
        let amount = self.balance;

        // Effects.
        let checkpoint = self.checkpoint(property);
        self.balance = 0;
        if let Some(listing) = self.listings.get_mut(&property) {
            listing.status = SaleStatus::Cancelled;
            listing.updated_at = Utc::now();
        }

        // Interaction.
        if let Err(e) = self.transfers.push(recipient, amount) {
            self.restore(checkpoint);
            return Err(e.into());
        }

        self.record(
            caller,
            EscrowEventKind::SaleCancelled {
                property,
                recipient,
                amount,
                inspection_passed,
            },
        );
        Ok(())
    }

    // -- Queries -------------------------------------------------------------

    /// Whether `property` is currently listed.
    pub fn is_listed(&self, property: PropertyId) -> bool {
        self.listings
            .get(&property)
            .map(|l| l.is_listed)
            .unwrap_or(false)
    }

    /// Purchase price of `property`, 0 if never listed.
    pub fn purchase_price(&self, property: PropertyId) -> u64 {
        self.listings
            .get(&property)
            .map(|l| l.purchase_price)
            .unwrap_or(0)
    }

    /// Escrow (earnest) amount of `property`, 0 if never listed.
    pub fn escrow_amount(&self, property: PropertyId) -> u64 {
        self.listings
            .get(&property)
            .map(|l| l.escrow_amount)
            .unwrap_or(0)
    }

    /// Buyer of `property`, the zero address if never listed.
    pub fn buyer_of(&self, property: PropertyId) -> Address {
        self.listings
            .get(&property)
            .map(|l| l.buyer)
            .unwrap_or(Address::ZERO)
    }

    /// Whether `approver` has approved the sale of `property`.
    pub fn approval_of(&self, property: PropertyId, approver: &Address) -> bool {
        self.approvals
            .get(&property)
            .map(|set| set.contains(approver))
            .unwrap_or(false)
    }

    /// Last inspection outcome recorded for `property`, `false` if none.
    pub fn inspection_passed(&self, property: PropertyId) -> bool {
        self.inspections.get(&property).copied().unwrap_or(false)
    }

    /// Aggregate value held in escrow.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// The fixed seller.
    pub fn seller(&self) -> Address {
        self.config.roles.seller
    }

    /// The fixed inspector.
    pub fn inspector(&self) -> Address {
        self.config.roles.inspector
    }

    /// The fixed lender.
    pub fn lender(&self) -> Address {
        self.config.roles.lender
    }

    /// Address of the ownership registry.
    pub fn registry_address(&self) -> Address {
        self.registry.address()
    }

    /// The escrow holder (custody) address.
    pub fn escrow_address(&self) -> Address {
        self.escrow_address
    }

    /// Active policy.
    pub fn policy(&self) -> EscrowPolicy {
        self.config.policy
    }

    /// Full listing record.
    pub fn listing(&self, property: PropertyId) -> Option<&Listing> {
        self.listings.get(&property)
    }

    /// Every listing ever recorded, by property id.
    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    /// Lifecycle status of `property`.
    pub fn status(&self, property: PropertyId) -> SaleStatus {
        self.listings
            .get(&property)
            .map(|l| l.status)
            .unwrap_or(SaleStatus::Unlisted)
    }

    /// Progress of the sale of `property`.
    pub fn stage(&self, property: PropertyId) -> SaleStage {
        let listing = match self.listings.get(&property) {
            Some(listing) => listing,
            None => return SaleStage::Unlisted,
        };
        match listing.status {
            SaleStatus::Unlisted => return SaleStage::Unlisted,
            SaleStatus::Finalized => return SaleStage::Finalized,
            SaleStatus::Cancelled => return SaleStage::Cancelled,
            SaleStatus::Listed => {}
        }

        if listing.earnest_deposited == 0 {
            return SaleStage::Listed;
        }
        if !self.inspection_passed(property) {
            return SaleStage::EarnestDeposited;
        }
        let all_approved = [listing.buyer, self.seller(), self.lender()]
            .iter()
            .all(|a| self.approval_of(property, a));
        if !all_approved {
            return SaleStage::Inspected;
        }
        SaleStage::Approved
    }

    /// The first unmet finalization condition, or `None` if the sale of
    /// `property` can settle.
    pub fn unmet_precondition(&self, property: PropertyId) -> Option<Precondition> {
        let buyer = self.buyer_of(property);
        let required = self.purchase_price(property);

        if !self.inspection_passed(property) {
            Some(Precondition::InspectionNotPassed)
        } else if !self.approval_of(property, &buyer) {
            Some(Precondition::BuyerNotApproved)
        } else if !self.approval_of(property, &self.config.roles.seller) {
            Some(Precondition::SellerNotApproved)
        } else if !self.approval_of(property, &self.config.roles.lender) {
            Some(Precondition::LenderNotApproved)
        } else if self.balance < required {
            Some(Precondition::InsufficientFunds {
                balance: self.balance,
                required,
            })
        } else {
            None
        }
    }

    /// The retained event log, oldest first.
    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    /// Events with a sequence number of at least `sequence`.
    pub fn events_since(&self, sequence: u64) -> &[EscrowEvent] {
        let start = self.events.partition_point(|e| e.sequence < sequence);
        &self.events[start..]
    }

    /// Sequence number the next recorded event will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// The ownership registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Mutable access to the registry, for minting and approvals by callers.
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// The value-transfer mechanism.
    pub fn transfers(&self) -> &V {
        &self.transfers
    }

    /// Mutable access to the value-transfer mechanism.
    pub fn transfers_mut(&mut self) -> &mut V {
        &mut self.transfers
    }

    // -- Internals -----------------------------------------------------------

    /// Buyer of the listing, seller or lender.
    fn is_party(&self, property: PropertyId, caller: &Address) -> bool {
        let roles = &self.config.roles;
        *caller == roles.seller
            || *caller == roles.lender
            || self
                .listings
                .get(&property)
                .map(|l| l.buyer == *caller)
                .unwrap_or(false)
    }

    fn checkpoint(&self, property: PropertyId) -> Checkpoint {
        Checkpoint {
            property,
            listing: self.listings.get(&property).cloned(),
            balance: self.balance,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        match checkpoint.listing {
            Some(listing) => {
                self.listings.insert(checkpoint.property, listing);
            }
            None => {
                self.listings.remove(&checkpoint.property);
            }
        }
        self.balance = checkpoint.balance;
    }

    fn record(&mut self, caller: Address, kind: EscrowEventKind) {
        tracing::info!(
            sequence = self.next_sequence,
            caller = %caller,
            property = ?kind.property(),
            balance = self.balance,
            event = ?kind,
            "escrow transition"
        );

        self.events.push(EscrowEvent {
            sequence: self.next_sequence,
            caller,
            kind,
            timestamp: Utc::now(),
        });
        self.next_sequence += 1;

        if self.events.len() > MAX_EVENT_LOG {
            let excess = self.events.len() - MAX_EVENT_LOG;
            self.events.drain(..excess);
        }
    }
}

fn log_rejection<T>(
    action: &'static str,
    property: Option<PropertyId>,
    caller: Address,
    result: Result<T, EscrowError>,
) -> Result<T, EscrowError> {
    if let Err(e) = &result {
        tracing::warn!(action, property = ?property, caller = %caller, error = %e, "escrow call rejected");
    }
    result
}
