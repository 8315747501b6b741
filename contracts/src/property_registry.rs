//! # Property Registry
//!
//! Unique, non-fungible property tokens. Each minted token stands for one
//! parcel of real estate and carries a metadata URI; the registry tracks who
//! owns it and who (if anyone) is approved to move it on the owner's behalf.
//!
//! The escrow ledger only depends on the [`OwnershipRegistry`] trait. The
//! in-memory [`PropertyRegistry`] is the implementation used by the node and
//! the tests.
//!
//! ## Transfer Rules
//!
//! - Only the owner can grant an approval, and a token holds at most one
//!   approved operator at a time.
//! - `transfer_from` succeeds when the caller is the owner or the approved
//!   operator, `from` is the current owner and `to` is not the zero address.
//! - A transfer clears the approval.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::config::FIRST_PROPERTY_ID;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No token has been minted under this id.
    #[error("property token not found: {0}")]
    TokenNotFound(PropertyId),

    /// `from` does not own the token.
    #[error("{from} does not own property {id} (owner is {owner})")]
    NotOwner {
        /// The token in question.
        id: PropertyId,
        /// The address the caller claimed as owner.
        from: Address,
        /// The actual owner.
        owner: Address,
    },

    /// The caller is neither the owner nor the approved operator.
    #[error("{caller} is not authorized to move property {id}")]
    NotAuthorized {
        /// The token in question.
        id: PropertyId,
        /// The address that attempted the operation.
        caller: Address,
    },

    /// Tokens cannot be sent to, or minted for, the zero address.
    #[error("transfer to the zero address")]
    ZeroAddress,

    /// Minting requires a metadata URI.
    #[error("token URI must not be empty")]
    EmptyTokenUri,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifier of a property token. Positive, sequential, never reused.
pub type PropertyId = u64;

/// A minted property token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyToken {
    /// Token id.
    pub id: PropertyId,
    /// Current owner.
    pub owner: Address,
    /// Operator allowed to transfer the token once on the owner's behalf.
    pub approved: Option<Address>,
    /// Metadata location (typically an IPFS URL to a JSON document).
    pub token_uri: String,
    /// When the token was minted.
    pub minted_at: DateTime<Utc>,
}

/// The ownership capability the escrow ledger depends on.
///
/// Every mutating call names its caller explicitly; the registry decides
/// whether that caller is allowed to do what it asks.
pub trait OwnershipRegistry {
    /// The registry's own address.
    fn address(&self) -> Address;

    /// Mints a new token owned by `caller` and returns its id.
    fn mint(&mut self, caller: Address, token_uri: &str) -> Result<PropertyId, RegistryError>;

    /// Lets `operator` transfer token `id` on the owner's behalf.
    fn approve(
        &mut self,
        caller: Address,
        operator: Address,
        id: PropertyId,
    ) -> Result<(), RegistryError>;

    /// Moves token `id` from `from` to `to`.
    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: PropertyId,
    ) -> Result<(), RegistryError>;

    /// Current owner of token `id`.
    fn owner_of(&self, id: PropertyId) -> Result<Address, RegistryError>;

    /// Approved operator for token `id`, if any.
    fn get_approved(&self, id: PropertyId) -> Result<Option<Address>, RegistryError>;

    /// Metadata URI of token `id`.
    fn token_uri(&self, id: PropertyId) -> Result<String, RegistryError>;

    /// Number of tokens minted so far.
    fn total_supply(&self) -> u64;
}

// ---------------------------------------------------------------------------
// In-memory registry
// ---------------------------------------------------------------------------

/// In-memory property token registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRegistry {
    /// Address under which this registry is deployed.
    address: Address,
    /// Minted tokens keyed by id.
    tokens: BTreeMap<PropertyId, PropertyToken>,
    /// Id the next mint will receive.
    next_id: PropertyId,
}

impl PropertyRegistry {
    /// Creates an empty registry deployed at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            tokens: BTreeMap::new(),
            next_id: FIRST_PROPERTY_ID,
        }
    }

    /// Returns the full token record, or `None` if it was never minted.
    pub fn token(&self, id: PropertyId) -> Option<&PropertyToken> {
        self.tokens.get(&id)
    }

    /// Ids of every token currently owned by `owner`.
    pub fn tokens_of(&self, owner: &Address) -> Vec<PropertyId> {
        self.tokens
            .values()
            .filter(|t| t.owner == *owner)
            .map(|t| t.id)
            .collect()
    }

    fn token_mut(&mut self, id: PropertyId) -> Result<&mut PropertyToken, RegistryError> {
        self.tokens
            .get_mut(&id)
            .ok_or(RegistryError::TokenNotFound(id))
    }
}

impl OwnershipRegistry for PropertyRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn mint(&mut self, caller: Address, token_uri: &str) -> Result<PropertyId, RegistryError> {
        if caller.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if token_uri.trim().is_empty() {
            return Err(RegistryError::EmptyTokenUri);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tokens.insert(
            id,
            PropertyToken {
                id,
                owner: caller,
                approved: None,
                token_uri: token_uri.to_string(),
                minted_at: Utc::now(),
            },
        );

        tracing::debug!(property = id, owner = %caller, "property token minted");
        Ok(id)
    }

    fn approve(
        &mut self,
        caller: Address,
        operator: Address,
        id: PropertyId,
    ) -> Result<(), RegistryError> {
        let token = self.token_mut(id)?;
        if token.owner != caller {
            return Err(RegistryError::NotAuthorized { id, caller });
        }

        token.approved = if operator.is_zero() {
            None
        } else {
            Some(operator)
        };
        Ok(())
    }

    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: PropertyId,
    ) -> Result<(), RegistryError> {
        let token = self.token_mut(id)?;

        if token.owner != from {
            return Err(RegistryError::NotOwner {
                id,
                from,
                owner: token.owner,
            });
        }
        if caller != token.owner && token.approved != Some(caller) {
            return Err(RegistryError::NotAuthorized { id, caller });
        }
        if to.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }

        token.owner = to;
        token.approved = None;

        tracing::debug!(property = id, %from, %to, "property token transferred");
        Ok(())
    }

    fn owner_of(&self, id: PropertyId) -> Result<Address, RegistryError> {
        self.tokens
            .get(&id)
            .map(|t| t.owner)
            .ok_or(RegistryError::TokenNotFound(id))
    }

    fn get_approved(&self, id: PropertyId) -> Result<Option<Address>, RegistryError> {
        self.tokens
            .get(&id)
            .map(|t| t.approved)
            .ok_or(RegistryError::TokenNotFound(id))
    }

    fn token_uri(&self, id: PropertyId) -> Result<String, RegistryError> {
        self.tokens
            .get(&id)
            .map(|t| t.token_uri.clone())
            .ok_or(RegistryError::TokenNotFound(id))
    }

    fn total_supply(&self) -> u64 {
        self.tokens.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/1.json";

    fn setup() -> (PropertyRegistry, Address) {
        let registry = PropertyRegistry::new(Address::from_label("registry"));
        (registry, Address::from_label("seller"))
    }

    #[test]
    fn mint_assigns_sequential_ids_from_one() {
        let (mut registry, seller) = setup();
        assert_eq!(registry.mint(seller, URI).unwrap(), 1);
        assert_eq!(registry.mint(seller, URI).unwrap(), 2);
        assert_eq!(registry.total_supply(), 2);
        assert_eq!(registry.owner_of(1).unwrap(), seller);
        assert_eq!(registry.token_uri(1).unwrap(), URI);
    }

    #[test]
    fn mint_rejects_empty_uri() {
        let (mut registry, seller) = setup();
        assert_eq!(
            registry.mint(seller, "  ").unwrap_err(),
            RegistryError::EmptyTokenUri
        );
    }

    #[test]
    fn only_owner_can_approve() {
        let (mut registry, seller) = setup();
        let id = registry.mint(seller, URI).unwrap();
        let stranger = Address::from_label("stranger");

        let err = registry.approve(stranger, stranger, id).unwrap_err();
        assert_eq!(err, RegistryError::NotAuthorized { id, caller: stranger });

        registry.approve(seller, stranger, id).unwrap();
        assert_eq!(registry.get_approved(id).unwrap(), Some(stranger));
    }

    #[test]
    fn approved_operator_can_transfer_once() {
        let (mut registry, seller) = setup();
        let id = registry.mint(seller, URI).unwrap();
        let escrow = Address::from_label("escrow");
        let buyer = Address::from_label("buyer");

        registry.approve(seller, escrow, id).unwrap();
        registry.transfer_from(escrow, seller, escrow, id).unwrap();
        assert_eq!(registry.owner_of(id).unwrap(), escrow);
        assert_eq!(registry.get_approved(id).unwrap(), None);

        // Seller lost both ownership and the approval it had granted.
        let err = registry.transfer_from(seller, escrow, buyer, id).unwrap_err();
        assert_eq!(err, RegistryError::NotAuthorized { id, caller: seller });
    }

    #[test]
    fn transfer_without_approval_rejected() {
        let (mut registry, seller) = setup();
        let id = registry.mint(seller, URI).unwrap();
        let escrow = Address::from_label("escrow");

        let err = registry.transfer_from(escrow, seller, escrow, id).unwrap_err();
        assert_eq!(err, RegistryError::NotAuthorized { id, caller: escrow });
        assert_eq!(registry.owner_of(id).unwrap(), seller);
    }

    #[test]
    fn transfer_from_wrong_owner_rejected() {
        let (mut registry, seller) = setup();
        let id = registry.mint(seller, URI).unwrap();
        let other = Address::from_label("other");

        let err = registry.transfer_from(seller, other, seller, id).unwrap_err();
        assert!(matches!(err, RegistryError::NotOwner { .. }));
    }

    #[test]
    fn unknown_token_reports_not_found() {
        let (registry, _) = setup();
        assert_eq!(
            registry.owner_of(42).unwrap_err(),
            RegistryError::TokenNotFound(42)
        );
    }

    #[test]
    fn tokens_of_lists_owned_ids() {
        let (mut registry, seller) = setup();
        let buyer = Address::from_label("buyer");
        registry.mint(seller, URI).unwrap();
        let second = registry.mint(seller, URI).unwrap();
        registry.transfer_from(seller, seller, buyer, second).unwrap();

        assert_eq!(registry.tokens_of(&seller), vec![1]);
        assert_eq!(registry.tokens_of(&buyer), vec![2]);
    }
}
