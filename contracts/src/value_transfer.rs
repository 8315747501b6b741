//! # Value Transfer
//!
//! Moves value between external wallets and the escrow holder. The ledger
//! pulls the value attached to payable calls (earnest deposits, wires) and
//! pushes payouts to the seller or buyer through the [`ValueTransfer`]
//! trait; it never touches wallet balances directly.
//!
//! [`AccountBook`] is the in-memory implementation: a map of wallet balances
//! with checked arithmetic. Recipients can be marked as refusing incoming
//! value, which makes pushes to them fail the way a reverting receiver
//! would on chain.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

/// Errors that can occur while moving value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The payer cannot cover the amount.
    #[error("insufficient funds: {account} has {available}, needs {requested}")]
    InsufficientFunds {
        /// Account being debited.
        account: Address,
        /// Its current balance.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// The recipient refused the transfer.
    #[error("recipient {0} rejected the transfer")]
    Rejected(Address),

    /// Crediting would overflow the recipient's balance.
    #[error("balance overflow crediting {0}")]
    Overflow(Address),
}

/// The value-transfer capability the escrow ledger depends on.
pub trait ValueTransfer {
    /// Takes `amount` from `from` into escrow custody.
    fn pull(&mut self, from: Address, amount: u64) -> Result<(), TransferError>;

    /// Pays `amount` out of escrow custody to `to`.
    fn push(&mut self, to: Address, amount: u64) -> Result<(), TransferError>;
}

/// Wallet balances kept in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBook {
    balances: BTreeMap<Address, u64>,
    /// Accounts whose incoming transfers fail.
    refusing: BTreeSet<Address>,
}

impl AccountBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`, zero if it never held anything.
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Adds freshly issued value to `account` (genesis allocations, faucets).
    pub fn credit(&mut self, account: Address, amount: u64) -> Result<(), TransferError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(account))?;
        Ok(())
    }

    /// Removes value from `account`.
    pub fn debit(&mut self, account: Address, amount: u64) -> Result<(), TransferError> {
        let available = self.balance_of(&account);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                account,
                available,
                requested: amount,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }

    /// Makes every future push to `account` fail (or succeed again).
    pub fn set_refusing(&mut self, account: Address, refusing: bool) {
        if refusing {
            self.refusing.insert(account);
        } else {
            self.refusing.remove(&account);
        }
    }

    /// Sum of all wallet balances.
    pub fn total(&self) -> u64 {
        self.balances.values().fold(0u64, |acc, b| acc.saturating_add(*b))
    }
}

impl ValueTransfer for AccountBook {
    fn pull(&mut self, from: Address, amount: u64) -> Result<(), TransferError> {
        self.debit(from, amount)
    }

    fn push(&mut self, to: Address, amount: u64) -> Result<(), TransferError> {
        if self.refusing.contains(&to) {
            return Err(TransferError::Rejected(to));
        }
        self.credit(to, amount)
    }
}
