//! # Reference Deployment
//!
//! Builds a ledger from the CLI role arguments and replays the reference
//! deployment: the seller mints three homes, approves the escrow for each
//! and lists them for one buyer. [`run_sale`] then walks property 1 through
//! a complete sale (or a cancellation).

use estate_contracts::{
    AccountBook, Address, EscrowConfig, EscrowError, EscrowLedger, EscrowPolicy, InMemoryLedger,
    OwnershipRegistry, PropertyId, PropertyRegistry,
};

use crate::cli::RoleArgs;

/// Metadata URI, purchase price and escrow amount of the reference homes.
pub const REFERENCE_PROPERTIES: [(&str, u64, u64); 3] = [
    (
        "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/1.json",
        20,
        10,
    ),
    (
        "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/2.json",
        15,
        5,
    ),
    (
        "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/3.json",
        10,
        5,
    ),
];

/// Creates an empty ledger for the given roles.
pub fn deploy(roles: &RoleArgs) -> InMemoryLedger {
    let policy = if roles.hardened {
        EscrowPolicy::hardened()
    } else {
        EscrowPolicy::permissive()
    };
    let config = EscrowConfig::new(roles.seller, roles.inspector, roles.lender).with_policy(policy);
    EscrowLedger::new(
        config,
        PropertyRegistry::new(roles.registry),
        AccountBook::new(),
    )
}

/// Mints, approves and lists the reference homes for `buyer`.
pub fn seed_listings(
    ledger: &mut InMemoryLedger,
    buyer: Address,
) -> Result<Vec<PropertyId>, EscrowError> {
    let seller = ledger.seller();
    let escrow = ledger.escrow_address();
    let mut ids = Vec::with_capacity(REFERENCE_PROPERTIES.len());

    for (uri, price, escrow_amount) in REFERENCE_PROPERTIES {
        let id = ledger.registry_mut().mint(seller, uri)?;
        ledger.registry_mut().approve(seller, escrow, id)?;
        ledger.list(seller, id, price, escrow_amount, buyer)?;
        ids.push(id);
    }

    tracing::info!(count = ids.len(), buyer = %buyer, "reference properties listed");
    Ok(ids)
}

/// Walks a listed property through the buyer, inspector, lender and seller
/// steps, ending in finalization or, with `cancel`, a pre-inspection
/// cancellation.
///
/// The buyer and lender wallets must already hold the earnest and the wire.
pub fn run_sale(
    ledger: &mut InMemoryLedger,
    property: PropertyId,
    cancel: bool,
) -> Result<(), EscrowError> {
    let buyer = ledger.buyer_of(property);
    let seller = ledger.seller();
    let lender = ledger.lender();
    let inspector = ledger.inspector();
    let earnest = ledger.escrow_amount(property);
    let price = ledger.purchase_price(property);

    ledger.deposit_earnest(buyer, property, earnest)?;
    ledger.approve_sale(buyer, property)?;

    if cancel {
        return ledger.cancel_sale(buyer, property);
    }

    ledger.update_inspection_status(inspector, property, true)?;
    ledger.approve_sale(lender, property)?;
    ledger.receive(lender, price.saturating_sub(earnest))?;
    ledger.approve_sale(seller, property)?;
    ledger.finalize_sale(seller, property)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_contracts::SaleStatus;

    fn roles() -> RoleArgs {
        RoleArgs {
            seller: Address::from_label("seller"),
            inspector: Address::from_label("inspector"),
            lender: Address::from_label("lender"),
            registry: Address::from_label("registry"),
            hardened: false,
        }
    }

    #[test]
    fn seed_lists_three_homes() {
        let mut ledger = deploy(&roles());
        let buyer = Address::from_label("buyer");
        let ids = seed_listings(&mut ledger, buyer).unwrap();

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ledger.purchase_price(2), 15);
        assert_eq!(ledger.escrow_amount(3), 5);
        for id in ids {
            assert!(ledger.is_listed(id));
            assert_eq!(
                ledger.registry().owner_of(id).unwrap(),
                ledger.escrow_address()
            );
        }
    }

    #[test]
    fn run_sale_settles_property_one() {
        let mut ledger = deploy(&roles());
        let buyer = Address::from_label("buyer");
        seed_listings(&mut ledger, buyer).unwrap();
        ledger.transfers_mut().credit(buyer, 10).unwrap();
        let lender = ledger.lender();
        ledger.transfers_mut().credit(lender, 10).unwrap();

        run_sale(&mut ledger, 1, false).unwrap();

        assert_eq!(ledger.status(1), SaleStatus::Finalized);
        assert_eq!(ledger.registry().owner_of(1).unwrap(), buyer);
        assert_eq!(ledger.transfers().balance_of(&ledger.seller()), 20);
    }

    #[test]
    fn run_sale_with_cancel_refunds_buyer() {
        let mut ledger = deploy(&RoleArgs {
            hardened: true,
            ..roles()
        });
        let buyer = Address::from_label("buyer");
        seed_listings(&mut ledger, buyer).unwrap();
        ledger.transfers_mut().credit(buyer, 10).unwrap();

        run_sale(&mut ledger, 1, true).unwrap();

        assert_eq!(ledger.status(1), SaleStatus::Cancelled);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.transfers().balance_of(&buyer), 10);
    }
}
