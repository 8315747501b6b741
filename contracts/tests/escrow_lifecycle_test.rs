//! Integration tests for the property escrow ledger.
//!
//! These walk whole sales across the ledger, the property registry and the
//! account book: listing and custody, earnest deposits, inspection,
//! approvals, settlement and cancellation.

use estate_contracts::{
    AccountBook, Address, EscrowConfig, EscrowError, EscrowEventKind, EscrowLedger,
    InMemoryLedger, OwnershipRegistry, Precondition, PropertyRegistry, SaleStatus,
};

const HOME_URI: &str = "https://ipfs.io/ipfs/QmQUozrHLAusXDxrvsESJ3PYB3rUeUuBAvVWw6nop2uu7c/1.png";

struct Parties {
    buyer: Address,
    seller: Address,
    inspector: Address,
    lender: Address,
}

/// Helper: the four signers and a ledger where the seller minted property 1
/// and approved the escrow to take it. Buyer and lender start with 10_000.
fn deploy() -> (InMemoryLedger, Parties) {
    let p = Parties {
        buyer: Address::from_label("buyer"),
        seller: Address::from_label("seller"),
        inspector: Address::from_label("inspector"),
        lender: Address::from_label("lender"),
    };

    let mut ledger = EscrowLedger::new(
        EscrowConfig::new(p.seller, p.inspector, p.lender),
        PropertyRegistry::new(Address::from_label("real estate")),
        AccountBook::new(),
    );

    let escrow = ledger.escrow_address();
    let id = ledger.registry_mut().mint(p.seller, HOME_URI).unwrap();
    assert_eq!(id, 1);
    ledger.registry_mut().approve(p.seller, escrow, id).unwrap();
    ledger.transfers_mut().credit(p.buyer, 10_000).unwrap();
    ledger.transfers_mut().credit(p.lender, 10_000).unwrap();

    (ledger, p)
}

fn list_default(ledger: &mut InMemoryLedger, p: &Parties) {
    ledger.list(p.seller, 1, 1_000, 10, p.buyer).unwrap();
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[test]
fn deployment_exposes_fixed_roles() {
    let (ledger, p) = deploy();
    assert_eq!(ledger.seller(), p.seller);
    assert_eq!(ledger.inspector(), p.inspector);
    assert_eq!(ledger.lender(), p.lender);
    assert_eq!(ledger.registry_address(), Address::from_label("real estate"));
    assert_eq!(ledger.balance(), 0);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn only_seller_can_list() {
    let (mut ledger, p) = deploy();

    for caller in [p.buyer, p.inspector, p.lender] {
        let err = ledger.list(caller, 1, 1_000, 10, p.buyer).unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }
    assert!(!ledger.is_listed(1));
    assert_eq!(ledger.registry().owner_of(1).unwrap(), p.seller);
}

#[test]
fn listing_records_terms_and_moves_token_into_custody() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);

    assert!(ledger.is_listed(1));
    assert_eq!(ledger.purchase_price(1), 1_000);
    assert_eq!(ledger.escrow_amount(1), 10);
    assert_eq!(ledger.buyer_of(1), p.buyer);
    assert_eq!(
        ledger.registry().owner_of(1).unwrap(),
        ledger.escrow_address()
    );
}

// ---------------------------------------------------------------------------
// Earnest
// ---------------------------------------------------------------------------

#[test]
fn only_listed_buyer_can_deposit() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);

    let err = ledger.deposit_earnest(p.lender, 1, 10).unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
    assert_eq!(ledger.balance(), 0);
}

#[test]
fn deposit_against_unlisted_property_is_unauthorized() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);

    // The buyer is only the buyer of property 1.
    let err = ledger.deposit_earnest(p.buyer, 2, 10).unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
}

#[test]
fn deposit_adds_exactly_the_attached_value() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);

    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    assert_eq!(ledger.balance(), 10);
    assert_eq!(ledger.transfers().balance_of(&p.buyer), 9_990);

    // Short, zero and over-sized deposits are all accepted by default.
    ledger.deposit_earnest(p.buyer, 1, 0).unwrap();
    ledger.deposit_earnest(p.buyer, 1, 3).unwrap();
    ledger.deposit_earnest(p.buyer, 1, 50).unwrap();
    assert_eq!(ledger.balance(), 63);
    assert_eq!(ledger.listing(1).unwrap().earnest_deposited, 63);
}

// ---------------------------------------------------------------------------
// Inspection & Approval
// ---------------------------------------------------------------------------

#[test]
fn only_inspector_updates_inspection() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);

    let err = ledger.update_inspection_status(p.seller, 1, true).unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
    assert!(!ledger.inspection_passed(1));

    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    assert!(ledger.inspection_passed(1));

    // Last write wins, a pass can be revoked.
    ledger.update_inspection_status(p.inspector, 1, false).unwrap();
    assert!(!ledger.inspection_passed(1));
}

#[test]
fn approvals_recorded_per_caller() {
    let (mut ledger, p) = deploy();

    ledger.approve_sale(p.buyer, 1).unwrap();
    ledger.approve_sale(p.seller, 1).unwrap();
    ledger.approve_sale(p.lender, 1).unwrap();

    assert!(ledger.approval_of(1, &p.buyer));
    assert!(ledger.approval_of(1, &p.seller));
    assert!(ledger.approval_of(1, &p.lender));
    assert!(!ledger.approval_of(1, &p.inspector));
    assert!(!ledger.approval_of(2, &p.buyer));
}

#[test]
fn stranger_approval_is_recorded_but_not_counted() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    let stranger = Address::from_label("stranger");

    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    ledger.approve_sale(stranger, 1).unwrap();
    assert!(ledger.approval_of(1, &stranger));

    assert_eq!(
        ledger.finalize_sale(stranger, 1),
        Err(EscrowError::PreconditionNotMet(
            Precondition::BuyerNotApproved
        ))
    );
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

#[test]
fn full_sale_happy_path() {
    let (mut ledger, p) = deploy();

    // 1. List
    ledger.list(p.seller, 1, 1_000, 10, p.buyer).unwrap();

    // 2. Earnest
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    assert_eq!(ledger.balance(), 10);

    // 3. Inspection
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();

    // 4. Approvals
    ledger.approve_sale(p.buyer, 1).unwrap();
    ledger.approve_sale(p.seller, 1).unwrap();
    ledger.approve_sale(p.lender, 1).unwrap();

    // 5. Lender wires the rest
    ledger.receive(p.lender, 990).unwrap();
    assert_eq!(ledger.balance(), 1_000);

    // 6. Finalize
    ledger.finalize_sale(p.seller, 1).unwrap();

    assert_eq!(ledger.balance(), 0);
    assert_eq!(ledger.transfers().balance_of(&p.seller), 1_000);
    assert_eq!(ledger.registry().owner_of(1).unwrap(), p.buyer);
    assert!(!ledger.is_listed(1));
    assert_eq!(ledger.status(1), SaleStatus::Finalized);

    let kinds: Vec<_> = ledger.events().iter().map(|e| &e.kind).collect();
    assert!(matches!(kinds.last(), Some(EscrowEventKind::SaleFinalized { amount: 1_000, .. })));
}

#[test]
fn finalize_without_inspection_fails() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    for approver in [p.buyer, p.seller, p.lender] {
        ledger.approve_sale(approver, 1).unwrap();
    }
    ledger.receive(p.lender, 990).unwrap();

    assert_eq!(
        ledger.finalize_sale(p.seller, 1),
        Err(EscrowError::PreconditionNotMet(
            Precondition::InspectionNotPassed
        ))
    );
    assert_eq!(ledger.balance(), 1_000);
    assert!(ledger.is_listed(1));
}

#[test]
fn finalize_without_lender_approval_fails() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    ledger.approve_sale(p.buyer, 1).unwrap();
    ledger.approve_sale(p.seller, 1).unwrap();
    ledger.receive(p.lender, 1_000).unwrap();

    assert_eq!(
        ledger.finalize_sale(p.buyer, 1),
        Err(EscrowError::PreconditionNotMet(
            Precondition::LenderNotApproved
        ))
    );
}

#[test]
fn finalize_underfunded_fails_without_side_effects() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    for approver in [p.buyer, p.seller, p.lender] {
        ledger.approve_sale(approver, 1).unwrap();
    }
    let events_before = ledger.events().len();

    assert_eq!(
        ledger.finalize_sale(p.seller, 1),
        Err(EscrowError::PreconditionNotMet(
            Precondition::InsufficientFunds {
                balance: 10,
                required: 1_000,
            }
        ))
    );
    assert_eq!(ledger.balance(), 10);
    assert_eq!(
        ledger.registry().owner_of(1).unwrap(),
        ledger.escrow_address()
    );
    assert_eq!(ledger.events().len(), events_before);
}

#[test]
fn anyone_may_trigger_settlement_once_conditions_hold() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    for approver in [p.buyer, p.seller, p.lender] {
        ledger.approve_sale(approver, 1).unwrap();
    }
    ledger.receive(p.lender, 1_000).unwrap();

    let passer_by = Address::from_label("passer-by");
    ledger.finalize_sale(passer_by, 1).unwrap();
    assert_eq!(ledger.registry().owner_of(1).unwrap(), p.buyer);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancel_before_inspection_refunds_buyer() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();

    ledger.cancel_sale(p.buyer, 1).unwrap();

    assert_eq!(ledger.balance(), 0);
    assert_eq!(ledger.transfers().balance_of(&p.buyer), 10_000);
    assert_eq!(ledger.status(1), SaleStatus::Cancelled);
    // Only funds move; the listing flag stays as it was.
    assert!(ledger.is_listed(1));
}

#[test]
fn cancel_after_inspection_pays_seller() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();

    ledger.cancel_sale(p.seller, 1).unwrap();

    assert_eq!(ledger.balance(), 0);
    assert_eq!(ledger.transfers().balance_of(&p.seller), 10);
    assert_eq!(ledger.transfers().balance_of(&p.buyer), 9_990);
    assert!(ledger.inspection_passed(1));
}

#[test]
fn cancel_drains_lender_funds_too() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.deposit_earnest(p.buyer, 1, 10).unwrap();
    ledger.receive(p.lender, 990).unwrap();

    let stranger = Address::from_label("stranger");
    ledger.cancel_sale(stranger, 1).unwrap();

    // The whole balance goes to the buyer, lender wire included.
    assert_eq!(ledger.balance(), 0);
    assert_eq!(ledger.transfers().balance_of(&p.buyer), 10_990);
}

#[test]
fn cancelled_sale_cannot_be_finalized() {
    let (mut ledger, p) = deploy();
    list_default(&mut ledger, &p);
    ledger.update_inspection_status(p.inspector, 1, true).unwrap();
    for approver in [p.buyer, p.seller, p.lender] {
        ledger.approve_sale(approver, 1).unwrap();
    }
    ledger.receive(p.lender, 1_000).unwrap();
    ledger.cancel_sale(p.buyer, 1).unwrap();
    ledger.receive(p.lender, 1_000).unwrap();

    assert_eq!(
        ledger.finalize_sale(p.buyer, 1),
        Err(EscrowError::InvalidPropertyState {
            property: 1,
            status: SaleStatus::Cancelled,
        })
    );
}
