// Escrow ledger benchmarks.
//
// Covers a full sale (list through finalize) and precondition evaluation on
// a ledger already holding many listings.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use estate_contracts::{
    AccountBook, Address, EscrowConfig, EscrowLedger, InMemoryLedger, OwnershipRegistry,
    PropertyRegistry,
};

const URI: &str = "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/1.json";

/// Ledger with `n` properties minted, approved and listed for the buyer.
fn setup_ledger(n: u64) -> (InMemoryLedger, [Address; 4]) {
    let seller = Address::from_label("seller");
    let buyer = Address::from_label("buyer");
    let inspector = Address::from_label("inspector");
    let lender = Address::from_label("lender");

    let mut ledger = EscrowLedger::new(
        EscrowConfig::new(seller, inspector, lender),
        PropertyRegistry::new(Address::from_label("registry")),
        AccountBook::new(),
    );
    let escrow = ledger.escrow_address();
    ledger.transfers_mut().credit(buyer, u64::MAX / 4).unwrap();
    ledger.transfers_mut().credit(lender, u64::MAX / 4).unwrap();

    for _ in 0..n {
        let id = ledger.registry_mut().mint(seller, URI).unwrap();
        ledger.registry_mut().approve(seller, escrow, id).unwrap();
        ledger.list(seller, id, 1_000, 10, buyer).unwrap();
    }

    (ledger, [seller, buyer, inspector, lender])
}

fn bench_full_sale(c: &mut Criterion) {
    c.bench_function("escrow/full_sale", |b| {
        b.iter_batched(
            || setup_ledger(0),
            |(mut ledger, [seller, buyer, inspector, lender])| {
                let escrow = ledger.escrow_address();
                let id = ledger.registry_mut().mint(seller, URI).unwrap();
                ledger.registry_mut().approve(seller, escrow, id).unwrap();
                ledger.list(seller, id, 1_000, 10, buyer).unwrap();
                ledger.deposit_earnest(buyer, id, 10).unwrap();
                ledger.update_inspection_status(inspector, id, true).unwrap();
                for approver in [buyer, seller, lender] {
                    ledger.approve_sale(approver, id).unwrap();
                }
                ledger.receive(lender, 990).unwrap();
                ledger.finalize_sale(seller, id).unwrap();
                ledger
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_precondition_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("escrow/unmet_precondition");

    for n in [10u64, 100, 1_000] {
        let (ledger, _) = setup_ledger(n);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(n), &ledger, |b, ledger| {
            b.iter(|| ledger.unmet_precondition(n / 2));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_sale, bench_precondition_check);
criterion_main!(benches);
