// Invariants over long random operation sequences

use crate::common::account;
use messenger::identity::AccountId;
use messenger::ledger::{Ledger, LedgerError, MessageIndex, Notification};
use messenger::vault::{ValueTransfer, Vault};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const ACCOUNTS: usize = 4;
const STEPS: usize = 2_000;

struct World {
    ledger: Ledger,
    vault: Vault,
    events: Vec<Notification>,
    accounts: Vec<AccountId>,
    resolved: HashSet<MessageIndex>,
    supply: u64,
}

impl World {
    fn new() -> Self {
        let accounts: Vec<AccountId> = (0..ACCOUNTS).map(|_| account()).collect();
        let mut vault = Vault::new();
        for a in &accounts {
            vault.deposit(a, 1_000).unwrap();
        }
        let supply = vault.total_supply();

        Self {
            ledger: Ledger::new(),
            vault,
            events: Vec::new(),
            accounts,
            resolved: HashSet::new(),
            supply,
        }
    }

    fn check(&self) {
        // Conservation
        assert_eq!(self.ledger.escrow_balance(), self.ledger.pending_total());
        // Nothing created or destroyed
        assert_eq!(self.vault.total_supply() + self.ledger.escrow_balance(), self.supply);
        // Terminal states stay terminal
        for index in &self.resolved {
            assert!(!self.ledger.get(*index).unwrap().is_pending());
        }
    }
}

#[test]
fn test_random_sequences_preserve_invariants() {
    for seed in 0..4u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = World::new();
        let mut next_index = 0u64;

        for _ in 0..STEPS {
            let actor = world.accounts[rng.gen_range(0..ACCOUNTS)];

            if world.ledger.is_empty() || rng.gen_bool(0.4) {
                let receiver = world.accounts[rng.gen_range(0..ACCOUNTS)];
                let deposit = rng.gen_range(0..300);
                let events_before = world.events.len();
                let result = world.ledger.post(
                    &mut world.vault,
                    &mut world.events,
                    actor,
                    receiver,
                    "msg",
                    deposit,
                );
                match result {
                    Ok(index) => {
                        assert_eq!(index.value(), next_index);
                        next_index += 1;
                        assert_eq!(world.events.len(), events_before + 1);
                    }
                    Err(LedgerError::InsufficientFunds { .. }) => {
                        assert_eq!(world.events.len(), events_before);
                    }
                    Err(other) => panic!("unexpected post error: {}", other),
                }
            } else {
                let index = MessageIndex::new(rng.gen_range(0..world.ledger.len() as u64));
                let message = world.ledger.get(index).unwrap().clone();
                let caller = if rng.gen_bool(0.8) {
                    *message.receiver()
                } else {
                    actor
                };
                let balances_before: Vec<u64> =
                    world.accounts.iter().map(|a| world.vault.balance_of(a)).collect();

                let result = if rng.gen_bool(0.5) {
                    world.ledger.accept(&mut world.vault, &mut world.events, index, caller)
                } else {
                    world.ledger.deny(&mut world.vault, &mut world.events, index, caller)
                };

                match &result {
                    Ok(()) => {
                        assert_eq!(&caller, message.receiver());
                        assert!(message.is_pending());
                        assert!(world.resolved.insert(index));
                    }
                    Err(LedgerError::Unauthorized { .. }) => {
                        assert_ne!(&caller, message.receiver());
                    }
                    Err(LedgerError::AlreadyResolved { .. }) => {
                        assert!(world.resolved.contains(&index));
                    }
                    Err(other) => panic!("unexpected resolve error: {}", other),
                }

                if result.is_err() {
                    let balances_after: Vec<u64> =
                        world.accounts.iter().map(|a| world.vault.balance_of(a)).collect();
                    assert_eq!(balances_before, balances_after);
                }
            }

            world.check();
        }
    }
}

#[test]
fn test_notifications_follow_commit_order() {
    let mut world = World::new();
    let (a, b) = (world.accounts[0], world.accounts[1]);

    let first = world
        .ledger
        .post(&mut world.vault, &mut world.events, a, b, "one", 1)
        .unwrap();
    let second = world
        .ledger
        .post(&mut world.vault, &mut world.events, b, a, "two", 1)
        .unwrap();
    world
        .ledger
        .deny(&mut world.vault, &mut world.events, first, b)
        .unwrap();
    world
        .ledger
        .accept(&mut world.vault, &mut world.events, second, a)
        .unwrap();

    let order: Vec<u64> = world.events.iter().map(|n| n.index().value()).collect();
    assert_eq!(order, vec![0, 1, 0, 1]);
    assert!(matches!(world.events[0], Notification::NewMessage { .. }));
    assert!(matches!(world.events[3], Notification::MessageConfirmed { .. }));
}
