// Balance tracking tests for the vault module

use messenger::identity::{AccountId, Keypair};
use messenger::vault::{ValueTransfer, Vault, VaultError};

fn account() -> AccountId {
    AccountId::from_public_key(&Keypair::generate().public_key())
}

// ============================================================================
// VAULT CREATION TESTS
// ============================================================================

#[test]
fn test_new_vault_has_zero_balance() {
    let vault = Vault::new();

    assert_eq!(vault.balance_of(&account()), 0);
    assert_eq!(vault.total_supply(), 0);
    assert_eq!(vault.account_count(), 0);
}

// ============================================================================
// CREDIT / DEBIT TESTS
// ============================================================================

#[test]
fn test_deposit_increases_balance() {
    let alice = account();
    let mut vault = Vault::new();

    vault.deposit(&alice, 100).unwrap();

    assert_eq!(vault.balance_of(&alice), 100);
    assert_eq!(vault.total_supply(), 100);
}

#[test]
fn test_credits_accumulate() {
    let alice = account();
    let mut vault = Vault::new();

    for _ in 0..5 {
        vault.credit(&alice, 100).unwrap();
    }

    assert_eq!(vault.balance_of(&alice), 500);
}

#[test]
fn test_debit_decreases_balance() {
    let alice = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, 100).unwrap();

    vault.debit(&alice, 30).unwrap();

    assert_eq!(vault.balance_of(&alice), 70);
    assert_eq!(vault.total_supply(), 70);
}

#[test]
fn test_debit_exact_balance_succeeds() {
    let alice = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, 100).unwrap();

    vault.debit(&alice, 100).unwrap();

    assert_eq!(vault.balance_of(&alice), 0);
    assert!(vault.can_afford(&alice, 0));
    assert!(!vault.can_afford(&alice, 1));
}

#[test]
fn test_debit_insufficient_balance_fails() {
    let alice = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, 50).unwrap();

    let result = vault.debit(&alice, 100);

    assert_eq!(
        result,
        Err(VaultError::InsufficientBalance {
            available: 50,
            required: 100
        })
    );
}

#[test]
fn test_balances_are_per_account() {
    let alice = account();
    let bob = account();
    let mut vault = Vault::new();

    vault.deposit(&alice, 10).unwrap();
    vault.deposit(&bob, 20).unwrap();
    vault.debit(&bob, 5).unwrap();

    assert_eq!(vault.balance_of(&alice), 10);
    assert_eq!(vault.balance_of(&bob), 15);
    assert_eq!(vault.account_count(), 2);
}
