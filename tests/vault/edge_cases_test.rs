// Vault edge cases

use messenger::identity::{AccountId, Keypair};
use messenger::vault::{ValueTransfer, Vault, VaultError};

fn account() -> AccountId {
    AccountId::from_public_key(&Keypair::generate().public_key())
}

#[test]
fn test_maximum_amount_value() {
    let alice = account();
    let mut vault = Vault::new();

    vault.deposit(&alice, u64::MAX).unwrap();

    assert_eq!(vault.balance_of(&alice), u64::MAX);
}

#[test]
fn test_supply_overflow_across_accounts() {
    let alice = account();
    let bob = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, u64::MAX).unwrap();

    assert_eq!(vault.deposit(&bob, 1), Err(VaultError::BalanceOverflow));
    assert_eq!(vault.balance_of(&bob), 0);
    assert_eq!(vault.total_supply(), u64::MAX);
}

#[test]
fn test_zero_moves_are_allowed() {
    let alice = account();
    let mut vault = Vault::new();

    vault.credit(&alice, 0).unwrap();
    vault.debit(&alice, 0).unwrap();

    assert_eq!(vault.balance_of(&alice), 0);
}

#[test]
fn test_empty_vault_cannot_spend() {
    let mut vault = Vault::new();

    assert!(matches!(
        vault.debit(&account(), 1),
        Err(VaultError::InsufficientBalance { available: 0, required: 1 })
    ));
}

#[test]
fn test_vault_bytes_roundtrip() {
    let alice = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, 42).unwrap();
    vault.debit(&alice, 2).unwrap();

    let restored = Vault::from_bytes(&vault.to_bytes()).unwrap();

    assert_eq!(restored.balance_of(&alice), 40);
    assert_eq!(restored.total_supply(), 40);
    assert_eq!(restored.account_count(), 1);
}

#[test]
fn test_vault_bytes_do_not_grow_with_traffic() {
    let alice = account();
    let bob = account();
    let mut vault = Vault::new();
    vault.deposit(&alice, 1).unwrap();
    vault.deposit(&bob, 0).unwrap();
    let base = vault.to_bytes().len();

    for _ in 0..1_000 {
        vault.debit(&alice, 1).unwrap();
        vault.credit(&alice, 1).unwrap();
    }

    assert_eq!(vault.balance_of(&alice), 1);
    assert_eq!(vault.to_bytes().len(), base);
}

#[test]
fn test_vault_from_garbage_fails() {
    assert!(matches!(
        Vault::from_bytes(&[0xFF]),
        Err(VaultError::DeserializationFailed(_))
    ));
}
