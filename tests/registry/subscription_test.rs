// Notifications delivered to async subscribers

use messenger::identity::{AccountId, Keypair};
use messenger::ledger::{
    BroadcastSink, MessageIndex, Notification, NotificationSink, Outcome,
};
use messenger::registry::{Registry, RegistryConfig};
use std::sync::Arc;

fn account() -> AccountId {
    AccountId::from_public_key(&Keypair::generate().public_key())
}

#[tokio::test]
async fn test_subscriber_sees_commits_in_order() {
    let registry = Registry::new(RegistryConfig::default());
    let (alice, bob) = (account(), account());
    registry.fund(&alice, 10).unwrap();
    let mut rx = registry.subscribe();

    let index = registry.post(alice, bob, "text", 1).unwrap();
    registry.accept(index, bob).unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        Notification::NewMessage {
            index,
            sender: alice,
            receiver: bob,
            text: b"text".to_vec(),
            deposit_in_wei: 1,
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        Notification::MessageConfirmed {
            index,
            outcome: Outcome::Accepted
        }
    );
}

#[tokio::test]
async fn test_rejected_calls_emit_nothing() {
    let registry = Registry::new(RegistryConfig::default());
    let (alice, bob) = (account(), account());
    registry.fund(&alice, 10).unwrap();
    let index = registry.post(alice, bob, "text", 1).unwrap();
    let mut rx = registry.subscribe();

    assert!(registry.deny(index, alice).is_err());
    assert!(registry.post(alice, bob, "too much", 100).is_err());
    registry.deny(index, bob).unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        Notification::MessageConfirmed {
            index,
            outcome: Outcome::Denied
        }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_writes_from_tasks_reach_subscriber() {
    let registry = Arc::new(Registry::new(RegistryConfig::default()));
    let receiver = account();
    let senders: Vec<AccountId> = (0..8).map(|_| account()).collect();
    for sender in &senders {
        registry.fund(sender, 5).unwrap();
    }
    let mut rx = registry.subscribe();

    let mut handles = Vec::new();
    for sender in senders {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry.post(sender, receiver, "hi", 5).unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..8 {
        seen.push(rx.recv().await.unwrap().index().value());
    }
    // Broadcast order is commit order, and commits are numbered in order
    assert_eq!(seen, (0..8).collect::<Vec<u64>>());
    assert_eq!(registry.escrow_balance(), 40);
    assert_eq!(registry.list_received(&receiver).len(), 8);
    assert!(registry.message(MessageIndex::new(7)).is_some());
}

#[tokio::test]
async fn test_broadcast_sink_counts_live_subscribers() {
    let mut sink = BroadcastSink::new(4);
    assert_eq!(sink.subscriber_count(), 0);

    // Emitting with nobody listening is dropped quietly
    sink.emit(Notification::MessageConfirmed {
        index: MessageIndex::new(0),
        outcome: Outcome::Denied,
    });

    let mut first = sink.subscribe();
    let second = sink.subscribe();
    assert_eq!(sink.subscriber_count(), 2);

    drop(second);
    assert_eq!(sink.subscriber_count(), 1);

    sink.emit(Notification::MessageConfirmed {
        index: MessageIndex::new(1),
        outcome: Outcome::Accepted,
    });
    assert_eq!(first.recv().await.unwrap().index(), MessageIndex::new(1));
    assert!(first.try_recv().is_err());
}
