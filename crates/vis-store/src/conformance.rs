//! Behaviour every [`LedgerStore`] backend must share.

use std::sync::Arc;
use std::thread;

use chrono::Utc;
use vis_types::{
    MachineIdentity, ObjectId, ObjectIdGenerator, RecordStatus, SlotKey, VersionRecord,
    VersionType,
};

use crate::error::StoreError;
use crate::traits::LedgerStore;

pub(crate) fn generator() -> ObjectIdGenerator {
    ObjectIdGenerator::with_seed(MachineIdentity::from_parts([0x0a, 0x0b, 0x0c], 7), 0)
}

pub(crate) fn staged(
    gen: &ObjectIdGenerator,
    namespace: &str,
    repo_id: &str,
    version_type: VersionType,
    value: &str,
) -> VersionRecord {
    VersionRecord {
        id: gen.generate(),
        namespace: namespace.into(),
        repo_id: repo_id.into(),
        version_type,
        value: value.into(),
        status: RecordStatus::Staged,
        created: Utc::now(),
    }
}

fn committed(
    gen: &ObjectIdGenerator,
    namespace: &str,
    repo_id: &str,
    version_type: VersionType,
    value: &str,
) -> VersionRecord {
    VersionRecord {
        status: RecordStatus::Committed,
        ..staged(gen, namespace, repo_id, version_type, value)
    }
}

pub(crate) fn run_all(store: &dyn LedgerStore) {
    let gen = generator();
    insert_then_get(store, &gen);
    duplicate_id_is_rejected(store, &gen);
    null_and_rolled_back_are_rejected(store, &gen);
    staged_is_invisible_until_committed(store, &gen);
    commit_is_not_idempotent(store, &gen);
    commit_unknown_id_is_false(store, &gen);
    newest_committed_wins(store, &gen);
    staged_newer_does_not_shadow_committed(store, &gen);
    delete_slot_removes_every_status(store, &gen);
    slots_are_isolated(store, &gen);
    summaries_aggregate_committed(store, &gen);
}

/// Several threads race to commit one staged id; exactly one wins.
pub(crate) fn concurrent_commit_wins_once(store: Arc<dyn LedgerStore>) {
    let gen = generator();
    let record = staged(&gen, "race", "repo", VersionType::Nightly, "n1");
    store.insert(&record).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = record.id;
            thread::spawn(move || store.commit_staged(&id).unwrap())
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().expect("thread should not panic"))
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1);
    assert!(store.latest_committed(&record.key()).unwrap().is_some());
}

fn insert_then_get(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let record = staged(gen, "get", "repo", VersionType::Release, "1.2.3");
    store.insert(&record).unwrap();

    let read_back = store.get(&record.id).unwrap().expect("should exist");
    assert_eq!(read_back.id, record.id);
    assert_eq!(read_back.value, "1.2.3");
    assert_eq!(read_back.status, RecordStatus::Staged);
    assert_eq!(read_back.created.timestamp(), record.created.timestamp());

    let missing = ObjectId::from_raw([0xff; 12]);
    assert!(store.get(&missing).unwrap().is_none());
}

fn duplicate_id_is_rejected(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let record = staged(gen, "dup", "repo", VersionType::Patch, "1");
    store.insert(&record).unwrap();
    let err = store.insert(&record).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(id) if id == record.id));
}

fn null_and_rolled_back_are_rejected(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let mut record = staged(gen, "bad", "repo", VersionType::Patch, "1");
    record.id = ObjectId::null();
    assert!(matches!(store.insert(&record), Err(StoreError::NullObjectId)));

    let mut record = staged(gen, "bad", "repo", VersionType::Patch, "1");
    record.status = RecordStatus::RolledBack;
    assert!(matches!(
        store.insert(&record),
        Err(StoreError::InvalidRecord { .. })
    ));
    assert!(store.get(&record.id).unwrap().is_none());
}

fn staged_is_invisible_until_committed(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let record = staged(gen, "vis", "repo", VersionType::Release, "1.2.3");
    let key = record.key();
    store.insert(&record).unwrap();
    assert!(store.latest_committed(&key).unwrap().is_none());

    assert!(store.commit_staged(&record.id).unwrap());
    let current = store.latest_committed(&key).unwrap().expect("committed");
    assert_eq!(current.value, "1.2.3");
    assert_eq!(current.status, RecordStatus::Committed);
}

fn commit_is_not_idempotent(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let record = staged(gen, "twice", "repo", VersionType::Release, "1");
    store.insert(&record).unwrap();
    assert!(store.commit_staged(&record.id).unwrap());
    assert!(!store.commit_staged(&record.id).unwrap());
}

fn commit_unknown_id_is_false(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    assert!(!store.commit_staged(&gen.generate()).unwrap());
}

fn newest_committed_wins(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let key = SlotKey::new("lcw", "repo", VersionType::Release);
    store
        .insert(&committed(gen, "lcw", "repo", VersionType::Release, "1.0.0"))
        .unwrap();
    store
        .insert(&committed(gen, "lcw", "repo", VersionType::Release, "1.0.1"))
        .unwrap();
    let current = store.latest_committed(&key).unwrap().expect("committed");
    assert_eq!(current.value, "1.0.1");
}

fn staged_newer_does_not_shadow_committed(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let key = SlotKey::new("shadow", "repo", VersionType::Nightly);
    store
        .insert(&committed(gen, "shadow", "repo", VersionType::Nightly, "n1"))
        .unwrap();
    store
        .insert(&staged(gen, "shadow", "repo", VersionType::Nightly, "n2"))
        .unwrap();
    assert_eq!(store.latest_committed(&key).unwrap().unwrap().value, "n1");
}

fn delete_slot_removes_every_status(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    let key = SlotKey::new("del", "repo", VersionType::Development);
    let kept = committed(gen, "del", "repo", VersionType::Release, "keep");
    store.insert(&kept).unwrap();
    store
        .insert(&committed(gen, "del", "repo", VersionType::Development, "d1"))
        .unwrap();
    let pending = staged(gen, "del", "repo", VersionType::Development, "d2");
    store.insert(&pending).unwrap();

    assert_eq!(store.delete_slot(&key).unwrap(), 2);
    assert!(store.latest_committed(&key).unwrap().is_none());
    assert!(store.get(&pending.id).unwrap().is_none());
    assert!(!store.commit_staged(&pending.id).unwrap());
    assert!(store.get(&kept.id).unwrap().is_some());

    assert_eq!(store.delete_slot(&key).unwrap(), 0);
}

fn slots_are_isolated(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    store
        .insert(&committed(gen, "iso-a", "repo", VersionType::Patch, "a"))
        .unwrap();
    store
        .insert(&committed(gen, "iso-b", "repo", VersionType::Patch, "b"))
        .unwrap();
    store
        .insert(&committed(gen, "iso-a", "other", VersionType::Patch, "c"))
        .unwrap();

    let a = SlotKey::new("iso-a", "repo", VersionType::Patch);
    assert_eq!(store.latest_committed(&a).unwrap().unwrap().value, "a");
    let b = SlotKey::new("iso-b", "repo", VersionType::Patch);
    assert_eq!(store.latest_committed(&b).unwrap().unwrap().value, "b");
    let none = SlotKey::new("iso-a", "repo", VersionType::Release);
    assert!(store.latest_committed(&none).unwrap().is_none());
}

fn summaries_aggregate_committed(store: &dyn LedgerStore, gen: &ObjectIdGenerator) {
    store
        .insert(&committed(gen, "zz-sum", "app", VersionType::Release, "1.0.0"))
        .unwrap();
    store
        .insert(&committed(gen, "zz-sum", "app", VersionType::Release, "1.1.0"))
        .unwrap();
    store
        .insert(&committed(gen, "zz-sum", "app", VersionType::Development, "2.0.0-dev"))
        .unwrap();
    store
        .insert(&staged(gen, "zz-sum", "app", VersionType::Patch, "never"))
        .unwrap();
    store
        .insert(&staged(gen, "zz-sum", "pending-only", VersionType::Patch, "never"))
        .unwrap();

    let summaries = store.summaries().unwrap();
    let mine: Vec<_> = summaries
        .iter()
        .filter(|s| s.namespace == "zz-sum")
        .collect();
    assert_eq!(mine.len(), 1);
    let app = mine[0];
    assert_eq!(app.repo_id, "app");
    assert_eq!(app.count(VersionType::Release), 2);
    assert_eq!(app.count(VersionType::Development), 1);
    assert_eq!(app.count(VersionType::Patch), 0);
    assert_eq!(app.last_value.as_deref(), Some("2.0.0-dev"));
    assert!(app.last_updated.is_some());

    let ordered: Vec<_> = summaries
        .iter()
        .map(|s| (s.namespace.clone(), s.repo_id.clone()))
        .collect();
    let mut sorted = ordered.clone();
    sorted.sort();
    assert_eq!(ordered, sorted);
}
