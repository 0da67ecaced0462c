use chime_core::{FileFiringLedger, FiringLedger, LedgerError};

#[test]
fn first_claim_wins_and_second_loses() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileFiringLedger::new(dir.path());

    assert!(!ledger.has_fired(1, "20260805_0700").unwrap());
    assert!(ledger.claim(1, "20260805_0700").unwrap());
    assert!(ledger.has_fired(1, "20260805_0700").unwrap());
    assert!(!ledger.claim(1, "20260805_0700").unwrap());
}

#[test]
fn claims_are_scoped_per_bell_and_per_slot() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileFiringLedger::new(dir.path());

    assert!(ledger.claim(1, "20260805_0700").unwrap());
    // Same slot, different bell.
    assert!(ledger.claim(2, "20260805_0700").unwrap());
    // Same bell, next minute.
    assert!(ledger.claim(1, "20260805_0701").unwrap());

    assert!(!ledger.claim(1, "20260805_0700").unwrap());
    assert!(!ledger.claim(2, "20260805_0700").unwrap());
}

#[test]
fn markers_survive_a_process_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first_invocation = FileFiringLedger::new(dir.path());
    assert!(first_invocation.claim(1, "20260805_0700").unwrap());
    drop(first_invocation);

    // A fresh ledger over the same directory models a restarted process
    // within the same minute.
    let second_invocation = FileFiringLedger::new(dir.path());
    assert!(second_invocation.has_fired(1, "20260805_0700").unwrap());
    assert!(!second_invocation.claim(1, "20260805_0700").unwrap());
}

#[test]
fn sweep_removes_only_strictly_older_slots() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileFiringLedger::new(dir.path());

    ledger.claim(1, "20260804_2359").unwrap();
    ledger.claim(2, "20260805_0659").unwrap();
    ledger.claim(3, "20260805_0700").unwrap();
    ledger.claim(4, "20260805_0701").unwrap();

    let removed = ledger.sweep_expired("20260805_0700").unwrap();
    assert_eq!(removed, 2);

    assert!(!ledger.has_fired(1, "20260804_2359").unwrap());
    assert!(!ledger.has_fired(2, "20260805_0659").unwrap());
    assert!(ledger.has_fired(3, "20260805_0700").unwrap());
    assert!(ledger.has_fired(4, "20260805_0701").unwrap());
}

#[test]
fn sweep_ignores_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileFiringLedger::new(dir.path());

    std::fs::write(dir.path().join("readme.txt"), b"not a marker").unwrap();
    std::fs::write(dir.path().join("bell_1_notaslot.fired"), b"x").unwrap();

    let removed = ledger.sweep_expired("20991231_2359").unwrap();
    assert_eq!(removed, 0);
    assert!(dir.path().join("readme.txt").exists());
}

#[test]
fn sweep_on_missing_directory_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileFiringLedger::new(dir.path().join("never_created"));

    assert_eq!(ledger.sweep_expired("20260805_0700").unwrap(), 0);
}

#[test]
fn unusable_ledger_directory_surfaces_as_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // A plain file where the marker directory should be.
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"occupied").unwrap();

    let ledger = FileFiringLedger::new(&blocked);
    let err = ledger.claim(1, "20260805_0700").unwrap_err();
    assert!(matches!(err, LedgerError::Io { .. }));
}
