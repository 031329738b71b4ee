// crates/fio-ledger-core/tests/identity.rs
// ============================================================================
// Module: Identity Derivation Tests
// Description: Determinism, shape, and grouping of derived identities.
// ============================================================================
//! ## Overview
//! Validates configuration and run identities with fixed vectors and
//! property-based checks.

#![allow(
    clippy::unwrap_used,
    clippy::panic_in_result_fn,
    reason = "Tests use unwrap on deterministic fixtures."
)]

use fio_ledger_core::config_identity;
use fio_ledger_core::derive_identity;
use fio_ledger_core::run_identity;
use proptest::prelude::*;

// ============================================================================
// SECTION: Fixed Vectors
// ============================================================================

#[test]
fn config_identity_depends_only_on_hostname() {
    let identity = config_identity("server-01");
    assert_eq!(identity.as_str(), "c552f179-a811-58fc-a992-97896acc8f83");
    assert_eq!(identity, config_identity("server-01"));
    assert_ne!(identity, config_identity("server-02"));
}

#[test]
fn run_identity_groups_by_calendar_day() {
    let morning = run_identity("server-01", "2025-06-01T08:00:00Z").unwrap();
    let evening = run_identity("server-01", "2025-06-01 21:30:00").unwrap();
    let next_day = run_identity("server-01", "2025-06-02T08:00:00Z").unwrap();
    assert_eq!(morning.as_str(), "6b58c3ae-ba96-520e-be4f-79c261dd1d60");
    assert_eq!(morning, evening);
    assert_ne!(morning, next_day);
}

#[test]
fn blank_test_date_is_rejected() {
    let err = run_identity("server-01", "").unwrap_err();
    assert_eq!(err.field, "test_date");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn is_uuid_v5_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    value.len() == 36
        && [8, 13, 18, 23].iter().all(|&index| bytes[index] == b'-')
        && bytes[14] == b'5'
        && matches!(bytes[19], b'8' | b'9' | b'a' | b'b')
        && value.chars().all(|c| c == '-' || (c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
}

proptest! {
    #[test]
    fn derive_identity_is_deterministic_and_shaped(input in ".{0,64}") {
        let first = derive_identity(&input);
        prop_assert_eq!(&first, &derive_identity(&input));
        prop_assert!(is_uuid_v5_shaped(&first));
    }

    #[test]
    fn distinct_inputs_yield_distinct_identities(a in "[a-z0-9-]{1,32}", b in "[a-z0-9-]{1,32}") {
        prop_assume!(a != b);
        prop_assert_ne!(derive_identity(&a), derive_identity(&b));
    }
}
