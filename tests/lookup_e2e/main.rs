//! Lookup E2E test suite.
//!
//! Exercises the lookup page and `/api/lookup` against an in-process mock of
//! the Firestore REST API.
//!
//! Run with: cargo test --test lookup_e2e

mod mock_firestore;
mod test_helpers;

mod test_lookup;
