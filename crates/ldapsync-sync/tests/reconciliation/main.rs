//! Integration tests for ldapsync-sync
//!
//! Drives the reconciliation engine against in-memory directory and
//! account store fakes and asserts on the recorded remote calls.


mod test_apply;
