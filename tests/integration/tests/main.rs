//! End-to-End Integration Tests
//!
//! These tests drive complete responses, signed and encrypted by the fixture
//! builder, through the verification pipeline.

mod assertion_checks;
mod concurrency;
mod envelope;
mod pipeline;
mod tampering;
