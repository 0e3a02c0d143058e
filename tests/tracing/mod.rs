//! Tests for tracing functionality
//!
//! These tests verify that the lifecycle logs cleanly with a subscriber installed.
//! Without the feature the logging code is compiled out and every other test covers it.
