//! Tests for template engine
//!
//! Organized into focused submodules, one per concern.

use super::*;

// Test helper functions
mod helpers;


// Error and edge case tests
mod errors;
