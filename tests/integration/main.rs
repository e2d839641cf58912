//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against mock
//! adapters and a temporary on-disk store.  No real hardware is required.

mod control_loop_tests;
mod mock_hw;
mod runtime_tests;
