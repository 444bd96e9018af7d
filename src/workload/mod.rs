//! Workload Module
//!
//! Keys and values driven through a backend.
//!
//! ## Responsibilities
//! - Generate unique fixed-length keys for the write phase
//! - Build the sentinel-filled value every put writes
//! - Verify read-back values and reset the checked position

mod key;
mod value;

pub use key::{Key, KeyGenerator, KEY_LEN};
pub use value::{make_value, reset_checked, verify_value, SENTINEL};
