//! EncryptChat Crypto Library
//!
//! Message text is obscured with a fixed alphabetic rotation (Caesar shift)
//! before it is handed to storage, and rotated back on display.
//! All participants share the same configured shift.
//!
//! This is NOT encryption: there is no key exchange, no randomness and no
//! integrity check. It only keeps raw text from sitting verbatim in the store.

pub mod keys;
pub mod shift;

pub use keys::{DEFAULT_SHIFT, ShiftKey};
pub use shift::{decode, encode};
