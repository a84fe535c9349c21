//! # Steelfix Core
//!
//! Core types and error definitions for the steelfix FIX protocol library.
//!
//! This crate provides the building blocks shared by the other steelfix crates:
//! - **Error types**: unified error handling with `thiserror`
//! - **Tag values**: the [`TagValue`] tagged union covering every FIX primitive
//! - **Tag maps**: [`TagMap`], the ordered, bucket-indexed tag storage used by
//!   messages and repeating-group occurrences
//!
//! ## Ownership model
//!
//! A [`TagMap`] exclusively owns its entries, including the child maps of any
//! repeating-group occurrences. Nothing in this crate is synchronised; a map
//! belongs to one logical owner at a time.

pub mod error;
pub mod tagmap;
pub mod value;

pub use error::{EncodeError, FixError, MessageError, Result};
pub use tagmap::{TagMap, TAG_BUCKETS};
pub use value::TagValue;
