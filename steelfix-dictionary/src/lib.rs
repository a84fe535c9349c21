//! # Steelfix Dictionary
//!
//! FIX specification parsing and protocol descriptors for the steelfix
//! library.
//!
//! This crate provides:
//! - **Schema definitions**: the descriptor graph resolved from a FIX
//!   dictionary: field types, per-message field layouts, repeating
//!   groups, and the hashed indices used for runtime lookup
//! - **Dictionary parsing**: a QuickFIX XML format loader
//!
//! A [`ProtocolDescr`] is built once per dictionary file and never mutated
//! afterwards, so it can be shared freely across threads by reference.

pub mod quickfix;
pub mod schema;

pub use quickfix::LoadError;
pub use schema::{FieldDescr, FieldKind, FieldType, MessageDescr, ProtocolDescr, Version};
