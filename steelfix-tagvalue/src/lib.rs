//! # Steelfix Tag-Value
//!
//! Schema-checked FIX message construction and tag=value wire encoding.
//!
//! This crate ties the descriptor graph of `steelfix-dictionary` to the
//! tag storage of `steelfix-core`:
//! - [`Message`]: typed setters and getters that resolve every tag through
//!   the message descriptor when validation is on
//! - [`GroupMut`]/[`GroupRef`]: handles on repeating-group occurrences,
//!   bound to the group's subfield index
//! - [`Encoder`]: renders a message with FIX framing: BeginString,
//!   BodyLength, body in insertion order, CheckSum

pub mod checksum;
pub mod encoder;
pub mod message;

#[cfg(test)]
mod tests_support;

pub use checksum::{calculate_checksum, format_checksum, parse_checksum};
pub use encoder::{Encoder, SOH, TAG_BEGIN_STRING, TAG_BODY_LENGTH, TAG_CHECKSUM, TAG_MSG_TYPE};
pub use message::{GroupMut, GroupRef, Message, MessageFlags};
