//! Typed tag values for FIX messages.
//!
//! This module provides [`TagValue`], the tagged union stored under every
//! tag number in a [`TagMap`](crate::TagMap). Scalar variants cover the FIX
//! primitive families; the `Group` variant holds the ordered occurrences of
//! a repeating group, one child map per occurrence.

use crate::tagmap::TagMap;
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed FIX tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// Signed integer value (Int, Length, SeqNum, NumInGroup, ...).
    Int(i64),
    /// Unsigned integer value.
    Uint(u64),
    /// Single character value (Char, Boolean).
    Char(char),
    /// Floating point value (Float, Price, Qty, Amt, Percentage).
    Float(f64),
    /// Fixed-point value preserving the caller's scale exactly.
    Decimal(Decimal),
    /// Textual value (String, Currency, UTCTimestamp, ...).
    Str(String),
    /// Raw binary payload (Data, XmlData).
    Data(Bytes),
    /// Repeating group occurrences, one child map each. The occurrence
    /// count is the wire value of the containing NumInGroup tag.
    Group(Vec<TagMap>),
}

impl TagValue {
    /// Returns the value as an i64, if it is an Int variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u64, if it is a Uint variant.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a char, if it is a Char variant.
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is a Float variant.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a Str variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as raw bytes, if it is a Data variant.
    #[must_use]
    pub fn as_data(&self) -> Option<&Bytes> {
        match self {
            Self::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the group occurrences, if this is a Group variant.
    #[must_use]
    pub fn as_group(&self) -> Option<&[TagMap]> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the group occurrences mutably, if this is a Group variant.
    #[must_use]
    pub fn as_group_mut(&mut self) -> Option<&mut Vec<TagMap>> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Returns true if this is a Group variant.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Uint(v) => write!(f, "{}", v),
            Self::Char(c) => write!(f, "{}", c),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Str(s) => write!(f, "{}", s),
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
            Self::Group(g) => write!(f, "<group of {}>", g.len()),
        }
    }
}
