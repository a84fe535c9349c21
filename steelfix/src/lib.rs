//! # Steelfix
//!
//! Schema-driven construction, mutation and wire encoding of FIX
//! (Financial Information eXchange) tag-value messages, versions 4.0
//! through 5.0 SP2.
//!
//! A [`ProtocolDescr`](dictionary::ProtocolDescr) is loaded once from a
//! QuickFIX-style XML dictionary and shared read-only by every message
//! built against it. Messages store typed tag values, nested repeating
//! groups included, and validate each mutation against the descriptor
//! when asked to. The encoder renders standard FIX framing: BeginString,
//! BodyLength, body fields in insertion order, CheckSum.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use steelfix::prelude::*;
//!
//! let protocol = ProtocolDescr::from_file("FIX44.xml")?;
//! let mut order = Message::new(&protocol, "D", MessageFlags::VALIDATE)?;
//! order.set_str(49, "SENDER")?;
//! order.set_str(56, "TARGET")?;
//! order.set_str(55, "MSFT")?;
//! order.set_char(54, '1')?;
//! order.set_decimal(44, "42.50".parse()?)?;
//!
//! let wire = Encoder::new().encode(&order)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: tag values, tag maps, and error definitions
//! - [`dictionary`]: dictionary parsing and protocol descriptors
//! - [`tagvalue`]: message construction and wire encoding

pub mod core {
    //! Tag values, tag maps, and error definitions.
    pub use steelfix_core::*;
}

pub mod dictionary {
    //! Dictionary parsing and protocol descriptors.
    pub use steelfix_dictionary::*;
}

pub mod tagvalue {
    //! Message construction and wire encoding.
    pub use steelfix_tagvalue::*;
}

pub mod prelude {
    //! Convenience re-exports of the items most callers need.
    pub use steelfix_core::error::{EncodeError, FixError, MessageError};
    pub use steelfix_core::value::TagValue;
    pub use steelfix_dictionary::{FieldKind, ProtocolDescr, Version};
    pub use steelfix_tagvalue::{Encoder, Message, MessageFlags, SOH};
}
