//! Schema-checked FIX message construction.
//!
//! A [`Message`] pairs a [`MessageDescr`] resolved from a
//! [`ProtocolDescr`] with a root [`TagMap`] of typed values. When the
//! [`VALIDATE`](MessageFlags::VALIDATE) flag is set, every mutation first
//! resolves the field through the descriptor (root tags through the
//! message's field index, group members through the owning group's
//! subfield index) and checks the setter against the field kind.
//! Descriptor lookup always completes before the tag map is touched, so a
//! failed operation leaves the message exactly as it was.
//!
//! Repeating groups are worked through handles: [`Message::add_group`]
//! appends an occurrence and returns a [`GroupMut`] bound to the group's
//! subfield index, which accepts the same setters (and nested group
//! operations) as the message itself.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::ops::{BitOr, BitOrAssign};
use steelfix_core::error::MessageError;
use steelfix_core::tagmap::TagMap;
use steelfix_core::value::TagValue;
use steelfix_dictionary::{FieldDescr, FieldKind, MessageDescr, ProtocolDescr};

use crate::encoder::TAG_MSG_TYPE;

/// Per-message behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageFlags(u32);

impl MessageFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Check every mutation against the message descriptor.
    pub const VALIDATE: Self = Self(0x01);

    /// Returns true if all bits of `other` are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MessageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MessageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Descriptor context a tag map is validated against.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DescrScope<'d> {
    /// Root of a validated message: tags resolve through the message's
    /// field index.
    Root(&'d MessageDescr),
    /// One occurrence of a validated group: tags resolve through the
    /// group's subfield index.
    Group(&'d FieldDescr),
    /// Validation off; nothing resolves and nothing is checked.
    None,
}

impl<'d> DescrScope<'d> {
    pub(crate) fn find(&self, tag: u32) -> Option<&'d FieldDescr> {
        match self {
            Self::Root(descr) => descr.field(tag),
            Self::Group(descr) => descr.subfield(tag),
            Self::None => None,
        }
    }

    const fn validating(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Resolves the descriptor for a setter, checking kind compatibility.
    ///
    /// Completes before any mutation; `Ok(None)` means validation is off.
    fn check(
        &self,
        tag: u32,
        accepts: impl FnOnce(FieldKind) -> bool,
    ) -> Result<Option<&'d FieldDescr>, MessageError> {
        if !self.validating() {
            return Ok(None);
        }
        let descr = self.find(tag).ok_or(MessageError::UnknownField { tag })?;
        if accepts(descr.kind) {
            Ok(Some(descr))
        } else {
            Err(MessageError::WrongType { tag })
        }
    }

    /// Resolves the descriptor of a group tag.
    fn check_group(&self, tag: u32) -> Result<Self, MessageError> {
        if !self.validating() {
            return Ok(Self::None);
        }
        let descr = self.find(tag).ok_or(MessageError::UnknownField { tag })?;
        if descr.is_group() {
            Ok(Self::Group(descr))
        } else {
            Err(MessageError::NotGroup { tag })
        }
    }
}

/// A FIX message bound to its descriptor.
#[derive(Debug)]
pub struct Message<'d> {
    protocol: &'d ProtocolDescr,
    descr: &'d MessageDescr,
    root: TagMap,
    flags: MessageFlags,
}

impl<'d> Message<'d> {
    /// Creates a message of the given type.
    ///
    /// With [`MessageFlags::VALIDATE`] the required tag 35 is installed on
    /// the root map automatically.
    ///
    /// # Errors
    /// [`MessageError::UnknownMsg`] if the protocol defines no message
    /// with this type.
    pub fn new(
        protocol: &'d ProtocolDescr,
        msg_type: &str,
        flags: MessageFlags,
    ) -> Result<Self, MessageError> {
        let descr = protocol
            .message(msg_type)
            .ok_or_else(|| MessageError::UnknownMsg {
                msg_type: msg_type.to_string(),
            })?;
        let mut root = TagMap::new();
        if flags.contains(MessageFlags::VALIDATE) {
            root.set(TAG_MSG_TYPE, TagValue::Str(descr.msg_type.clone()));
        }
        Ok(Self {
            protocol,
            descr,
            root,
            flags,
        })
    }

    /// Returns the protocol this message was built against.
    #[inline]
    #[must_use]
    pub const fn protocol(&self) -> &'d ProtocolDescr {
        self.protocol
    }

    /// Returns the message descriptor.
    #[inline]
    #[must_use]
    pub const fn descr(&self) -> &'d MessageDescr {
        self.descr
    }

    /// Returns the message flags.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> MessageFlags {
        self.flags
    }

    /// Returns the root tag map.
    #[inline]
    #[must_use]
    pub const fn tags(&self) -> &TagMap {
        &self.root
    }

    fn scope(&self) -> DescrScope<'d> {
        if self.flags.contains(MessageFlags::VALIDATE) {
            DescrScope::Root(self.descr)
        } else {
            DescrScope::None
        }
    }

    fn root_mut(&mut self) -> GroupMut<'_, 'd> {
        GroupMut {
            scope: self.scope(),
            table: &mut self.root,
        }
    }

    fn root_ref(&self) -> GroupRef<'_, 'd> {
        GroupRef {
            scope: self.scope(),
            table: &self.root,
        }
    }

    /// Sets a textual field.
    ///
    /// # Errors
    /// See [`GroupMut::set_str`].
    pub fn set_str(&mut self, tag: u32, value: &str) -> Result<(), MessageError> {
        self.root_mut().set_str(tag, value)
    }

    /// Sets a signed integer field.
    pub fn set_i64(&mut self, tag: u32, value: i64) -> Result<(), MessageError> {
        self.root_mut().set_i64(tag, value)
    }

    /// Sets an unsigned integer field.
    pub fn set_u64(&mut self, tag: u32, value: u64) -> Result<(), MessageError> {
        self.root_mut().set_u64(tag, value)
    }

    /// Sets a floating point field.
    pub fn set_f64(&mut self, tag: u32, value: f64) -> Result<(), MessageError> {
        self.root_mut().set_f64(tag, value)
    }

    /// Sets a fixed-point field, preserving the value's scale on the wire.
    pub fn set_decimal(&mut self, tag: u32, value: Decimal) -> Result<(), MessageError> {
        self.root_mut().set_decimal(tag, value)
    }

    /// Sets a single-character field.
    pub fn set_char(&mut self, tag: u32, value: char) -> Result<(), MessageError> {
        self.root_mut().set_char(tag, value)
    }

    /// Sets a boolean field (rendered `Y`/`N`).
    pub fn set_bool(&mut self, tag: u32, value: bool) -> Result<(), MessageError> {
        self.root_mut().set_bool(tag, value)
    }

    /// Sets a UTC timestamp field (rendered `YYYYMMDD-HH:MM:SS.sss`).
    pub fn set_timestamp(&mut self, tag: u32, value: DateTime<Utc>) -> Result<(), MessageError> {
        self.root_mut().set_timestamp(tag, value)
    }

    /// Sets a raw data field.
    ///
    /// The companion Length tag, when the dictionary defines one, is set
    /// to the payload length ahead of the data entry so it precedes the
    /// payload on the wire.
    pub fn set_data(&mut self, tag: u32, value: Bytes) -> Result<(), MessageError> {
        self.root_mut().set_data(tag, value)
    }

    /// Gets a textual field.
    pub fn get_str(&self, tag: u32) -> Result<&str, MessageError> {
        self.root_ref().get_str(tag)
    }

    /// Gets a signed integer field.
    pub fn get_i64(&self, tag: u32) -> Result<i64, MessageError> {
        self.root_ref().get_i64(tag)
    }

    /// Gets an unsigned integer field.
    pub fn get_u64(&self, tag: u32) -> Result<u64, MessageError> {
        self.root_ref().get_u64(tag)
    }

    /// Gets a floating point field.
    pub fn get_f64(&self, tag: u32) -> Result<f64, MessageError> {
        self.root_ref().get_f64(tag)
    }

    /// Gets a fixed-point field.
    pub fn get_decimal(&self, tag: u32) -> Result<Decimal, MessageError> {
        self.root_ref().get_decimal(tag)
    }

    /// Gets a single-character field.
    pub fn get_char(&self, tag: u32) -> Result<char, MessageError> {
        self.root_ref().get_char(tag)
    }

    /// Gets a boolean field.
    pub fn get_bool(&self, tag: u32) -> Result<bool, MessageError> {
        self.root_ref().get_bool(tag)
    }

    /// Gets a raw data field.
    pub fn get_data(&self, tag: u32) -> Result<&Bytes, MessageError> {
        self.root_ref().get_data(tag)
    }

    /// Removes a field. Returns whether it was set.
    pub fn remove(&mut self, tag: u32) -> bool {
        self.root.remove(tag).is_some()
    }

    /// Appends an occurrence to the repeating group at `tag` and returns
    /// a handle bound to the group's subfield layout.
    ///
    /// # Errors
    /// See [`GroupMut::add_group`].
    pub fn add_group(&mut self, tag: u32) -> Result<GroupMut<'_, 'd>, MessageError> {
        let scope = self.scope();
        let sub = scope.check_group(tag)?;
        let table = self.root.add_occurrence(tag)?;
        Ok(GroupMut { scope: sub, table })
    }

    /// Returns the group occurrence at zero-based `index`.
    pub fn group(&self, tag: u32, index: usize) -> Result<GroupRef<'_, 'd>, MessageError> {
        self.root_ref().group(tag, index)
    }

    /// Returns the group occurrence at zero-based `index`, mutably.
    pub fn group_mut(&mut self, tag: u32, index: usize) -> Result<GroupMut<'_, 'd>, MessageError> {
        let scope = self.scope();
        let sub = scope.check_group(tag)?;
        let table = group_occurrence_mut(&mut self.root, tag, index)?;
        Ok(GroupMut { scope: sub, table })
    }

    /// Returns the number of occurrences stored at `tag`.
    #[must_use]
    pub fn group_count(&self, tag: u32) -> usize {
        self.root.occurrence_count(tag)
    }

    /// Removes the group occurrence at zero-based `index`. Removing the
    /// last occurrence removes the group tag entirely.
    ///
    /// # Errors
    /// See [`GroupMut::remove_group`].
    pub fn remove_group(&mut self, tag: u32, index: usize) -> Result<(), MessageError> {
        self.root_mut().remove_group(tag, index)
    }
}

fn check_stored_group(table: &TagMap, tag: u32) -> Result<(), MessageError> {
    match table.get(tag) {
        None => Err(MessageError::NotFound { tag }),
        Some(value) if !value.is_group() => Err(MessageError::NotGroup { tag }),
        Some(_) => Ok(()),
    }
}

fn group_occurrence_mut<'m>(
    table: &'m mut TagMap,
    tag: u32,
    index: usize,
) -> Result<&'m mut TagMap, MessageError> {
    check_stored_group(table, tag)?;
    table
        .occurrence_mut(tag, index)
        .ok_or(MessageError::NotFound { tag })
}

/// Writes a scalar into a table, guarding stored groups against being
/// silently overwritten.
fn write_scalar(table: &mut TagMap, tag: u32, value: TagValue) -> Result<(), MessageError> {
    if table.get(tag).is_some_and(TagValue::is_group) {
        return Err(MessageError::InvalidArgument(format!(
            "tag {tag} holds a repeating group"
        )));
    }
    table.set(tag, value);
    Ok(())
}

fn read(table: &TagMap, tag: u32) -> Result<&TagValue, MessageError> {
    table.get(tag).ok_or(MessageError::NotFound { tag })
}

/// Mutable handle on one tag map (the message root or one group
/// occurrence), carrying the descriptor context mutations are checked
/// against.
#[derive(Debug)]
pub struct GroupMut<'m, 'd> {
    scope: DescrScope<'d>,
    table: &'m mut TagMap,
}

impl<'m, 'd> GroupMut<'m, 'd> {
    /// Sets a textual field.
    ///
    /// # Errors
    /// [`MessageError::UnknownField`] when validating and the tag is not
    /// in scope; [`MessageError::WrongType`] when the field kind is not
    /// textual; [`MessageError::InvalidArgument`] when the tag already
    /// holds a repeating group.
    pub fn set_str(&mut self, tag: u32, value: &str) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_textual())?;
        write_scalar(self.table, tag, TagValue::Str(value.to_string()))
    }

    /// Sets a signed integer field.
    pub fn set_i64(&mut self, tag: u32, value: i64) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_int())?;
        write_scalar(self.table, tag, TagValue::Int(value))
    }

    /// Sets an unsigned integer field.
    pub fn set_u64(&mut self, tag: u32, value: u64) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_int())?;
        write_scalar(self.table, tag, TagValue::Uint(value))
    }

    /// Sets a floating point field.
    pub fn set_f64(&mut self, tag: u32, value: f64) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_float())?;
        write_scalar(self.table, tag, TagValue::Float(value))
    }

    /// Sets a fixed-point field, preserving the value's scale on the wire.
    pub fn set_decimal(&mut self, tag: u32, value: Decimal) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_float())?;
        write_scalar(self.table, tag, TagValue::Decimal(value))
    }

    /// Sets a single-character field.
    pub fn set_char(&mut self, tag: u32, value: char) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_char())?;
        write_scalar(self.table, tag, TagValue::Char(value))
    }

    /// Sets a boolean field (rendered `Y`/`N`).
    pub fn set_bool(&mut self, tag: u32, value: bool) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_char())?;
        write_scalar(self.table, tag, TagValue::Char(if value { 'Y' } else { 'N' }))
    }

    /// Sets a UTC timestamp field (rendered `YYYYMMDD-HH:MM:SS.sss`).
    pub fn set_timestamp(&mut self, tag: u32, value: DateTime<Utc>) -> Result<(), MessageError> {
        self.scope.check(tag, |k: FieldKind| k.is_timestamp())?;
        let rendered = value.format("%Y%m%d-%H:%M:%S%.3f").to_string();
        write_scalar(self.table, tag, TagValue::Str(rendered))
    }

    /// Sets a raw data field, recording the companion Length tag first
    /// when the dictionary defines one.
    pub fn set_data(&mut self, tag: u32, value: Bytes) -> Result<(), MessageError> {
        let descr = self.scope.check(tag, |k: FieldKind| k.is_data())?;
        if let Some(length_tag) = descr.and_then(|d| d.length_tag) {
            write_scalar(self.table, length_tag, TagValue::Int(value.len() as i64))?;
        }
        write_scalar(self.table, tag, TagValue::Data(value))
    }

    /// Gets a textual field.
    pub fn get_str(&self, tag: u32) -> Result<&str, MessageError> {
        self.as_ref().get_str(tag)
    }

    /// Gets a signed integer field.
    pub fn get_i64(&self, tag: u32) -> Result<i64, MessageError> {
        self.as_ref().get_i64(tag)
    }

    /// Gets an unsigned integer field.
    pub fn get_u64(&self, tag: u32) -> Result<u64, MessageError> {
        self.as_ref().get_u64(tag)
    }

    /// Gets a floating point field.
    pub fn get_f64(&self, tag: u32) -> Result<f64, MessageError> {
        self.as_ref().get_f64(tag)
    }

    /// Gets a fixed-point field.
    pub fn get_decimal(&self, tag: u32) -> Result<Decimal, MessageError> {
        self.as_ref().get_decimal(tag)
    }

    /// Gets a single-character field.
    pub fn get_char(&self, tag: u32) -> Result<char, MessageError> {
        self.as_ref().get_char(tag)
    }

    /// Gets a boolean field.
    pub fn get_bool(&self, tag: u32) -> Result<bool, MessageError> {
        self.as_ref().get_bool(tag)
    }

    /// Gets a raw data field.
    pub fn get_data(&self, tag: u32) -> Result<&Bytes, MessageError> {
        read(self.table, tag)?
            .as_data()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Removes a field. Returns whether it was set.
    pub fn remove(&mut self, tag: u32) -> bool {
        self.table.remove(tag).is_some()
    }

    /// Appends an occurrence to the nested group at `tag`.
    ///
    /// # Errors
    /// [`MessageError::UnknownField`] when validating and the tag is not
    /// in scope; [`MessageError::NotGroup`] when the descriptor carries no
    /// subfields; [`MessageError::InvalidArgument`] when the stored value
    /// is a scalar.
    pub fn add_group(&mut self, tag: u32) -> Result<GroupMut<'_, 'd>, MessageError> {
        let sub = self.scope.check_group(tag)?;
        let table = self.table.add_occurrence(tag)?;
        Ok(GroupMut { scope: sub, table })
    }

    /// Returns the nested group occurrence at zero-based `index`, mutably.
    pub fn group_mut(&mut self, tag: u32, index: usize) -> Result<GroupMut<'_, 'd>, MessageError> {
        let sub = self.scope.check_group(tag)?;
        let table = group_occurrence_mut(self.table, tag, index)?;
        Ok(GroupMut { scope: sub, table })
    }

    /// Returns the number of occurrences stored at `tag`.
    #[must_use]
    pub fn group_count(&self, tag: u32) -> usize {
        self.table.occurrence_count(tag)
    }

    /// Removes the nested group occurrence at zero-based `index`.
    ///
    /// # Errors
    /// [`MessageError::UnknownField`]/[`MessageError::NotGroup`] per the
    /// usual lookup discipline; [`MessageError::NotFound`] when the tag is
    /// unset or the index is out of range.
    pub fn remove_group(&mut self, tag: u32, index: usize) -> Result<(), MessageError> {
        self.scope.check_group(tag)?;
        check_stored_group(self.table, tag)?;
        if self.table.remove_occurrence(tag, index) {
            Ok(())
        } else {
            Err(MessageError::NotFound { tag })
        }
    }

    /// Borrows this handle immutably.
    #[must_use]
    pub fn as_ref(&self) -> GroupRef<'_, 'd> {
        GroupRef {
            scope: self.scope,
            table: self.table,
        }
    }
}

/// Immutable handle on one tag map.
#[derive(Debug, Clone, Copy)]
pub struct GroupRef<'m, 'd> {
    scope: DescrScope<'d>,
    table: &'m TagMap,
}

impl<'m, 'd> GroupRef<'m, 'd> {
    /// Gets a textual field.
    ///
    /// # Errors
    /// [`MessageError::NotFound`] when the tag is unset;
    /// [`MessageError::WrongType`] when the stored variant differs.
    pub fn get_str(&self, tag: u32) -> Result<&'m str, MessageError> {
        read(self.table, tag)?
            .as_str()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets a signed integer field.
    pub fn get_i64(&self, tag: u32) -> Result<i64, MessageError> {
        read(self.table, tag)?
            .as_i64()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets an unsigned integer field.
    pub fn get_u64(&self, tag: u32) -> Result<u64, MessageError> {
        read(self.table, tag)?
            .as_u64()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets a floating point field.
    pub fn get_f64(&self, tag: u32) -> Result<f64, MessageError> {
        read(self.table, tag)?
            .as_f64()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets a fixed-point field.
    pub fn get_decimal(&self, tag: u32) -> Result<Decimal, MessageError> {
        read(self.table, tag)?
            .as_decimal()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets a single-character field.
    pub fn get_char(&self, tag: u32) -> Result<char, MessageError> {
        read(self.table, tag)?
            .as_char()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Gets a boolean field stored as `Y`/`N`.
    pub fn get_bool(&self, tag: u32) -> Result<bool, MessageError> {
        match self.get_char(tag)? {
            'Y' => Ok(true),
            'N' => Ok(false),
            _ => Err(MessageError::WrongType { tag }),
        }
    }

    /// Gets a raw data field.
    pub fn get_data(&self, tag: u32) -> Result<&'m Bytes, MessageError> {
        read(self.table, tag)?
            .as_data()
            .ok_or(MessageError::WrongType { tag })
    }

    /// Returns the nested group occurrence at zero-based `index`.
    pub fn group(&self, tag: u32, index: usize) -> Result<GroupRef<'m, 'd>, MessageError> {
        let sub = self.scope.check_group(tag)?;
        check_stored_group(self.table, tag)?;
        self.table
            .occurrence(tag, index)
            .map(|table| GroupRef { scope: sub, table })
            .ok_or(MessageError::NotFound { tag })
    }

    /// Returns the number of occurrences stored at `tag`.
    #[must_use]
    pub fn group_count(&self, tag: u32) -> usize {
        self.table.occurrence_count(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::{test_protocol, TAG_CL_ORD_ID, TAG_ENCRYPT_METHOD};

    fn validated<'d>(protocol: &'d ProtocolDescr, msg_type: &str) -> Message<'d> {
        Message::new(protocol, msg_type, MessageFlags::VALIDATE).unwrap()
    }

    #[test]
    fn test_create_installs_msg_type() {
        let protocol = test_protocol();
        let msg = validated(&protocol, "D");
        assert_eq!(msg.get_str(35).unwrap(), "D");
        assert_eq!(msg.descr().name, "NewOrderSingle");
    }

    #[test]
    fn test_create_unvalidated_leaves_root_empty() {
        let protocol = test_protocol();
        let msg = Message::new(&protocol, "D", MessageFlags::NONE).unwrap();
        assert!(msg.tags().is_empty());
    }

    #[test]
    fn test_create_unknown_msg_type() {
        let protocol = test_protocol();
        assert!(matches!(
            Message::new(&protocol, "ZZ", MessageFlags::VALIDATE),
            Err(MessageError::UnknownMsg { msg_type }) if msg_type == "ZZ"
        ));
    }

    #[test]
    fn test_scalar_round_trips() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");

        msg.set_str(TAG_CL_ORD_ID, "ORD1").unwrap();
        msg.set_i64(34, 17).unwrap();
        msg.set_char(54, '1').unwrap();
        msg.set_f64(44, 42.5).unwrap();
        msg.set_f64(38, 100.0).unwrap();

        assert_eq!(msg.get_str(TAG_CL_ORD_ID).unwrap(), "ORD1");
        assert_eq!(msg.get_i64(34).unwrap(), 17);
        assert_eq!(msg.get_char(54).unwrap(), '1');
        assert_eq!(msg.get_f64(44).unwrap(), 42.5);
        assert_eq!(msg.get_f64(38).unwrap(), 100.0);
    }

    #[test]
    fn test_decimal_round_trip_preserves_scale() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        msg.set_decimal(44, "42.50".parse().unwrap()).unwrap();
        assert_eq!(msg.get_decimal(44).unwrap().to_string(), "42.50");
    }

    #[test]
    fn test_unknown_field_rejected_when_validating() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        assert_eq!(
            msg.set_str(9999, "x"),
            Err(MessageError::UnknownField { tag: 9999 })
        );
        // Validation off: arbitrary tags are accepted.
        let mut free = Message::new(&protocol, "D", MessageFlags::NONE).unwrap();
        free.set_str(9999, "x").unwrap();
        assert_eq!(free.get_str(9999).unwrap(), "x");
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "A");
        // EncryptMethod is an Int field; the float setter must not take it.
        assert_eq!(
            msg.set_f64(TAG_ENCRYPT_METHOD, 0.0),
            Err(MessageError::WrongType {
                tag: TAG_ENCRYPT_METHOD
            })
        );
        // And the failed call left nothing behind.
        assert_eq!(
            msg.get_i64(TAG_ENCRYPT_METHOD),
            Err(MessageError::NotFound {
                tag: TAG_ENCRYPT_METHOD
            })
        );
        msg.set_i64(TAG_ENCRYPT_METHOD, 0).unwrap();
    }

    #[test]
    fn test_getter_variant_mismatch() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        msg.set_u64(34, 100).unwrap();
        assert_eq!(msg.get_i64(34), Err(MessageError::WrongType { tag: 34 }));
        assert_eq!(msg.get_u64(34).unwrap(), 100);
    }

    #[test]
    fn test_bool_round_trip() {
        let protocol = test_protocol();
        let mut msg = Message::new(&protocol, "D", MessageFlags::NONE).unwrap();
        msg.set_bool(141, true).unwrap();
        assert_eq!(msg.get_char(141).unwrap(), 'Y');
        assert!(msg.get_bool(141).unwrap());
        msg.set_bool(141, false).unwrap();
        assert!(!msg.get_bool(141).unwrap());
    }

    #[test]
    fn test_timestamp_formatting() {
        use chrono::TimeZone;

        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        let when = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 5).unwrap();
        msg.set_timestamp(60, when).unwrap();
        assert_eq!(msg.get_str(60).unwrap(), "20240315-09:30:05.000");

        // TransactTime is a timestamp; OrderQty is not.
        assert_eq!(
            msg.set_timestamp(38, when),
            Err(MessageError::WrongType { tag: 38 })
        );
    }

    #[test]
    fn test_remove_twice() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        msg.set_str(TAG_CL_ORD_ID, "ORD1").unwrap();
        assert!(msg.remove(TAG_CL_ORD_ID));
        assert!(!msg.remove(TAG_CL_ORD_ID));
    }

    #[test]
    fn test_group_add_and_read_back() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");

        for entry_type in ['0', '1'] {
            let mut occurrence = msg.add_group(267).unwrap();
            occurrence.set_char(269, entry_type).unwrap();
        }

        assert_eq!(msg.group_count(267), 2);
        assert_eq!(msg.group(267, 0).unwrap().get_char(269).unwrap(), '0');
        assert_eq!(msg.group(267, 1).unwrap().get_char(269).unwrap(), '1');
        assert!(matches!(
            msg.group(267, 2),
            Err(MessageError::NotFound { tag: 267 })
        ));
    }

    #[test]
    fn test_group_member_validation() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");
        let mut occurrence = msg.add_group(267).unwrap();

        // 269 belongs to the group; 55 does not.
        occurrence.set_char(269, '0').unwrap();
        assert_eq!(
            occurrence.set_str(55, "MSFT"),
            Err(MessageError::UnknownField { tag: 55 })
        );
    }

    #[test]
    fn test_nested_component_fields_in_group() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");
        let mut occurrence = msg.add_group(146).unwrap();
        occurrence.set_str(55, "MSFT").unwrap();
        occurrence.set_str(48, "US5949181045").unwrap();

        assert_eq!(msg.group(146, 0).unwrap().get_str(55).unwrap(), "MSFT");
    }

    #[test]
    fn test_add_group_on_scalar_field() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "D");
        assert_eq!(
            msg.add_group(TAG_CL_ORD_ID).err(),
            Some(MessageError::NotGroup {
                tag: TAG_CL_ORD_ID
            })
        );
    }

    #[test]
    fn test_add_group_unvalidated_over_scalar() {
        let protocol = test_protocol();
        let mut msg = Message::new(&protocol, "D", MessageFlags::NONE).unwrap();
        msg.set_i64(38, 100).unwrap();
        assert!(matches!(
            msg.add_group(38),
            Err(MessageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_scalar_set_over_group_rejected() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");
        msg.add_group(267).unwrap().set_char(269, '0').unwrap();
        assert!(matches!(
            msg.set_i64(267, 5),
            Err(MessageError::InvalidArgument(_))
        ));
        assert_eq!(msg.group_count(267), 1);
    }

    #[test]
    fn test_remove_group_occurrences() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");
        for entry_type in ['0', '1', '2'] {
            msg.add_group(267).unwrap().set_char(269, entry_type).unwrap();
        }

        msg.remove_group(267, 1).unwrap();
        assert_eq!(msg.group_count(267), 2);
        assert_eq!(msg.group(267, 1).unwrap().get_char(269).unwrap(), '2');

        msg.remove_group(267, 0).unwrap();
        msg.remove_group(267, 0).unwrap();
        // The last removal drops the tag itself.
        assert!(msg.tags().get(267).is_none());
        assert!(matches!(
            msg.remove_group(267, 0),
            Err(MessageError::NotFound { tag: 267 })
        ));
    }

    #[test]
    fn test_group_mut_rewrites_occurrence() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "V");
        msg.add_group(267).unwrap().set_char(269, '0').unwrap();

        msg.group_mut(267, 0).unwrap().set_char(269, '9').unwrap();
        assert_eq!(msg.group(267, 0).unwrap().get_char(269).unwrap(), '9');
    }

    #[test]
    fn test_set_data_records_companion_length() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "A");
        msg.set_data(96, Bytes::from_static(b"abcde")).unwrap();

        assert_eq!(msg.get_i64(95).unwrap(), 5);
        assert_eq!(msg.get_data(96).unwrap().as_ref(), b"abcde");

        // The length entry precedes the data entry in insertion order.
        let order: Vec<u32> = msg.tags().iter().map(|(t, _)| t).collect();
        let pos_95 = order.iter().position(|&t| t == 95).unwrap();
        let pos_96 = order.iter().position(|&t| t == 96).unwrap();
        assert!(pos_95 < pos_96);
    }

    #[test]
    fn test_set_data_kind_checked() {
        let protocol = test_protocol();
        let mut msg = validated(&protocol, "A");
        assert_eq!(
            msg.set_data(TAG_ENCRYPT_METHOD, Bytes::from_static(b"x")),
            Err(MessageError::WrongType {
                tag: TAG_ENCRYPT_METHOD
            })
        );
    }
}
