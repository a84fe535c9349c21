//! FIX tag=value wire encoder.
//!
//! Renders a [`Message`] in the field order FIX fixes, not the order the
//! caller set tags in: BeginString (8), BodyLength (9), MsgType (35), then
//! every remaining tag in the message's insertion order, and finally
//! CheckSum (10). Repeating groups emit their count tag first, then each
//! occurrence's fields in that occurrence's insertion order, flattened.
//!
//! BodyLength counts every byte between its own trailing delimiter and the
//! first byte of the CheckSum field; CheckSum is the 3-digit byte sum
//! modulo 256 of everything before it, delimiters included.

use crate::checksum::{calculate_checksum, format_checksum};
use crate::message::{DescrScope, Message};
use bytes::{BufMut, BytesMut};
use memchr::memchr;
use smallvec::SmallVec;
use steelfix_core::error::EncodeError;
use steelfix_core::tagmap::TagMap;
use steelfix_core::value::TagValue;
use steelfix_dictionary::FieldKind;

/// SOH (Start of Header), the conventional FIX field delimiter.
pub const SOH: u8 = 0x01;

/// BeginString tag.
pub const TAG_BEGIN_STRING: u32 = 8;
/// BodyLength tag.
pub const TAG_BODY_LENGTH: u32 = 9;
/// MsgType tag.
pub const TAG_MSG_TYPE: u32 = 35;
/// CheckSum tag.
pub const TAG_CHECKSUM: u32 = 10;

/// FIX message encoder.
///
/// The delimiter defaults to SOH and can be swapped for a printable byte
/// when producing human-readable dumps.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    delimiter: u8,
}

impl Encoder {
    /// Creates an encoder using the SOH delimiter.
    #[must_use]
    pub const fn new() -> Self {
        Self { delimiter: SOH }
    }

    /// Creates an encoder using a custom field delimiter.
    #[must_use]
    pub const fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Encodes a message into a fresh buffer.
    ///
    /// # Errors
    /// [`EncodeError::NotNumInGroup`] when a stored group sits under a
    /// non-NumInGroup tag; [`EncodeError::EmbeddedDelimiter`] when a
    /// textual value contains the delimiter byte.
    pub fn encode(&self, msg: &Message<'_>) -> Result<BytesMut, EncodeError> {
        let mut body = BytesMut::with_capacity(256);

        // MsgType leads the body; prefer the stored tag 35 so unvalidated
        // callers can override it.
        let msg_type = msg
            .tags()
            .get(TAG_MSG_TYPE)
            .and_then(TagValue::as_str)
            .unwrap_or(&msg.descr().msg_type);
        self.put_raw(&mut body, TAG_MSG_TYPE, msg_type.as_bytes());

        self.encode_table(&mut body, msg.tags(), DescrScope::Root(msg.descr()), true)?;

        let begin_string = msg.protocol().version().begin_string();
        let mut out = BytesMut::with_capacity(body.len() + begin_string.len() + 24);
        self.put_raw(&mut out, TAG_BEGIN_STRING, begin_string.as_bytes());
        self.put_uint(&mut out, TAG_BODY_LENGTH, body.len() as u64);
        out.extend_from_slice(&body);

        let checksum = calculate_checksum(&out);
        self.put_raw(&mut out, TAG_CHECKSUM, &format_checksum(checksum));
        Ok(out)
    }

    /// Encodes a message into a caller-supplied buffer and returns the
    /// number of bytes written.
    ///
    /// # Errors
    /// [`EncodeError::NoMoreSpace`] with the required total length when
    /// the buffer is too small; the buffer is left untouched. Also any
    /// error [`Encoder::encode`] reports.
    pub fn encode_into(&self, msg: &Message<'_>, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let encoded = self.encode(msg)?;
        if buf.len() < encoded.len() {
            return Err(EncodeError::NoMoreSpace {
                required: encoded.len(),
                available: buf.len(),
            });
        }
        buf[..encoded.len()].copy_from_slice(&encoded);
        Ok(encoded.len())
    }

    fn encode_table(
        &self,
        out: &mut BytesMut,
        table: &TagMap,
        scope: DescrScope<'_>,
        at_root: bool,
    ) -> Result<(), EncodeError> {
        // Tags already rendered ahead of their insertion-order position
        // (Length companions pulled in front of their Data field).
        let mut pulled_forward: SmallVec<[u32; 4]> = SmallVec::new();
        let mut emitted: SmallVec<[u32; 16]> = SmallVec::new();

        for (tag, value) in table.iter() {
            if at_root
                && matches!(
                    tag,
                    TAG_BEGIN_STRING | TAG_BODY_LENGTH | TAG_MSG_TYPE | TAG_CHECKSUM
                )
            {
                continue;
            }
            if pulled_forward.contains(&tag) {
                continue;
            }
            match value {
                TagValue::Group(occurrences) => {
                    let descr = scope.find(tag);
                    if let Some(descr) = descr {
                        if descr.kind != FieldKind::NumInGroup {
                            return Err(EncodeError::NotNumInGroup { tag });
                        }
                    }
                    self.put_uint(out, tag, occurrences.len() as u64);
                    let sub_scope = descr.map_or(DescrScope::None, DescrScope::Group);
                    for occurrence in occurrences {
                        self.encode_table(out, occurrence, sub_scope, false)?;
                    }
                }
                TagValue::Data(payload) => {
                    // The companion Length must hit the wire before the
                    // payload even when it was set afterwards.
                    if let Some(length_tag) = scope.find(tag).and_then(|d| d.length_tag) {
                        if !emitted.contains(&length_tag) && !pulled_forward.contains(&length_tag) {
                            if let Some(length_value) = table.get(length_tag) {
                                self.put_scalar(out, length_tag, length_value)?;
                                pulled_forward.push(length_tag);
                            }
                        }
                    }
                    self.put_raw(out, tag, payload);
                }
                scalar => self.put_scalar(out, tag, scalar)?,
            }
            emitted.push(tag);
        }
        Ok(())
    }

    fn put_scalar(&self, out: &mut BytesMut, tag: u32, value: &TagValue) -> Result<(), EncodeError> {
        match value {
            TagValue::Int(v) => {
                let mut buf = itoa::Buffer::new();
                self.put_raw(out, tag, buf.format(*v).as_bytes());
            }
            TagValue::Uint(v) => {
                let mut buf = itoa::Buffer::new();
                self.put_raw(out, tag, buf.format(*v).as_bytes());
            }
            TagValue::Char(c) => {
                let mut buf = [0u8; 4];
                self.put_raw(out, tag, c.encode_utf8(&mut buf).as_bytes());
            }
            TagValue::Float(v) => self.put_raw(out, tag, v.to_string().as_bytes()),
            TagValue::Decimal(v) => self.put_raw(out, tag, v.to_string().as_bytes()),
            TagValue::Str(s) => {
                if memchr(self.delimiter, s.as_bytes()).is_some() {
                    return Err(EncodeError::EmbeddedDelimiter { tag });
                }
                self.put_raw(out, tag, s.as_bytes());
            }
            TagValue::Data(payload) => self.put_raw(out, tag, payload),
            // Groups are rendered by encode_table; a group reaching this
            // point sits under a tag the dictionary knows nothing about.
            TagValue::Group(_) => return Err(EncodeError::NotNumInGroup { tag }),
        }
        Ok(())
    }

    fn put_uint(&self, out: &mut BytesMut, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(out, tag, buf.format(value).as_bytes());
    }

    fn put_raw(&self, out: &mut BytesMut, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        out.put_slice(tag_buf.format(tag).as_bytes());
        out.put_u8(b'=');
        out.put_slice(value);
        out.put_u8(self.delimiter);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
