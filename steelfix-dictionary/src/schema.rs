//! Schema definitions for FIX protocol descriptors.
//!
//! This module defines the descriptor graph a dictionary file resolves to:
//! - [`FieldType`]: one record per tag number, with name and kind
//! - [`FieldDescr`]: a field's position in a message, with required-flag
//!   and, for repeating groups, the expanded subfield layout
//! - [`MessageDescr`]: a message layout with its hashed field index
//! - [`ProtocolDescr`]: the immutable root owning every record
//!
//! Records live in flat arenas and are addressed by index; lookups go
//! through fixed bucket arrays (never resized) so field resolution stays
//! O(1) average on the hot path.

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Bucket count for the field-type name index.
pub const FIELD_TYPE_BUCKETS: usize = 64;

/// Bucket count for the message-type index.
pub const MSG_BUCKETS: usize = 64;

/// Bucket count for per-message and per-group tag indices.
pub const FIELD_DESCR_BUCKETS: usize = 16;

fn name_bucket(name: &str, buckets: usize) -> usize {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    hasher.finish() as usize % buckets
}

/// FIX protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// FIX 4.0
    Fix40,
    /// FIX 4.1
    Fix41,
    /// FIX 4.2
    Fix42,
    /// FIX 4.3
    Fix43,
    /// FIX 4.4
    Fix44,
    /// FIX 5.0
    Fix50,
    /// FIX 5.0 SP1
    Fix50Sp1,
    /// FIX 5.0 SP2
    Fix50Sp2,
    /// FIXT 1.1 (transport layer for FIX 5.0+)
    Fixt11,
}

impl Version {
    /// Returns the BeginString value (tag 8) for this version.
    #[must_use]
    pub const fn begin_string(&self) -> &'static str {
        match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fix50 | Self::Fix50Sp1 | Self::Fix50Sp2 | Self::Fixt11 => "FIXT.1.1",
        }
    }
}

impl FromStr for Version {
    type Err = ();

    /// Parses the `version` attribute spelling (e.g. `FIX.4.4`,
    /// `FIX.5.0SP2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "FIX.4.0" => Self::Fix40,
            "FIX.4.1" => Self::Fix41,
            "FIX.4.2" => Self::Fix42,
            "FIX.4.3" => Self::Fix43,
            "FIX.4.4" => Self::Fix44,
            "FIX.5.0" => Self::Fix50,
            "FIX.5.0SP1" | "FIX.5.0-SP1" => Self::Fix50Sp1,
            "FIX.5.0SP2" | "FIX.5.0-SP2" => Self::Fix50Sp2,
            "FIXT.1.1" => Self::Fixt11,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fix50 => "FIX.5.0",
            Self::Fix50Sp1 => "FIX.5.0SP1",
            Self::Fix50Sp2 => "FIX.5.0SP2",
            Self::Fixt11 => "FIXT.1.1",
        };
        write!(f, "{}", name)
    }
}

/// FIX field data kind, as named by the `type` attribute of a dictionary
/// `<field>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Integer value.
    Int,
    /// Length field (byte count of a companion data field).
    Length,
    /// Sequence number.
    SeqNum,
    /// Number of entries in a repeating group.
    NumInGroup,
    /// Tag number reference.
    TagNum,
    /// Day of month (1-31).
    DayOfMonth,
    /// Floating point number.
    Float,
    /// Quantity.
    Qty,
    /// Price.
    Price,
    /// Price offset.
    PriceOffset,
    /// Amount (price * quantity).
    Amt,
    /// Percentage.
    Percentage,
    /// Single character.
    Char,
    /// Boolean (Y/N).
    Boolean,
    /// String.
    String,
    /// Multiple character value (space-separated).
    MultipleCharValue,
    /// Multiple string value (space-separated).
    MultipleStringValue,
    /// Country code (ISO 3166).
    Country,
    /// Currency code (ISO 4217).
    Currency,
    /// Exchange code (ISO 10383 MIC).
    Exchange,
    /// Month-year (YYYYMM, optionally with day or week).
    MonthYear,
    /// UTC timestamp.
    UtcTimestamp,
    /// UTC time only.
    UtcTimeOnly,
    /// UTC date only.
    UtcDateOnly,
    /// Local market date.
    LocalMktDate,
    /// Local market time.
    LocalMktTime,
    /// Time of day with timezone.
    TzTimeOnly,
    /// Timestamp with timezone.
    TzTimestamp,
    /// Raw data (binary, length-prefixed by a companion Length field).
    Data,
    /// XML data.
    XmlData,
    /// Language code (ISO 639-1).
    Language,
}

impl FromStr for FieldKind {
    type Err = std::convert::Infallible;

    /// Creates a FieldKind from a dictionary type name. Unrecognised names
    /// map to `String`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "INT" => Self::Int,
            "LENGTH" => Self::Length,
            "SEQNUM" => Self::SeqNum,
            "NUMINGROUP" => Self::NumInGroup,
            "TAGNUM" => Self::TagNum,
            "DAYOFMONTH" => Self::DayOfMonth,
            "FLOAT" => Self::Float,
            "QTY" | "QUANTITY" => Self::Qty,
            "PRICE" => Self::Price,
            "PRICEOFFSET" => Self::PriceOffset,
            "AMT" | "AMOUNT" => Self::Amt,
            "PERCENTAGE" => Self::Percentage,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "STRING" => Self::String,
            "MULTIPLECHARVALUE" => Self::MultipleCharValue,
            "MULTIPLESTRINGVALUE" | "MULTIPLEVALUESTRING" => Self::MultipleStringValue,
            "COUNTRY" => Self::Country,
            "CURRENCY" => Self::Currency,
            "EXCHANGE" => Self::Exchange,
            "MONTHYEAR" => Self::MonthYear,
            "UTCTIMESTAMP" => Self::UtcTimestamp,
            "UTCTIMEONLY" => Self::UtcTimeOnly,
            "UTCDATEONLY" | "UTCDATE" => Self::UtcDateOnly,
            "LOCALMKTDATE" => Self::LocalMktDate,
            "LOCALMKTTIME" => Self::LocalMktTime,
            "TZTIMEONLY" => Self::TzTimeOnly,
            "TZTIMESTAMP" => Self::TzTimestamp,
            "DATA" => Self::Data,
            "XMLDATA" => Self::XmlData,
            "LANGUAGE" => Self::Language,
            _ => Self::String,
        })
    }
}

impl FieldKind {
    /// Returns true if integer setters/getters apply to this kind.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Length
                | Self::SeqNum
                | Self::NumInGroup
                | Self::TagNum
                | Self::DayOfMonth
        )
    }

    /// Returns true if fractional-numeric setters/getters apply.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            Self::Float
                | Self::Qty
                | Self::Price
                | Self::PriceOffset
                | Self::Amt
                | Self::Percentage
        )
    }

    /// Returns true if single-character setters/getters apply.
    #[must_use]
    pub const fn is_char(&self) -> bool {
        matches!(self, Self::Char | Self::Boolean)
    }

    /// Returns true if this kind renders as free text on the wire.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::MultipleCharValue
                | Self::MultipleStringValue
                | Self::Country
                | Self::Currency
                | Self::Exchange
                | Self::MonthYear
                | Self::Language
        ) || self.is_timestamp()
    }

    /// Returns true if this kind carries a raw binary payload.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data | Self::XmlData)
    }

    /// Returns true if this kind represents a date or time.
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(
            self,
            Self::UtcTimestamp
                | Self::UtcTimeOnly
                | Self::UtcDateOnly
                | Self::LocalMktDate
                | Self::LocalMktTime
                | Self::TzTimeOnly
                | Self::TzTimestamp
        )
    }
}

/// One field-type record per tag number, owned by the protocol arena and
/// immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Field tag number.
    pub num: u32,
    /// Field name, unique per dictionary.
    pub name: String,
    /// Field data kind.
    pub kind: FieldKind,
}

/// Hashed tag index over a `FieldDescr` slice.
///
/// Buckets are chosen by direct modulus of the tag number and chain slice
/// indices; the bucket count is fixed.
#[derive(Debug, Clone, Default)]
pub(crate) struct TagIndex {
    buckets: Box<[SmallVec<[u16; 4]>]>,
}

impl TagIndex {
    pub(crate) fn build(fields: &[FieldDescr]) -> Self {
        let mut buckets: Box<[SmallVec<[u16; 4]>]> =
            (0..FIELD_DESCR_BUCKETS).map(|_| SmallVec::new()).collect();
        for (i, field) in fields.iter().enumerate() {
            buckets[field.tag as usize % FIELD_DESCR_BUCKETS].push(i as u16);
        }
        Self { buckets }
    }

    pub(crate) fn find<'a>(&self, fields: &'a [FieldDescr], tag: u32) -> Option<&'a FieldDescr> {
        self.buckets
            .get(tag as usize % FIELD_DESCR_BUCKETS)?
            .iter()
            .map(|&i| &fields[i as usize])
            .find(|f| f.tag == tag)
    }
}

/// A field's position within a message or repeating group.
///
/// When `subfields` is non-empty the field introduces a repeating group:
/// the field itself is the NumInGroup count tag, and each occurrence is
/// laid out per `subfields`.
#[derive(Debug, Clone)]
pub struct FieldDescr {
    /// Tag number, copied from the referenced [`FieldType`].
    pub tag: u32,
    /// Data kind, copied from the referenced [`FieldType`].
    pub kind: FieldKind,
    /// Index of the referenced [`FieldType`] in the protocol arena.
    pub type_id: u32,
    /// Whether the dictionary marks this field `required="Y"`.
    pub required: bool,
    /// For data-kind fields: the companion Length tag that precedes the
    /// payload on the wire, resolved from the expanded layout.
    pub length_tag: Option<u32>,
    subfields: Vec<FieldDescr>,
    subfield_index: TagIndex,
}

impl FieldDescr {
    pub(crate) fn new(field_type: &FieldType, type_id: u32, required: bool) -> Self {
        Self {
            tag: field_type.num,
            kind: field_type.kind,
            type_id,
            required,
            length_tag: None,
            subfields: Vec::new(),
            subfield_index: TagIndex::default(),
        }
    }

    pub(crate) fn set_subfields(&mut self, subfields: Vec<FieldDescr>) {
        self.subfield_index = TagIndex::build(&subfields);
        self.subfields = subfields;
    }

    /// Returns true if this field introduces a repeating group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        !self.subfields.is_empty()
    }

    /// Returns the expanded layout of one group occurrence.
    #[must_use]
    pub fn subfields(&self) -> &[FieldDescr] {
        &self.subfields
    }

    /// Looks up a group member by tag.
    #[must_use]
    pub fn subfield(&self, tag: u32) -> Option<&FieldDescr> {
        self.subfield_index.find(&self.subfields, tag)
    }
}

/// A message layout: the expanded field list plus its hashed tag index.
#[derive(Debug, Clone)]
pub struct MessageDescr {
    /// Human-readable message name (e.g. `NewOrderSingle`).
    pub name: String,
    /// The literal tag 35 value for this message (e.g. `D`).
    pub msg_type: String,
    fields: Vec<FieldDescr>,
    field_index: TagIndex,
}

impl MessageDescr {
    pub(crate) fn new(name: String, msg_type: String, fields: Vec<FieldDescr>) -> Self {
        let field_index = TagIndex::build(&fields);
        Self {
            name,
            msg_type,
            fields,
            field_index,
        }
    }

    /// Returns the expanded field list in dictionary order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescr] {
        &self.fields
    }

    /// Looks up a root-level field by tag.
    #[must_use]
    pub fn field(&self, tag: u32) -> Option<&FieldDescr> {
        self.field_index.find(&self.fields, tag)
    }
}

/// The immutable descriptor graph for one FIX dictionary.
///
/// Owns every [`FieldType`], [`FieldDescr`] and [`MessageDescr`] record.
/// Built once per dictionary file; safely shareable across threads by
/// reference, no synchronisation needed.
#[derive(Debug, Clone)]
pub struct ProtocolDescr {
    version: Version,
    field_types: Vec<FieldType>,
    /// `hash(name) % FIELD_TYPE_BUCKETS` -> indices into `field_types`.
    type_name_buckets: Box<[SmallVec<[u32; 4]>]>,
    messages: Vec<MessageDescr>,
    /// `hash(msg_type) % MSG_BUCKETS` -> indices into `messages`.
    msg_type_buckets: Box<[SmallVec<[u32; 4]>]>,
}

impl ProtocolDescr {
    pub(crate) fn new(version: Version) -> Self {
        Self {
            version,
            field_types: Vec::new(),
            type_name_buckets: (0..FIELD_TYPE_BUCKETS).map(|_| SmallVec::new()).collect(),
            messages: Vec::new(),
            msg_type_buckets: (0..MSG_BUCKETS).map(|_| SmallVec::new()).collect(),
        }
    }

    /// Returns the protocol version this dictionary describes.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Inserts a field type; returns false if the name is already taken.
    pub(crate) fn add_field_type(&mut self, field_type: FieldType) -> bool {
        if self.field_type(&field_type.name).is_some() {
            return false;
        }
        let bucket = name_bucket(&field_type.name, FIELD_TYPE_BUCKETS);
        let id = self.field_types.len() as u32;
        self.field_types.push(field_type);
        self.type_name_buckets[bucket].push(id);
        true
    }

    /// Inserts a message descriptor; returns false on duplicate msg_type.
    pub(crate) fn add_message(&mut self, message: MessageDescr) -> bool {
        if self.message(&message.msg_type).is_some() {
            return false;
        }
        let bucket = name_bucket(&message.msg_type, MSG_BUCKETS);
        let id = self.messages.len() as u32;
        self.messages.push(message);
        self.msg_type_buckets[bucket].push(id);
        true
    }

    /// Looks up a field type by dictionary name.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.type_name_buckets[name_bucket(name, FIELD_TYPE_BUCKETS)]
            .iter()
            .map(|&i| &self.field_types[i as usize])
            .find(|ft| ft.name == name)
    }

    /// Returns the field type a descriptor references.
    #[must_use]
    pub fn field_type_by_id(&self, type_id: u32) -> &FieldType {
        &self.field_types[type_id as usize]
    }

    /// Returns the id of a field type by name, if present.
    pub(crate) fn field_type_id(&self, name: &str) -> Option<u32> {
        self.type_name_buckets[name_bucket(name, FIELD_TYPE_BUCKETS)]
            .iter()
            .copied()
            .find(|&i| self.field_types[i as usize].name == name)
    }

    /// Looks up a message descriptor by its tag 35 value.
    #[must_use]
    pub fn message(&self, msg_type: &str) -> Option<&MessageDescr> {
        self.msg_type_buckets[name_bucket(msg_type, MSG_BUCKETS)]
            .iter()
            .map(|&i| &self.messages[i as usize])
            .find(|m| m.msg_type == msg_type)
    }

    /// Iterates every field type in the dictionary.
    pub fn field_types(&self) -> impl Iterator<Item = &FieldType> {
        self.field_types.iter()
    }

    /// Iterates every message descriptor in the dictionary.
    pub fn messages(&self) -> impl Iterator<Item = &MessageDescr> {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_type(num: u32, name: &str, kind: FieldKind) -> FieldType {
        FieldType {
            num,
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_version_begin_string() {
        assert_eq!(Version::Fix42.begin_string(), "FIX.4.2");
        assert_eq!(Version::Fix44.begin_string(), "FIX.4.4");
        assert_eq!(Version::Fix50Sp2.begin_string(), "FIXT.1.1");
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("FIX.4.4".parse::<Version>(), Ok(Version::Fix44));
        assert_eq!("FIX.5.0SP2".parse::<Version>(), Ok(Version::Fix50Sp2));
        assert_eq!("FIX.5.0-SP1".parse::<Version>(), Ok(Version::Fix50Sp1));
        assert!("FIX.3.9".parse::<Version>().is_err());
    }

    #[test]
    fn test_field_kind_from_str() {
        assert_eq!("INT".parse::<FieldKind>().unwrap(), FieldKind::Int);
        assert_eq!(
            "NUMINGROUP".parse::<FieldKind>().unwrap(),
            FieldKind::NumInGroup
        );
        assert_eq!(
            "UTCTIMESTAMP".parse::<FieldKind>().unwrap(),
            FieldKind::UtcTimestamp
        );
        // Unknown type names degrade to String.
        assert_eq!("TENOR".parse::<FieldKind>().unwrap(), FieldKind::String);
    }

    #[test]
    fn test_field_kind_classification() {
        assert!(FieldKind::Length.is_int());
        assert!(FieldKind::Price.is_float());
        assert!(FieldKind::Boolean.is_char());
        assert!(FieldKind::Currency.is_textual());
        assert!(FieldKind::UtcTimestamp.is_textual());
        assert!(FieldKind::XmlData.is_data());
        assert!(!FieldKind::Data.is_textual());
        assert!(!FieldKind::String.is_int());
    }

    #[test]
    fn test_protocol_field_type_lookup() {
        let mut protocol = ProtocolDescr::new(Version::Fix44);
        assert!(protocol.add_field_type(field_type(35, "MsgType", FieldKind::String)));
        assert!(protocol.add_field_type(field_type(38, "OrderQty", FieldKind::Qty)));

        assert_eq!(protocol.field_type("MsgType").unwrap().num, 35);
        assert_eq!(protocol.field_type("OrderQty").unwrap().num, 38);
        assert!(protocol.field_type("Nope").is_none());
    }

    #[test]
    fn test_duplicate_field_type_rejected() {
        let mut protocol = ProtocolDescr::new(Version::Fix44);
        assert!(protocol.add_field_type(field_type(35, "MsgType", FieldKind::String)));
        assert!(!protocol.add_field_type(field_type(36, "MsgType", FieldKind::String)));
    }

    #[test]
    fn test_message_field_index() {
        let mut protocol = ProtocolDescr::new(Version::Fix44);
        protocol.add_field_type(field_type(11, "ClOrdID", FieldKind::String));
        protocol.add_field_type(field_type(55, "Symbol", FieldKind::String));

        let fields = vec![
            FieldDescr::new(protocol.field_type("ClOrdID").unwrap(), 0, true),
            FieldDescr::new(protocol.field_type("Symbol").unwrap(), 1, false),
        ];
        let descr = MessageDescr::new("NewOrderSingle".into(), "D".into(), fields);

        assert_eq!(descr.field(11).unwrap().tag, 11);
        assert!(descr.field(11).unwrap().required);
        assert!(!descr.field(55).unwrap().required);
        assert!(descr.field(99).is_none());

        assert!(protocol.add_message(descr));
        assert_eq!(protocol.message("D").unwrap().name, "NewOrderSingle");
        assert!(protocol.message("E").is_none());
        // Duplicate message types are rejected.
        let dup = MessageDescr::new("Other".into(), "D".into(), Vec::new());
        assert!(!protocol.add_message(dup));
    }

    #[test]
    fn test_group_subfield_index() {
        let count_type = field_type(267, "NoMDEntryTypes", FieldKind::NumInGroup);
        let member_type = field_type(269, "MDEntryType", FieldKind::Char);

        let mut group = FieldDescr::new(&count_type, 0, true);
        group.set_subfields(vec![FieldDescr::new(&member_type, 1, true)]);

        assert!(group.is_group());
        assert_eq!(group.subfield(269).unwrap().kind, FieldKind::Char);
        assert!(group.subfield(270).is_none());
    }

    #[test]
    fn test_colliding_index_buckets() {
        // Tags congruent modulo FIELD_DESCR_BUCKETS chain in one bucket.
        let a = field_type(1, "Account", FieldKind::String);
        let b = field_type(1 + FIELD_DESCR_BUCKETS as u32, "Collides", FieldKind::Int);
        let fields = vec![FieldDescr::new(&a, 0, false), FieldDescr::new(&b, 1, false)];
        let descr = MessageDescr::new("Test".into(), "X1".into(), fields);

        assert_eq!(descr.field(1).unwrap().kind, FieldKind::String);
        assert_eq!(
            descr.field(1 + FIELD_DESCR_BUCKETS as u32).unwrap().kind,
            FieldKind::Int
        );
    }
}
