//! Shared test fixtures: a small FIX.4.4 dictionary covering scalar
//! fields, components, repeating groups, and a Length/Data pair.

use steelfix_dictionary::ProtocolDescr;

pub(crate) const TAG_CL_ORD_ID: u32 = 11;
pub(crate) const TAG_ENCRYPT_METHOD: u32 = 98;

const TEST_DICT: &str = r#"
<fix version="FIX.4.4">
 <header>
  <field name="SenderCompID" required="Y"/>
  <field name="TargetCompID" required="Y"/>
  <field name="MsgSeqNum" required="Y"/>
 </header>
 <trailer>
  <field name="CheckSum" required="Y"/>
 </trailer>
 <messages>
  <message name="NewOrderSingle" msgtype="D">
   <field name="ClOrdID" required="Y"/>
   <component name="Instrument"/>
   <field name="Side" required="Y"/>
   <field name="TransactTime" required="Y"/>
   <field name="OrderQty" required="N"/>
   <field name="OrdType" required="Y"/>
   <field name="Price" required="N"/>
  </message>
  <message name="MarketDataRequest" msgtype="V">
   <field name="MDReqID" required="Y"/>
   <group name="NoMDEntryTypes" required="Y">
    <field name="MDEntryType" required="Y"/>
   </group>
   <group name="NoRelatedSym" required="Y">
    <component name="Instrument"/>
   </group>
  </message>
  <message name="Logon" msgtype="A">
   <field name="EncryptMethod" required="Y"/>
   <field name="HeartBtInt" required="Y"/>
   <field name="ResetSeqNumFlag" required="N"/>
   <field name="RawDataLength" required="N"/>
   <field name="RawData" required="N"/>
  </message>
  <message name="OddGroup" msgtype="X1">
   <group name="MiscCount" required="N">
    <field name="ClOrdID" required="Y"/>
   </group>
  </message>
 </messages>
 <components>
  <component name="Instrument">
   <field name="Symbol" required="Y"/>
   <field name="SecurityID" required="N"/>
  </component>
 </components>
 <fields>
  <field number="8" name="BeginString" type="STRING"/>
  <field number="9" name="BodyLength" type="LENGTH"/>
  <field number="35" name="MsgType" type="STRING"/>
  <field number="49" name="SenderCompID" type="STRING"/>
  <field number="56" name="TargetCompID" type="STRING"/>
  <field number="34" name="MsgSeqNum" type="SEQNUM"/>
  <field number="10" name="CheckSum" type="STRING"/>
  <field number="11" name="ClOrdID" type="STRING"/>
  <field number="55" name="Symbol" type="STRING"/>
  <field number="48" name="SecurityID" type="STRING"/>
  <field number="54" name="Side" type="CHAR"/>
  <field number="60" name="TransactTime" type="UTCTIMESTAMP"/>
  <field number="38" name="OrderQty" type="QTY"/>
  <field number="40" name="OrdType" type="CHAR"/>
  <field number="44" name="Price" type="PRICE"/>
  <field number="262" name="MDReqID" type="STRING"/>
  <field number="267" name="NoMDEntryTypes" type="NUMINGROUP"/>
  <field number="269" name="MDEntryType" type="CHAR"/>
  <field number="146" name="NoRelatedSym" type="NUMINGROUP"/>
  <field number="98" name="EncryptMethod" type="INT"/>
  <field number="108" name="HeartBtInt" type="INT"/>
  <field number="141" name="ResetSeqNumFlag" type="BOOLEAN"/>
  <field number="95" name="RawDataLength" type="LENGTH"/>
  <field number="96" name="RawData" type="DATA"/>
  <field number="5000" name="MiscCount" type="INT"/>
 </fields>
</fix>
"#;

pub(crate) fn test_protocol() -> ProtocolDescr {
    ProtocolDescr::from_xml(TEST_DICT).unwrap()
}
