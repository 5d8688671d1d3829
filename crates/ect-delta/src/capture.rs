//! Capture of arbitrary `Serialize` values into [`Node`] trees.
//!
//! Unlike a round-trip through `serde_json::Value`, capture keeps the serde
//! type name of every struct as the object's class identity, which is what
//! entity and field metadata are keyed by.

use serde::ser::{self, Impossible, Serialize};

use crate::{CaptureError, Node, Number, Object};

/// Captures a `Serialize` value as a node tree.
///
/// Structs become objects classed by their type name, struct variants by
/// `Enum::Variant`; maps become classless objects; `None` and unit become
/// `null`.
///
/// ```
/// use ect_delta::{to_node, Node};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Address {
///     street: String,
///     city: String,
/// }
///
/// let node = to_node(&Address { street: "Old".into(), city: "Beijing".into() })?;
/// assert_eq!(node.class(), Some("Address"));
/// assert_eq!(node.child("city"), Some(&Node::from("Beijing")));
/// # Ok::<(), ect_delta::CaptureError>(())
/// ```
pub fn to_node<T>(value: &T) -> Result<Node, CaptureError>
where
    T: ?Sized + Serialize,
{
    value.serialize(NodeSerializer)
}

struct NodeSerializer;

fn number(value: f64) -> Result<Node, CaptureError> {
    Number::new(value).map(Node::Number).map_err(|_| CaptureError::NotFinite { value })
}

fn tagged(variant: &'static str, value: Node) -> Node {
    Node::Object(Object::new().with_field(variant, value))
}

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = CaptureError;

    type SerializeSeq = SeqCapture;
    type SerializeTuple = SeqCapture;
    type SerializeTupleStruct = SeqCapture;
    type SerializeTupleVariant = SeqCapture;
    type SerializeMap = MapCapture;
    type SerializeStruct = StructCapture;
    type SerializeStructVariant = StructCapture;

    fn serialize_bool(self, v: bool) -> Result<Node, CaptureError> {
        Ok(Node::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Node, CaptureError> {
        Ok(Node::Number(Number::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Node, CaptureError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Node, CaptureError> {
        number(v as f64)
    }

    fn serialize_f32(self, v: f32) -> Result<Node, CaptureError> {
        number(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Node, CaptureError> {
        number(v)
    }

    fn serialize_char(self, v: char) -> Result<Node, CaptureError> {
        Ok(Node::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node, CaptureError> {
        Ok(Node::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node, CaptureError> {
        Ok(Node::Array(v.iter().map(|byte| Node::from(i64::from(*byte))).collect()))
    }

    fn serialize_none(self) -> Result<Node, CaptureError> {
        Ok(Node::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Node, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node, CaptureError> {
        Ok(Node::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node, CaptureError> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node, CaptureError> {
        Ok(Node::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Node, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, value.serialize(NodeSerializer)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCapture, CaptureError> {
        Ok(SeqCapture { variant: None, items: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCapture, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCapture, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqCapture, CaptureError> {
        Ok(SeqCapture { variant: Some(variant), items: Vec::with_capacity(len) })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCapture, CaptureError> {
        Ok(MapCapture { object: Object::new(), pending_key: None })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructCapture, CaptureError> {
        Ok(StructCapture { object: Object::new().with_class(name) })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructCapture, CaptureError> {
        Ok(StructCapture { object: Object::new().with_class(format!("{name}::{variant}")) })
    }
}

struct SeqCapture {
    variant: Option<&'static str>,
    items: Vec<Node>,
}

impl SeqCapture {
    fn push<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn finish(self) -> Node {
        let array = Node::Array(self.items);
        match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        }
    }
}

impl ser::SerializeSeq for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(self.finish())
    }
}

struct MapCapture {
    object: Object,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(KeyCapture)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| CaptureError::Custom("map value serialized before its key".into()))?;
        self.object.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(Node::Object(self.object))
    }
}

struct StructCapture {
    object: Object,
}

impl ser::SerializeStruct for StructCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.object.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(Node::Object(self.object))
    }
}

impl ser::SerializeStructVariant for StructCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), CaptureError>
    where
        T: ?Sized + Serialize,
    {
        self.object.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(Node::Object(self.object))
    }
}

/// Map keys: scalars are stringified, everything else is rejected.
struct KeyCapture;

impl KeyCapture {
    fn reject(found: &'static str) -> CaptureError {
        CaptureError::NonScalarKey { found }
    }
}

impl ser::Serializer for KeyCapture {
    type Ok = String;
    type Error = CaptureError;

    type SerializeSeq = Impossible<String, CaptureError>;
    type SerializeTuple = Impossible<String, CaptureError>;
    type SerializeTupleStruct = Impossible<String, CaptureError>;
    type SerializeTupleVariant = Impossible<String, CaptureError>;
    type SerializeMap = Impossible<String, CaptureError>;
    type SerializeStruct = Impossible<String, CaptureError>;
    type SerializeStructVariant = Impossible<String, CaptureError>;

    fn serialize_bool(self, v: bool) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String, CaptureError> {
        Err(Self::reject("float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String, CaptureError> {
        Err(Self::reject("float"))
    }

    fn serialize_char(self, v: char) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String, CaptureError> {
        Ok(v.to_owned())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, CaptureError> {
        Err(Self::reject("bytes"))
    }

    fn serialize_none(self) -> Result<String, CaptureError> {
        Err(Self::reject("null"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<String, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String, CaptureError> {
        Err(Self::reject("null"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, CaptureError> {
        Err(Self::reject("null"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, CaptureError> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, CaptureError>
    where
        T: ?Sized + Serialize,
    {
        Err(Self::reject("object"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, CaptureError> {
        Err(Self::reject("array"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, CaptureError> {
        Err(Self::reject("array"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, CaptureError> {
        Err(Self::reject("array"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, CaptureError> {
        Err(Self::reject("object"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, CaptureError> {
        Err(Self::reject("object"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, CaptureError> {
        Err(Self::reject("object"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, CaptureError> {
        Err(Self::reject("object"))
    }
}
