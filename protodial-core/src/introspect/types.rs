use prost_reflect::Kind;

/// Which side of a method to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// One schema field, or a synthesized group of `oneof` members.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared name (e.g. `user_id`).
    pub name: String,
    /// Fully qualified name (e.g. `pkg.Request.user_id`).
    pub full_name: String,
    /// JSON name (e.g. `userId`). Empty for oneof groups.
    pub json_name: String,
    /// Scalar type name, or one of `message`, `enum`, `oneof`, `map`.
    pub type_name: String,
    /// Whether the field is `repeated` (maps excluded).
    pub is_list: bool,
    pub kind: FieldKind,
}

/// The payload of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Plain scalar, also used for map fields.
    Scalar,
    Enum(Vec<EnumValue>),
    Message(Message),
    OneOf(OneOf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub full_name: String,
    pub number: i32,
}

/// A message type and its fields, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub full_name: String,
    pub fields: Vec<Field>,
    reference: bool,
}

/// The members of a `oneof`, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOf {
    pub name: String,
    pub full_name: String,
    pub members: Vec<Field>,
}

impl Field {
    pub fn is_map(&self) -> bool {
        self.type_name == MAP_TYPE_NAME
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, FieldKind::Enum(_))
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, FieldKind::Message(_))
    }

    pub fn is_one_of(&self) -> bool {
        matches!(self.kind, FieldKind::OneOf(_))
    }

    pub fn enum_values(&self) -> Option<&[EnumValue]> {
        match &self.kind {
            FieldKind::Enum(values) => Some(values),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            FieldKind::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn one_of(&self) -> Option<&OneOf> {
        match &self.kind {
            FieldKind::OneOf(one_of) => Some(one_of),
            _ => None,
        }
    }
}

impl Message {
    pub(crate) fn expanded(full_name: String, fields: Vec<Field>) -> Self {
        Self {
            full_name,
            fields,
            reference: false,
        }
    }

    /// A message already being expanded further up the tree.
    pub(crate) fn reference(full_name: String) -> Self {
        Self {
            full_name,
            fields: Vec::new(),
            reference: true,
        }
    }

    /// `true` when this message points back to an enclosing message of the same type
    /// instead of repeating its fields.
    pub fn is_reference(&self) -> bool {
        self.reference
    }
}

impl OneOf {
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|f| f.name.as_str())
    }

    pub fn member(&self, name: &str) -> Option<&Field> {
        self.members.iter().find(|f| f.name == name)
    }
}

pub(crate) const MAP_TYPE_NAME: &str = "map";
pub(crate) const ONEOF_TYPE_NAME: &str = "oneof";

/// The protobuf name of a field kind, as written in `.proto` files.
pub(crate) fn kind_name(kind: &Kind) -> &'static str {
    match kind {
        Kind::Double => "double",
        Kind::Float => "float",
        Kind::Int32 => "int32",
        Kind::Int64 => "int64",
        Kind::Uint32 => "uint32",
        Kind::Uint64 => "uint64",
        Kind::Sint32 => "sint32",
        Kind::Sint64 => "sint64",
        Kind::Fixed32 => "fixed32",
        Kind::Fixed64 => "fixed64",
        Kind::Sfixed32 => "sfixed32",
        Kind::Sfixed64 => "sfixed64",
        Kind::Bool => "bool",
        Kind::String => "string",
        Kind::Bytes => "bytes",
        Kind::Message(_) => "message",
        Kind::Enum(_) => "enum",
    }
}
