//! # Field Introspection
//!
//! Builds a navigable tree describing every parameter of a method's input or output message.
//!
//! The tree mirrors the schema in declaration order, with two deviations:
//!
//! * The members of a `oneof` are grouped under a single synthetic [`Field`] that takes the
//!   position of the first member.
//! * A message type that is already being expanded higher up the same branch is not expanded
//!   again; a reference (see [`Message::is_reference`]) is emitted instead, so self-referential
//!   types produce a finite tree.
//!
//! Map fields are reported with `is_map() == true` and are not expanded into their key/value entry.
mod types;

pub use types::*;

use crate::schema::{LookupError, Registry};
use prost_reflect::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor, OneofDescriptor};

/// Default limit on how many messages may be nested inside each other.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Message nesting exceeds the limit of {limit} at '{path}'")]
    DepthExceeded { path: String, limit: usize },
}

/// Materializes [`Field`] trees out of a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct FieldIntrospector {
    max_depth: usize,
}

impl Default for FieldIntrospector {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Shorthand for `FieldIntrospector::default().fields(..)`.
pub fn get_fields(
    registry: &Registry,
    method_full_name: &str,
    direction: Direction,
) -> Result<Vec<Field>, IntrospectError> {
    FieldIntrospector::default().fields(registry, method_full_name, direction)
}

impl FieldIntrospector {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Describes the input or output message of `method_full_name`
    /// (e.g. `helloworld.Greeter.SayHello`).
    pub fn fields(
        &self,
        registry: &Registry,
        method_full_name: &str,
        direction: Direction,
    ) -> Result<Vec<Field>, IntrospectError> {
        let method = registry.resolve_method(method_full_name)?;

        let message = match direction {
            Direction::Input => method.input(),
            Direction::Output => method.output(),
        };

        tracing::debug!(
            method = method_full_name,
            message = message.full_name(),
            ?direction,
            "Materializing field tree"
        );

        self.message(&message).map(|message| message.fields)
    }

    /// Describes any message type of the registry.
    pub fn message(&self, desc: &MessageDescriptor) -> Result<Message, IntrospectError> {
        let mut stack = Vec::new();
        self.nested(desc, &mut stack)
    }

    fn nested(
        &self,
        desc: &MessageDescriptor,
        stack: &mut Vec<String>,
    ) -> Result<Message, IntrospectError> {
        let name = desc.full_name().to_string();

        if stack.contains(&name) {
            return Ok(Message::reference(name));
        }

        if stack.len() >= self.max_depth {
            stack.push(name);
            return Err(IntrospectError::DepthExceeded {
                path: stack.join(" > "),
                limit: self.max_depth,
            });
        }

        stack.push(name);
        let fields = self.message_fields(desc, stack);
        let name = stack.pop().unwrap_or_default();

        Ok(Message::expanded(name, fields?))
    }

    fn message_fields(
        &self,
        desc: &MessageDescriptor,
        stack: &mut Vec<String>,
    ) -> Result<Vec<Field>, IntrospectError> {
        let mut fields: Vec<Field> = Vec::new();

        // `MessageDescriptor::fields` is ordered by number, the tree follows the source.
        let declared = desc
            .descriptor_proto()
            .field
            .iter()
            .filter_map(|proto| desc.get_field_by_name(proto.name()));

        for fd in declared {
            let field = self.field(&fd, stack)?;

            let Some(oneof) = fd.containing_oneof().filter(|o| !o.is_synthetic()) else {
                fields.push(field);
                continue;
            };

            let group = fields.iter_mut().find_map(|f| match &mut f.kind {
                FieldKind::OneOf(group) if group.name == oneof.name() => Some(group),
                _ => None,
            });

            match group {
                Some(group) => group.members.push(field),
                None => fields.push(one_of_field(&oneof, field)),
            }
        }

        Ok(fields)
    }

    fn field(
        &self,
        fd: &FieldDescriptor,
        stack: &mut Vec<String>,
    ) -> Result<Field, IntrospectError> {
        let (type_name, kind) = if fd.is_map() {
            (MAP_TYPE_NAME, FieldKind::Scalar)
        } else {
            match fd.kind() {
                Kind::Enum(e) => ("enum", FieldKind::Enum(enum_values(&e))),
                Kind::Message(m) => ("message", FieldKind::Message(self.nested(&m, stack)?)),
                other => (kind_name(&other), FieldKind::Scalar),
            }
        };

        Ok(Field {
            name: fd.name().to_string(),
            full_name: fd.full_name().to_string(),
            json_name: fd.json_name().to_string(),
            type_name: type_name.to_string(),
            is_list: fd.is_list(),
            kind,
        })
    }
}

fn enum_values(desc: &EnumDescriptor) -> Vec<EnumValue> {
    desc.enum_descriptor_proto()
        .value
        .iter()
        .filter_map(|proto| desc.get_value_by_name(proto.name()))
        .map(|v| EnumValue {
            name: v.name().to_string(),
            full_name: v.full_name().to_string(),
            number: v.number(),
        })
        .collect()
}

fn one_of_field(desc: &OneofDescriptor, first_member: Field) -> Field {
    Field {
        name: desc.name().to_string(),
        full_name: desc.full_name().to_string(),
        json_name: String::new(),
        type_name: ONEOF_TYPE_NAME.to_string(),
        is_list: false,
        kind: FieldKind::OneOf(OneOf {
            name: desc.name().to_string(),
            full_name: desc.full_name().to_string(),
            members: vec![first_member],
        }),
    }
}
