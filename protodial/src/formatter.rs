use crate::config::ConfigError;
use colored::*;
use protodial_core::{
    introspect::{Field, FieldKind, IntrospectError, Message},
    invoker::{InvokeError, Reply},
    schema::{LoadError, LookupError},
    tonic::Status,
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct ServiceList(pub Vec<String>);

pub struct MethodList(pub String, pub Vec<String>);

/// The field tree of one message.
pub struct FieldTree(pub String, pub Vec<Field>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Reply> for FormattedString {
    fn from(reply: Reply) -> Self {
        match reply.close_error {
            None => FormattedString(reply.json),
            Some(err) => FormattedString(format!(
                "{}\n\n{} '{}'",
                reply.json,
                "Warning: connection did not close cleanly:".yellow().bold(),
                err
            )),
        }
    }
}

impl From<Status> for FormattedString {
    fn from(status: Status) -> Self {
        FormattedString(format!(
            "{} code={:?} message={:?}",
            "gRPC Failed:".red().bold(),
            status.code(),
            status.message()
        ))
    }
}

impl From<InvokeError> for FormattedString {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Status(status) => FormattedString::from(status),
            InvokeError::Network(err) => FormattedString(format!(
                "{}\n\n'{}'",
                "Connection Error:".red().bold(),
                err
            )),
            err => FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), err)),
        }
    }
}

impl From<LoadError> for FormattedString {
    fn from(err: LoadError) -> Self {
        FormattedString(format!(
            "{}\n\n{}",
            "Failed to load proto files:".red().bold(),
            err
        ))
    }
}

impl From<LookupError> for FormattedString {
    fn from(err: LookupError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Symbol Lookup Failed:".red().bold(),
            err
        ))
    }
}

impl From<IntrospectError> for FormattedString {
    fn from(err: IntrospectError) -> Self {
        match err {
            IntrospectError::Lookup(err) => FormattedString::from(err),
            err => FormattedString(format!(
                "{}\n\n'{}'",
                "Failed to describe fields:".red().bold(),
                err
            )),
        }
    }
}

impl From<ConfigError> for FormattedString {
    fn from(err: ConfigError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Invalid config:".red().bold(), err))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<ServiceList> for FormattedString {
    fn from(ServiceList(services): ServiceList) -> Self {
        if services.is_empty() {
            return FormattedString("No services found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Services:\n");
        for svc in services {
            out.push_str(&format!("  - {}\n", svc.green()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MethodList> for FormattedString {
    fn from(MethodList(service, methods): MethodList) -> Self {
        if methods.is_empty() {
            return FormattedString(
                format!("No methods found for '{service}'.")
                    .yellow()
                    .to_string(),
            );
        }

        let mut out = String::new();
        out.push_str(&format!("{} {} {{\n", "service".cyan(), service.green()));
        for method in methods {
            out.push_str(&format!("  {} {};\n", "rpc".cyan(), method.green()));
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<FieldTree> for FormattedString {
    fn from(FieldTree(message, fields): FieldTree) -> Self {
        let mut out = String::new();
        out.push_str(&format!("{} {} {{\n", "message".cyan(), message.green()));
        write_fields(&mut out, &fields, 1);
        out.push('}');
        FormattedString(out)
    }
}

fn write_fields(out: &mut String, fields: &[Field], depth: usize) {
    for field in fields {
        write_field(out, field, depth);
    }
}

fn write_field(out: &mut String, field: &Field, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = if field.is_list {
        format!("{} ", "repeated".cyan())
    } else {
        "".to_string()
    };

    match &field.kind {
        FieldKind::Scalar => {
            out.push_str(&format!(
                "{indent}{label}{} {};\n",
                field.type_name.yellow(),
                field.name
            ));
        }
        FieldKind::Enum(values) => {
            out.push_str(&format!(
                "{indent}{label}{} {} {{\n",
                "enum".yellow(),
                field.name
            ));
            for value in values {
                out.push_str(&format!(
                    "{indent}  {} = {};\n",
                    value.name,
                    value.number.to_string().purple()
                ));
            }
            out.push_str(&format!("{indent}}}\n"));
        }
        FieldKind::Message(message) => write_message(out, field, &label, message, depth),
        FieldKind::OneOf(one_of) => {
            out.push_str(&format!("{indent}{} {} {{\n", "oneof".cyan(), field.name));
            write_fields(out, &one_of.members, depth + 1);
            out.push_str(&format!("{indent}}}\n"));
        }
    }
}

fn write_message(out: &mut String, field: &Field, label: &str, message: &Message, depth: usize) {
    let indent = "  ".repeat(depth);

    if message.is_reference() {
        out.push_str(&format!(
            "{indent}{label}{} {}; {}\n",
            message.full_name.yellow(),
            field.name,
            "// recursive".dimmed()
        ));
        return;
    }

    out.push_str(&format!(
        "{indent}{label}{} {} {{\n",
        message.full_name.yellow(),
        field.name
    ));
    write_fields(out, &message.fields, depth + 1);
    out.push_str(&format!("{indent}}}\n"));
}
