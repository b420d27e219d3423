//! # CLI
//!
//! This module defines the command-line interface of `protodial` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers are `key:value`);
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "protodial", version, about = "Dynamic gRPC CLI driven by .proto sources")]
pub struct Cli {
    #[command(flatten)]
    pub schema: SchemaArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the schema comes from. Given before the subcommand.
#[derive(Args)]
pub struct SchemaArgs {
    /// The .proto file to load, either a path or a name relative to an import path
    #[arg(long)]
    pub proto: PathBuf,

    /// Directory searched for imports (repeatable)
    #[arg(short = 'I', long = "import-path")]
    pub import_paths: Vec<PathBuf>,

    /// File listing import paths, one per line
    #[arg(long)]
    pub import_paths_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every service defined by the loaded files
    Services,

    /// List the methods of a service
    Methods {
        /// Fully qualified service name (e.g. my.package.Service)
        service: String,
    },

    /// Show the field tree of a method's request (or response) message
    Fields {
        /// Endpoint (package.Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),

        /// Show the response message instead of the request
        #[arg(long)]
        output: bool,
    },

    /// Perform a unary gRPC call over TLS
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// protodial --proto greeter.proto call helloworld.Greeter/SayHello \
    ///     --host api.example.com --port 443 --body '{"name": "world"}'
    /// ```
    Call {
        /// Endpoint (package.Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),

        /// JSON request body
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// Server hostname. Overrides the profile.
    #[arg(long)]
    pub host: Option<String>,

    /// Server port. Overrides the profile.
    #[arg(long)]
    pub port: Option<String>,

    /// Metadata sent with the call, merged over the profile's
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Connection profile to start from
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Save the resulting connection settings as a profile
    #[arg(long)]
    pub save_profile: Option<PathBuf>,

    /// Accept any server certificate
    #[arg(long)]
    pub insecure: bool,

    /// Deadline in seconds for connecting, calling and closing
    #[arg(long)]
    pub timeout: Option<u64>,
}

fn parse_endpoint(value: &str) -> Result<(String, String), String> {
    let (service, method) = value.split_once('/').ok_or_else(|| {
        format!("Invalid endpoint format: '{value}'. Expected 'package.Service/Method'",)
    })?;

    if service.trim().is_empty() || method.trim().is_empty() {
        return Err("Service and Method names cannot be empty".to_string());
    }

    Ok((service.to_string(), method.to_string()))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    let body: serde_json::Value =
        serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))?;

    if !body.is_object() {
        return Err("The body must be a JSON object".to_string());
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn endpoint_splits_at_slash() {
        assert_eq!(
            parse_endpoint("pkg.Svc/Do").unwrap(),
            ("pkg.Svc".to_string(), "Do".to_string())
        );
        assert!(parse_endpoint("pkg.Svc.Do").is_err());
        assert!(parse_endpoint("pkg.Svc/ ").is_err());
    }

    #[test]
    fn header_value_keeps_later_colons() {
        assert_eq!(
            parse_header("authorization: Bearer a:b").unwrap(),
            ("authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header("no-colon").is_err());
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(parse_body(r#"{"a": 1}"#).is_ok());
        assert!(parse_body("[1, 2]").is_err());
        assert!(parse_body("{").is_err());
    }

    #[test]
    fn call_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "protodial",
            "--proto",
            "api.proto",
            "-I",
            "protos",
            "call",
            "pkg.Svc/Do",
            "--body",
            "{}",
            "--host",
            "localhost",
            "-H",
            "x-a:1",
            "--insecure",
            "--timeout",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.schema.proto, PathBuf::from("api.proto"));
        assert_eq!(cli.schema.import_paths, vec![PathBuf::from("protos")]);

        let Commands::Call {
            endpoint,
            connection,
            ..
        } = cli.command
        else {
            panic!("Expected call command");
        };
        assert_eq!(endpoint.1, "Do");
        assert_eq!(connection.host.as_deref(), Some("localhost"));
        assert_eq!(connection.port, None);
        assert_eq!(connection.headers, vec![("x-a".to_string(), "1".to_string())]);
        assert!(connection.insecure);
        assert_eq!(connection.timeout, Some(5));
    }

    #[test]
    fn proto_is_required() {
        assert!(Cli::try_parse_from(["protodial", "services"]).is_err());
    }
}
