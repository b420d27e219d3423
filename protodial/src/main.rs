//! # Protodial CLI Entry Point
//!
//! The main executable for the Protodial tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and sets up logging.
//! 2. **Schema**: Loads the requested `.proto` file and its imports through `protodial_core`.
//! 3. **Execution**: Lists, introspects, or calls through the core library.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.
mod cli;
mod config;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, ConnectionArgs, SchemaArgs};
use config::Profile;
use formatter::{FieldTree, FormattedString, GenericError, MethodList, ServiceList};
use protodial_core::introspect::{Direction, get_fields};
use protodial_core::invoker::{ConnectionConfig, Invoker, TlsVerification};
use protodial_core::schema::{Registry, load_registry};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: &str = "443";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let registry = load_or_exit(args.schema);

    match args.command {
        Commands::Services => {
            println!("{}", FormattedString::from(ServiceList(registry.services())))
        }
        Commands::Methods { service } => {
            let methods = registry.methods(&service);
            println!("{}", FormattedString::from(MethodList(service, methods)))
        }
        Commands::Fields { endpoint, output } => {
            let (service, method) = endpoint;
            let direction = if output {
                Direction::Output
            } else {
                Direction::Input
            };
            describe_fields(&registry, &service, &method, direction)
        }
        Commands::Call {
            endpoint,
            body,
            connection,
        } => {
            let (service, method) = endpoint;
            run_call(&registry, &service, &method, body, connection).await
        }
    }
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    eprintln!("{}", err.into());
    process::exit(1);
}

fn load_or_exit(args: SchemaArgs) -> Registry {
    let mut import_paths = args.import_paths;

    if let Some(file) = args.import_paths_file {
        match config::read_import_paths(&file) {
            Ok(paths) => import_paths.extend(paths),
            Err(err) => exit_with(err),
        }
    }

    match load_registry(&import_paths, &args.proto) {
        Ok(registry) => registry,
        Err(err) => exit_with(err),
    }
}

fn describe_fields(registry: &Registry, service: &str, method: &str, direction: Direction) {
    let descriptor = match registry.resolve_service_method(service, method) {
        Ok(descriptor) => descriptor,
        Err(err) => exit_with(err),
    };

    let message = match direction {
        Direction::Input => descriptor.input(),
        Direction::Output => descriptor.output(),
    };

    match get_fields(registry, descriptor.full_name(), direction) {
        Ok(fields) => println!(
            "{}",
            FormattedString::from(FieldTree(message.full_name().to_string(), fields))
        ),
        Err(err) => exit_with(err),
    }
}

async fn run_call(
    registry: &Registry,
    service: &str,
    method: &str,
    body: serde_json::Value,
    args: ConnectionArgs,
) {
    let profile = match &args.profile {
        Some(path) => Profile::read(path).unwrap_or_else(|err| exit_with(err)),
        None => Profile::default(),
    };

    let Some(hostname) = args.host.or(profile.hostname) else {
        exit_with(GenericError(
            "Missing server address",
            "pass --host or a profile with a Hostname entry",
        ))
    };
    let port = args
        .port
        .or(profile.port)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    let mut metadata = profile.metadata;
    metadata.extend(args.headers);

    if let Some(path) = &args.save_profile {
        let saved = Profile {
            hostname: Some(hostname.clone()),
            port: Some(port.clone()),
            metadata: metadata.clone(),
        };
        if let Err(err) = saved.write(path) {
            exit_with(err);
        }
    }

    let mut config = ConnectionConfig::default();
    if args.insecure {
        config = config.with_tls(TlsVerification::Insecure);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let mut invoker = Invoker::new(config);
    invoker.configure(hostname, port, metadata);

    match invoker
        .send(registry, service, method, &body.to_string())
        .await
    {
        Ok(reply) => println!("{}", FormattedString::from(reply)),
        Err(err) => exit_with(err),
    }
}
