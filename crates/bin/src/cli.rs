//! CLI argument definitions for the vab binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Wire transport to serve or connect over.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Transport {
    /// Framed binary protocol over raw TCP
    Basyx,
    /// REST verb mapping over HTTP
    Http,
}

/// Virtual Automation Bus: path-addressed access to nested object models
#[derive(Parser, Debug)]
#[command(name = "vab")]
#[command(about = "Virtual Automation Bus - transport-agnostic remote object access")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve a JSON object model
    Serve(ServeArgs),
    /// Serve a gateway that forwards nested addresses
    Gateway(GatewayArgs),
    /// Read the node at a path
    Get(TargetArgs),
    /// Replace the node at a path
    Set(WriteArgs),
    /// Create a new node under a path
    Create(WriteArgs),
    /// Delete a node by key or by value
    Delete(DeleteArgs),
    /// Invoke the operation at a path
    Invoke(InvokeArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// JSON file holding the object model to serve
    #[arg(short, long, env = "VAB_MODEL")]
    pub model: PathBuf,

    /// Address to bind, port 0 picks a free port
    #[arg(short, long, default_value = "0.0.0.0:6998", env = "VAB_BIND")]
    pub bind: String,

    /// Transport to serve over
    #[arg(short, long, default_value = "basyx", env = "VAB_TRANSPORT")]
    pub transport: Transport,
}

/// Arguments for the gateway command
#[derive(clap::Args, Debug)]
pub struct GatewayArgs {
    /// Address to bind, port 0 picks a free port
    #[arg(short, long, default_value = "0.0.0.0:6999", env = "VAB_BIND")]
    pub bind: String,

    /// Transport to serve over
    #[arg(short, long, default_value = "basyx", env = "VAB_TRANSPORT")]
    pub transport: Transport,
}

/// Address and path shared by all client commands
#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Endpoint address, e.g. basyx://localhost:6998
    pub address: String,

    /// Slash-separated path below the endpoint
    pub path: String,
}

/// Arguments for commands carrying a JSON value
#[derive(clap::Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// The value, as JSON
    pub value: String,
}

/// Arguments for the delete command
#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// When given, delete this value from the addressed list instead of
    /// deleting the addressed key
    pub value: Option<String>,
}

/// Arguments for the invoke command
#[derive(clap::Args, Debug)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Operation arguments, one JSON document each
    pub args: Vec<String>,
}
