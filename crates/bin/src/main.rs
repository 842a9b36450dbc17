use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vab::{
    Node, Provider,
    connector::{BasyxServer, ConnectorRegistry, Gateway, HttpServer},
    provider::LocalProvider,
    serializer::Serializer,
};

mod cli;

use cli::{Cli, Commands, DeleteArgs, GatewayArgs, InvokeArgs, ServeArgs, Transport, WriteArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vab=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Gateway(args) => gateway(args).await,
        Commands::Get(target) => {
            let provider = connect(&target.address)?;
            let node = provider.get(&target.path).await?;
            print_node(&node)
        }
        Commands::Set(args) => {
            let provider = connect(&args.target.address)?;
            provider.set(&args.target.path, parse_value(&args.value)?).await?;
            Ok(())
        }
        Commands::Create(args) => {
            let provider = connect(&args.target.address)?;
            provider
                .create(&args.target.path, parse_value(&args.value)?)
                .await?;
            Ok(())
        }
        Commands::Delete(args) => delete(args).await,
        Commands::Invoke(args) => invoke(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.model)?;
    let root = Serializer::default().from_str(&text)?;
    tracing::info!(model = %args.model.display(), "loaded object model");

    let provider: Arc<dyn Provider> = Arc::new(LocalProvider::new(root));
    run_server(provider, &args.bind, args.transport).await
}

async fn gateway(args: GatewayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider: Arc<dyn Provider> =
        Arc::new(Gateway::new(ConnectorRegistry::with_defaults()));
    run_server(provider, &args.bind, args.transport).await
}

/// Starts the chosen transport server and blocks until ctrl-c.
async fn run_server(
    provider: Arc<dyn Provider>,
    bind: &str,
    transport: Transport,
) -> Result<(), Box<dyn std::error::Error>> {
    match transport {
        Transport::Basyx => {
            let mut server = BasyxServer::new(provider);
            server.start(bind).await?;
            println!("Serving basyx://{}", server.get_address()?);
            tokio::signal::ctrl_c().await?;
            println!("Shutting down");
            server.stop()?;
        }
        Transport::Http => {
            let mut server = HttpServer::new(provider);
            server.start(bind).await?;
            println!("Serving http://{}", server.get_address()?);
            tokio::signal::ctrl_c().await?;
            println!("Shutting down");
            server.stop()?;
        }
    }
    Ok(())
}

async fn delete(args: DeleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = connect(&args.target.address)?;
    let value = match &args.value {
        Some(text) => Some(parse_value(text)?),
        None => None,
    };
    provider.delete(&args.target.path, value).await?;
    Ok(())
}

async fn invoke(args: InvokeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = connect(&args.target.address)?;
    let invoke_args = args
        .args
        .iter()
        .map(|text| parse_value(text))
        .collect::<Result<Vec<_>, _>>()?;
    let result = provider.invoke(&args.target.path, invoke_args).await?;
    print_node(&result)
}

fn connect(address: &str) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    Ok(ConnectorRegistry::with_defaults().connect_to(address)?)
}

fn parse_value(text: &str) -> Result<Node, Box<dyn std::error::Error>> {
    Ok(Serializer::default().from_str(text)?)
}

fn print_node(node: &Node) -> Result<(), Box<dyn std::error::Error>> {
    let json = Serializer::default().to_json(node);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
