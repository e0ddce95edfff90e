//! Vision node runner
//!
//! Hosts a single vision node outside of a flow: loads its model, feeds it
//! the given image files one by one and prints every emitted message as JSON.

use clap::Parser;
use flow_vision::{
    flow::{
        host::{ChannelHost, HostEvent},
        message::Message,
        status::NodeStatus,
    },
    utils::http::ReqwestFetch,
};
use flow_vision_catalog_core::{InferenceConfig, NodeEnvironment, find_node};
use flow_vision_catalog_vision::{default_providers, get_catalog};
use flow_vision_types::{Value, anyhow, bail, json::Map, sync::mpsc::UnboundedReceiver};
use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "vision-runner")]
#[command(about = "Run a vision node over image files", long_about = None)]
struct Args {
    /// Node type to run, e.g. tensorflowCocoSsd
    #[arg(short = 't', long = "type")]
    node_type: Option<String>,

    /// Node configuration file (.json or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model URL, path or identifier; overrides the configuration file
    #[arg(short, long)]
    model: Option<String>,

    /// Per-message score threshold override
    #[arg(long)]
    score_threshold: Option<f32>,

    /// Per-message max detections override
    #[arg(long)]
    max_detections: Option<usize>,

    /// Give up on a remote model download after this many seconds
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,

    /// List the registered node types and exit
    #[arg(long)]
    list: bool,

    /// Print the JSON schema of the node configuration and exit
    #[arg(long)]
    schema: bool,

    /// Print one message per line instead of pretty JSON
    #[arg(long)]
    compact: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Image files to run through the node
    images: Vec<PathBuf>,
}

fn read_config(path: &PathBuf) -> flow_vision_types::Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config '{}': {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        toml::from_str::<Value>(&text)?
    } else {
        serde_json::from_str::<Value>(&text)?
    };
    Ok(config)
}

fn node_config(args: &Args) -> flow_vision_types::Result<Value> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => Value::Object(Map::new()),
    };
    let Some(object) = config.as_object_mut() else {
        bail!("node configuration must be an object");
    };
    if let Some(model) = &args.model {
        object.insert("modelSource".to_string(), Value::String(model.clone()));
    }
    Ok(config)
}

fn model_fetch(args: &Args) -> ReqwestFetch {
    match args.fetch_timeout {
        Some(secs) => ReqwestFetch::with_timeout(Duration::from_secs(secs)),
        None => ReqwestFetch::new(),
    }
}

/// Wait until the node reports ready, or fail with its load error.
async fn wait_until_ready(rx: &mut UnboundedReceiver<HostEvent>) -> flow_vision_types::Result<()> {
    while let Some(event) = rx.recv().await {
        match event {
            HostEvent::Status { status: NodeStatus::Ready, .. } => return Ok(()),
            HostEvent::Error { error, .. } => bail!("{error}"),
            HostEvent::Status { status, .. } => info!(status = %status, "Node status"),
            HostEvent::Send { .. } => {}
        }
    }
    bail!("node host closed before the model was ready")
}

fn print_message(message: &Message, compact: bool) -> flow_vision_types::Result<()> {
    let text = if compact {
        serde_json::to_string(message)?
    } else {
        serde_json::to_string_pretty(message)?
    };
    println!("{text}");
    Ok(())
}

async fn run(args: Args) -> flow_vision_types::Result<usize> {
    let node_type = args
        .node_type
        .as_deref()
        .ok_or_else(|| anyhow!("--type is required unless --list is given"))?;
    let constructor = find_node(node_type).ok_or_else(|| {
        let known: Vec<&str> = get_catalog().iter().map(|nc| nc.type_name()).collect();
        anyhow!("unknown node type '{node_type}', expected one of {known:?}")
    })?;

    let (host, mut rx) = ChannelHost::new();
    let env = NodeEnvironment::new(Arc::new(host))
        .with_fetch(Arc::new(model_fetch(&args)))
        .with_providers(default_providers());
    let node = constructor.construct(&env, &node_config(&args)?)?;
    info!(node_id = %node.id(), node_type = %node.node_type(), "Node created");

    wait_until_ready(&mut rx).await?;

    let mut failures = 0;
    for path in &args.images {
        let mut message = Message::from_path(path);
        message.score_threshold = args.score_threshold;
        message.max_detections = args.max_detections;
        node.on_input(message).await;

        while let Ok(event) = rx.try_recv() {
            match event {
                HostEvent::Send { message, .. } => print_message(&message, args.compact)?,
                HostEvent::Error { error, .. } => {
                    warn!(image = %path.display(), error = %error, "Input failed");
                    failures += 1;
                }
                HostEvent::Status { .. } => {}
            }
        }
    }

    node.on_close().await;
    Ok(failures)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    flow_vision::logging::init(args.verbose);

    if args.list {
        for constructor in get_catalog() {
            println!("{}", constructor.type_name());
        }
        return ExitCode::SUCCESS;
    }
    if args.schema {
        println!("{:#}", InferenceConfig::schema());
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            warn!(failures, "Some inputs failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
