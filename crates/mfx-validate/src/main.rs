mod config;
mod hooks;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mfx_host::{Host, Identity, MeshEffect, ParameterType, PluginRegistryManager};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::CookConfig;
use crate::hooks::{CookedMesh, SyntheticMesh, ValidatorHooks};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate OpenMfx mesh effect bundles")]
struct Args {
    /// Path to the `.ofx` bundle binary.
    #[arg(long)]
    bundle: PathBuf,
    /// Only check the plug-in at this index.
    #[arg(long)]
    plugin: Option<usize>,
    /// Instantiate and cook every checked plug-in.
    #[arg(long)]
    cook: bool,
    /// Cook even when the plug-in reports that it would pass its input through.
    #[arg(long, requires = "cook")]
    always_cook: bool,
    /// JSON file with the input mesh and parameter overrides used when cooking.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();

    let config = match &args.config {
        Some(path) => CookConfig::load(path)?,
        None => CookConfig::default(),
    };
    let hooks = ValidatorHooks::new(SyntheticMesh::from_config(&config));
    let output = hooks.output();
    let manager = PluginRegistryManager::new(Host::new(hooks));

    let result = validate_bundle(&manager, &args, &config, &output);
    manager.release_registry(&args.bundle);
    result
}

fn validate_bundle(
    manager: &PluginRegistryManager,
    args: &Args,
    config: &CookConfig,
    output: &Arc<Mutex<Option<CookedMesh>>>,
) -> Result<()> {
    let registry = manager
        .get_registry(&args.bundle)
        .with_context(|| format!("Failed to open bundle {}", args.bundle.display()))?;
    if registry.is_empty() {
        bail!("No mesh effect plug-ins exported by {}", args.bundle.display());
    }
    let indices: Vec<usize> = match args.plugin {
        Some(index) if index >= registry.len() => {
            bail!("Bundle exports {} plug-ins, there is no index {index}", registry.len())
        }
        Some(index) => vec![index],
        None => (0..registry.len()).collect(),
    };

    let mut failures = 0;
    for index in indices {
        if let Err(err) = validate_plugin(manager, &args.bundle, index, args, config, output) {
            println!("  FAILED: {err:#}");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} plug-in(s) failed validation");
    }
    println!("Validated {}", args.bundle.display());
    Ok(())
}

fn validate_plugin(
    manager: &PluginRegistryManager,
    bundle: &Path,
    index: usize,
    args: &Args,
    config: &CookConfig,
    output: &Arc<Mutex<Option<CookedMesh>>>,
) -> Result<()> {
    let registry = manager
        .get_registry(bundle)
        .context("Bundle was released while validating")?;
    let described = report_descriptor(manager, bundle, index, &registry);
    manager.release_registry(bundle);
    let descriptor = described?;
    if !args.cook {
        return Ok(());
    }

    let host = manager.host();
    let mut instance = host
        .create_instance(&descriptor)
        .context("CreateInstance failed")?;
    let cooked = cook_instance(host, &mut instance, args, config, output);
    host.destroy_instance(instance);
    cooked
}

fn report_descriptor(
    manager: &PluginRegistryManager,
    bundle: &Path,
    index: usize,
    registry: &mfx_host::PluginRegistry,
) -> Result<Arc<MeshEffect>> {
    let plugin = registry
        .plugin(index)
        .with_context(|| format!("No plug-in at index {index}"))?;
    let (major, minor) = plugin.version();
    println!("[{index}] {} {major}.{minor}", plugin.identifier());

    let descriptor = manager
        .get_effect_descriptor(bundle, index)
        .with_context(|| format!("Failed to load or describe {}", plugin.identifier()))?;
    println!("  inputs: {}", descriptor.inputs().names().join(", "));
    for parameter in descriptor.parameters().iter() {
        let kind = parameter.parameter_type();
        if matches!(kind, ParameterType::Group | ParameterType::Page) {
            continue;
        }
        println!(
            "  param {} ({kind:?}) = {:?}",
            parameter.name().to_string_lossy(),
            parameter.value()
        );
    }
    Ok(descriptor)
}

fn cook_instance(
    host: &Host,
    instance: &mut MeshEffect,
    args: &Args,
    config: &CookConfig,
    output: &Arc<Mutex<Option<CookedMesh>>>,
) -> Result<()> {
    config.apply_parameters(instance)?;

    match host.is_identity(instance).context("IsIdentity failed")? {
        Identity::PassThrough { input } if !args.always_cook => {
            println!("  identity: passes {input} through");
            return Ok(());
        }
        Identity::PassThrough { input } => println!("  identity: passes {input} through"),
        Identity::MustCook => println!("  identity: must cook"),
    }

    output.lock().take();
    host.cook(instance).context("Cook failed")?;
    match output.lock().take() {
        Some(mesh) => println!(
            "  cooked: {} points, {} corners, {} faces",
            mesh.points, mesh.corners, mesh.faces
        ),
        None => println!("  cooked: main output was not released"),
    }
    if let Some(message) = instance.persistent_message() {
        println!("  {:?}: {}", message.kind, message.text);
        if message.kind.is_failure() {
            bail!("plug-in reported {:?}: {}", message.kind, message.text);
        }
    }
    Ok(())
}
