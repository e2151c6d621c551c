use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info};

use weave_core::kernel::error::Result;
use weave_core::{AppContext, Application, ConfigData};

use crate::components;
use crate::manifest::Manifest;

/// Weave: dependency-ordered application composition
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Root directory components resolve relative paths against [env: WEAVE_ROOT]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Environment label, e.g. development or production [env: WEAVE_ENV]
    #[arg(long = "env", global = true)]
    pub environment: Option<String>,

    /// Component manifest (JSON, YAML or TOML). Without one the default
    /// built-ins are started.
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start every component in dependency order (default)
    Run {
        /// Shut down as soon as startup completes instead of waiting for Ctrl-C
        #[arg(long)]
        exit_after_start: bool,
    },
    /// Print the startup layers without running anything
    Plan,
    /// List the built-in components
    Builtins,
}

pub async fn execute(args: CliArgs) -> Result<()> {
    let command = args.command.unwrap_or(Commands::Run {
        exit_after_start: false,
    });

    match command {
        Commands::Builtins => {
            let app = Application::with_context(AppContext::default());
            let app = with_builtins(app);
            println!("Built-in components:");
            for name in app.catalog().names() {
                println!("  - {}", name);
            }
            Ok(())
        }
        Commands::Plan => {
            let app = assemble(args.root, args.environment, args.manifest.as_deref())?;
            let layers = app.registry().startup_plan()?;
            println!("Startup plan ({} components):", app.registry().len());
            for (index, layer) in layers.iter().enumerate() {
                println!("  {}. {}", index + 1, layer.join(", "));
            }
            Ok(())
        }
        Commands::Run { exit_after_start } => {
            let mut app = assemble(args.root, args.environment, args.manifest.as_deref())?;
            run(&mut app, exit_after_start).await
        }
    }
}

async fn run(app: &mut Application, exit_after_start: bool) -> Result<()> {
    if let Err(e) = app.run().await {
        if let Some(component) = Application::failed_component(&e) {
            eprintln!("Startup failed in component '{}'", component);
        }
        // Whatever did start still gets stopped.
        if let Err(shutdown_error) = app.shutdown().await {
            error!("Shutdown after failed startup reported: {}", shutdown_error);
        }
        return Err(e);
    }
    println!("Application started with {} components.", app.registry().len());

    if !exit_after_start {
        println!("Press Ctrl-C to stop.");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {}", e);
        }
    }

    println!("Shutting down application...");
    app.shutdown().await?;
    info!("Application stopped.");
    Ok(())
}

fn with_builtins(mut app: Application) -> Application {
    components::register_builtins(&mut app);
    app
}

/// Build the application and add the manifest's components, or the default
/// built-ins.
fn assemble(
    root: Option<PathBuf>,
    environment: Option<String>,
    manifest: Option<&std::path::Path>,
) -> Result<Application> {
    let mut app = with_builtins(Application::new());
    if let Some(root) = root {
        app.path(root)?;
    }
    if let Some(environment) = environment {
        app.set_environment(environment)?;
    }

    match manifest {
        Some(path) => {
            let manifest = Manifest::load(path)?;
            manifest.apply(&mut app)?;
        }
        None => {
            for name in components::DEFAULT_COMPONENTS {
                app.add_component(*name, ConfigData::new())?;
            }
        }
    }
    Ok(app)
}
