use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::json;

use pio_prebuild::config::{loader, PrebuildConfig};
use pio_prebuild::system::{find_project_root, PlatformioPaths, PlatformioResolver};
use pio_prebuild::{
    BuildContext, FlagInjector, LogCollector, PackageResolver, PatchMode, SourcePatcher,
    StaticResolver,
};

/// PlatformIO pre-build helpers.
///
/// Hook into platformio.ini with `build_flags = !pio-prebuild run`, which
/// patches the framework and prints the flags for PlatformIO to pick up.
#[derive(Parser, Debug)]
#[command(name = "pio-prebuild", version, about, long_about = None)]
struct Cli {
    /// Project directory, used as given (defaults to the nearest directory above the cwd holding platformio.ini)
    #[arg(long, env = "PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    /// Config file (defaults to <project_dir>/pio-prebuild.toml, optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also append log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EnvArgs {
    /// Active PlatformIO environment
    #[arg(long = "env", env = "PIOENV")]
    env_name: String,

    /// Env file name inside <project_dir>/<env>/ (overrides config)
    #[arg(long)]
    env_file: Option<String>,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// PlatformIO packages directory (defaults to $PLATFORMIO_PACKAGES_DIR or <core>/packages)
    #[arg(long)]
    packages_dir: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Fail when a patch rule matches nothing
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print -D flags derived from the environment's .env file
    Flags {
        #[command(flatten)]
        env: EnvArgs,
        #[arg(long)]
        json: bool,
    },
    /// Patch vendored framework sources
    Patch {
        #[command(flatten)]
        patch: PatchArgs,
        #[arg(long)]
        json: bool,
    },
    /// Patch, then print flags
    Run {
        #[command(flatten)]
        env: EnvArgs,
        #[command(flatten)]
        patch: PatchArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let collector = match LogCollector::new(cli.log_file.clone(), level) {
        Ok(collector) => collector,
        Err(e) => {
            eprintln!("[Main] ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = collector.install() {
        eprintln!("[Main] WARNING: Failed to set LogCollector as global logger: {}", e);
    }

    let code = match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = collector.wait_for_empty() {
        eprintln!("[Main] WARNING: Failed to flush logs: {}", e);
    }
    code
}

fn execute(cli: Cli) -> Result<()> {
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => {
            let cwd = std::env::current_dir().context("Failed to get current working directory")?;
            find_project_root(&cwd)
        }
    };
    let config = load_config(&project_dir, cli.config.as_deref())?;

    match cli.command {
        Command::Flags { env, json } => {
            let mut ctx = BuildContext::new(&project_dir, env.env_name.clone(), Box::new(StaticResolver::new()));
            let added = inject_flags(&mut ctx, &config, &env)?;
            print_flags(&added, json)?;
        }
        Command::Patch { patch, json } => {
            let env_name = std::env::var("PIOENV").unwrap_or_default();
            let ctx = BuildContext::new(&project_dir, env_name, resolver_for(&patch)?);
            let report = apply_patches(&ctx, &config, &patch)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Run { env, patch, json } => {
            let mut ctx = BuildContext::new(&project_dir, env.env_name.clone(), resolver_for(&patch)?);
            let report = apply_patches(&ctx, &config, &patch)?;
            let added = inject_flags(&mut ctx, &config, &env)?;
            if json {
                let combined = json!({ "patches": report, "flags": added });
                println!("{}", serde_json::to_string_pretty(&combined)?);
            } else {
                print_flags(&added, false)?;
            }
        }
        Command::Config => {
            print!("{}", loader::to_toml_string(&config)?);
        }
    }

    Ok(())
}

fn load_config(project_dir: &Path, explicit: Option<&Path>) -> Result<PrebuildConfig> {
    match explicit {
        Some(path) => loader::load_config_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let path = loader::default_config_path(project_dir);
            loader::load_or_default(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
    }
}

fn resolver_for(args: &PatchArgs) -> Result<Box<dyn PackageResolver>> {
    let paths = match &args.packages_dir {
        Some(dir) => PlatformioPaths::with_packages_dir(dir.clone()),
        None => PlatformioPaths::discover()?,
    };
    log::debug!("[Main] Packages directory: {}", paths.packages_dir().display());
    Ok(Box::new(PlatformioResolver::new(paths)))
}

fn inject_flags(ctx: &mut BuildContext, config: &PrebuildConfig, env: &EnvArgs) -> Result<Vec<String>> {
    let file_name = env.env_file.as_deref().unwrap_or(&config.flags.env_file);
    let injector = FlagInjector::new(file_name);
    let path = injector.env_file(ctx);
    injector
        .inject(ctx)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn apply_patches(
    ctx: &BuildContext,
    config: &PrebuildConfig,
    args: &PatchArgs,
) -> Result<Vec<serde_json::Value>> {
    let mode = if args.dry_run { PatchMode::DryRun } else { PatchMode::Apply };
    let mut report = Vec::new();

    for set in &config.patch {
        let mut set = set.clone();
        set.strict |= args.strict;
        let package = set.package.clone();

        let outcomes = SourcePatcher::new(set)
            .with_mode(mode)
            .apply(ctx)
            .with_context(|| format!("Failed to patch package {}", package))?;

        for (path, outcome) in outcomes {
            log::debug!("[Main] {}: {}", path.display(), outcome);
            report.push(json!({ "path": path, "outcome": outcome }));
        }
    }

    Ok(report)
}

fn print_flags(flags: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(flags)?);
    } else {
        for flag in flags {
            println!("{}", flag);
        }
    }
    Ok(())
}
