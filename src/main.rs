use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use s2i_create::create::{
    Error, Group, Materializer, OverwritePolicy, Registry, RenderContext, ScaffoldReport,
    ScaffoldRequest, Selection,
};

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Args)]
struct CreateOpts {
    /// Name of the builder image the project produces.
    #[arg(value_name = "IMAGE_NAME")]
    image_name: String,

    /// Directory the project is generated in. Created if missing.
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// What to do with files that already exist.
    #[arg(long, short, value_enum, default_value_t = OverwritePolicy::FailIfExists)]
    policy: OverwritePolicy,

    /// Leave out a template group. Can be repeated.
    #[arg(long, value_enum, conflicts_with = "templates")]
    without: Vec<Group>,

    /// Generate only the named templates. Can be repeated.
    #[arg(long = "template", short = 't', value_name = "NAME")]
    templates: Vec<String>,

    /// Validate and report without touching the filesystem.
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[clap(
        name = "create",
        about = "Generate a new S2I builder image project."
    )]
    Create {
        #[clap(flatten)]
        args: CreateOpts,
    },

    #[clap(name = "list", about = "List the templates a project is generated from.")]
    List,
}

#[derive(Parser)]
#[command(name = "s2i-create")]
#[command(about = "Bootstraps source-to-image builder image projects.", long_about = None)]
#[command(version)]
pub struct App {
    #[clap(flatten)]
    args: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

fn log_level(opts: &GlobalOpts) -> LevelFilter {
    if opts.quiet {
        return LevelFilter::Error;
    }
    match opts.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn setup_logging(level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}

fn display_path(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

fn print_report(report: &ScaffoldReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let cwd = std::env::current_dir()?;
    let prefix = if report.dry_run { "[DRY RUN] " } else { "" };
    for file in report.files.iter() {
        println!(
            "{}{:<12}{}",
            prefix,
            file.outcome.to_string(),
            display_path(&file.path, &cwd).display()
        );
    }
    Ok(())
}

fn create(args: CreateOpts) -> Result<()> {
    let selection = if args.templates.is_empty() {
        args.without
            .iter()
            .fold(Selection::default(), |s, g| s.without(*g))
    } else {
        Selection::named(args.templates)
    };
    let request = ScaffoldRequest::new(&args.destination, RenderContext::for_image(&args.image_name))
        .selection(selection)
        .policy(args.policy)
        .dry_run(args.dry_run);
    debug!("Scaffold request: {:?}", request);

    let materializer = Materializer::new(Registry::builtin())?;
    let result = materializer.generate(&request);
    if let Err(Error::Interrupted { report, .. }) = &result {
        print_report(report, args.json)?;
    }
    let report = result.with_context(|| {
        format!(
            "Failed to create '{}' in {}",
            args.image_name,
            args.destination.display()
        )
    })?;
    print_report(&report, args.json)
}

fn list() -> Result<()> {
    let registry = Registry::builtin();
    for t in registry.iter() {
        println!(
            "{:<24}{:<10}{:<12}{}",
            t.name,
            t.group.to_string(),
            t.mode.to_string(),
            t.path.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let app = App::parse();
    setup_logging(log_level(&app.args))?;

    match app.command {
        Command::Create { args } => create(args)?,
        Command::List => list()?,
    }

    Ok(())
}
