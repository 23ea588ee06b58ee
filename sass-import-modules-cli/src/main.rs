use clap::{Args, Parser, Subcommand};
use sass_import_modules::{
  CallContext, ImportResult, Importer, ImporterConfig, ImporterOptions,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(author, version, about = "Resolve Sass imports the way the importer would")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve one or more import specifiers from a referring file.
  Resolve(ResolveArgs),
}

#[derive(Args)]
struct ResolveArgs {
  /// Specifiers to resolve, in order, against a single importer.
  #[arg(required = true)]
  specifiers: Vec<String>,

  /// File containing the imports.
  #[arg(long)]
  from: PathBuf,

  /// Include paths supplied by the calling compilation; tried first.
  #[arg(long = "include-path")]
  include_paths: Vec<PathBuf>,

  /// Search paths tried after the referrer's directory.
  #[arg(long = "path")]
  paths: Vec<PathBuf>,

  /// Extensions in priority order.
  #[arg(long = "ext")]
  extensions: Vec<String>,

  /// Resolvers in order (local, partial, tilde, node).
  #[arg(long = "resolver")]
  resolvers: Vec<String>,

  /// JSON importer config; command-line options take precedence.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Emit JSON results and the dependency graph.
  #[arg(long)]
  json: bool,

  /// Emit tracing spans (JSON) to stderr.
  #[arg(long)]
  trace: bool,
}

#[derive(Serialize)]
struct JsonResult {
  specifier: String,
  file: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonOutput {
  results: Vec<JsonResult>,
  dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  match cli.command {
    Commands::Resolve(args) => run_resolve(args),
  }
}

fn run_resolve(args: ResolveArgs) -> ExitCode {
  init_tracing(args.trace);

  let cwd = match std::env::current_dir() {
    Ok(cwd) => cwd,
    Err(err) => {
      eprintln!("failed to resolve current directory: {err}");
      return ExitCode::FAILURE;
    }
  };

  let options = match build_options(&args, &cwd) {
    Ok(options) => options,
    Err(err) => {
      eprintln!("{err}");
      return ExitCode::FAILURE;
    }
  };

  // The default stand-in lives next to the library sources; a relocated binary
  // needs `standIn` in its config.
  if !options.stand_in.is_file() {
    eprintln!(
      "circular import stand-in {} does not exist; set \"standIn\" in the importer config",
      options.stand_in.display()
    );
    return ExitCode::FAILURE;
  }

  let from = cwd.join(&args.from);

  let importer = Importer::new(options);
  let context = CallContext::with_include_paths(args.include_paths.iter().map(|p| cwd.join(p)));
  let mut results = Vec::with_capacity(args.specifiers.len());
  for specifier in &args.specifiers {
    match importer.resolve(specifier, &from, &context) {
      Ok(result) => results.push(JsonResult {
        specifier: specifier.clone(),
        file: result.as_ref().and_then(ImportResult::file_path).map(Path::to_path_buf),
      }),
      Err(err) => {
        eprintln!("{err}");
        return ExitCode::FAILURE;
      }
    }
  }

  if args.json {
    let output = JsonOutput {
      results,
      dependencies: importer.dependency_graph().into_iter().collect(),
    };
    match serde_json::to_string_pretty(&output) {
      Ok(serialized) => println!("{serialized}"),
      Err(err) => {
        eprintln!("failed to serialize JSON: {err}");
        return ExitCode::FAILURE;
      }
    }
  } else {
    for result in &results {
      match &result.file {
        Some(file) => println!("{} -> {}", result.specifier, file.display()),
        None => println!("{} -> (unresolved)", result.specifier),
      }
    }
  }

  ExitCode::SUCCESS
}

/// Command-line paths are relative to `cwd`; paths inside a config file are
/// relative to the file.
fn build_options(args: &ResolveArgs, cwd: &Path) -> Result<ImporterOptions, String> {
  let mut options = match &args.config {
    Some(path) => {
      let (config, dir) = ImporterConfig::from_path(path).map_err(|err| err.to_string())?;
      config.into_options(cwd.join(dir))
    }
    None => ImporterOptions::with_cwd(cwd),
  };

  if !args.paths.is_empty() {
    options = options.paths(args.paths.iter().map(|p| cwd.join(p)));
  }
  if !args.extensions.is_empty() {
    options = options.extensions(&args.extensions);
  }
  if !args.resolvers.is_empty() {
    options = options.resolver_names(&args.resolvers);
  }
  Ok(options)
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::DEBUG)
    .with_writer(std::io::stderr)
    .json()
    .with_ansi(false)
    .try_init();
}
