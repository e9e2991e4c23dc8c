//! `hypertune-gen`: fetch a generated, typed Hypertune client and write it into the project.
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context, Result};
use clap::Parser;

mod codegen;
mod manifest;
mod output;

use codegen::{CodegenClient, CodegenRequest, DEFAULT_EDGE_BASE_URL};

/// Tool for generating Hypertune client code for Rust.
#[derive(Parser, Debug)]
#[command(name = "hypertune-gen", version)]
struct Args {
    #[arg(long = "edgeBaseURL", hide = true, default_value = DEFAULT_EDGE_BASE_URL)]
    edge_base_url: String,

    /// Version of the hypertune crate your app uses. Defaults to the version required in the
    /// nearest Cargo.toml.
    #[arg(long = "sdkVersion")]
    sdk_version: Option<String>,

    /// The directory to write the generated files to.
    #[arg(long = "outputFileDir", default_value = "generated")]
    output_file_dir: String,

    /// File path to the GraphQL initialization query.
    #[arg(long = "queryFilePath")]
    query_file_path: Option<PathBuf>,

    /// Project token.
    #[arg(long, env = "HYPERTUNE_TOKEN")]
    token: String,

    /// Project branch to use.
    #[arg(long = "branchName", env = "HYPERTUNE_BRANCH_NAME", default_value = "main")]
    branch_name: String,

    /// Crate or module name to use in the generated code.
    #[arg(long = "packageName", default_value = "hypertune")]
    package_name: String,

    /// Include the project token in the generated code.
    #[arg(long = "includeToken")]
    include_token: bool,

    /// Embed a static snapshot of your flag logic in the generated code so the SDK can
    /// initialize locally and instantly before fetching the latest logic, and keep working if
    /// the server is unreachable.
    #[arg(long = "includeInitData")]
    include_init_data: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let result = std::env::current_dir()
        .context("failed to get current working directory")
        .and_then(|cwd| run(args, &cwd, &mut io::stdout().lock()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Relative paths in `args` are resolved against `cwd`.
fn run(args: Args, cwd: &Path, out: &mut impl Write) -> Result<()> {
    if args.output_file_dir.is_empty() {
        bail!("outputFileDir must be specified");
    }
    if args.package_name.is_empty() {
        bail!("packageName must be specified");
    }
    if args.token.is_empty() {
        bail!("token must be specified");
    }

    let sdk_version = match args.sdk_version.filter(|v| !v.is_empty()) {
        Some(version) => version,
        None => manifest::resolve_sdk_version(cwd).context("failed to parse sdk version")?,
    };

    let query = match &args.query_file_path {
        Some(path) => {
            Some(fs::read_to_string(cwd.join(path)).context("failed to read query file")?)
        }
        None => None,
    };

    let client = CodegenClient::new(&args.edge_base_url)?;
    let request = CodegenRequest {
        sdk_type: hypertune::LANGUAGE,
        language: hypertune::LANGUAGE,
        query: query.as_deref(),
        include_token: args.include_token,
        include_fallback: args.include_init_data,
        sdk_version: &sdk_version,
        package_name: &args.package_name,
    };
    let response = client.fetch(&request, &args.token, &args.branch_name)?;

    output::write_files(cwd, Path::new(&args.output_file_dir), &response.files, out)?;
    output::print_messages(&response.messages, out)?;
    Ok(())
}
