//! Traceline CLI
//!
//! Entry point for the `traceline` command-line tool.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use traceline_cli::batch::{
    self, BatchPolicy, BatchReport, DartOptions, DsymOptions, NdkOptions,
};
use traceline_cli::build::{self, BuildOptions};
use traceline_cli::console;
use traceline_cli::meta::AppFields;
use traceline_cli::net::{self, HttpUploader};

#[derive(Parser)]
#[command(name = "traceline")]
#[command(about = "Discover and upload mobile debug symbols", version)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project api key (falls back to the Android manifest where one applies)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Root URL of the upload API
    #[arg(long, global = true, default_value = "https://upload.traceline.io")]
    upload_api_root_url: String,

    /// Root URL of the build API
    #[arg(long, global = true, default_value = "https://build.traceline.io")]
    build_api_root_url: String,

    /// Port appended to the API URLs (0 leaves them untouched)
    #[arg(long, global = true, default_value_t = 0)]
    port: u16,

    /// Abort on the first failed upload instead of continuing
    #[arg(long, global = true)]
    fail_on_upload_error: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 300)]
    timeout: u64,

    /// Retry attempts for requests that fail at the transport level
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,

    /// Discover and resolve without sending anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// App version sent with Dart uploads and build reports
    #[arg(long, global = true)]
    app_version: Option<String>,

    /// Android version code sent with Dart uploads and build reports
    #[arg(long, global = true)]
    app_version_code: Option<String>,

    /// iOS bundle version sent with Dart uploads and build reports
    #[arg(long, global = true)]
    app_bundle_version: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload debug symbols
    Upload {
        #[command(subcommand)]
        target: UploadCommands,
    },

    /// Report a new build to the build API
    CreateBuild(CreateBuildArgs),
}

#[derive(Subcommand)]
enum UploadCommands {
    /// Android NDK shared-object symbols
    AndroidNdk(AndroidNdkArgs),

    /// dSYM debug bundles
    Dsym(DsymArgs),

    /// Dart/Flutter symbol files
    Dart(DartArgs),
}

#[derive(Args)]
struct AndroidNdkArgs {
    /// Project directory or a single `.so` file
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Build variant (inferred when the layout has exactly one)
    #[arg(long)]
    variant: Option<String>,

    /// NDK installation root (falls back to $ANDROID_NDK_ROOT)
    #[arg(long)]
    android_ndk_root: Option<PathBuf>,

    /// Module application id (falls back to the merged manifest)
    #[arg(long)]
    application_id: Option<String>,

    /// Module version code (falls back to the merged manifest)
    #[arg(long)]
    version_code: Option<String>,

    /// Module version name (falls back to the merged manifest)
    #[arg(long)]
    version_name: Option<String>,

    /// Merged AndroidManifest.xml (derived from the layout when absent)
    #[arg(long)]
    app_manifest: Option<PathBuf>,

    /// Project root path sent with each upload
    #[arg(long)]
    project_root: Option<String>,

    /// Replace symbols the remote store already holds
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct DsymArgs {
    /// Directory, compressed archive, or a single dSYM bundle
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Info.plist consulted for the api key when --api-key is absent
    #[arg(long)]
    plist: Option<PathBuf>,

    /// Project root path sent with each upload
    #[arg(long)]
    project_root: Option<String>,

    /// Replace symbols the remote store already holds
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct DartArgs {
    /// Directory or a single `.symbols` file
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Companion iOS app binary (derived from the symbols path when absent)
    #[arg(long)]
    ios_app_path: Option<PathBuf>,

    /// Replace symbols the remote store already holds
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct CreateBuildArgs {
    /// Name of the person or system performing the build
    #[arg(long)]
    builder_name: Option<String>,

    /// Release stage (e.g. production, staging)
    #[arg(long)]
    release_stage: Option<String>,

    /// Free-form key=value pair attached to the build (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    metadata: Vec<(String, String)>,

    /// Source control provider (e.g. github)
    #[arg(long)]
    provider: Option<String>,

    /// Source control repository URL
    #[arg(long)]
    repository: Option<String>,

    /// Source control revision
    #[arg(long)]
    revision: Option<String>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Upload { target } => run_upload(&cli.globals, target),
        Commands::CreateBuild(args) => run_create_build(&cli.globals, args),
    };

    if let Err(message) = result {
        console::error(&message);
        process::exit(1);
    }
}

fn run_upload(globals: &GlobalArgs, target: UploadCommands) -> Result<(), String> {
    let uploader = HttpUploader::new(
        Duration::from_secs(globals.timeout),
        globals.retries,
        globals.dry_run,
    )
    .map_err(|e| e.to_string())?;

    let endpoint_root = net::endpoint_url(&globals.upload_api_root_url, globals.port);
    let policy = BatchPolicy {
        abort_on_first_fatal: globals.fail_on_upload_error,
    };

    let report = match target {
        UploadCommands::AndroidNdk(args) => {
            let opts = NdkOptions {
                path: args.path,
                variant: args.variant,
                android_ndk_root: args.android_ndk_root,
                app: AppFields {
                    api_key: globals.api_key.clone(),
                    application_id: args.application_id,
                    version_code: args.version_code,
                    version_name: args.version_name,
                },
                manifest_path: args.app_manifest,
                project_root: args.project_root,
                overwrite: args.overwrite,
            };
            batch::process_android_ndk(&opts, &uploader, &endpoint_root, policy)
        }
        UploadCommands::Dsym(args) => {
            let opts = DsymOptions {
                path: args.path,
                api_key: globals.api_key.clone(),
                plist: args.plist,
                project_root: args.project_root,
                overwrite: args.overwrite,
            };
            batch::process_dsym(&opts, &uploader, &endpoint_root, policy)
        }
        UploadCommands::Dart(args) => {
            let opts = DartOptions {
                path: args.path,
                api_key: globals.api_key.clone(),
                ios_app_path: args.ios_app_path,
                app_version: globals.app_version.clone(),
                app_version_code: globals.app_version_code.clone(),
                app_bundle_version: globals.app_bundle_version.clone(),
                overwrite: args.overwrite,
            };
            batch::process_dart(&opts, &uploader, &endpoint_root, policy)
        }
    }
    .map_err(|e| e.to_string())?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let mut summary = format!("Uploaded {} file(s)", report.uploaded());
    if report.skipped() > 0 {
        summary.push_str(&format!(", skipped {}", report.skipped()));
    }
    if report.failed() > 0 {
        summary.push_str(&format!(", failed {}", report.failed()));
    }
    console::info(&summary);
}

fn run_create_build(globals: &GlobalArgs, args: CreateBuildArgs) -> Result<(), String> {
    let opts = BuildOptions {
        api_key: globals.api_key.clone(),
        app_version: globals.app_version.clone(),
        app_version_code: globals.app_version_code.clone(),
        app_bundle_version: globals.app_bundle_version.clone(),
        builder_name: args.builder_name,
        release_stage: args.release_stage,
        metadata: args.metadata,
        provider: args.provider,
        repository: args.repository,
        revision: args.revision,
    };

    let dir = std::env::current_dir().map_err(|e| e.to_string())?;
    let payload = build::build_payload(&opts, &dir).map_err(|e| e.to_string())?;

    let endpoint = net::endpoint_url(&globals.build_api_root_url, globals.port);
    build::send_build_report(
        &endpoint,
        &payload,
        Duration::from_secs(globals.timeout),
        globals.dry_run,
    )
    .map_err(|e| e.to_string())?;

    console::success("Build created");
    Ok(())
}
