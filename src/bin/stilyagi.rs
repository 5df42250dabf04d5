// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use stilyagi::{
    install::resolve_install_paths,
    package::{package_styles, resolve_version, DEFAULT_OUTPUT_DIR, DEFAULT_STYLES_PATH},
    path::resolve_project_path,
    tengo::{source::parse_source_entries, split_dest, update_tengo_map},
    GithubClient, InstallConfig, Installer, MapValueType, PackageOptions, RepoRef,
};

use anyhow::{Context, Result};
use clap::{builder::FalseyValueParser, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{env::current_dir, path::PathBuf, process::exit, time::Duration};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "stilyagi [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Zip(opts) => run_zip(opts),
            Command::Install(opts) => run_install(opts),
            Command::UpdateTengoMap(opts) => run_update_tengo_map(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Package styles into a versioned zip archive.
    #[command(override_usage = "stilyagi zip [options]")]
    Zip(ZipOptions),

    /// Install a published style pack into a repository.
    #[command(override_usage = "stilyagi install [options] <owner/name>")]
    Install(InstallOptions),

    /// Merge entries from a source list into a Tengo map.
    #[command(override_usage = "stilyagi update-tengo-map [options] <source> <dest>")]
    UpdateTengoMap(UpdateTengoMapOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ZipOptions {
    /// Root of the repository containing styles.
    #[arg(long, value_name = "path", env = "STILYAGI_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Path, relative to project root, of styles content.
    #[arg(long, value_name = "path", env = "STILYAGI_STYLES_PATH", default_value = DEFAULT_STYLES_PATH)]
    pub styles_path: PathBuf,

    /// Directory for generated archives.
    #[arg(long, value_name = "path", env = "STILYAGI_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Style directory names to include, all styles if omitted.
    #[arg(long, value_name = "name", env = "STILYAGI_STYLE", value_delimiter = ',')]
    pub style: Vec<String>,

    /// Override the vocabulary recorded in .vale.ini.
    #[arg(long, value_name = "name", env = "STILYAGI_VOCABULARY")]
    pub vocabulary: Option<String>,

    /// Directory recorded as StylesPath inside the archive.
    #[arg(long, value_name = "path", env = "STILYAGI_INI_STYLES_PATH", default_value = DEFAULT_STYLES_PATH)]
    pub ini_styles_path: String,

    /// File glob that packaged styles are applied to in .vale.ini.
    #[arg(long, value_name = "glob", env = "STILYAGI_TARGET_GLOB")]
    pub target_glob: Option<String>,

    /// Version embedded in the archive name.
    #[arg(long, value_name = "version", env = "STILYAGI_VERSION")]
    pub archive_version: Option<String>,

    /// Overwrite an existing archive.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InstallOptions {
    /// GitHub repository reference in owner/name form.
    #[arg(required = true, value_name = "owner/name")]
    pub repo: String,

    /// Repository root whose .vale.ini and Makefile are updated.
    #[arg(long, value_name = "path", env = "STILYAGI_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Vale configuration file to update.
    #[arg(long, value_name = "path", env = "STILYAGI_VALE_INI", default_value = ".vale.ini")]
    pub vale_ini: PathBuf,

    /// Makefile that should expose the vale target.
    #[arg(long, value_name = "path", env = "STILYAGI_MAKEFILE", default_value = "Makefile")]
    pub makefile: PathBuf,

    /// Release version to install instead of the latest release.
    #[arg(long, value_name = "version", env = "STILYAGI_RELEASE_VERSION")]
    pub release_version: Option<String>,

    /// Release tag used in download URLs instead of v<version>.
    #[arg(long, value_name = "tag", env = "STILYAGI_RELEASE_TAG")]
    pub tag: Option<String>,

    /// Do not download the release archive to read its manifest.
    #[arg(long, env = "STILYAGI_SKIP_MANIFEST_DOWNLOAD", value_parser = FalseyValueParser::new())]
    pub skip_manifest_download: bool,

    /// Token used to authenticate GitHub API requests.
    #[arg(long, value_name = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UpdateTengoMapOptions {
    /// Source list of map entries, one per line.
    #[arg(required = true, value_name = "source")]
    pub source: PathBuf,

    /// Tengo script path, append ::name to target a map other than "allow".
    #[arg(required = true, value_name = "dest")]
    pub dest: String,

    /// Root directory for resolving relative paths.
    #[arg(long, value_name = "path", env = "STILYAGI_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Value parsing mode: true, =, =b, or =n.
    #[arg(long = "type", value_name = "mode", default_value = "true")]
    pub value_type: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_zip(opts: ZipOptions) -> Result<()> {
    let project_root = resolve_project_path(current_dir()?, &opts.project_root)?;
    let version = resolve_version(&project_root, opts.archive_version.as_deref())?;

    let mut options = PackageOptions::new(project_root, version);
    options.styles_path = opts.styles_path;
    options.output_dir = opts.output_dir;
    options.styles = opts
        .style
        .iter()
        .map(|style| style.trim().to_string())
        .filter(|style| !style.is_empty())
        .collect();
    options.vocabulary = opts.vocabulary;
    options.ini_styles_path = opts.ini_styles_path;
    options.target_glob = opts.target_glob;
    options.force = opts.force;

    let archive_path = package_styles(&options)?;
    println!("{}", archive_path.display());

    Ok(())
}

fn run_install(opts: InstallOptions) -> Result<()> {
    let repo: RepoRef = opts.repo.parse()?;
    let (_, ini_path, makefile_path) =
        resolve_install_paths(current_dir()?, &opts.project_root, &opts.vale_ini, &opts.makefile)?;

    let mut config = InstallConfig::new(repo, ini_path, makefile_path);
    config.override_version = opts.release_version;
    config.override_tag = opts.tag;
    config.skip_manifest_download = opts.skip_manifest_download;

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(100));

    let client = GithubClient::new(opts.github_token)?.with_progress(bar.clone());
    let status = Installer::new(config, client).run();
    bar.finish_and_clear();

    println!("{}", status?);

    Ok(())
}

fn run_update_tengo_map(opts: UpdateTengoMapOptions) -> Result<()> {
    let project_root = resolve_project_path(current_dir()?, &opts.project_root)?;
    let kind: MapValueType = opts.value_type.parse()?;
    let source = resolve_project_path(&project_root, &opts.source)?;
    let (dest, map_name) = split_dest(&opts.dest)?;
    let dest = resolve_project_path(&project_root, dest)?;

    let (provided, entries) = parse_source_entries(&source, kind)
        .with_context(|| format!("cannot load entries from {}", source.display()))?;
    let result = update_tengo_map(&dest, &map_name, &entries)?;
    println!("{provided} entries provided, {} updated", result.updated);

    Ok(())
}
