//! ServiceOwners CLI
//!
//! Entry point for the `sowners` command-line tool.

use clap::{Parser, Subcommand};
use serviceowners::app::{self, ChangeSource, Outcome, Workspace, EXIT_FAILURE};
use serviceowners::config::CliOverrides;
use serviceowners::error::CliError;
use serviceowners::logging;
use serviceowners::report::{ImpactFormat, LintFormat, OwnerFormat};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "sowners")]
#[command(about = "Repo-native service ownership mapping", version)]
struct Cli {
    /// Repository root (default: auto-detect with git)
    #[arg(long, global = true)]
    repo_root: Option<PathBuf>,

    /// Rules file, relative to the repo root (default: SERVICEOWNERS)
    #[arg(long, global = true)]
    serviceowners_file: Option<String>,

    /// Services catalog, relative to the repo root (default: services.yaml)
    #[arg(long, global = true)]
    services_file: Option<String>,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the service that owns a path
    #[command(visible_aliases = ["who", "owner"])]
    WhoOwns {
        /// Path to a file (relative or absolute)
        path: String,

        /// Show every matching rule and which one won
        #[arg(long)]
        explain: bool,

        #[arg(long, value_enum, default_value_t = OwnerFormat::Text)]
        format: OwnerFormat,
    },

    /// Compute the services impacted by a diff or a file list
    #[command(visible_alias = "impact")]
    Impacted {
        /// Git revision range (default: HEAD~1...HEAD)
        #[arg(long, conflicts_with = "stdin")]
        diff: Option<String>,

        /// Read changed files, one per line, from stdin
        #[arg(long)]
        stdin: bool,

        #[arg(long, value_enum, default_value_t = ImpactFormat::Text)]
        format: ImpactFormat,

        /// List changed files per service
        #[arg(long)]
        show_files: bool,

        /// Files listed per service in text output (default: 50)
        #[arg(long)]
        max_files: Option<usize>,

        /// Exit 3 if any changed file is unmapped
        #[arg(long)]
        fail_on_unmapped: bool,
    },

    /// Lint SERVICEOWNERS and the services catalog
    Lint {
        /// Fail on warnings too
        #[arg(long)]
        strict: bool,

        /// Check every rule matches at least one repository file
        #[arg(long)]
        check_matches: bool,

        /// Report shadowed rules and overlaps across services
        #[arg(long)]
        check_overlaps: bool,

        #[arg(long, value_enum, default_value_t = LintFormat::Text)]
        format: LintFormat,
    },

    /// Bootstrap SERVICEOWNERS from CODEOWNERS
    Init {
        /// Path to CODEOWNERS (default: search common locations)
        #[arg(long)]
        codeowners: Option<PathBuf>,

        /// Write SERVICEOWNERS to disk instead of printing it
        #[arg(long)]
        write: bool,

        /// Overwrite an existing SERVICEOWNERS with --write
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings and where they came from
    Config,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(outcome) => {
            println!("{}", outcome.output);
            process::exit(outcome.exit_code);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    let cwd = std::env::current_dir().map_err(|source| CliError::Read {
        path: PathBuf::from("."),
        source,
    })?;
    let repo_root = app::resolve_repo_root(cli.repo_root.as_deref(), &cwd);
    tracing::debug!(root = %repo_root.display(), "repository root");

    let mut overrides = CliOverrides {
        serviceowners_file: cli.serviceowners_file,
        services_file: cli.services_file,
        ..CliOverrides::default()
    };

    match cli.command {
        Commands::WhoOwns { path, explain, format } => {
            let settings = Workspace::settings(&repo_root, &overrides)?.settings;
            let ws = Workspace::load(&repo_root, settings)?;
            app::who_owns(&ws, &path, explain, format)
        }
        Commands::Impacted {
            diff,
            stdin,
            format,
            show_files,
            max_files,
            fail_on_unmapped,
        } => {
            overrides.diff = diff;
            overrides.max_files = max_files;
            overrides.fail_on_unmapped = fail_on_unmapped.then_some(true);
            let settings = Workspace::settings(&repo_root, &overrides)?.settings;

            let changes = if stdin {
                ChangeSource::from_stdin()?
            } else {
                ChangeSource::Diff(settings.impacted.diff.clone())
            };
            let ws = Workspace::load(&repo_root, settings)?;
            app::impacted(&ws, &changes, format, show_files)
        }
        Commands::Lint {
            strict,
            check_matches,
            check_overlaps,
            format,
        } => {
            overrides.strict = strict.then_some(true);
            overrides.check_matches = check_matches.then_some(true);
            overrides.check_overlaps = check_overlaps.then_some(true);
            let settings = Workspace::settings(&repo_root, &overrides)?.settings;
            let ws = Workspace::load_lenient(&repo_root, settings)?;
            app::lint(&ws, format)
        }
        Commands::Init {
            codeowners,
            write,
            force,
        } => {
            let settings = Workspace::settings(&repo_root, &overrides)?.settings;
            let codeowners = codeowners.map(|p| if p.is_absolute() { p } else { cwd.join(p) });
            app::init(&repo_root, &settings, codeowners.as_deref(), write, force)
        }
        Commands::Config => app::config(&Workspace::settings(&repo_root, &overrides)?),
    }
}
