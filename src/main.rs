//! Box CLI - package Python projects with PyApp
//!
//! Usage: box <COMMAND>
//!
//! Commands:
//!   init       Initialize the project in the current folder
//!   package    Build the project, then package it with PyApp
//!   installer  Create an installer for the packaged project
//!   clean      Remove build outputs
//!   uninit     Remove the box configuration from pyproject.toml
//!   env        Manage PyApp environment variables

use std::path::PathBuf;
use std::process;

use box_packager::{
    env_vars, messages, BoxResult, CleanOptions, Cleaner, EntryType, InitOptions, Initializer,
    InstallerBuilder, ManifestWriter, Packager, ProjectLayout, ProjectManifest, PyAppVersion,
    SourceOrigin, VariableType,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Automatic packaging and installers of your GUI with PyApp
#[derive(Parser, Debug)]
#[command(name = "box")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new project in the current folder
    Init {
        /// Don't ask questions, initialize with default values
        #[arg(short, long)]
        quiet: bool,

        /// Builder for the project (rye, hatch, pdm, build, flit, custom)
        #[arg(short, long)]
        builder: Option<String>,

        /// Command that builds the sdist, required by the `custom` builder
        #[arg(long)]
        build_command: Option<String>,

        /// Optional dependencies for the project
        #[arg(long)]
        optional_deps: Option<String>,

        /// Set the project as a GUI project
        #[arg(long)]
        gui: bool,

        /// Optional PyApp variables, e.g. `PYAPP_FULL_ISOLATION 1`
        #[arg(long)]
        opt_pyapp_vars: Option<String>,

        /// App entry for the project
        #[arg(short, long)]
        entry: Option<String>,

        /// Entry type passed to PyApp (spec, module, script, notebook)
        #[arg(long)]
        entry_type: Option<String>,

        /// Python version to use with PyApp
        #[arg(long)]
        python_version: Option<String>,
    },

    /// Build the project, then package it with PyApp
    ///
    /// A PyApp source already in the `build` folder is not downloaded or
    /// extracted again. Run `box clean` to start over.
    Package {
        /// Enable verbose mode
        #[arg(short, long)]
        verbose: bool,

        /// Local PyApp source, a folder or a .tar.gz archive
        #[arg(short, long, value_name = "PATH")]
        pyapp_source: Option<PathBuf>,

        /// PyApp version to use, see the PyApp release page
        #[arg(long, default_value = "latest")]
        pyapp_version: String,
    },

    /// Create an installer for the project
    Installer {
        /// Enable verbose mode
        #[arg(short, long)]
        verbose: bool,
    },

    /// Clean the project, by default `dist`, `build` and `target`
    Clean {
        /// Clean the `dist` folder
        #[arg(short, long)]
        dist: bool,

        /// Clean the `build` folder
        #[arg(short, long)]
        build: bool,

        /// Clean the `target` folder
        #[arg(short, long)]
        target: bool,

        /// Clean the cached PyApp source archive(s), ignores `-b`
        #[arg(short, long)]
        source_pyapp: bool,

        /// Clean the PyApp folder(s) in `build`, ignores `-b`
        #[arg(short, long)]
        pyapp_folder: bool,
    },

    /// Remove all box settings from `pyproject.toml`
    Uninit {
        /// Clean the full project first
        #[arg(short, long)]
        clean_project: bool,
    },

    /// Manage the PyApp environment variables of the project
    Env {
        /// Set a string variable, `KEY=VALUE`
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Set an integer variable, `KEY=VALUE`
        #[arg(long, value_name = "KEY=VALUE")]
        set_int: Vec<String>,

        /// Set a boolean variable, `KEY=VALUE`
        #[arg(long, value_name = "KEY=VALUE")]
        set_bool: Vec<String>,

        /// Print the value of a variable
        #[arg(long, value_name = "KEY")]
        get: Vec<String>,

        /// List all variables
        #[arg(long)]
        list: bool,

        /// Remove a variable
        #[arg(long, value_name = "KEY")]
        unset: Vec<String>,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Package { verbose, .. } | Commands::Installer { verbose } => *verbose,
            _ => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.verbose());

    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(e) => {
            messages::error(e.to_string());
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if verbose {
        if let Ok(directive) = "box_packager=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> BoxResult<()> {
    let layout = ProjectLayout::current()?;

    match command {
        Commands::Init {
            quiet,
            builder,
            build_command,
            optional_deps,
            gui,
            opt_pyapp_vars,
            entry,
            entry_type,
            python_version,
        } => {
            let entry_type = entry_type.map(|t| t.parse::<EntryType>()).transpose()?;
            let options = InitOptions {
                quiet,
                builder,
                build_command,
                optional_deps,
                // `--gui` absent means "ask", or false in quiet mode
                gui: gui.then_some(true),
                app_entry: entry,
                entry_type,
                python_version,
                opt_pyapp_vars,
            };
            Initializer::new(layout.root(), options).initialize()?;
            messages::success("Project initialized.");
        }

        Commands::Package {
            verbose,
            pyapp_source,
            pyapp_version,
        } => {
            require_box_project(&layout)?;
            let origin = SourceOrigin::resolve(
                pyapp_source.as_deref(),
                PyAppVersion::parse(&pyapp_version),
            )?;
            let output = Packager::from_layout(layout)?
                .source(origin)
                .verbose(verbose)
                .package()?;
            let name = output
                .binary
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            messages::success(format!(
                "Project successfully packaged.\n\
                 You can find the executable file {} in the `target/release` folder.",
                name
            ));
        }

        Commands::Installer { verbose } => {
            require_box_project(&layout)?;
            let installer = InstallerBuilder::from_layout(layout)?
                .verbose(verbose)
                .create()?;
            if let Some(path) = installer {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                messages::success(format!(
                    "Installer successfully created.\n\
                     You can find the installer file {} in the `target/release` folder.",
                    name
                ));
            }
        }

        Commands::Clean {
            dist,
            build,
            target,
            source_pyapp,
            pyapp_folder,
        } => {
            require_box_project(&layout)?;
            let options = CleanOptions {
                dist,
                build,
                target,
                source_pyapp,
                pyapp_folder,
            };
            clean(layout, options)?;
        }

        Commands::Uninit { clean_project } => {
            ProjectManifest::from_dir(layout.root())?;
            if clean_project {
                clean(layout.clone(), CleanOptions::default())?;
            }
            ManifestWriter::new(layout.root()).uninitialize()?;
            messages::success("Project un-initialized.");
        }

        Commands::Env {
            set,
            set_int,
            set_bool,
            get,
            list,
            unset,
        } => {
            require_box_project(&layout)?;
            let root = layout.root();

            for (values, typ) in [
                (set, VariableType::String),
                (set_int, VariableType::Int),
                (set_bool, VariableType::Bool),
            ] {
                for key_val in values {
                    messages::success(env_vars::set_variable(root, &key_val, typ)?);
                }
            }

            for name in unset {
                if env_vars::unset_variable(root, &name)? {
                    messages::success(format!("Variable {} unset.", name));
                } else {
                    messages::warning(format!("Could not find variable {}.", name));
                }
            }

            let manifest = ProjectManifest::from_dir(root)?;
            for name in get {
                match env_vars::get_variable(&manifest, &name) {
                    Some(value) => println!("{}", value),
                    None => messages::warning(format!(
                        "No variable named {} found in the configuration.",
                        name
                    )),
                }
            }

            if list {
                let vars = env_vars::list_variables(&manifest);
                if vars.is_empty() {
                    messages::warning("No variables set.");
                }
                for (key, value) in vars {
                    println!("{}: {}", key, value);
                }
            }
        }
    }

    Ok(())
}

fn require_box_project(layout: &ProjectLayout) -> BoxResult<()> {
    ProjectManifest::from_dir(layout.root())?.ensure_box_project()
}

fn clean(layout: ProjectLayout, options: CleanOptions) -> BoxResult<()> {
    let report = Cleaner::new(layout, options).clean()?;
    if report.is_empty() {
        messages::info(report.summary());
    } else {
        messages::success(report.summary());
    }
    Ok(())
}
