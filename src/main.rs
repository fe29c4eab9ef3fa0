use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use resolvr::report::Report;
use resolvr::{Config, Generator, Outcome, Resolver, Services, constants};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "resolvr")]
#[command(about = "Resolve dependency manifests and generate call graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Language {
    Java,
    Golang,
}

#[derive(Subcommand)]
enum Commands {
    /// Write dependency lock files for every manifest found
    Resolve {
        /// Directories to scan (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Glob of paths to skip (can be specified multiple times)
        #[arg(short, long)]
        exclusion: Vec<String>,

        /// Resolve manifests even when their lock file exists
        #[arg(long)]
        regenerate: bool,

        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,

        /// Number of jobs run at the same time
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write the run report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Generate call graphs for Java and Go projects
    Callgraph {
        /// Directories to scan (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Glob of paths to skip (can be specified multiple times)
        #[arg(short, long)]
        exclusion: Vec<String>,

        /// Glob of paths to keep even when excluded (can be specified multiple times)
        #[arg(short, long)]
        inclusion: Vec<String>,

        /// Languages to generate call graphs for (defaults to all configured)
        #[arg(short, long, value_enum)]
        language: Vec<Language>,

        /// Build Java projects before looking for compiled classes
        #[arg(long)]
        build: bool,

        /// Deadline for the whole run, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,

        /// Write the run report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn scan_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    }
}

/// Configured exclusions followed by the ones given on the command line
fn merge_exclusions(config: &Config, extra: Vec<String>) -> Vec<String> {
    config.exclusions.iter().cloned().chain(extra).collect()
}

fn finish(command: &str, outcome: &Outcome, json: Option<PathBuf>, services: &Services) -> Result<()> {
    let report = Report::new(command, outcome);
    report.print(&services.logger);
    if let Some(path) = json {
        report.write_json(&path)?;
    }
    if report.has_critical() {
        anyhow::bail!("{} job(s) failed", report.failed());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let services = Services::system();

    match cli.command {
        Commands::Resolve {
            paths,
            exclusion,
            regenerate,
            config,
            workers,
            json,
        } => {
            let mut config = Config::load_or_default(&config)?;
            config.regenerate |= regenerate;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.validate()?;

            let exclusions = merge_exclusions(&config, exclusion);
            let resolver = Resolver::new(config, services.clone());
            let resolution = resolver.resolve(&scan_paths(paths), &exclusions).await?;
            finish("resolve", &resolution, json, &services)?;
        }
        Commands::Callgraph {
            paths,
            exclusion,
            inclusion,
            language,
            build,
            timeout,
            config,
            json,
        } => {
            let config = Config::load_or_default(&config)?;
            let mut configs = config.callgraph.clone();
            if !language.is_empty() {
                if !language.contains(&Language::Java) {
                    configs.java = None;
                }
                if !language.contains(&Language::Golang) {
                    configs.golang = None;
                }
            }
            if build {
                if let Some(java) = configs.java.as_mut() {
                    java.build = true;
                }
            }

            let exclusions = merge_exclusions(&config, exclusion);
            let inclusions: Vec<String> = config.inclusions.iter().cloned().chain(inclusion).collect();
            let timeout = Duration::from_secs(timeout.unwrap_or(config.timeout_secs));
            if timeout.is_zero() {
                anyhow::bail!("--timeout must be greater than 0");
            }

            let generator = Generator::new(config.workers, services.clone());
            let generation = generator
                .generate(&scan_paths(paths), &exclusions, &inclusions, &configs, timeout)
                .await?;
            finish("callgraph", &generation, json, &services)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "resolvr", &mut std::io::stdout());
        }
    }

    Ok(())
}
