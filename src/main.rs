//! svn-authz
//!
//! Reports the permissions a Subversion authz file grants.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use svn_authz::{
    Access, Policy,
    config::{AppConfig, LogFormat, load_config},
};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Evaluate Subversion path-based authorization rules
#[derive(Parser, Debug)]
#[command(name = "svn-authz")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SVN_AUTHZ_CONFIG")]
    config: Option<String>,

    /// Authz file to evaluate (overrides authz.file)
    #[arg(short, long)]
    authz: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SVN_AUTHZ_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the permissions a user has on one or more paths
    Check {
        /// User name; omit for an anonymous request
        #[arg(short, long)]
        user: Option<String>,

        /// Paths as `repository:/dir` or `/dir`
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List the user names a selector denotes
    Members {
        /// Selector such as `@group` or `&alias`
        selector: String,
    },
    /// Tell whether a user satisfies a selector
    Includes {
        /// User name; omit for an anonymous request
        #[arg(short, long)]
        user: Option<String>,

        selector: String,
    },
}

#[derive(Serialize)]
struct CheckResult<'a> {
    path: &'a str,
    access: Access,
    route: Option<String>,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn render_includes(included: bool, json: bool) -> serde_json::Result<String> {
    if json {
        serde_json::to_string(&included)
    } else {
        Ok(included.to_string())
    }
}

fn run(args: &Args, config: &AppConfig) -> anyhow::Result<()> {
    let file = args
        .authz
        .clone()
        .or_else(|| config.authz.expanded_file())
        .context("no authz file given (use --authz or set authz.file)")?;

    let policy = Policy::from_path(&file, config.authz.match_mode)
        .with_context(|| format!("failed to load authz file {}", file))?;
    debug!(file = %file, routes = policy.routes().len(), "Loaded authz file");

    match &args.command {
        Command::Check { user, paths } => {
            let mut results = Vec::with_capacity(paths.len());
            for path in paths {
                let decision = policy.decide(user.as_deref(), path)?;
                results.push(CheckResult {
                    path,
                    access: decision.access,
                    route: decision.route,
                });
            }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    println!("{}\t{}", result.path, result.access);
                }
            }
        }
        Command::Members { selector } => {
            let members = policy.resolve(selector)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&members[..])?);
            } else {
                for member in members.iter() {
                    println!("{}", member);
                }
            }
        }
        Command::Includes { user, selector } => {
            let included = policy.includes(user.as_deref(), selector)?;
            println!("{}", render_includes(included, args.json)?);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    init_logging(&args, &config);

    run(&args, &config).inspect_err(|e| error!(error = %e, "svn-authz failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_honours_json_flag() {
        let args = Args::try_parse_from([
            "svn-authz", "--json", "includes", "--user", "harry", "@calc",
        ])
        .unwrap();
        assert!(args.json);
        assert!(matches!(args.command, Command::Includes { .. }));

        let rendered = render_includes(true, args.json).unwrap();
        assert_eq!(serde_json::from_str::<bool>(&rendered).unwrap(), true);
        assert_eq!(render_includes(false, false).unwrap(), "false");
    }
}
