//! CLI argument definitions using clap derive

use crate::exclude::ExcludeSpec;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vres - variant selection and artifact resolution
///
/// Selects the variants of a component that supply a configuration's
/// artifacts and resolves them from a local repository.
#[derive(Parser, Debug)]
#[command(name = "vres")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VRES_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the variants selected for a configuration
    Select(SelectArgs),

    /// Resolve the artifact files of a configuration
    Resolve(ResolveArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the select command
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Component descriptor (TOML)
    pub descriptor: PathBuf,

    /// Requested configuration name
    pub configuration: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Component descriptor (TOML)
    pub descriptor: PathBuf,

    /// Requested configuration name
    pub configuration: String,

    /// Exclude modules or artifacts (group[:module[:artifact[:ext[:classifier]]]])
    #[arg(short = 'x', long, value_parser = parse_exclude)]
    pub exclude: Vec<ExcludeSpec>,

    /// Override a variant attribute (KEY=VALUE)
    #[arg(short, long, value_parser = parse_attribute)]
    pub attribute: Vec<(String, String)>,

    /// Repository root (defaults to repository.root from config)
    #[arg(short, long)]
    pub repository: Option<PathBuf>,

    /// Compute SHA-256 checksums of resolved files
    #[arg(long)]
    pub checksums: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., repository.root)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for select and resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse an exclude rule
fn parse_exclude(s: &str) -> Result<ExcludeSpec, String> {
    s.parse::<ExcludeSpec>().map_err(|e| e.to_string())
}

/// Parse attribute override in KEY=VALUE format
fn parse_attribute(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    if pos == 0 {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_attribute_valid() {
        let (k, v) = parse_attribute("org.gradle.docstype=sources").unwrap();
        assert_eq!(k, "org.gradle.docstype");
        assert_eq!(v, "sources");
    }

    #[test]
    fn parse_attribute_invalid() {
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=value").is_err());
    }

    #[test]
    fn cli_parses_select() {
        let cli = Cli::parse_from(["vres", "select", "lib.toml", "runtime"]);
        match cli.command {
            Commands::Select(args) => {
                assert_eq!(args.descriptor, PathBuf::from("lib.toml"));
                assert_eq!(args.configuration, "runtime");
                assert_eq!(args.format, OutputFormat::Table);
            }
            _ => panic!("expected Select command"),
        }
    }

    #[test]
    fn cli_parses_resolve_with_excludes() {
        let cli = Cli::parse_from([
            "vres",
            "resolve",
            "lib.toml",
            "runtime",
            "-x",
            "com.example:lib",
            "--exclude",
            "org.slf4j:*",
            "-a",
            "org.gradle.docstype=sources",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.exclude.len(), 2);
                assert_eq!(args.exclude[1], ExcludeSpec::Group("org.slf4j".to_string()));
                assert_eq!(args.attribute.len(), 1);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn cli_rejects_bad_exclude() {
        let result = Cli::try_parse_from(["vres", "resolve", "lib.toml", "runtime", "-x", "a::b"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["vres", "config"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["vres", "-v", "config"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["vres", "-vv", "config"]);
        assert_eq!(cli.verbose, 2);
    }
}
