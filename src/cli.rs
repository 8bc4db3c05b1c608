use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Regex Clippy CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "regex-clippy",
    version,
    about = "Lint, simplify and normalize regular expressions",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub check: CheckArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report errors, tips and equivalences for a pattern.
    Check(CheckArgs),

    /// Print the canonical form of a pattern.
    Normalize(PatternArgs),

    /// Fold the first repeated run of a pattern into a quantifier.
    Fold(PatternArgs),

    /// Apply one rule's rewrite to the first place it matches.
    Fix {
        /// Rule to apply.
        #[arg(long)]
        rule: String,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// List available rules.
    ListRules,

    /// Explain a rule.
    Explain {
        /// Rule name.
        rule: String,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct PatternArgs {
    /// Pattern to process. Read from stdin when absent.
    #[arg(value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Path to a `regex-clippy.toml` config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CheckArgs {
    #[command(flatten)]
    pub pattern: PatternArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Only run these rules (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these rules (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Enable preview rules.
    #[arg(long)]
    pub preview: bool,

    /// Exit with code 1 if any finding is reported, not only errors.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}
