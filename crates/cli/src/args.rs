//! Arguments shared by every subcommand

use clap::Args;
use std::path::PathBuf;

/// Global flags
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (defaults to photopost.toml in the usual places)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Whether decorative output (spinners, colours) should be shown
    pub fn interactive(&self) -> bool {
        !self.json && !self.quiet && console::user_attended_stderr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        global: GlobalArgs,
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["photopost", "--json", "-c", "site.toml"]);
        assert!(cli.global.json);
        assert_eq!(cli.global.config.as_deref(), Some(std::path::Path::new("site.toml")));
        assert!(!cli.global.interactive());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["photopost", "-v", "-q"]).is_err());
    }
}
