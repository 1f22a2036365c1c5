use std::path::PathBuf;

use palc::Parser;

/// CLI arguments
#[derive(Parser)]
#[command(name = "stilt", after_long_help = "Runs a script, or starts an interactive prompt when no path is given.")]
pub struct Cli {
	/// Script to execute; starts the interactive prompt when omitted
	pub path: Option<PathBuf>,
}
