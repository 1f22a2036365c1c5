use palc::Parser;
use stilt::{Stilt, StiltError, cli::Cli};

fn main() {
	let cli = match Cli::try_parse_from(std::env::args_os()) {
		Ok(cli) => cli,
		Err(_) => {
			eprintln!("Usage: stilt [file_path]");
			std::process::exit(64);
		}
	};

	let mut stilt = Stilt::new();
	match cli.path {
		Some(path) => {
			if let Err(e) = stilt.run_file(&path) {
				// Compile and runtime halts already streamed their
				// diagnostics to stderr.
				match &e {
					StiltError::CompileErrors(_) | StiltError::RuntimeHalt => {}
					_ => eprintln!("{e}"),
				}
				std::process::exit(e.exit_code());
			}
		}
		None => stilt.run_prompt(),
	}
}
