use std::path::PathBuf;

use anyhow::{Context, Result};
use fbmsg_gen::{Format, GenerateOptions, Input};
use slog::{o, Drain, Level, Logger};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(author, about)]
struct Args {
	/// The go file to write
	#[structopt(parse(from_os_str), default_value = "errmsgs.go")]
	output: PathBuf,
	/// Declarations to read, the bundled catalogue is used if none is given
	#[structopt(short = "i", long = "input", number_of_values = 1, parse(from_os_str))]
	inputs: Vec<PathBuf>,
	/// Directory to search for included headers
	#[structopt(short = "I", long = "include-dir", number_of_values = 1, parse(from_os_str))]
	include_dirs: Vec<PathBuf>,
	/// Format of the inputs (csv or header), guessed from the extension by
	/// default
	#[structopt(short = "f", long)]
	format: Option<Format>,
	/// Also write messages that are not status vector errors
	#[structopt(long)]
	all: bool,
	/// Package of the generated file
	#[structopt(long, default_value = "firebirdsql")]
	package: String,
	/// Name of the generated map
	#[structopt(long, default_value = "errmsgs")]
	map_name: String,
	/// Print more, can be given multiple times
	#[structopt(short = "v", long, parse(from_occurrences))]
	verbose: u8,
}

fn create_logger(verbose: u8) -> Logger {
	let level = match verbose {
		0 => Level::Info,
		1 => Level::Debug,
		_ => Level::Trace,
	};
	let decorator = slog_term::TermDecorator::new().build();
	let drain = slog_term::CompactFormat::new(decorator).build().fuse();
	let drain = drain.filter_level(level).fuse();
	let drain = slog_async::Async::new(drain).build().fuse();

	Logger::root(drain, o!())
}

fn main() -> Result<()> {
	// Parse command line options
	let args = Args::from_args();
	let logger = create_logger(args.verbose);
	let output = args.output;

	let mut options = GenerateOptions::new()
		.package(args.package)
		.map_name(args.map_name)
		.all_definitions(args.all)
		.logger(logger);
	for dir in args.include_dirs {
		options = options.include_dir(dir);
	}
	for input in args.inputs {
		options = options.input(Input::from_path(input, args.format));
	}

	options
		.generate(&output)
		.with_context(|| format!("Failed to generate {}", output.display()))?;
	Ok(())
}
