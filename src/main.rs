use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
    process::ExitCode,
};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use wikiq::{
    classifier::Classifier,
    cli::CommandLine,
    config::{Config, OutputMode},
    output::RowWriter,
};

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdin().lock()));
    };

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|extension| extension == "zst") {
        let decoder = zstd::stream::Decoder::with_buffer(reader)
            .with_context(|| format!("Failed to start decompressing {}", path.display()))?;
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(reader))
    }
}

fn dry_run(config: &Config, classifier: &Classifier) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let mode = match config.output_mode {
        OutputMode::Simple => "simple",
        OutputMode::Full => "full",
    };
    writeln!(stdout, "output mode: {mode}")?;

    let mut writer = RowWriter::new(stdout, config.output_mode);
    writer.write_header(&classifier.column_names())?;
    writer.flush()?;
    Ok(())
}

fn run(command_line: &CommandLine, config: &Config) -> Result<()> {
    // invalid regexes are reported before any input is touched
    let classifier = Classifier::new(config)?;
    if command_line.dry_run {
        return dry_run(config, &classifier);
    }

    let input = open_input(command_line.input.as_deref())?;
    let output = BufWriter::new(io::stdout().lock());
    let stats = wikiq::convert_with(input, output, classifier, config.output_mode)?;
    tracing::debug!(?stats);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let (command_line, config) = match CommandLine::try_parse_config(std::env::args_os()) {
        Ok(parsed) => parsed,
        // prints usage, exits with 0 for --help and --version
        Err(error) => error.exit(),
    };

    match run(&command_line, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match error.downcast_ref::<wikiq::Error>() {
                Some(wikiq::Error::Parsing(parsing_error)) if parsing_error.is_malformed_input() => {
                    eprintln!("XML ERROR: {parsing_error}");
                }
                _ => eprintln!("Error: {error:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
