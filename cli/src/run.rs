use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Error};

use clap::{CommandFactory, Parser};

use demfit_core::{numerics::Grid, FitOptions, Registry};

mod runner;
use runner::Runner;

/// Fit a demographic model to spectra.
#[derive(Debug, Parser)]
pub struct Run {
    /// Input file pattern.
    ///
    /// All files in the directory of the pattern whose names start with the file name part of the
    /// pattern, and end with the suffix, will be fitted in order of their names. Files may contain
    /// ms output or a spectrum in plain text format, and may be gzip-compressed.
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Name of model to fit.
    ///
    /// Use the 'models' subcommand to list the available models.
    #[arg(value_name = "MODEL")]
    model: String,

    /// Output path.
    ///
    /// The output will contain one line per fitted file, giving the log-likelihood and the
    /// optimized parameters. If the path already exists, it will be overwritten.
    #[arg(value_name = "PATH")]
    output: PathBuf,

    /// Grid sizes used for extrapolation.
    ///
    /// Use comma to separate grid sizes. [default: 110,120,130]
    #[arg(long, use_value_delimiter = true, value_delimiter = ',', value_name = "INT,...")]
    pts: Option<Vec<usize>>,

    /// Maximum number of optimizer iterations per file. [default: 10]
    #[arg(short = 'n', long, value_name = "INT")]
    max_iterations: Option<u64>,

    /// Perturbation of the initial guess, in factors of two. [default: 1]
    #[arg(long, value_name = "FLOAT")]
    fold: Option<f64>,

    /// Seed for the random number generator.
    ///
    /// By default, the random number generator is seeded from the system.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Suffix of input files.
    #[arg(long, default_value = "txt", value_name = "SUFFIX")]
    suffix: String,

    /// Promote warnings to errors.
    ///
    /// By default, files that cannot be read or fitted are skipped with a warning. Using this flag
    /// will cause an error instead.
    #[arg(long)]
    strict: bool,
}

impl Run {
    fn options(&self) -> Result<FitOptions, Error> {
        let defaults = FitOptions::default();

        let options = FitOptions {
            pts: self.pts.clone().unwrap_or(defaults.pts),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            fold: self.fold.unwrap_or(defaults.fold),
            seed: self.seed.or(defaults.seed),
        };

        let invalid = |message: String| {
            Run::command().error(clap::error::ErrorKind::ValueValidation, message)
        };

        if options.pts.is_empty() {
            return Err(invalid("at least one grid size is required".to_string()).into());
        }
        if let Some(pts) = options.pts.iter().find(|&&pts| pts < Grid::MIN_POINTS) {
            return Err(invalid(format!(
                "grid size {pts} is too small, minimum is {}",
                Grid::MIN_POINTS
            ))
            .into());
        }
        if options.pts.iter().collect::<HashSet<_>>().len() != options.pts.len() {
            return Err(invalid("grid sizes must be distinct".to_string()).into());
        }
        if !(options.fold.is_finite() && options.fold >= 0.0) {
            return Err(invalid(format!("invalid fold {}", options.fold)).into());
        }

        Ok(options)
    }

    pub fn run(self) -> Result<(), Error> {
        let registry = Registry::builtin()?;
        let descriptor = registry.resolve(&self.model)?.clone();
        let options = self.options()?;

        let paths = discover(&self.pattern, &self.suffix)?;
        if paths.is_empty() {
            anyhow::bail!(
                "no files match pattern '{}' with suffix '{}'",
                self.pattern,
                self.suffix
            );
        }
        log::info!("Found {} file(s) matching pattern", paths.len());

        let mut runner = Runner::new(descriptor, options, self.strict);
        let results = runner.run(&paths)?;

        runner::write_results(&self.output, &results).with_context(|| {
            format!(
                "Failed to write output to path '{}'",
                self.output.display()
            )
        })
    }
}

/// Returns the files in the directory of the pattern that start with its file name part and end
/// with the suffix, sorted by name.
fn discover(pattern: &str, suffix: &str) -> Result<Vec<PathBuf>, Error> {
    let (directory, prefix) = split_pattern(pattern);

    let entries = fs::read_dir(&directory).with_context(|| {
        format!(
            "Failed to read directory '{}' of pattern '{pattern}'",
            directory.display()
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();

        let matches = path.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(suffix));

        if matches {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Splits a pattern into the directory to search and the file name prefix.
fn split_pattern(pattern: &str) -> (PathBuf, &str) {
    match pattern.rsplit_once(std::path::MAIN_SEPARATOR) {
        Some(("", prefix)) => (PathBuf::from(std::path::MAIN_SEPARATOR_STR), prefix),
        Some((directory, prefix)) => (PathBuf::from(directory), prefix),
        None => (Path::new(".").to_path_buf(), pattern),
    }
}
