use std::path::PathBuf;

use anyhow::Error;

use clap::Parser;

use demfit_core::{numerics::DiffusionBackend, spectrum, FitOptions, Registry};

/// Evaluate the expected spectrum of a model.
///
/// The spectrum is printed in plain text format, extrapolated to infinite grid resolution. It is
/// not scaled by θ, so that entries give the expected number of sites per unit population-scaled
/// mutation rate.
#[derive(Debug, Parser)]
pub struct Evaluate {
    /// Name of model to evaluate.
    #[arg(value_name = "MODEL")]
    model: String,

    /// Model parameters.
    ///
    /// Use comma to separate parameters, in the order listed by the 'models' subcommand.
    #[arg(
        short = 'p',
        long,
        required = true,
        allow_negative_numbers = true,
        use_value_delimiter = true,
        value_delimiter = ',',
        value_name = "FLOAT,..."
    )]
    params: Vec<f64>,

    /// Number of sampled chromosomes in each population.
    ///
    /// Use comma to separate sample sizes.
    #[arg(
        short = 's',
        long,
        required = true,
        use_value_delimiter = true,
        value_delimiter = ',',
        value_name = "INT,..."
    )]
    sample_sizes: Vec<usize>,

    /// Grid sizes used for extrapolation.
    ///
    /// Use comma to separate grid sizes. [default: 110,120,130]
    #[arg(long, use_value_delimiter = true, value_delimiter = ',', value_name = "INT,...")]
    pts: Option<Vec<usize>>,

    /// Output spectrum path.
    ///
    /// If no path is given, the spectrum will be output to stdout.
    #[arg(short = 'o', long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Precision to use when printing spectrum.
    #[arg(long, default_value_t = 6, value_name = "INT")]
    precision: usize,
}

impl Evaluate {
    pub fn run(self) -> Result<(), Error> {
        let registry = Registry::builtin()?;
        let descriptor = registry.resolve(&self.model)?;
        let pts = self.pts.unwrap_or_else(|| FitOptions::default().pts);

        if self.params.len() == descriptor.model().arity()
            && !descriptor.is_within_bounds(&self.params)
        {
            log::warn!(
                "Parameters {:?} are outside the bounds of model '{}'",
                self.params,
                descriptor.name()
            );
        }

        let sfs = descriptor.model().evaluate_extrapolated(
            &DiffusionBackend,
            &self.params,
            &self.sample_sizes,
            &pts,
        )?;

        spectrum::io::write::Builder::default()
            .set_precision(self.precision)
            .write_to_path_or_stdout(self.output, &sfs)?;

        Ok(())
    }
}
