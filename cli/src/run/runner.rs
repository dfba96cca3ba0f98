use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Error};

use rand::rngs::StdRng;

use demfit_core::{
    numerics::DiffusionBackend, spectrum, FitOptions, FitResult, Fitter, ModelDescriptor,
};

pub struct Runner {
    descriptor: ModelDescriptor,
    fitter: Fitter<DiffusionBackend>,
    rng: StdRng,
    strict: bool,
    skipped: usize,
}

impl Runner {
    pub fn new(descriptor: ModelDescriptor, options: FitOptions, strict: bool) -> Self {
        let rng = options.rng();

        Self {
            descriptor,
            fitter: Fitter::new(DiffusionBackend, options),
            rng,
            strict,
            skipped: 0,
        }
    }

    /// Fits each path in turn, returning the results of those that succeeded in the same order.
    pub fn run(&mut self, paths: &[PathBuf]) -> Result<Vec<FitResult>, Error> {
        let mut results = Vec::with_capacity(paths.len());

        for (i, path) in paths.iter().enumerate() {
            log::info!(
                "Fitting model '{}' to '{}' ({}/{})",
                self.descriptor.name(),
                path.display(),
                i + 1,
                paths.len()
            );

            match self.fit_path(path) {
                Ok(result) => {
                    log::info!(
                        "Log-likelihood {} at initial guess, {} after optimization",
                        result.initial_log_likelihood,
                        result.log_likelihood
                    );
                    results.push(result);
                }
                Err(error) => {
                    if self.strict {
                        Err(error)?
                    } else {
                        log::warn!("Skipping '{}' due to error: {error:#}", path.display());
                        self.skipped += 1;
                    }
                }
            }
        }

        self.summarize(paths.len());

        Ok(results)
    }

    fn fit_path(&mut self, path: &Path) -> Result<FitResult, Error> {
        let data = spectrum::io::read::Builder::default()
            .read_from_path(path)
            .with_context(|| format!("Failed to read spectrum from path '{}'", path.display()))?;
        log::debug!("Read spectrum with shape {}", data.shape());

        self.fitter
            .fit(&self.descriptor, &data, &mut self.rng)
            .with_context(|| format!("Failed to fit spectrum from path '{}'", path.display()))
    }

    fn summarize(&self, total: usize) {
        if self.skipped > 0 {
            log::warn!("Skipped {} of {total} files due to errors.", self.skipped);
        }
    }
}

/// Writes one line per result to the path, overwriting any existing file.
pub fn write_results<P>(path: P, results: &[FitResult]) -> io::Result<()>
where
    P: AsRef<Path>,
{
    let mut writer = BufWriter::new(File::create(path)?);

    for result in results {
        writeln!(writer, "{result}")?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{env, fs, process};

    use demfit_core::Registry;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = env::temp_dir().join(format!("demfit-{name}-{}", process::id()));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    const MS: &str = "\
ms 4 2 -t 5.0
12345 678 91011

//
segsites: 3
positions: 0.1 0.5 0.9
100
110
001
000

//
segsites: 2
positions: 0.2 0.7
10
11
11
01
";

    const MS_TWO_POPULATIONS: &str = "\
ms 8 2 -t 5.0 -I 2 4 4 -ej 0.05 2 1
12345 678 91011

//
segsites: 4
positions: 0.1 0.4 0.6 0.9
1000
1100
0010
0000
1001
0001
0110
0000

//
segsites: 3
positions: 0.2 0.5 0.8
100
110
000
001
010
011
000
100
";

    fn options() -> FitOptions {
        FitOptions {
            pts: vec![12, 16, 20],
            max_iterations: 2,
            fold: 1.0,
            seed: Some(1),
        }
    }

    #[test]
    fn test_run_skips_unreadable_files() {
        let dir = TempDir::new("skip");
        fs::write(dir.0.join("sim_a.txt"), MS).unwrap();
        fs::write(dir.0.join("sim_b.txt"), "not a spectrum").unwrap();
        fs::write(dir.0.join("sim_c.txt"), MS).unwrap();
        let paths = ["sim_a.txt", "sim_b.txt", "sim_c.txt"].map(|name| dir.0.join(name));

        let registry = Registry::builtin().unwrap();
        let descriptor = registry.resolve("trunk_2epoch_sizechange").unwrap().clone();
        let mut runner = Runner::new(descriptor, options(), false);

        let results = runner.run(&paths).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(runner.skipped, 1);

        let output = dir.0.join("out");
        write_results(&output, &results).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let lines = written.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        for (line, result) in lines.iter().zip(results.iter()) {
            let fields = line.split('\t').collect::<Vec<_>>();
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0].parse::<f64>().unwrap(), result.log_likelihood);
            assert!(fields[1].starts_with('[') && fields[1].ends_with(']'));
            assert_eq!(fields[1].split(", ").count(), 2);
            assert_eq!(fields[2], "");
        }
    }

    #[test]
    fn test_run_two_population_model() {
        let dir = TempDir::new("two-populations");
        fs::write(dir.0.join("sim.txt"), MS_TWO_POPULATIONS).unwrap();
        let paths = [dir.0.join("sim.txt")];

        let registry = Registry::builtin().unwrap();
        let descriptor = registry.resolve("bneck_2params").unwrap().clone();
        let mut runner = Runner::new(descriptor.clone(), options(), false);

        let results = runner.run(&paths).unwrap();
        assert_eq!(runner.skipped, 0);
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert!(result.log_likelihood.is_finite());
        assert!(result.log_likelihood <= 0.0);
        assert_eq!(result.params.len(), 2);
        assert!(descriptor.is_within_bounds(&result.params));

        let output = dir.0.join("out");
        write_results(&output, &results).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let lines = written.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);

        let fields = lines[0].split('\t').collect::<Vec<_>>();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].parse::<f64>().unwrap(), result.log_likelihood);
        assert_eq!(fields[1].split(", ").count(), 2);
        assert_eq!(fields[2], "");
    }

    #[test]
    fn test_run_strict_aborts() {
        let dir = TempDir::new("strict");
        fs::write(dir.0.join("sim_a.txt"), "not a spectrum").unwrap();
        let paths = [dir.0.join("sim_a.txt")];

        let registry = Registry::builtin().unwrap();
        let descriptor = registry.resolve("trunk_2epoch_sizechange").unwrap().clone();
        let mut runner = Runner::new(descriptor, options(), true);

        assert!(runner.run(&paths).is_err());
    }

    #[test]
    fn test_run_skips_sample_size_mismatch() {
        let dir = TempDir::new("mismatch");
        fs::write(dir.0.join("sim.txt"), MS).unwrap();
        let paths = [dir.0.join("sim.txt")];

        // Two-population model, one-population data
        let registry = Registry::builtin().unwrap();
        let descriptor = registry.resolve("IM_2params").unwrap().clone();
        let mut runner = Runner::new(descriptor, options(), false);

        assert!(runner.run(&paths).unwrap().is_empty());
        assert_eq!(runner.skipped, 1);
    }
}
