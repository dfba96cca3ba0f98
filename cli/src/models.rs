use std::io::{self, Write};

use anyhow::Error;

use clap::Parser;

use demfit_core::{ModelDescriptor, Registry};

/// List available models.
///
/// Each line gives the name of a model, the names of its parameters, the initial guess, and the
/// lower and upper bounds, separated by tabs. Models sharing the demographic history of another
/// model, but with different bounds, additionally name that model.
#[derive(Debug, Parser)]
pub struct Models {}

impl Models {
    pub fn run(self) -> Result<(), Error> {
        let registry = Registry::builtin()?;

        let mut writer = io::stdout().lock();
        for descriptor in registry.iter() {
            writeln!(writer, "{}", format_descriptor(descriptor))?;
        }

        Ok(())
    }
}

fn format_descriptor(descriptor: &ModelDescriptor) -> String {
    let join = |values: &[f64]| {
        values
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}",
        descriptor.name(),
        descriptor.model().params().join(","),
        join(descriptor.guess()),
        join(descriptor.lower()),
        join(descriptor.upper()),
    );

    if let Some(target) = descriptor.alias_of() {
        line.push_str("\t-> ");
        line.push_str(target);
    }

    line
}
