//! Utilities for writing spectra.

use std::{fs, io, path::Path};

use crate::spectrum::{Spectrum, State};

use super::text;

/// A builder to write a spectrum in plain text format.
#[derive(Debug)]
pub struct Builder {
    precision: usize,
}

impl Builder {
    /// Set precision.
    ///
    /// If unset, a precision of six digits will be used.
    pub fn set_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Write spectrum to writer.
    pub fn write<W, S: State>(self, writer: &mut W, spectrum: &Spectrum<S>) -> io::Result<()>
    where
        W: io::Write,
    {
        text::write_spectrum(writer, spectrum, self.precision)
    }

    /// Write spectrum to stdout.
    pub fn write_to_stdout<S: State>(self, spectrum: &Spectrum<S>) -> io::Result<()> {
        self.write(&mut io::stdout().lock(), spectrum)
    }

    /// Write spectrum to path.
    ///
    /// If path already exists, it will be overwritten.
    pub fn write_to_path<P, S: State>(self, path: P, spectrum: &Spectrum<S>) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        self.write(&mut fs::File::create(path)?, spectrum)
    }

    /// Write spectrum to path or stdout.
    ///
    /// If the provided path is `None`, write to stdout.
    /// If path already exists, it will be overwritten.
    pub fn write_to_path_or_stdout<P, S: State>(
        self,
        path: Option<P>,
        spectrum: &Spectrum<S>,
    ) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        match path {
            Some(path) => self.write_to_path(path, spectrum),
            None => self.write_to_stdout(spectrum),
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder { precision: 6 }
    }
}
