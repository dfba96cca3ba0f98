//! Utilities for reading SCS.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use flate2::read::MultiGzDecoder;

use crate::Scs;

use super::{ms, text, CompressionMethod, Format};

/// A builder to read an SCS.
#[derive(Debug, Default)]
pub struct Builder {
    format: Option<Format>,
    compression_method: Option<Option<CompressionMethod>>,
}

impl Builder {
    /// Read SCS from reader.
    pub fn read<R>(self, reader: &mut R) -> io::Result<Scs>
    where
        R: io::Read,
    {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        let compression_method = self
            .compression_method
            .unwrap_or_else(|| CompressionMethod::detect(&raw));

        let raw = match compression_method {
            Some(CompressionMethod::Gzip) => {
                let mut decompressed = Vec::new();
                MultiGzDecoder::new(&raw[..]).read_to_end(&mut decompressed)?;
                decompressed
            }
            None => raw,
        };

        let format = self.format.unwrap_or_else(|| Format::detect(&raw));

        let reader = &mut &raw[..];
        match format {
            Format::Text => text::read_scs(reader),
            Format::Ms => ms::read_scs(reader),
        }
    }

    /// Read SCS from path.
    pub fn read_from_path<P>(self, path: P) -> io::Result<Scs>
    where
        P: AsRef<Path>,
    {
        self.read(&mut fs::File::open(path)?)
    }

    /// Set compression method.
    ///
    /// If unset, gzip compression will automatically be detected when reading.
    pub fn set_compression_method(mut self, compression_method: Option<CompressionMethod>) -> Self {
        self.compression_method = Some(compression_method);
        self
    }

    /// Set format to read.
    ///
    /// If unset, the format will automatically be detected when reading.
    pub fn set_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}
