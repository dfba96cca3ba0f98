//! Utilities for reading and writing spectra.

pub mod ms;
pub mod read;
pub mod text;
pub mod write;

/// Supported input formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// Coalescent simulator output in the format of Hudson's `ms`.
    Ms,
    /// Plain text format.
    Text,
}

impl Format {
    fn detect(bytes: &[u8]) -> Self {
        Self::detect_plain_text(bytes).unwrap_or(Self::Ms)
    }

    fn detect_plain_text(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..text::START.len())
            .and_then(|start| (start == text::START).then_some(Self::Text))
    }
}

/// Supported compression methods.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionMethod {
    /// Gzip, including multi-member and BGZF files.
    Gzip,
}

impl CompressionMethod {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    fn detect(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..Self::GZIP_MAGIC_NUMBER.len())
            .and_then(|start| (start == Self::GZIP_MAGIC_NUMBER).then_some(Self::Gzip))
    }
}
