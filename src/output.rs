//! Text outputs, optionally gzip compressed.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};

use crate::errors::HydroGridErr;

/// A text file being written, plain or gzip compressed.
pub enum TextOutput {
    /// Uncompressed.
    Plain(BufWriter<File>),
    /// Compressed with gzip.
    Gzip(GzEncoder<BufWriter<File>>),
}

impl TextOutput {
    /// Create (or truncate) the output at `path`.
    pub fn create(path: &Path, gzip: bool) -> Result<Self, HydroGridErr> {
        let file = File::create(path).map_err(|err| HydroGridErr::ResourceUnavailable {
            path: PathBuf::from(path),
            reason: err.to_string(),
        })?;
        let file = BufWriter::new(file);

        if gzip {
            Ok(TextOutput::Gzip(GzEncoder::new(file, Compression::default())))
        } else {
            Ok(TextOutput::Plain(file))
        }
    }

    /// Flush everything, writing the gzip trailer if there is one.
    pub fn finish(self) -> Result<(), HydroGridErr> {
        let mut file = match self {
            TextOutput::Plain(file) => file,
            TextOutput::Gzip(encoder) => encoder.finish()?,
        };
        file.flush()?;

        Ok(())
    }
}

impl Write for TextOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TextOutput::Plain(file) => file.write(buf),
            TextOutput::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TextOutput::Plain(file) => file.flush(),
            TextOutput::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Append `.gz` to a file name when compressing.
pub fn output_file_name(stem: &str, extension: &str, gzip: bool) -> String {
    if gzip {
        format!("{}.{}.gz", stem, extension)
    } else {
        format!("{}.{}", stem, extension)
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempdir::TempDir;

    #[test]
    fn test_plain_and_gzip_outputs() {
        let tmp = TempDir::new("hydro-grid-output").unwrap();

        let plain = tmp.path().join(output_file_name("rows", "txt", false));
        let mut out = TextOutput::create(&plain, false).unwrap();
        writeln!(out, "1,2,3").unwrap();
        out.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&plain).unwrap(), "1,2,3\n");

        let zipped = tmp.path().join(output_file_name("rows", "txt", true));
        assert!(zipped.to_string_lossy().ends_with("rows.txt.gz"));
        let mut out = TextOutput::create(&zipped, true).unwrap();
        writeln!(out, "1,2,3").unwrap();
        out.finish().unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&zipped).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "1,2,3\n");
    }
}
