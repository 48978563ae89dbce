use anyhow::{Context, Result};
use flate2::bufread::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open `path` as a stream of CSV bytes, decompressing on the fly when the
/// file starts with the gzip magic number.
pub fn open_decoded(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let head = reader
        .fill_buf()
        .with_context(|| format!("reading {}", path.display()))?;
    if head.starts_with(&GZIP_MAGIC) {
        debug!(path = %path.display(), "gzip input");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        debug!(path = %path.display(), "plain input");
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    const CSV: &str = "a,b\n1,x\n2,y\n";

    fn read_all(path: &Path) -> Result<String> {
        let mut out = String::new();
        open_decoded(path)?.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn plain_input_passes_through() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(CSV.as_bytes())?;
        assert_eq!(read_all(tmp.path())?, CSV);
        Ok(())
    }

    #[test]
    fn gzip_input_is_decompressed() -> Result<()> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(CSV.as_bytes())?;
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&enc.finish()?)?;
        assert_eq!(read_all(tmp.path())?, CSV);
        Ok(())
    }

    #[test]
    fn empty_file_reads_as_empty() -> Result<()> {
        let tmp = NamedTempFile::new()?;
        assert_eq!(read_all(tmp.path())?, "");
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(open_decoded(Path::new("/definitely/not/here.csv.gz")).is_err());
    }
}
