use std::fs::File;
use std::io::{BufReader, Read};

use camino::Utf8Path;

const CHUNK_SIZE: usize = 8192;

/// Incremental CRC32 accumulator, seeded at zero. Feed it chunks in stream
/// order; the result is independent of chunk boundaries.
#[derive(Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Render the accumulated value as lowercase hex at natural width, the
    /// form checksums take in the manifest.
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

/// Stream a reader through the accumulator in fixed-size chunks.
pub fn checksum_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut crc = Crc32::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
    }
    Ok(crc.finish())
}

/// Compute the checksum string for a file on disk.
pub fn checksum_file(fs_path: &Utf8Path) -> std::io::Result<String> {
    let file = File::open(fs_path)?;
    checksum_reader(BufReader::new(file))
}
