use std::io::{self, Read, Write};

use anyhow::Context;
use flate2::{write::GzEncoder, Compression};

/// Counts bytes written without keeping them.
#[derive(Debug, Default)]
struct CountingSink {
    written: u64,
}

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Size of the data in `r`, either as is or after gzip at the default level.
pub fn measure<R: Read>(r: &mut R, gzip: bool) -> anyhow::Result<u64> {
    if !gzip {
        let mut sink = CountingSink::default();
        io::copy(r, &mut sink).context("read")?;
        return Ok(sink.written);
    }

    let mut encoder = GzEncoder::new(CountingSink::default(), Compression::default());
    io::copy(r, &mut encoder).context("gzip")?;
    let sink = encoder.finish().context("finish gzip stream")?;
    Ok(sink.written)
}
