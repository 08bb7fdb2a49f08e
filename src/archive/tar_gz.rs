use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::debug;
use std::io::Write;
use tar::{Builder, Header};

use super::{ArchiveWriter, Entry};

/// Writer for `.tar.gz` source distributions
pub struct TarGzWriter;

impl ArchiveWriter for TarGzWriter {
    fn artifact_name(&self, stem: &str) -> String {
        format!("{stem}.tar.gz")
    }

    #[tracing::instrument(skip(self, entries, out))]
    fn write(&self, entries: &[Entry], out: &mut dyn Write) -> Result<()> {
        debug!("Writing {} entries as tar.gz", entries.len());
        let encoder = GzEncoder::new(out, Compression::default());
        let mut builder = Builder::new(encoder);

        for entry in entries {
            // Fixed mtime/mode/ownership keep rebuilds byte-identical.
            let mut header = Header::new_gnu();
            header.set_size(entry.data.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            builder
                .append_data(&mut header, &entry.path, entry.data.as_slice())
                .with_context(|| format!("Failed to append archive entry {}", entry.path))?;
        }

        let encoder = builder
            .into_inner()
            .context("Failed to finish tar stream")?;
        encoder.finish().context("Failed to finish gzip stream")?;
        Ok(())
    }
}
