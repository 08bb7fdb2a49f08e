use anyhow::{Context, Result};
use log::debug;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

use super::{ArchiveWriter, Entry};

/// Writer for `.zip` artifacts
pub struct ZipWriter;

impl ArchiveWriter for ZipWriter {
    fn artifact_name(&self, stem: &str) -> String {
        format!("{stem}.zip")
    }

    #[tracing::instrument(skip(self, entries, out))]
    fn write(&self, entries: &[Entry], out: &mut dyn Write) -> Result<()> {
        debug!("Writing {} entries as zip", entries.len());

        // The zip writer needs Write + Seek, so assemble the archive in
        // memory and copy it out afterwards.
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            // Fixed timestamp (the zip epoch) and permissions keep rebuilds
            // byte-identical.
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .unix_permissions(0o644)
                .last_modified_time(zip::DateTime::default());

            for entry in entries {
                writer
                    .start_file(entry.path.as_str(), options)
                    .with_context(|| format!("Failed to start archive entry {}", entry.path))?;
                writer
                    .write_all(&entry.data)
                    .with_context(|| format!("Failed to write archive entry {}", entry.path))?;
            }
            writer.finish().context("Failed to finish zip archive")?;
        }

        out.write_all(cursor.get_ref())
            .context("Failed to write zip archive")?;
        Ok(())
    }
}
