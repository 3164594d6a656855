use crate::StampError;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Collects generated documents into a single in-memory ZIP.
///
/// Entry names are derived from guest display names and disambiguated
/// deterministically, so two guests sharing a name can never overwrite each
/// other inside the archive. Entries are appended in input record order.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    used_names: BTreeSet<String>,
    entries: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            used_names: BTreeSet::new(),
            entries: 0,
        }
    }

    /// Append one generated document. Returns the entry name actually used.
    pub fn append(
        &mut self,
        record_id: &str,
        display_name: &str,
        bytes: &[u8],
    ) -> Result<String, StampError> {
        let filename = self.unique_filename(record_id, display_name);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(filename.as_str(), options)
            .map_err(|err| StampError::Archive(err.to_string()))?;
        self.writer.write_all(bytes)?;
        self.used_names.insert(filename.clone());
        self.entries += 1;
        Ok(filename)
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn finish(self) -> Result<Vec<u8>, StampError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|err| StampError::Archive(err.to_string()))?;
        Ok(cursor.into_inner())
    }

    /// First come, first served: the plain name, then name plus record id,
    /// then a numeric suffix. Deterministic for a given input order.
    fn unique_filename(&self, record_id: &str, display_name: &str) -> String {
        let mut base = sanitize_name(display_name);
        if base.is_empty() {
            base = format!("guest-{}", sanitize_name(record_id));
        }

        let candidate = format!("{}.pdf", base);
        if !self.used_names.contains(&candidate) {
            return candidate;
        }
        let candidate = format!("{}-{}.pdf", base, sanitize_name(record_id));
        if !self.used_names.contains(&candidate) {
            return candidate;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}-{}-{}.pdf", base, sanitize_name(record_id), n);
            if !self.used_names.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep ASCII alphanumerics, whitespace and the Gujarati block; every run of
/// anything else collapses to one underscore.
pub(crate) fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_stripped_run = false;
    for ch in name.chars() {
        let keep = ch.is_ascii_alphanumeric()
            || ch.is_whitespace()
            || ('\u{0A80}'..='\u{0AFF}').contains(&ch);
        if keep {
            out.push(ch);
            in_stripped_run = false;
        } else if !in_stripped_run {
            out.push('_');
            in_stripped_run = true;
        }
    }
    let trimmed = out.trim().trim_matches('_').trim();
    trimmed.to_string()
}
