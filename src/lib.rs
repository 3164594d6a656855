mod archive;
mod assets;
mod error;
mod font;
mod registry;
mod stamp;
#[cfg(test)]
mod testutil;

pub use archive::ArchiveBuilder;
pub use assets::{AssetSource, DirAssets, MemoryAssets, sha256_hex};
pub use error::StampError;
pub use font::{ShapedRun, StampFont};
pub use registry::{CoordinateOverrides, Point, TemplateDefinition, TemplateRegistry};
pub use stamp::{Color, StampStyle, stamp_document};

/// One named entity to personalize a document for. Owned by the ingestion
/// side; `name` is expected to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestRecord {
    pub id: String,
    pub name: String,
}

impl GuestRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub id: String,
    pub reason: String,
}

/// Result of a batch run: the ZIP plus the generated-versus-failed accounting
/// the caller reports back to the operator.
#[derive(Debug)]
pub struct BatchOutput {
    pub zip_bytes: Vec<u8>,
    pub requested: usize,
    pub generated: usize,
    pub failed: Vec<FailedRecord>,
}

/// Generate one document per record across the worker pool and archive the
/// successes in input order.
///
/// A failing record is recorded and skipped, never fatal to the batch; asset
/// and configuration problems are the caller's to surface before calling this.
pub fn archive_batch<F>(
    records: &[GuestRecord],
    workers: Option<usize>,
    generate: F,
) -> Result<BatchOutput, StampError>
where
    F: Fn(&GuestRecord) -> Result<Vec<u8>, StampError> + Sync,
{
    use rayon::prelude::*;

    if records.is_empty() {
        return Err(StampError::EmptyBatch);
    }

    let map = || {
        records
            .par_iter()
            .enumerate()
            .map(|(idx, record)| (idx, generate(record)))
            .collect::<Vec<(usize, Result<Vec<u8>, StampError>)>>()
    };
    let mut results = match workers {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|err| StampError::Io(std::io::Error::other(err.to_string())))?;
            pool.install(map)
        }
        None => map(),
    };
    results.sort_by_key(|(idx, _)| *idx);

    let mut builder = ArchiveBuilder::new();
    let mut failed = Vec::new();
    for (idx, result) in results {
        let record = &records[idx];
        match result {
            Ok(bytes) => {
                builder.append(&record.id, &record.name, &bytes)?;
            }
            Err(err) => {
                log::warn!("record {} ({}) failed: {}", record.id, record.name, err);
                failed.push(FailedRecord {
                    id: record.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let generated = builder.len();
    let zip_bytes = builder.finish()?;
    Ok(BatchOutput {
        zip_bytes,
        requested: records.len(),
        generated,
        failed,
    })
}

/// Batch personalization engine: resolves a template's insertion points,
/// stamps one document per guest and packages the results as a ZIP.
pub struct NameStamper {
    registry: TemplateRegistry,
    assets: Box<dyn AssetSource>,
    style: StampStyle,
    workers: Option<usize>,
}

pub struct NameStamperBuilder {
    registry: TemplateRegistry,
    assets: Box<dyn AssetSource>,
    style: StampStyle,
    workers: Option<usize>,
}

impl NameStamperBuilder {
    pub fn new(assets: impl AssetSource + 'static) -> Self {
        Self {
            registry: TemplateRegistry::builtin(),
            assets: Box::new(assets),
            style: StampStyle::default(),
            workers: None,
        }
    }

    /// Replace the builtin template table, e.g. for a different template pack.
    pub fn registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn style(mut self, style: StampStyle) -> Self {
        self.style = style;
        self
    }

    /// Bound the generation pool instead of using the global one.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    pub fn build(self) -> NameStamper {
        NameStamper {
            registry: self.registry,
            assets: self.assets,
            style: self.style,
            workers: self.workers,
        }
    }
}

impl NameStamper {
    pub fn builder(assets: impl AssetSource + 'static) -> NameStamperBuilder {
        NameStamperBuilder::new(assets)
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Stamp every record's name onto its own copy of the template and return
    /// the ZIP plus per-record failure accounting.
    ///
    /// Template and font bytes are loaded and parsed once, before any worker
    /// starts; registry and asset failures surface here, wholesale.
    pub fn generate_batch(
        &self,
        template_id: &str,
        records: &[GuestRecord],
        overrides: Option<&CoordinateOverrides>,
    ) -> Result<BatchOutput, StampError> {
        if records.is_empty() {
            return Err(StampError::EmptyBatch);
        }
        let def = self.registry.lookup(template_id)?;
        let placements = def.resolve_coordinates(overrides);
        let template_bytes = self.assets.template_bytes(template_id)?;
        let font = StampFont::parse(self.assets.font_bytes()?)?;

        log::info!(
            "batch start: template {} records {} pages {:?}",
            template_id,
            records.len(),
            def.page_set
        );
        let output = archive_batch(records, self.workers, |record| {
            stamp_document(
                &template_bytes,
                &font,
                &record.name,
                &placements,
                &self.style,
            )
        })?;
        log::info!(
            "batch done: template {} generated {}/{} failed {}",
            template_id,
            output.generated,
            output.requested,
            output.failed.len()
        );
        Ok(output)
    }

    /// One rendered sample for validating coordinate overrides before a batch.
    pub fn generate_preview(
        &self,
        template_id: &str,
        test_text: &str,
        overrides: Option<&CoordinateOverrides>,
    ) -> Result<Vec<u8>, StampError> {
        let def = self.registry.lookup(template_id)?;
        let placements = def.resolve_coordinates(overrides);
        let template_bytes = self.assets.template_bytes(template_id)?;
        let font = StampFont::parse(self.assets.font_bytes()?)?;
        log::debug!(
            "preview: template {} text {:?} pages {:?}",
            template_id,
            test_text,
            def.page_set
        );
        stamp_document(&template_bytes, &font, test_text, &placements, &self.style)
    }
}
