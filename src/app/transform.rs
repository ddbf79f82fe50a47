use crate::app::metadata::document::{FieldPath, MetadataDocument};
use crate::app::metadata::{paths, purpose_regex};
use crate::domain::model::{BoundingBox, Record, TemporalExtent, TransformedData};
use crate::domain::ports::Transformer;
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use regex::Regex;

/// Flattens a metadata record into a [`TransformedData`] summary.
pub struct MetadataTransformer {
    title: FieldPath,
    abstract_text: FieldPath,
    purpose: FieldPath,
    resource_type: FieldPath,
    classification: FieldPath,
    license: FieldPath,
    reference_system: FieldPath,
    west: FieldPath,
    east: FieldPath,
    south: FieldPath,
    north: FieldPath,
    begin: FieldPath,
    end: FieldPath,
    purpose_pattern: Regex,
}

impl MetadataTransformer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title: FieldPath::parse(paths::TITLE)?,
            abstract_text: FieldPath::parse(paths::ABSTRACT)?,
            purpose: FieldPath::parse(paths::PURPOSE)?,
            resource_type: FieldPath::parse(paths::RESOURCE_TYPE)?,
            classification: FieldPath::parse(paths::CLASSIFICATION)?,
            license: FieldPath::parse(paths::LICENSE)?,
            reference_system: FieldPath::parse(paths::REFERENCE_SYSTEM)?,
            west: FieldPath::parse(paths::WEST)?,
            east: FieldPath::parse(paths::EAST)?,
            south: FieldPath::parse(paths::SOUTH)?,
            north: FieldPath::parse(paths::NORTH)?,
            begin: FieldPath::parse(paths::BEGIN_DATE)?,
            end: FieldPath::parse(paths::END_DATE)?,
            purpose_pattern: purpose_regex()?,
        })
    }

    fn bounding_box(&self, doc: &MetadataDocument) -> Option<BoundingBox> {
        let coordinate = |path: &FieldPath| doc.text(path)?.parse::<f64>().ok();
        Some(BoundingBox {
            west: coordinate(&self.west)?,
            east: coordinate(&self.east)?,
            south: coordinate(&self.south)?,
            north: coordinate(&self.north)?,
        })
    }

    fn temporal_extent(&self, doc: &MetadataDocument) -> Option<TemporalExtent> {
        Some(TemporalExtent {
            begin: doc.text(&self.begin)?.to_string(),
            end: doc.text(&self.end)?.to_string(),
        })
    }
}

impl Transformer for MetadataTransformer {
    fn transform(&self, record: &Record) -> Result<TransformedData> {
        let doc = MetadataDocument::parse(&record.content)?;
        let owned = |path: &FieldPath| doc.text(path).map(str::to_string);

        let title = owned(&self.title).ok_or_else(|| EtlError::ProcessingError {
            message: format!("record {} has no title", record.uuid),
        })?;
        let purpose = owned(&self.purpose);
        let contract_code = purpose
            .as_deref()
            .and_then(|purpose| self.purpose_pattern.captures(purpose))
            .and_then(|caps| caps.get(1))
            .map(|code| code.as_str().to_string());

        Ok(TransformedData {
            uuid: record.uuid.clone(),
            title,
            abstract_text: owned(&self.abstract_text),
            resource_type: owned(&self.resource_type),
            purpose,
            contract_code,
            classification: owned(&self.classification),
            license: owned(&self.license),
            reference_system: owned(&self.reference_system),
            bounding_box: self.bounding_box(&doc),
            temporal_extent: self.temporal_extent(&doc),
            harvested_at: Utc::now(),
        })
    }
}
