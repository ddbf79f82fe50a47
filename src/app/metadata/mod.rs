//! ISO 19115-3 metadata handling: field lookup and record validation.

pub mod document;
pub mod rules;

use crate::config::ValidatorConfig;
use crate::domain::model::{Record, ValidationResult};
use crate::domain::ports::Validator;
use crate::utils::error::{EtlError, Result};
use document::{FieldPath, MetadataDocument};
use regex::Regex;
use rules::{
    FieldExists, HasParty, IsDate, IsDecimal, MatchesPattern, PartyFieldMatches, PartyOrcid,
    PartyRole, ReferencesAny, ValidationRule, ValueInList,
};

pub mod paths {
    pub const TITLE: &str = ".//mdb:identificationInfo/mri:MD_DataIdentification/mri:citation/cit:CI_Citation/cit:title/gco:CharacterString";
    pub const ABSTRACT: &str =
        ".//mdb:identificationInfo/mri:MD_DataIdentification/mri:abstract/gco:CharacterString";
    pub const PURPOSE: &str =
        ".//mdb:identificationInfo/mri:MD_DataIdentification/mri:purpose/gco:CharacterString";
    pub const RESOURCE_TYPE: &str =
        ".//mdb:metadataScope/mdb:MD_MetadataScope/mdb:resourceScope/mcc:MD_ScopeCode/@codeListValue";
    pub const BEGIN_DATE: &str = ".//gex:temporalElement/gex:EX_TemporalExtent/gex:extent/gml:TimePeriod/gml:beginPosition";
    pub const END_DATE: &str = ".//gex:temporalElement/gex:EX_TemporalExtent/gex:extent/gml:TimePeriod/gml:endPosition";
    pub const REFERENCE_SYSTEM: &str = ".//mdb:referenceSystemInfo/mrs:MD_ReferenceSystem/mrs:referenceSystemIdentifier/mcc:MD_Identifier/mcc:code/gco:CharacterString";
    pub const WEST: &str = ".//gex:westBoundLongitude/gco:Decimal";
    pub const EAST: &str = ".//gex:eastBoundLongitude/gco:Decimal";
    pub const SOUTH: &str = ".//gex:southBoundLatitude/gco:Decimal";
    pub const NORTH: &str = ".//gex:northBoundLatitude/gco:Decimal";
    pub const CLASSIFICATION: &str = ".//mri:resourceConstraints/mco:MD_SecurityConstraints/mco:classification/mco:MD_ClassificationCode/@codeListValue";
    pub const LICENSE: &str = ".//mri:resourceConstraints/mco:MD_LegalConstraints/mco:reference/cit:CI_Citation/cit:title/gco:CharacterString";
    pub const ONLINE_RESOURCE: &str =
        ".//mrd:onLine/cit:CI_OnlineResource/cit:linkage/gco:CharacterString";

    // Relative to a cited responsible party.
    pub const PARTY_NAME: &str = ".//cit:CI_Individual/cit:name/gco:CharacterString";
    pub const PARTY_EMAIL: &str = ".//cit:electronicMailAddress/gco:CharacterString";
}

pub const PRINCIPAL_INVESTIGATOR: &str = "principalInvestigator";

/// `CODE, project title` where CODE looks like `ABC1234-123-XYZ`.
pub const PURPOSE_PATTERN: &str = r"^([A-Z]{3}[0-9]{4}-[0-9]{3}-[A-Z]{3}),\s*\S.*$";

/// `Family, Given` or `Given Family`.
pub const PERSON_NAME_PATTERN: &str = r"^[^,\s]+(,\s*|\s+)[^,\s].*$";

pub const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Bare or `https://orcid.org/` prefixed iD; the last character may be the X checksum.
pub const ORCID_PATTERN: &str = r"^(https?://orcid\.org/)?[0-9]{4}-[0-9]{4}-[0-9]{4}-[0-9]{3}[0-9X]$";

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EtlError::ConfigError {
        message: e.to_string(),
    })
}

pub fn purpose_regex() -> Result<Regex> {
    compile(PURPOSE_PATTERN)
}

pub struct MetadataValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl MetadataValidator {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// The standard rule set, with code lists taken from `config`.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let p = FieldPath::parse;
        let pi = PartyRole::new(PRINCIPAL_INVESTIGATOR)?;
        let rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(FieldExists::new(p(paths::TITLE)?, "title")),
            Box::new(FieldExists::new(p(paths::ABSTRACT)?, "abstract")),
            Box::new(FieldExists::new(p(paths::PURPOSE)?, "purpose")),
            Box::new(MatchesPattern::new(p(paths::PURPOSE)?, purpose_regex()?, "purpose")),
            Box::new(ValueInList::new(
                p(paths::RESOURCE_TYPE)?,
                config.valid_resource_types(),
                "resource type",
            )),
            Box::new(FieldExists::new(p(paths::BEGIN_DATE)?, "begin date")),
            Box::new(IsDate::new(p(paths::BEGIN_DATE)?, "begin date")),
            Box::new(FieldExists::new(p(paths::END_DATE)?, "end date")),
            Box::new(IsDate::new(p(paths::END_DATE)?, "end date")),
            Box::new(ReferencesAny::new(
                p(paths::REFERENCE_SYSTEM)?,
                config.reference_systems(),
                "reference system",
            )),
            Box::new(IsDecimal::new(p(paths::WEST)?, "west bound longitude")),
            Box::new(IsDecimal::new(p(paths::EAST)?, "east bound longitude")),
            Box::new(IsDecimal::new(p(paths::SOUTH)?, "south bound latitude")),
            Box::new(IsDecimal::new(p(paths::NORTH)?, "north bound latitude")),
            Box::new(ValueInList::new(
                p(paths::CLASSIFICATION)?,
                config.classifications(),
                "classification",
            )),
            Box::new(ValueInList::new(p(paths::LICENSE)?, config.licenses(), "license")),
            Box::new(FieldExists::new(p(paths::ONLINE_RESOURCE)?, "online resource")),
            Box::new(HasParty::new(pi.clone(), "principal investigator")),
            Box::new(PartyFieldMatches::new(
                pi.clone(),
                p(paths::PARTY_NAME)?,
                compile(PERSON_NAME_PATTERN)?,
                "principal investigator name",
            )),
            Box::new(PartyFieldMatches::new(
                pi.clone(),
                p(paths::PARTY_EMAIL)?,
                compile(EMAIL_PATTERN)?,
                "principal investigator email",
            )),
            Box::new(PartyOrcid::new(
                pi,
                compile(ORCID_PATTERN)?,
                "principal investigator ORCID",
            )?),
        ];
        Ok(Self::new(rules))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Validator for MetadataValidator {
    fn validate(&self, record: &Record) -> ValidationResult {
        let document = match MetadataDocument::parse(&record.content) {
            Ok(document) => document,
            Err(e) => {
                return ValidationResult::from_errors(&record.uuid, vec![e.to_string()]);
            }
        };

        let errors = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(&document))
            .collect();
        ValidationResult::from_errors(&record.uuid, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<mdb:MD_Metadata xmlns:mdb="http://standards.iso.org/iso/19115/-3/mdb/2.0"
                 xmlns:cit="http://standards.iso.org/iso/19115/-3/cit/2.0"
                 xmlns:gco="http://standards.iso.org/iso/19115/-3/gco/1.0"
                 xmlns:mri="http://standards.iso.org/iso/19115/-3/mri/1.0">"#;

    fn title_and_abstract_validator() -> MetadataValidator {
        MetadataValidator::new(vec![
            Box::new(FieldExists::new(
                FieldPath::parse(".//cit:title/gco:CharacterString").unwrap(),
                "title",
            )),
            Box::new(FieldExists::new(
                FieldPath::parse(".//mri:abstract/gco:CharacterString").unwrap(),
                "abstract",
            )),
        ])
    }

    fn record(identification: &str) -> Record {
        Record::new(
            "test-uuid",
            format!(
                "{}<mdb:identificationInfo><mri:MD_DataIdentification>{}</mri:MD_DataIdentification></mdb:identificationInfo></mdb:MD_Metadata>",
                HEADER, identification
            ),
        )
    }

    const CITATION: &str = "<mri:citation><cit:CI_Citation><cit:title><gco:CharacterString>Valid Title</gco:CharacterString></cit:title></cit:CI_Citation></mri:citation>";
    const ABSTRACT: &str =
        "<mri:abstract><gco:CharacterString>Valid Abstract</gco:CharacterString></mri:abstract>";

    #[test]
    fn test_valid_record() {
        let result = title_and_abstract_validator().validate(&record(&format!("{}{}", CITATION, ABSTRACT)));
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_missing_title() {
        let result = title_and_abstract_validator().validate(&record(ABSTRACT));
        assert!(!result.is_valid());
        assert!(result.errors().contains(&"Record is missing a title.".to_string()));
    }

    #[test]
    fn test_missing_abstract() {
        let result = title_and_abstract_validator().validate(&record(CITATION));
        assert!(!result.is_valid());
        assert!(result.errors().contains(&"Record is missing a abstract.".to_string()));
    }

    #[test]
    fn test_multiple_errors_keep_rule_order() {
        let result = title_and_abstract_validator().validate(&record(""));
        assert_eq!(
            result.errors(),
            [
                "Record is missing a title.".to_string(),
                "Record is missing a abstract.".to_string()
            ]
        );
        match result {
            ValidationResult::Invalid(details) => assert_eq!(details.record_id, "test-uuid"),
            ValidationResult::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_unparseable_record_is_invalid() {
        let result = title_and_abstract_validator().validate(&Record::new("broken", "<mdb:MD_Metadata>"));
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("XML parse error"));
    }

    #[test]
    fn test_standard_rule_set_size() {
        let validator = MetadataValidator::from_config(&ValidatorConfig::default()).unwrap();
        assert_eq!(validator.rule_count(), 21);
    }

    #[test]
    fn test_principal_investigator_patterns() {
        let name = compile(PERSON_NAME_PATTERN).unwrap();
        assert!(name.is_match("Nguyen, Linh"));
        assert!(name.is_match("Linh Nguyen"));
        assert!(!name.is_match("Nguyen"));
        assert!(!name.is_match("Nguyen,"));

        let email = compile(EMAIL_PATTERN).unwrap();
        assert!(email.is_match("linh.nguyen@example.edu.au"));
        assert!(!email.is_match("invalid-email"));

        let orcid = compile(ORCID_PATTERN).unwrap();
        assert!(orcid.is_match("https://orcid.org/0000-0002-1825-0097"));
        assert!(orcid.is_match("0000-0002-1694-233X"));
        assert!(!orcid.is_match("invalid-orcid"));
        assert!(!orcid.is_match("https://orcid.org/0000-0002-1825"));
    }

    #[test]
    fn test_purpose_pattern() {
        let re = purpose_regex().unwrap();
        assert!(re.is_match("DAV1707-001-BLX, Stubble retention"));
        assert!(!re.is_match("DAV1707-001-BLX1, title"));
        assert!(!re.is_match("InvalidPurpose"));
        assert_eq!(
            re.captures("UOA2203-008-RTX,Soil carbon").unwrap().get(1).unwrap().as_str(),
            "UOA2203-008-RTX"
        );
    }
}
