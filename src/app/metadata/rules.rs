use super::document::{FieldPath, MetadataDocument, Section};
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// A single check over a parsed metadata document.
pub trait ValidationRule: Send + Sync {
    /// Returns an error message if the check fails.
    fn check(&self, document: &MetadataDocument) -> Option<String>;
}

fn invalid_value(field_name: &str, value: &str) -> String {
    format!("Record has an invalid {}: {}", field_name, value)
}

fn missing(field_name: &str) -> String {
    format!("Record is missing a {}.", field_name)
}

pub struct FieldExists {
    path: FieldPath,
    field_name: String,
}

impl FieldExists {
    pub fn new(path: FieldPath, field_name: impl Into<String>) -> Self {
        Self {
            path,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for FieldExists {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        match document.text(&self.path) {
            Some(_) => None,
            None => Some(missing(&self.field_name)),
        }
    }
}

// The value rules below pass when the field is absent; pair them with
// FieldExists where the field is mandatory.

pub struct ValueInList {
    path: FieldPath,
    allowed_values: Vec<String>,
    field_name: String,
}

impl ValueInList {
    pub fn new(path: FieldPath, allowed_values: Vec<String>, field_name: impl Into<String>) -> Self {
        Self {
            path,
            allowed_values,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for ValueInList {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        let value = document.text(&self.path)?;
        if self.allowed_values.iter().any(|allowed| allowed == value) {
            None
        } else {
            Some(invalid_value(&self.field_name, value))
        }
    }
}

pub struct MatchesPattern {
    path: FieldPath,
    pattern: Regex,
    field_name: String,
}

impl MatchesPattern {
    pub fn new(path: FieldPath, pattern: Regex, field_name: impl Into<String>) -> Self {
        Self {
            path,
            pattern,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for MatchesPattern {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        let value = document.text(&self.path)?;
        if self.pattern.is_match(value) {
            None
        } else {
            Some(invalid_value(&self.field_name, value))
        }
    }
}

pub struct IsDecimal {
    path: FieldPath,
    field_name: String,
}

impl IsDecimal {
    pub fn new(path: FieldPath, field_name: impl Into<String>) -> Self {
        Self {
            path,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for IsDecimal {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        let value = document.text(&self.path)?;
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => None,
            _ => Some(invalid_value(&self.field_name, value)),
        }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339 timestamps.
pub fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

pub struct IsDate {
    path: FieldPath,
    field_name: String,
}

impl IsDate {
    pub fn new(path: FieldPath, field_name: impl Into<String>) -> Self {
        Self {
            path,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for IsDate {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        let value = document.text(&self.path)?;
        if is_date(value) {
            None
        } else {
            Some(invalid_value(&self.field_name, value))
        }
    }
}

/// Passes when the value mentions at least one of `needles`, e.g. an EPSG code
/// inside a descriptive reference system name.
pub struct ReferencesAny {
    path: FieldPath,
    needles: Vec<String>,
    field_name: String,
}

impl ReferencesAny {
    pub fn new(path: FieldPath, needles: Vec<String>, field_name: impl Into<String>) -> Self {
        Self {
            path,
            needles,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for ReferencesAny {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        let value = document.text(&self.path)?;
        if self.needles.iter().any(|needle| value.contains(needle.as_str())) {
            None
        } else {
            Some(invalid_value(&self.field_name, value))
        }
    }
}

/// Cited responsible parties holding `role`, e.g. `principalInvestigator`.
#[derive(Debug, Clone)]
pub struct PartyRole {
    party: FieldPath,
    role_code: FieldPath,
    role: String,
}

impl PartyRole {
    pub fn new(role: impl Into<String>) -> Result<Self> {
        Ok(Self {
            party: FieldPath::parse(".//cit:citedResponsibleParty")?,
            role_code: FieldPath::parse(".//cit:role/cit:CI_RoleCode/@codeListValue")?,
            role: role.into(),
        })
    }

    pub fn parties<'a>(&self, document: &'a MetadataDocument) -> Vec<Section<'a>> {
        document
            .sections(&self.party)
            .into_iter()
            .filter(|party| party.text(&self.role_code) == Some(self.role.as_str()))
            .collect()
    }
}

pub struct HasParty {
    parties: PartyRole,
    field_name: String,
}

impl HasParty {
    pub fn new(parties: PartyRole, field_name: impl Into<String>) -> Self {
        Self {
            parties,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for HasParty {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        if self.parties.parties(document).is_empty() {
            Some(missing(&self.field_name))
        } else {
            None
        }
    }
}

/// Every party holding the role must have the field, matching `pattern`.
/// Reports the first party that fails.
pub struct PartyFieldMatches {
    parties: PartyRole,
    path: FieldPath,
    pattern: Regex,
    field_name: String,
}

impl PartyFieldMatches {
    pub fn new(
        parties: PartyRole,
        path: FieldPath,
        pattern: Regex,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            parties,
            path,
            pattern,
            field_name: field_name.into(),
        }
    }
}

impl ValidationRule for PartyFieldMatches {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        self.parties
            .parties(document)
            .iter()
            .find_map(|party| match party.text(&self.path) {
                None => Some(missing(&self.field_name)),
                Some(value) if !self.pattern.is_match(value) => {
                    Some(invalid_value(&self.field_name, value))
                }
                Some(_) => None,
            })
    }
}

/// Every party holding the role must list an online resource named "Orcid"
/// (or the common misspelling "Orchid") whose linkage matches `pattern`.
pub struct PartyOrcid {
    parties: PartyRole,
    resource: FieldPath,
    name: FieldPath,
    linkage: FieldPath,
    pattern: Regex,
    field_name: String,
}

impl PartyOrcid {
    pub fn new(parties: PartyRole, pattern: Regex, field_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            parties,
            resource: FieldPath::parse(".//cit:onlineResource/cit:CI_OnlineResource")?,
            name: FieldPath::parse(".//cit:CI_OnlineResource/cit:name/gco:CharacterString")?,
            linkage: FieldPath::parse(".//cit:CI_OnlineResource/cit:linkage/gco:CharacterString")?,
            pattern,
            field_name: field_name.into(),
        })
    }

    fn orcid_linkage<'a>(&self, party: &Section<'a>) -> Option<&'a str> {
        party
            .sections(&self.resource)
            .into_iter()
            .find(|resource| {
                resource.text(&self.name).is_some_and(|name| {
                    name.eq_ignore_ascii_case("orcid") || name.eq_ignore_ascii_case("orchid")
                })
            })
            .and_then(|resource| resource.text(&self.linkage))
    }
}

impl ValidationRule for PartyOrcid {
    fn check(&self, document: &MetadataDocument) -> Option<String> {
        self.parties
            .parties(document)
            .iter()
            .find_map(|party| match self.orcid_linkage(party) {
                None => Some(missing(&self.field_name)),
                Some(value) if !self.pattern.is_match(value) => {
                    Some(invalid_value(&self.field_name, value))
                }
                Some(_) => None,
            })
    }
}
