//! Validation and normalization of record requests

use crate::error::AppError;
use crate::types::{FetchRequest, RecordsParams, SortInput};
use airtable_api::{ListRecordsOptions, SortDirection, SortSpec};
use serde_json::json;
use sha2::{Digest, Sha256};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_FIELDS: usize = 50;
pub const MAX_SORTS: usize = 10;
pub const MAX_RECORDS_LIMIT: u32 = 1000;

/// A validated, normalized request for a table's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub table: String,
    /// Deduplicated, in request order
    pub fields: Vec<String>,
    pub sort: Vec<SortSpec>,
    pub max_records: Option<u32>,
    pub view: Option<String>,
}

impl RecordQuery {
    pub fn from_request(req: FetchRequest, default_table: Option<&str>) -> Result<Self, AppError> {
        Self::build(
            req.table_name.as_deref(),
            default_table,
            req.fields,
            req.sort.unwrap_or_default(),
            req.max_records,
            req.view,
        )
    }

    pub fn from_params(params: RecordsParams, default_table: Option<&str>) -> Result<Self, AppError> {
        let fields = params.fields.map(|f| {
            f.split(',')
                .map(str::to_string)
                .filter(|s| !s.trim().is_empty())
                .collect()
        });

        let sort = params
            .sort
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                let s = s.trim();
                match s.strip_prefix('-') {
                    Some(field) => SortInput {
                        field: field.to_string(),
                        direction: Some("desc".to_string()),
                    },
                    None => SortInput {
                        field: s.to_string(),
                        direction: None,
                    },
                }
            })
            .collect();

        Self::build(
            params.table.as_deref(),
            default_table,
            fields,
            sort,
            params.max_records,
            params.view,
        )
    }

    fn build(
        table: Option<&str>,
        default_table: Option<&str>,
        fields: Option<Vec<String>>,
        sort: Vec<SortInput>,
        max_records: Option<u32>,
        view: Option<String>,
    ) -> Result<Self, AppError> {
        let table = match table.filter(|t| !t.trim().is_empty()).or(default_table) {
            Some(t) => sanitize_name("tableName", t)?,
            None => {
                return Err(AppError::Validation(
                    "tableName is required".to_string(),
                ))
            }
        };

        let raw_fields = fields.unwrap_or_default();
        if raw_fields.is_empty() {
            return Err(AppError::Validation(
                "fields must be a non-empty array".to_string(),
            ));
        }
        if raw_fields.len() > MAX_FIELDS {
            return Err(AppError::Validation(format!(
                "at most {} fields may be requested",
                MAX_FIELDS
            )));
        }

        let mut fields: Vec<String> = Vec::with_capacity(raw_fields.len());
        for field in &raw_fields {
            let field = sanitize_name("fields", field)?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        if sort.len() > MAX_SORTS {
            return Err(AppError::Validation(format!(
                "at most {} sort entries are allowed",
                MAX_SORTS
            )));
        }
        let sort = sort
            .into_iter()
            .map(|s| {
                Ok(SortSpec {
                    field: sanitize_name("sort.field", &s.field)?,
                    direction: parse_direction(s.direction.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if let Some(max) = max_records {
            if max == 0 || max > MAX_RECORDS_LIMIT {
                return Err(AppError::Validation(format!(
                    "maxRecords must be between 1 and {}",
                    MAX_RECORDS_LIMIT
                )));
            }
        }

        let view = view
            .filter(|v| !v.trim().is_empty())
            .map(|v| sanitize_name("view", &v))
            .transpose()?;

        Ok(Self {
            table,
            fields,
            sort,
            max_records,
            view,
        })
    }

    /// Stable rendering used for cache keying. Field order does not matter,
    /// sort order does.
    pub fn canonical(&self) -> String {
        let mut fields = self.fields.clone();
        fields.sort();
        let sort: Vec<_> = self
            .sort
            .iter()
            .map(|s| json!([s.field, s.direction.as_str()]))
            .collect();

        json!({
            "table": self.table,
            "fields": fields,
            "sort": sort,
            "maxRecords": self.max_records,
            "view": self.view,
        })
        .to_string()
    }

    /// SHA-256 hex digest of [`Self::canonical`]
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn list_options(&self) -> ListRecordsOptions {
        ListRecordsOptions {
            fields: self.fields.clone(),
            sort: self.sort.clone(),
            max_records: self.max_records,
            view: self.view.clone(),
        }
    }
}

/// Trim and check a table, field or view name
fn sanitize_name(what: &str, raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", what)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            what, MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::Validation(format!(
            "{} contains control characters",
            what
        )));
    }
    Ok(name.to_string())
}

fn parse_direction(raw: Option<&str>) -> Result<SortDirection, AppError> {
    match raw.map(|d| d.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("asc") => Ok(SortDirection::Asc),
        Some("desc") => Ok(SortDirection::Desc),
        Some(other) => Err(AppError::Validation(format!(
            "sort direction must be \"asc\" or \"desc\", got {:?}",
            other
        ))),
    }
}
