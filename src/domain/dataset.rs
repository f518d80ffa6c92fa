// Dataset domain model - uploaded rows plus the field schema inferred from them
use super::format::field_label;
use super::record::{Record, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SAMPLE_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
    pub data_type: FieldType,
    pub is_metric: bool,
    pub is_dimension: bool,
}

impl FieldInfo {
    fn infer(name: &str, value: &Value) -> Self {
        let data_type = match value {
            Value::Null => FieldType::Unknown,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::Text(s) if !s.trim().is_empty() && value.as_number().is_some() => {
                FieldType::Number
            }
            Value::Text(_) if value.as_date().is_some() => FieldType::Date,
            Value::Text(_) => FieldType::String,
        };

        Self {
            name: name.to_string(),
            label: field_label(name),
            data_type,
            is_metric: data_type == FieldType::Number,
            is_dimension: data_type != FieldType::Number,
        }
    }
}

/// Listing entry; everything about a dataset except its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub row_count: usize,
    pub fields: Vec<FieldInfo>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(flatten)]
    pub info: DatasetInfo,
    pub records: Vec<Record>,
}

/// Metadata plus the first few rows, for previews.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPreview<'a> {
    #[serde(flatten)]
    pub info: &'a DatasetInfo,
    pub sample_rows: &'a [Record],
}

impl Dataset {
    /// Field types come from the first record only.
    pub fn from_records(
        id: String,
        name: String,
        records: Vec<Record>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let fields = records
            .first()
            .map(|first| {
                first
                    .fields()
                    .map(|(name, value)| FieldInfo::infer(name, value))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            info: DatasetInfo {
                id,
                name,
                row_count: records.len(),
                fields,
                created_at,
            },
            records,
        }
    }

    /// First `limit` rows; `0` means all of them.
    pub fn rows(&self, limit: usize) -> &[Record] {
        if limit == 0 {
            return &self.records;
        }
        &self.records[..limit.min(self.records.len())]
    }

    pub fn preview(&self) -> DatasetPreview<'_> {
        DatasetPreview {
            info: &self.info,
            sample_rows: self.rows(SAMPLE_ROWS),
        }
    }
}
