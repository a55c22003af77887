use indexmap::IndexMap;
use itertools::Itertools;

use crate::libs::error::U4cError;

/// Columns every sample sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["sample", "replicate", "condition", "file"];

/// Sample metadata: a TSV with a header row, keyed by the `sample` column.
///
/// Arbitrary extra columns are retained and may serve as grouping keys.
#[derive(Debug, Clone)]
pub struct SampleSheet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SampleSheet {
    pub fn parse(text: &str) -> Result<Self, U4cError> {
        let mut lines = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let header = lines
            .next()
            .ok_or_else(|| U4cError::Empty("sample sheet has no header row".to_string()))?;
        let columns: Vec<String> = header.split('\t').map(|s| s.to_string()).collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(U4cError::Config(format!(
                    "sample sheet lacks mandatory column `{}`",
                    required
                )));
            }
        }

        let mut rows = vec![];
        for line in lines {
            let fields: Vec<String> = line.split('\t').map(|s| s.to_string()).collect();
            if fields.len() != columns.len() {
                return Err(U4cError::Integrity(format!(
                    "sample row has {} fields, header has {}: `{}`",
                    fields.len(),
                    columns.len(),
                    line
                )));
            }
            rows.push(fields);
        }
        if rows.is_empty() {
            return Err(U4cError::Empty("sample sheet has no samples".to_string()));
        }

        let sheet = Self { columns, rows };

        if let Some(dup) = sheet.samples().iter().duplicates().next() {
            return Err(U4cError::Integrity(format!(
                "duplicate sample identifier `{}`",
                dup
            )));
        }

        Ok(sheet)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize, U4cError> {
        self.columns.iter().position(|c| c == name).ok_or_else(|| {
            U4cError::Config(format!(
                "grouping key `{}` is not a sample sheet column (have: {})",
                name,
                self.columns.join(", ")
            ))
        })
    }

    /// Sample identifiers in sheet order.
    pub fn samples(&self) -> Vec<&str> {
        let i = self
            .column_index("sample")
            .expect("mandatory column checked at parse time");
        self.rows.iter().map(|r| r[i].as_str()).collect()
    }

    /// One sample's value in `column`.
    pub fn value(&self, sample: &str, column: &str) -> Result<&str, U4cError> {
        let c = self.column_index(column)?;
        let s = self
            .column_index("sample")
            .expect("mandatory column checked at parse time");
        self.rows
            .iter()
            .find(|r| r[s] == sample)
            .map(|r| r[c].as_str())
            .ok_or_else(|| U4cError::Integrity(format!("unknown sample `{}`", sample)))
    }

    /// Equivalence classes of samples under `key`, ordered by group label.
    ///
    /// A key that is unique per sample degenerates to singleton groups
    /// through this same path; there is no separate by-sample mode.
    pub fn groups(&self, key: &str) -> Result<IndexMap<String, Vec<String>>, U4cError> {
        let k = self.column_index(key)?;
        let s = self
            .column_index("sample")
            .expect("mandatory column checked at parse time");

        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for row in &self.rows {
            groups
                .entry(row[k].clone())
                .or_default()
                .push(row[s].clone());
        }
        groups.sort_keys();

        Ok(groups)
    }
}
