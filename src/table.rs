use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{StatsError, StatsResult};

/// Values of one column, either numeric (NaN marks a missing cell) or
/// categorical.
#[derive(Debug, Clone, Serialize)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnValues::Numeric(_))
    }
}

/// A named column of a [`Table`].
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// In-memory tabular dataset. All columns share the same row count.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> StatsResult<Self> {
        if columns.is_empty() {
            return Err(StatsError::InsufficientData(
                "Table must contain at least one column.".to_string(),
            ));
        }
        let expected = columns[0].values.len();
        for column in &columns[1..] {
            let len = column.values.len();
            if len != expected {
                return Err(StatsError::ColumnLengthMismatch {
                    column: column.name.clone(),
                    len,
                    expected,
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns[0].values.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_all_numeric(&self) -> bool {
        self.columns.iter().all(|c| c.values.is_numeric())
    }

    /// Numeric values of a named column, failing when the column is missing
    /// or categorical.
    pub fn numeric_values(&self, name: &str) -> StatsResult<&[f64]> {
        let column = self.column(name).ok_or_else(|| StatsError::InvalidReference {
            column: name.to_string(),
            valid: self.column_names().iter().map(|s| s.to_string()).collect(),
        })?;
        match &column.values {
            ColumnValues::Numeric(v) => Ok(v),
            ColumnValues::Categorical(_) => Err(StatsError::InvalidInput(format!(
                "Column '{}' is not numeric.",
                name
            ))),
        }
    }

    /// Removes every row that has a NaN in any numeric column.
    pub fn drop_incomplete_rows(&self) -> Table {
        let keep: Vec<bool> = (0..self.row_count())
            .map(|row| {
                self.columns.iter().all(|c| match &c.values {
                    ColumnValues::Numeric(v) => !v[row].is_nan(),
                    ColumnValues::Categorical(_) => true,
                })
            })
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: match &c.values {
                    ColumnValues::Numeric(v) => ColumnValues::Numeric(
                        v.iter()
                            .zip(&keep)
                            .filter(|(_, k)| **k)
                            .map(|(x, _)| *x)
                            .collect(),
                    ),
                    ColumnValues::Categorical(v) => ColumnValues::Categorical(
                        v.iter()
                            .zip(&keep)
                            .filter(|(_, k)| **k)
                            .map(|(x, _)| x.clone())
                            .collect(),
                    ),
                },
            })
            .collect();

        Table { columns }
    }

    /// Frequency counts of one categorical column, ordered by first
    /// appearance.
    pub fn value_counts(&self, name: &str) -> StatsResult<Vec<(String, u64)>> {
        let column = self.column(name).ok_or_else(|| StatsError::InvalidReference {
            column: name.to_string(),
            valid: self.column_names().iter().map(|s| s.to_string()).collect(),
        })?;
        let values = match &column.values {
            ColumnValues::Categorical(v) => v,
            ColumnValues::Numeric(_) => {
                return Err(StatsError::InvalidInput(format!(
                    "Column '{}' is not categorical.",
                    name
                )))
            }
        };

        let mut order: Vec<String> = Vec::new();
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for value in values {
            if !counts.contains_key(value) {
                order.push(value.clone());
            }
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
        Ok(order.into_iter().map(|k| {
            let n = counts[&k];
            (k, n)
        }).collect())
    }

    /// Contingency table of two columns. Numeric columns are treated as
    /// categories through their textual rendering. Returns row labels,
    /// column labels, and the count matrix, labels ordered by first
    /// appearance.
    pub fn crosstab(
        &self,
        rows: &str,
        cols: &str,
    ) -> StatsResult<(Vec<String>, Vec<String>, Vec<Vec<u64>>)> {
        let row_values = self.category_labels(rows)?;
        let col_values = self.category_labels(cols)?;

        let row_labels = first_appearance_labels(&row_values);
        let col_labels = first_appearance_labels(&col_values);

        let mut matrix = vec![vec![0u64; col_labels.len()]; row_labels.len()];
        for (r, c) in row_values.iter().zip(&col_values) {
            let i = row_labels.iter().position(|l| l == r).unwrap_or(0);
            let j = col_labels.iter().position(|l| l == c).unwrap_or(0);
            matrix[i][j] += 1;
        }
        Ok((row_labels, col_labels, matrix))
    }

    /// Splits one numeric column into per-group columns driven by a
    /// categorical column. Groups of unequal size are padded with NaN so the
    /// resulting table keeps a rectangular shape.
    ///
    /// When `reference_group` is given it must be one of the group labels;
    /// otherwise the call fails with the list of valid labels.
    pub fn unfold_by_group(
        &self,
        value_column: &str,
        group_column: &str,
        reference_group: Option<&str>,
    ) -> StatsResult<Table> {
        let values = self.numeric_values(value_column)?.to_vec();
        let groups = self.categorical_values(group_column)?.to_vec();

        let labels = first_appearance_labels(&groups);
        if let Some(reference) = reference_group {
            if !labels.iter().any(|l| l == reference) {
                return Err(StatsError::InvalidReference {
                    column: reference.to_string(),
                    valid: labels,
                });
            }
        }

        let mut per_group: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
        for (value, group) in values.iter().zip(&groups) {
            if let Some(i) = labels.iter().position(|l| l == group) {
                per_group[i].push(*value);
            }
        }

        let max_len = per_group.iter().map(Vec::len).max().unwrap_or(0);
        let columns = labels
            .into_iter()
            .zip(per_group)
            .map(|(label, mut group)| {
                group.resize(max_len, f64::NAN);
                Column::numeric(label, group)
            })
            .collect();
        Table::new(columns)
    }

    fn category_labels(&self, name: &str) -> StatsResult<Vec<String>> {
        let column = self.column(name).ok_or_else(|| StatsError::InvalidReference {
            column: name.to_string(),
            valid: self.column_names().iter().map(|s| s.to_string()).collect(),
        })?;
        Ok(match &column.values {
            ColumnValues::Categorical(v) => v.clone(),
            ColumnValues::Numeric(v) => v.iter().map(|x| x.to_string()).collect(),
        })
    }

    fn categorical_values(&self, name: &str) -> StatsResult<&[String]> {
        let column = self.column(name).ok_or_else(|| StatsError::InvalidReference {
            column: name.to_string(),
            valid: self.column_names().iter().map(|s| s.to_string()).collect(),
        })?;
        match &column.values {
            ColumnValues::Categorical(v) => Ok(v),
            ColumnValues::Numeric(_) => Err(StatsError::InvalidInput(format!(
                "Column '{}' is not categorical.",
                name
            ))),
        }
    }
}

fn first_appearance_labels(values: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for value in values {
        if !labels.iter().any(|l| l == value) {
            labels.push(value.clone());
        }
    }
    labels
}
