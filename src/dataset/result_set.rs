use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::coerce::{coerce_cell, ColumnKind};
use super::value::Scalar;
use crate::error::AppError;

/// Immutable query output: column names plus row-major cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl ResultSet {
    pub fn new<C: Into<String>>(columns: Vec<C>, rows: Vec<Vec<Scalar>>) -> Result<Self, AppError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(AppError::Custom(format!(
                "Row {} has {} cells, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, AppError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AppError::UnknownColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<&[Scalar]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Scalar]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Sub-view over every row.
    pub fn all(&self) -> SubView<'_> {
        SubView {
            source: self,
            indices: (0..self.rows.len()).collect(),
        }
    }

    /// Distinct non-missing values of `column`, in first-appearance order.
    pub fn distinct(&self, column: &str) -> Result<Vec<Scalar>, AppError> {
        let idx = self.column_index(column)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .map(|r| &r[idx])
            .filter(|v| !v.is_missing() && seen.insert(v.to_string()))
            .cloned()
            .collect())
    }

    /// Coerces every cell of `column` to `kind` and returns the number of
    /// cells that had to be turned into `Missing`. Only used while the
    /// result set is still being materialized.
    pub(crate) fn coerce_column(&mut self, column: &str, kind: ColumnKind) -> Result<usize, AppError> {
        let idx = self.column_index(column)?;
        let mut coerced = 0;
        for row in &mut self.rows {
            let cell = std::mem::replace(&mut row[idx], Scalar::Missing);
            let was_missing = cell.is_missing();
            row[idx] = coerce_cell(cell, kind);
            if !was_missing && row[idx].is_missing() {
                coerced += 1;
            }
        }
        Ok(coerced)
    }
}

/// The rows of a result set kept by a projection, in original order.
#[derive(Debug, Clone)]
pub struct SubView<'a> {
    source: &'a ResultSet,
    indices: Vec<usize>,
}

impl<'a> SubView<'a> {
    pub fn source(&self) -> &'a ResultSet {
        self.source
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [Scalar]> + '_ {
        let source = self.source;
        self.indices.iter().map(move |&i| source.rows[i].as_slice())
    }

    /// Cells of one column across the kept rows.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &'a Scalar> + '_, AppError> {
        let idx = self.source.column_index(name)?;
        Ok(self.rows().map(move |r| &r[idx]))
    }

    /// Narrows the view to the rows satisfying `keep`.
    pub fn retain<F>(&self, mut keep: F) -> SubView<'a>
    where
        F: FnMut(&[Scalar]) -> bool,
    {
        let source = self.source;
        SubView {
            source,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| keep(&source.rows[i]))
                .collect(),
        }
    }

    /// Fallible variant of [`SubView::retain`]; the first error aborts.
    pub fn try_retain<F>(&self, mut keep: F) -> Result<SubView<'a>, AppError>
    where
        F: FnMut(&[Scalar]) -> Result<bool, AppError>,
    {
        let mut indices = Vec::with_capacity(self.indices.len());
        for &i in &self.indices {
            if keep(&self.source.rows[i])? {
                indices.push(i);
            }
        }
        Ok(SubView {
            source: self.source,
            indices,
        })
    }

    /// Owned copy of the kept rows.
    pub fn to_result_set(&self) -> ResultSet {
        ResultSet {
            columns: self.source.columns.clone(),
            rows: self.rows().map(<[Scalar]>::to_vec).collect(),
        }
    }
}

/// Every result set loaded at startup, keyed by source name, plus the
/// distinct values of the columns that feed dropdowns.
#[derive(Debug, Default)]
pub struct Dataset {
    sources: BTreeMap<String, ResultSet>,
    distinct: BTreeMap<(String, String), Vec<Scalar>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: &str,
        result_set: ResultSet,
        distinct_columns: &[&str],
    ) -> Result<(), AppError> {
        for column in distinct_columns {
            let values = result_set.distinct(column)?;
            self.distinct
                .insert((name.to_string(), column.to_string()), values);
        }
        self.sources.insert(name.to_string(), result_set);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ResultSet, AppError> {
        self.sources
            .get(name)
            .ok_or_else(|| AppError::UnknownSource(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Distinct values computed at load. Empty when the column was not
    /// registered for distinct metadata.
    pub fn distinct(&self, source: &str, column: &str) -> &[Scalar] {
        self.distinct
            .get(&(source.to_string(), column.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
