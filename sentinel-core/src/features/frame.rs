//! FeatureFrame: named, equal-length `f64` columns over one row series.

/// Column-oriented frame of features, in column insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    len: usize,
}

impl FeatureFrame {
    /// Empty frame for `len` rows.
    pub fn with_len(len: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            len,
        }
    }

    /// Insert or replace a named column.
    ///
    /// # Panics
    /// If `values.len()` differs from the frame length.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        assert_eq!(values.len(), self.len, "column length must match frame length");
        let name = name.into();
        match self.names.iter().position(|n| *n == name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fill undefined values in every column: back-fill from the nearest later
    /// defined value, then forward-fill from the nearest earlier one.
    pub fn fill_undefined(&mut self) {
        for column in &mut self.columns {
            backfill(column);
            forward_fill(column);
        }
    }

    /// Names of columns that still contain an undefined value.
    pub fn undefined_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, col)| col.iter().any(|v| !v.is_finite()))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

fn backfill(values: &mut [f64]) {
    let mut next: Option<f64> = None;
    for v in values.iter_mut().rev() {
        if v.is_finite() {
            next = Some(*v);
        } else if let Some(fill) = next {
            *v = fill;
        }
    }
}

fn forward_fill(values: &mut [f64]) {
    let mut prev: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            prev = Some(*v);
        } else if let Some(fill) = prev {
            *v = fill;
        }
    }
}
