//! Parameterized row filters for deletes.
//!
//! A [`Selection`] is a conjunction of `column != ?` clauses. The
//! expression text and its arguments are kept apart, the way a SQL engine
//! binds parameters, so module or key content never becomes part of the
//! expression.

use std::fmt;

use prefs_types::Entry;

/// A filterable column of the row schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Module,
    Key,
}

impl Column {
    /// The column name as it appears in a selection expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Module => "module",
            Column::Key => "key",
        }
    }

    fn read<'a>(&self, entry: &'a Entry) -> &'a str {
        match self {
            Column::Module => &entry.module,
            Column::Key => &entry.key,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conjunction of `column != ?` clauses with bound arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    columns: Vec<Column>,
    args: Vec<String>,
}

impl Selection {
    /// An empty selection, which matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the selection with `AND column != arg`.
    pub fn and_not_equal(mut self, column: Column, arg: impl Into<String>) -> Self {
        self.push_not_equal(column, arg);
        self
    }

    /// In-place form of [`and_not_equal`](Self::and_not_equal).
    pub fn push_not_equal(&mut self, column: Column, arg: impl Into<String>) {
        self.columns.push(column);
        self.args.push(arg.into());
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no clauses.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The expression text, e.g. `module != ? AND module != ?`, or `None` for
    /// an empty selection.
    pub fn expression(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let clauses: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{c} != ?"))
            .collect();
        Some(clauses.join(" AND "))
    }

    /// The bound arguments, one per `?` in [`expression`](Self::expression).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Evaluate the selection against a row.
    pub fn matches(&self, entry: &Entry) -> bool {
        self.columns
            .iter()
            .zip(&self.args)
            .all(|(column, arg)| column.read(entry) != arg.as_str())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expression() {
            Some(expr) => f.write_str(&expr),
            None => f.write_str("<all>"),
        }
    }
}
