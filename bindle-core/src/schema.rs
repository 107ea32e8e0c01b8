use crate::{AsValue, Value};
use std::borrow::Cow;

/// Description of a result column.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Cow<'static, str>,
    /// Column type, expressed as the empty value of that type.
    pub value: Value,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            nullable: true,
        }
    }

    /// Column of the type `T` maps to.
    pub fn of<T: AsValue>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, T::as_empty_value())
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Shape of the rows an execution produces.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
    /// Tables the rows come from, when the driver knows them.
    pub tables: Vec<String>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            tables: Vec::new(),
        }
    }

    pub fn with_tables<S: Into<String>>(mut self, tables: impl IntoIterator<Item = S>) -> Self {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_ref())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}
