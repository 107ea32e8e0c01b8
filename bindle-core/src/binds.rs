use crate::{AsValue, BindKey, Result, StatementError, TypeMap, Value};
use std::collections::{BTreeMap, HashMap};

/// Parameters supplied to a statement execution.
///
/// Positional binds fill `?` style placeholders in order, named binds fill
/// `:name` style ones. Which style a query uses is up to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Binds {
    Positional(Vec<Value>),
    Named(BTreeMap<String, Value>),
}

impl Default for Binds {
    fn default() -> Self {
        Binds::Positional(Vec::new())
    }
}

impl Binds {
    pub fn len(&self) -> usize {
        match self {
            Binds::Positional(v) => v.len(),
            Binds::Named(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Binds::Named(..))
    }

    /// Positional value at `index`, `None` for named binds.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Binds::Positional(v) => v.get(index),
            Binds::Named(..) => None,
        }
    }

    /// Named value for `name`, `None` for positional binds.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        match self {
            Binds::Positional(..) => None,
            Binds::Named(v) => v.get(name),
        }
    }

    /// Each bind with its key, positional binds in order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (BindKey, &Value)> + '_> {
        match self {
            Binds::Positional(v) => {
                Box::new(v.iter().enumerate().map(|(i, v)| (BindKey::Index(i), v)))
            }
            Binds::Named(v) => Box::new(v.iter().map(|(k, v)| (BindKey::Name(k.clone()), v))),
        }
    }

    /// Run every value through `map`.
    ///
    /// Order and arity of positional binds and the key set of named binds are
    /// preserved. The first failure is reported as
    /// [`StatementError::ConversionFailure`] naming the parameter.
    pub fn convert(self, map: &TypeMap) -> Result<Binds> {
        Ok(match self {
            Binds::Positional(values) => Binds::Positional(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| convert_one(map, BindKey::Index(i), v))
                    .collect::<Result<_>>()?,
            ),
            Binds::Named(values) => Binds::Named(
                values
                    .into_iter()
                    .map(|(k, v)| convert_one(map, BindKey::Name(k.clone()), v).map(|v| (k, v)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

fn convert_one(map: &TypeMap, parameter: BindKey, value: Value) -> Result<Value> {
    let description = format!("{value:?}");
    map.convert(value).map_err(|e| {
        StatementError::ConversionFailure {
            parameter,
            value: description,
            reason: format!("{e:#}"),
        }
        .into()
    })
}

impl From<()> for Binds {
    fn from(_: ()) -> Self {
        Binds::default()
    }
}

impl From<Vec<Value>> for Binds {
    fn from(value: Vec<Value>) -> Self {
        Binds::Positional(value)
    }
}

impl<V: AsValue, const N: usize> From<[V; N]> for Binds {
    fn from(value: [V; N]) -> Self {
        Binds::Positional(value.into_iter().map(AsValue::as_value).collect())
    }
}

impl<K: Into<String>, V: AsValue> From<BTreeMap<K, V>> for Binds {
    fn from(value: BTreeMap<K, V>) -> Self {
        Binds::Named(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.as_value()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: AsValue> From<HashMap<K, V>> for Binds {
    fn from(value: HashMap<K, V>) -> Self {
        Binds::Named(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.as_value()))
                .collect(),
        )
    }
}

/// Positional binds of heterogeneous values.
/// ```rust
/// use bindle_core::{Binds, Value, binds};
/// let binds = binds![5, "five", None::<i32>];
/// assert_eq!(binds.get(1), Some(&Value::Varchar(Some("five".into()))));
/// ```
#[macro_export]
macro_rules! binds {
    () => {
        $crate::Binds::Positional(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Binds::Positional(::std::vec![$($crate::Value::from($value)),+])
    };
}

/// Named binds of heterogeneous values.
/// ```rust
/// use bindle_core::{Value, named_binds};
/// let binds = named_binds! { "id" => 7, "name" => "seven" };
/// assert_eq!(binds.get_named("id"), Some(&Value::Int32(Some(7))));
/// ```
#[macro_export]
macro_rules! named_binds {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut values = ::std::collections::BTreeMap::new();
        $(values.insert(::std::string::String::from($key), $crate::Value::from($value));)*
        $crate::Binds::Named(values)
    }};
}
