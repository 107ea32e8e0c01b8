use crate::{Error, Prepared, Result, Value, ValueCategory};
use parking_lot::RwLock;
use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, LazyLock},
};
use time::UtcOffset;

/// Transforms a value into the representation a driver expects.
pub type Converter = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Converters keyed by [`ValueCategory`].
///
/// Used in both directions: statements run bind parameters through their input
/// map before reaching the driver, and drivers hand back an output map that
/// result sets apply to fetched cells.
///
/// Categories with no registered converter pass through unchanged, so driver
/// native values the map knows nothing about still reach the driver.
#[derive(Clone, Default)]
pub struct TypeMap {
    converters: HashMap<ValueCategory, Converter>,
}

static INPUT_TYPE_MAPS: LazyLock<RwLock<HashMap<TypeId, Arc<TypeMap>>>> =
    LazyLock::new(Default::default);

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with the driver agnostic input converters.
    pub fn input_defaults() -> Self {
        let mut map = Self::new();
        map.register(ValueCategory::Null, Ok)
            .register(ValueCategory::Boolean, Ok)
            .register(ValueCategory::Binary, Ok)
            .register(ValueCategory::Numeric, convert_numeric)
            .register(ValueCategory::Text, convert_text)
            .register(ValueCategory::Temporal, convert_temporal);
        map
    }

    /// Input map of the statements prepared through `P`.
    ///
    /// Built once per type from [`TypeMap::input_defaults`] plus
    /// [`Prepared::input_type_map`], then shared.
    pub fn resolve<P: Prepared>() -> Arc<TypeMap> {
        let id = TypeId::of::<P>();
        if let Some(map) = INPUT_TYPE_MAPS.read().get(&id) {
            return map.clone();
        }
        let mut maps = INPUT_TYPE_MAPS.write();
        maps.entry(id)
            .or_insert_with(|| {
                log::debug!("Building the input type map of {}", type_name::<P>());
                let mut map = TypeMap::input_defaults();
                P::input_type_map(&mut map);
                Arc::new(map)
            })
            .clone()
    }

    /// Register `converter` for `category`, replacing the previous one.
    pub fn register<F>(&mut self, category: ValueCategory, converter: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.converters.insert(category, Arc::new(converter));
        self
    }

    pub fn remove(&mut self, category: ValueCategory) -> Option<Converter> {
        self.converters.remove(&category)
    }

    pub fn get(&self, category: ValueCategory) -> Option<&Converter> {
        self.converters.get(&category)
    }

    pub fn contains(&self, category: ValueCategory) -> bool {
        self.converters.contains_key(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn convert(&self, value: Value) -> Result<Value> {
        match self.converters.get(&value.category()) {
            Some(converter) => converter(value),
            None => Ok(value),
        }
    }
}

impl Debug for TypeMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut categories = self.converters.keys().collect::<Vec<_>>();
        categories.sort();
        f.debug_struct("TypeMap")
            .field("categories", &categories)
            .finish()
    }
}

fn convert_numeric(value: Value) -> Result<Value> {
    match value {
        Value::Float32(Some(v)) if !v.is_finite() => Err(Error::msg(format!(
            "Non finite f32 `{v}` has no portable representation"
        ))),
        Value::Float64(Some(v)) if !v.is_finite() => Err(Error::msg(format!(
            "Non finite f64 `{v}` has no portable representation"
        ))),
        Value::Decimal(Some(v), precision, scale) => {
            Ok(Value::Decimal(Some(v.normalize()), precision, scale))
        }
        _ => Ok(value),
    }
}

fn convert_text(value: Value) -> Result<Value> {
    match value {
        Value::Varchar(Some(ref v)) if v.contains('\0') => Err(Error::msg(
            "Text containing a NUL character cannot be sent to the driver",
        )),
        _ => Ok(value),
    }
}

fn convert_temporal(value: Value) -> Result<Value> {
    match value {
        Value::TimestampWithTimezone(Some(v)) => {
            Ok(Value::TimestampWithTimezone(Some(v.to_offset(UtcOffset::UTC))))
        }
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::{
        str::FromStr,
        sync::{
            Barrier,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };
    use time::macros::datetime;

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct CountedPrepared;

    impl Prepared for CountedPrepared {
        fn input_type_map(map: &mut TypeMap) {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            map.register(ValueCategory::Uuid, Ok);
        }
    }

    #[test]
    fn defaults_cover_the_agnostic_categories() {
        let map = TypeMap::input_defaults();
        for category in [
            ValueCategory::Null,
            ValueCategory::Boolean,
            ValueCategory::Numeric,
            ValueCategory::Text,
            ValueCategory::Binary,
            ValueCategory::Temporal,
        ] {
            assert!(map.contains(category), "{category:?} should be registered");
        }
        assert!(!map.contains(ValueCategory::Uuid));
        assert!(!map.contains(ValueCategory::Native));
    }

    #[test]
    fn unknown_category_passes_through() {
        let map = TypeMap::input_defaults();
        let value = Value::Unknown(Some("point(1 2)".into()));
        assert_eq!(map.convert(value.clone()).unwrap(), value);
        let empty = TypeMap::new();
        assert!(empty.convert(Value::Float64(Some(f64::NAN))).is_ok());
    }

    #[test]
    fn numeric_conversion() {
        let map = TypeMap::input_defaults();
        assert_eq!(map.convert(Value::Int32(Some(5))).unwrap(), Value::Int32(Some(5)));
        let decimal = Decimal::from_str("12.3400").unwrap();
        let converted = map.convert(Value::Decimal(Some(decimal), 6, 4)).unwrap();
        let Value::Decimal(Some(normalized), 6, 4) = converted else {
            panic!("Expected a Decimal(6, 4)");
        };
        assert_eq!(normalized.to_string(), "12.34");
        assert!(map.convert(Value::Float64(Some(f64::INFINITY))).is_err());
        assert!(map.convert(Value::Float32(Some(f32::NAN))).is_err());
    }

    #[test]
    fn text_and_temporal_conversion() {
        let map = TypeMap::input_defaults();
        assert!(map.convert(Value::Varchar(Some("a\0b".into()))).is_err());
        assert_eq!(
            map.convert(Value::Varchar(Some("ab".into()))).unwrap(),
            Value::Varchar(Some("ab".into()))
        );
        let converted = map
            .convert(Value::TimestampWithTimezone(Some(datetime!(2024-03-01 10:00 +2))))
            .unwrap();
        assert_eq!(
            converted,
            Value::TimestampWithTimezone(Some(datetime!(2024-03-01 08:00 UTC)))
        );
        let Value::TimestampWithTimezone(Some(v)) = converted else {
            unreachable!()
        };
        assert_eq!(v.offset(), UtcOffset::UTC);
    }

    #[test]
    fn typed_null_keeps_its_type() {
        let map = TypeMap::input_defaults();
        assert_eq!(map.convert(Value::Float64(None)).unwrap(), Value::Float64(None));
        assert_eq!(map.convert(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn register_replaces() {
        let mut map = TypeMap::input_defaults();
        map.register(ValueCategory::Uuid, |_| Ok(Value::Varchar(Some("uuid".into()))));
        assert_eq!(
            map.convert(Value::Uuid(Some(uuid::Uuid::nil()))).unwrap(),
            Value::Varchar(Some("uuid".into()))
        );
        map.remove(ValueCategory::Text);
        assert!(map.convert(Value::Varchar(Some("a\0b".into()))).is_ok());
    }

    #[test]
    fn concurrent_first_resolve_builds_once() {
        const THREADS: usize = 8;
        let barrier = Barrier::new(THREADS);
        let maps: Vec<Arc<TypeMap>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        TypeMap::resolve::<CountedPrepared>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert!(maps.iter().all(|m| Arc::ptr_eq(m, &maps[0])));
        assert!(maps[0].contains(ValueCategory::Uuid));
        assert!(Arc::ptr_eq(&TypeMap::resolve::<CountedPrepared>(), &maps[0]));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }
}
