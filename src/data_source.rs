//! Lazy record sequences consumed by the iteration components.
//!
//! A [`DataSource`] wraps a vector, a single record or an arbitrary external
//! iterator behind one pull interface. Sources are handles: cloning a
//! `DataSource` shares the cursor, so a sequence consumed by one `For` is
//! exhausted for the next one unless that component asks for a rewind.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::value::Value;

/// Producer behind a [`DataSource`].
pub trait RecordSource {
    /// Pull the next record, or `None` once the sequence is exhausted.
    fn next_record(&mut self) -> Option<Value>;

    /// Restart the sequence from its first record. Returns `false` when the
    /// producer cannot restart.
    fn rewind(&mut self) -> bool;
}

struct VecSource {
    items: Vec<Value>,
    pos: usize,
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> Option<Value> {
        let item = self.items.get(self.pos).cloned()?;
        self.pos += 1;
        Some(item)
    }

    fn rewind(&mut self) -> bool {
        self.pos = 0;
        true
    }
}

struct SingleSource {
    record: Value,
    consumed: bool,
}

impl RecordSource for SingleSource {
    fn next_record(&mut self) -> Option<Value> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        Some(self.record.clone())
    }

    fn rewind(&mut self) -> bool {
        self.consumed = false;
        true
    }
}

struct IterSource<I> {
    iter: I,
}

impl<I: Iterator<Item = Value>> RecordSource for IterSource<I> {
    fn next_record(&mut self) -> Option<Value> {
        self.iter.next()
    }

    fn rewind(&mut self) -> bool {
        false
    }
}

/// Shared handle to a lazy, finite sequence of records.
#[derive(Clone)]
pub struct DataSource {
    inner: Rc<RefCell<Box<dyn RecordSource>>>,
}

impl DataSource {
    /// Wrap any producer.
    pub fn new<S: RecordSource + 'static>(source: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(source))),
        }
    }

    /// A restartable sequence over `items`.
    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self::new(VecSource { items, pos: 0 })
    }

    /// A restartable sequence holding exactly one record.
    #[must_use]
    pub fn single(record: Value) -> Self {
        Self::new(SingleSource {
            record,
            consumed: false,
        })
    }

    /// A one-shot sequence pulling from an external iterator.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::new(IterSource {
            iter: iter.into_iter(),
        })
    }

    /// Interpret a resolved value as a sequence: lists iterate their items,
    /// `Null` is empty, an existing source is shared and anything else is a
    /// single record.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Data(source) => source,
            Value::List(items) => Self::from_vec(items),
            Value::Null => Self::from_vec(Vec::new()),
            other => Self::single(other),
        }
    }

    /// Pull the next record.
    #[must_use]
    pub fn next_record(&self) -> Option<Value> {
        self.inner.borrow_mut().next_record()
    }

    /// Restart the sequence; `false` if the producer is not restartable.
    pub fn rewind(&self) -> bool {
        self.inner.borrow_mut().rewind()
    }

    /// Whether two handles share the same producer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataSource(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &DataSource) -> Vec<Value> {
        core::iter::from_fn(|| source.next_record()).collect()
    }

    #[test]
    fn test_vec_source_is_restartable() {
        let source = DataSource::from_vec(vec![Value::from(1.0), Value::from(2.0)]);
        assert_eq!(drain(&source).len(), 2);
        assert!(drain(&source).is_empty());
        assert!(source.rewind());
        assert_eq!(drain(&source), vec![Value::from(1.0), Value::from(2.0)]);
    }

    #[test]
    fn test_iter_source_is_one_shot() {
        let source = DataSource::from_iter((0..3).map(|n| Value::from(f64::from(n))));
        let shared = source.clone();
        assert_eq!(shared.next_record(), Some(Value::from(0.0)));
        assert_eq!(drain(&source).len(), 2);
        assert!(!source.rewind());
        assert!(drain(&source).is_empty());
    }

    #[test]
    fn test_from_value() {
        assert!(drain(&DataSource::from_value(Value::Null)).is_empty());
        let single = DataSource::from_value(Value::from("x"));
        assert_eq!(drain(&single), vec![Value::from("x")]);
        let shared = DataSource::from_vec(vec![]);
        assert!(DataSource::from_value(Value::Data(shared.clone())).ptr_eq(&shared));
    }
}
