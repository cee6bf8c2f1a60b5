use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type RowIter<T> = Box<dyn Iterator<Item = T> + Send>;
type Source<T> = Arc<dyn Fn() -> RowIter<T> + Send + Sync>;

/// A lazy, restartable sequence of rows.
///
/// Building and composing a query does no I/O. Every enumeration (`iter`,
/// `to_vec`, `count`, `first`, `single`) runs the source again from the start,
/// so one query can be enumerated many times and always sees current data.
pub struct Query<T> {
    source: Source<T>,
}

/// Result of asking for at most one row.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleRow<T> {
    None,
    One(T),
    Many,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Query<T> {
    /// Wraps a row source; `source` is called once per enumeration.
    pub fn from_fn<F, I>(source: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Arc::new(move || Box::new(source().into_iter()) as RowIter<T>),
        }
    }

    pub fn from_vec(rows: Vec<T>) -> Self
    where
        T: Clone + Sync,
    {
        let rows = Arc::new(rows);
        Self::from_fn(move || rows.as_ref().clone())
    }

    pub fn empty() -> Self {
        Self::from_fn(Vec::new)
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.source;
        let predicate = Arc::new(predicate);
        Self {
            source: Arc::new(move || {
                let predicate = Arc::clone(&predicate);
                Box::new(source().filter(move |row| predicate(row))) as RowIter<T>
            }),
        }
    }

    pub fn map<U, F>(self, f: F) -> Query<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = self.source;
        let f = Arc::new(f);
        Query {
            source: Arc::new(move || {
                let f = Arc::clone(&f);
                Box::new(source().map(move |row| f(row))) as RowIter<U>
            }),
        }
    }

    pub fn filter_map<U, F>(self, f: F) -> Query<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        let source = self.source;
        let f = Arc::new(f);
        Query {
            source: Arc::new(move || {
                let f = Arc::clone(&f);
                Box::new(source().filter_map(move |row| f(row))) as RowIter<U>
            }),
        }
    }

    /// Sorts rows with `compare`; the sort happens at enumeration time.
    pub fn order_by<F>(self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let source = self.source;
        let compare = Arc::new(compare);
        Self {
            source: Arc::new(move || {
                let mut rows: Vec<T> = source().collect();
                rows.sort_by(|a, b| compare(a, b));
                Box::new(rows.into_iter()) as RowIter<T>
            }),
        }
    }

    pub fn skip(self, n: usize) -> Self {
        let source = self.source;
        Self {
            source: Arc::new(move || Box::new(source().skip(n)) as RowIter<T>),
        }
    }

    pub fn take(self, n: usize) -> Self {
        let source = self.source;
        Self {
            source: Arc::new(move || Box::new(source().take(n)) as RowIter<T>),
        }
    }

    /// One page of rows, `page` counted from 1.
    pub fn page(self, page: usize, per_page: usize) -> Self {
        self.skip(page.saturating_sub(1).saturating_mul(per_page))
            .take(per_page)
    }

    /// Runs the query.
    pub fn iter(&self) -> impl Iterator<Item = T> + Send + use<T> {
        (self.source)()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    /// Reads at most two rows to tell none, one, and many apart.
    pub fn single(&self) -> SingleRow<T> {
        let mut rows = self.iter();
        match (rows.next(), rows.next()) {
            (None, _) => SingleRow::None,
            (Some(row), None) => SingleRow::One(row),
            (Some(_), Some(_)) => SingleRow::Many,
        }
    }
}
