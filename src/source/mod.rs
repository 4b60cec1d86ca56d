//! Capabilities the containers consume to (re)build their content.
//!
//! A source returns `None` when it has nothing new to offer, for example
//! because the backing query failed. The container then keeps serving what it
//! already has and waits a full TTL before asking again.
//!
//! Plain closures implement every source trait, so most callers never name
//! one:
//!
//! ```ignore
//! let list = List::new(|| Some(vec![1, 2, 3]), Duration::from_secs(10))?;
//! ```

use std::collections::HashMap;

/// Builds the full content of a [`List`](crate::storage::List).
pub trait ListSource<T>: Send + Sync + 'static {
    fn build(&self) -> Option<Vec<T>>;
}

/// Builds the full content of a [`Map`](crate::storage::Map).
pub trait MapSource<K, V>: Send + Sync + 'static {
    fn build(&self) -> Option<HashMap<K, V>>;
}

/// Builds the members of a [`Set`](crate::storage::Set). Duplicates collapse.
pub trait SetSource<T>: Send + Sync + 'static {
    fn build(&self) -> Option<Vec<T>>;
}

/// Builds one value of a [`Store`](crate::storage::Store). `opts` carries
/// whatever the caller passed alongside the key.
pub trait StoreSource<K, V, O = ()>: Send + Sync + 'static {
    fn build(&self, key: &K, opts: &O) -> Option<V>;
}

impl<T, F> ListSource<T> for F
where
    F: Fn() -> Option<Vec<T>> + Send + Sync + 'static,
{
    fn build(&self) -> Option<Vec<T>> {
        self()
    }
}

impl<K, V, F> MapSource<K, V> for F
where
    F: Fn() -> Option<HashMap<K, V>> + Send + Sync + 'static,
{
    fn build(&self) -> Option<HashMap<K, V>> {
        self()
    }
}

impl<T, F> SetSource<T> for F
where
    F: Fn() -> Option<Vec<T>> + Send + Sync + 'static,
{
    fn build(&self) -> Option<Vec<T>> {
        self()
    }
}

impl<K, V, O, F> StoreSource<K, V, O> for F
where
    F: Fn(&K, &O) -> Option<V> + Send + Sync + 'static,
{
    fn build(&self, key: &K, opts: &O) -> Option<V> {
        self(key, opts)
    }
}
