use rand::Rng;
use serde::{Deserialize, Serialize};

/// Authored content that is either one value or a pool to pick from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variant<T> {
    One(T),
    Pool(Vec<T>),
}

impl<T> Variant<T> {
    /// Picks one concrete value. Pools draw uniformly; an empty pool yields nothing.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        match self {
            Variant::One(value) => Some(value),
            Variant::Pool(items) if items.is_empty() => None,
            Variant::Pool(items) => items.get(rng.gen_range(0..items.len())),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        match self {
            Variant::One(value) => std::slice::from_mut(value).iter_mut(),
            Variant::Pool(items) => items.iter_mut(),
        }
    }
}

impl<T> From<T> for Variant<T> {
    fn from(value: T) -> Self {
        Variant::One(value)
    }
}

/// Resolves an optional pool; absent stays absent.
pub fn resolve_variant<'a, T, R: Rng + ?Sized>(pool: Option<&'a Variant<T>>, rng: &mut R) -> Option<&'a T> {
    pool.and_then(|p| p.pick(rng))
}
