use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// A one-dimensional step lookup table.
///
/// A query selects the first key greater than or equal to it. Queries past the last
/// key miss, unless made through [`Lut1::get_clamped`].
#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct Lut1<K1, V> {
    k1: Vec<K1>,
    values: Vec<V>,
}

impl<K1, V> Lut1Builder<K1, V> {
    fn validate(&self) -> Result<(), String> {
        match (&self.k1, &self.values) {
            (Some(k), Some(v)) if k.len() != v.len() => Err(format!(
                "mismatched table lengths: {} keys, {} values",
                k.len(),
                v.len()
            )),
            (Some(k), _) if k.is_empty() => Err("lookup table must not be empty".to_string()),
            _ => Ok(()),
        }
    }
}

impl<K1, V> Lut1<K1, V> {
    pub fn builder() -> Lut1Builder<K1, V> {
        Default::default()
    }

    pub fn keys(&self) -> &[K1] {
        &self.k1
    }
}

impl<K1, V> Lut1<K1, V>
where
    K1: PartialOrd,
{
    /// Returns the value of the first key `>= k1`, or `None` past the last key.
    pub fn get(&self, k1: &K1) -> Option<&V> {
        let i1 = self.k1.partition_point(|k| k < k1);
        self.values.get(i1)
    }

    /// Like [`Lut1::get`], but saturates to the last value.
    pub fn get_clamped(&self, k1: &K1) -> Option<&V> {
        self.get(k1).or_else(|| self.values.last())
    }
}

pub type FloatLut1 = Lut1<f64, f64>;
