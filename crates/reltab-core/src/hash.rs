//! Stable hashing for key tuples and content-addressed cache keys.

use blake3::Hasher;
use serde::Serialize;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

/// Hash any serde-serializable value deterministically (via JSON).
/// Used for cache keys; heavy paths hash values directly instead.
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

/// Hash a row's key-field tuple, collision-resistant and order-preserving:
/// fields are fed in declared key order, each with a type discriminant so
/// `Number(1)` and `Text("1")` never collide.
pub fn hash_key_tuple(values: &[Value]) -> Hash256 {
    let mut h = Hasher::new();
    for v in values {
        hash_value(v, &mut h);
    }
    Hash256(h.finalize().into())
}

fn value_type_order(v: &Value) -> u8 {
    match v {
        Value::Empty => 0,
        Value::Number(_) => 1,
        Value::Bool(_) => 2,
        Value::Text(_) => 3,
        Value::Vector(_) => 4,
    }
}

fn hash_value(v: &Value, h: &mut Hasher) {
    h.update(&[value_type_order(v)]);
    match v {
        Value::Empty => {}
        Value::Number(n) => {
            // Normalize -0.0 so it hashes like 0.0.
            let n = if *n == 0.0 { 0.0 } else { *n };
            h.update(&n.to_bits().to_le_bytes());
        }
        Value::Bool(b) => {
            h.update(&[*b as u8]);
        }
        Value::Text(s) => {
            h.update(&(s.len() as u64).to_le_bytes());
            h.update(s.as_bytes());
        }
        Value::Vector(xs) => {
            h.update(&(xs.len() as u64).to_le_bytes());
            for x in xs {
                h.update(&x.to_bits().to_le_bytes());
            }
        }
    }
}
