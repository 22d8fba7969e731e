//! Class labels with exact equality semantics.
//!
//! Labels are real numbers, but two labels denote the same class only when
//! their bit patterns agree. There is no tolerance: `1.0` and
//! `1.0 + f64::EPSILON` are different classes, and so are `0.0` and `-0.0`.
//! Every NaN payload is folded into the canonical NaN first, so all NaN
//! labels fall into one class.
//!
//! Finite labels serialize as plain numbers. Formats such as JSON have no
//! representation for NaN or the infinities, so those are written as the
//! strings `"NaN"`, `"inf"` and `"-inf"`.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug)]
pub struct ClassLabel(f64);

impl ClassLabel {
    pub fn new(value: f64) -> Self {
        ClassLabel(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    fn bits(self) -> u64 {
        if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl From<f64> for ClassLabel {
    fn from(value: f64) -> Self {
        ClassLabel(value)
    }
}

impl From<ClassLabel> for f64 {
    fn from(label: ClassLabel) -> Self {
        label.0
    }
}

impl PartialEq for ClassLabel {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for ClassLabel {}

impl Hash for ClassLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for ClassLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        f64::from_bits(self.bits()).total_cmp(&f64::from_bits(other.bits()))
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ClassLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else if self.0.is_nan() {
            serializer.serialize_str("NaN")
        } else if self.0 > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }
}

struct ClassLabelVisitor;

impl<'de> Visitor<'de> for ClassLabelVisitor {
    type Value = ClassLabel;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or one of \"NaN\", \"inf\", \"-inf\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ClassLabel, E> {
        Ok(ClassLabel(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ClassLabel, E> {
        Ok(ClassLabel(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ClassLabel, E> {
        Ok(ClassLabel(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ClassLabel, E> {
        match v {
            "NaN" => Ok(ClassLabel(f64::NAN)),
            "inf" => Ok(ClassLabel(f64::INFINITY)),
            "-inf" => Ok(ClassLabel(f64::NEG_INFINITY)),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for ClassLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ClassLabelVisitor)
    }
}
