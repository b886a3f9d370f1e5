use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::ValidateLength;

use crate::infrastructure::store::DocumentData;

/// Optional field semantics in PATCH requests.
///
/// - `Unchanged` → key absent from the payload
/// - `SetToNull` → explicit `null`, clears the field
/// - `SetToValue` → replaces the field
///
/// Containing structs need `#[serde(default)]` so absent keys land on
/// `Unchanged`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum OptionField<T> {
    #[default]
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => OptionField::SetToNull,
            Some(value) => OptionField::SetToValue(value),
        })
    }
}

impl<T> ValidateLength<u64> for OptionField<T>
where
    T: ValidateLength<u64>,
{
    fn length(&self) -> Option<u64> {
        match self {
            OptionField::SetToValue(value) => value.length(),
            _ => None,
        }
    }

    fn validate_length(&self, min: Option<u64>, max: Option<u64>, equal: Option<u64>) -> bool {
        match self {
            OptionField::SetToValue(value) => value.validate_length(min, max, equal),
            _ => true,
        }
    }
}

impl<T> OptionField<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn value_ref(&self) -> Option<&T> {
        match self {
            Self::SetToValue(v) => Some(v),
            _ => None,
        }
    }

    pub fn map_value<U, F: FnOnce(T) -> U>(self, f: F) -> OptionField<U> {
        match self {
            Self::Unchanged => OptionField::Unchanged,
            Self::SetToNull => OptionField::SetToNull,
            Self::SetToValue(v) => OptionField::SetToValue(f(v)),
        }
    }

    /// Writes this field into a store patch: absent stays absent, null
    /// becomes JSON null, values are converted with `to_value`.
    pub fn write_to(self, patch: &mut DocumentData, key: &str)
    where
        T: Into<Value>,
    {
        match self {
            Self::Unchanged => {}
            Self::SetToNull => {
                patch.insert(key.to_string(), Value::Null);
            }
            Self::SetToValue(v) => {
                patch.insert(key.to_string(), v.into());
            }
        }
    }
}

/// Writes a required field into a patch when it was supplied.
pub fn write_if_some<T: Into<Value>>(value: Option<T>, patch: &mut DocumentData, key: &str) {
    if let Some(v) = value {
        patch.insert(key.to_string(), v.into());
    }
}
