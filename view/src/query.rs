use {
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    serde::Serialize,
    serde_json::{Map, Value},
};

/// A view query: a label plus its argument payload.
///
/// Encoded, a query is a JSON object with exactly one key, the label, whose
/// value is the (possibly empty) argument object.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewQuery {
    label: String,
    args: Value,
}

impl ViewQuery {
    pub fn new(label: impl Into<String>, args: Value) -> Self {
        Self {
            label: label.into(),
            args,
        }
    }

    /// Parse an encoded query. A bare string is accepted as a label with no
    /// arguments, which is how serde renders a unit enum variant.
    pub fn from_encoded(encoded: Value) -> HarnessResult<Self> {
        match encoded {
            Value::String(label) => Ok(Self::new(label, Value::Object(Map::new()))),
            Value::Object(map) => {
                if map.len() != 1 {
                    return Err(HarnessError::InvalidViewQuery(format!(
                        "expected exactly one key, found {}",
                        map.len()
                    )));
                }
                let (label, args) = map.into_iter().next().ok_or_else(|| {
                    HarnessError::InvalidViewQuery("empty query object".to_string())
                })?;
                Ok(Self::new(label, args))
            }
            other => Err(HarnessError::InvalidViewQuery(format!(
                "expected an object, found {other}"
            ))),
        }
    }

    /// Encode any serializable getter, typically an enum variant, as a query.
    pub fn from_getter<G: Serialize>(getter: &G) -> HarnessResult<Self> {
        let encoded = serde_json::to_value(getter)
            .map_err(|err| HarnessError::Serialization(err.to_string()))?;
        Self::from_encoded(encoded)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> &Value {
        &self.args
    }

    pub fn encode(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.label.clone(), self.args.clone());
        Value::Object(map)
    }
}
