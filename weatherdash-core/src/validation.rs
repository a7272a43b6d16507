//! Declared bounds for prediction form fields.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, FieldError, Result};

/// Inclusive numeric bound; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldBound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldBound {
    pub const fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub const fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub const fn unbounded() -> Self {
        Self { min: None, max: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(b),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number(FieldBound),
    Flag,
}

/// One form field: wire name, human label, unit suffix and bound.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Appended to bound values in messages, e.g. `" hPa"` or `"%"`.
    pub unit: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn number(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        bound: FieldBound,
    ) -> Self {
        Self { name, label, unit, kind: FieldKind::Number(bound) }
    }

    pub const fn flag(name: &'static str, label: &'static str) -> Self {
        Self { name, label, unit: "", kind: FieldKind::Flag }
    }

    /// Check a single value, returning the inline message on failure.
    pub fn check(&self, value: FieldValue) -> Option<FieldError> {
        let message = match (self.kind, value) {
            (FieldKind::Flag, FieldValue::Flag(_)) => return None,
            (FieldKind::Flag, FieldValue::Number(_)) => "Expected true or false".to_string(),
            (FieldKind::Number(_), FieldValue::Flag(_)) => "Expected a number".to_string(),
            (FieldKind::Number(_), FieldValue::Number(n)) if !n.is_finite() => {
                "Expected a number".to_string()
            }
            (FieldKind::Number(bound), FieldValue::Number(n)) => match (bound.min, bound.max) {
                (Some(min), _) if n < min => format!("Must be at least {min}{}", self.unit),
                (_, Some(max)) if n > max => format!("Must be at most {max}{}", self.unit),
                _ => return None,
            },
        };
        Some(FieldError { field: self.name, message })
    }
}

/// The bound table of one prediction form.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSet {
    fields: Vec<FieldSpec>,
}

impl BoundSet {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Replace the bounds of the named numeric fields.
    pub fn with_overrides(mut self, overrides: &HashMap<String, FieldBound>) -> Result<Self> {
        for (name, bound) in overrides {
            let spec = self
                .fields
                .iter_mut()
                .find(|f| f.name == name.as_str())
                .ok_or_else(|| {
                    DashboardError::Configuration(format!("unknown form field '{name}' in bounds"))
                })?;
            match spec.kind {
                FieldKind::Number(_) => spec.kind = FieldKind::Number(*bound),
                FieldKind::Flag => {
                    return Err(DashboardError::Configuration(format!(
                        "form field '{name}' is a flag and cannot take numeric bounds"
                    )));
                }
            }
        }
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Collect every field error; `Ok` only when all values are in bounds.
    pub fn validate<'a, I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let errors: Vec<FieldError> = values
            .into_iter()
            .filter_map(|(name, value)| self.spec(name).and_then(|spec| spec.check(value)))
            .collect();

        if errors.is_empty() { Ok(()) } else { Err(DashboardError::Validation(errors)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidity() -> FieldSpec {
        FieldSpec::number("humidity", "Humidity (%)", "%", FieldBound::between(0.0, 100.0))
    }

    #[test]
    fn in_range_value_passes() {
        assert!(humidity().check(FieldValue::Number(60.0)).is_none());
        assert!(humidity().check(FieldValue::Number(0.0)).is_none());
        assert!(humidity().check(FieldValue::Number(100.0)).is_none());
    }

    #[test]
    fn out_of_range_value_gets_inline_message() {
        let err = humidity().check(FieldValue::Number(150.0)).expect("150 is out of bounds");
        assert_eq!(err.field, "humidity");
        assert_eq!(err.message, "Must be at most 100%");

        let err = humidity().check(FieldValue::Number(-1.0)).unwrap();
        assert_eq!(err.message, "Must be at least 0%");
    }

    #[test]
    fn nan_is_never_accepted() {
        let open = FieldSpec::number("dew", "Dew Point (°C)", "°C", FieldBound::unbounded());
        assert!(open.check(FieldValue::Number(f64::NAN)).is_some());
        assert!(open.check(FieldValue::Number(-80.0)).is_none());
    }

    #[test]
    fn flag_field_rejects_numbers() {
        let spec = FieldSpec::flag("rain_today", "Rain Today");
        assert!(spec.check(FieldValue::Flag(true)).is_none());
        assert!(spec.check(FieldValue::Number(1.0)).is_some());
    }

    #[test]
    fn validate_collects_all_errors() {
        let set = BoundSet::new(vec![
            humidity(),
            FieldSpec::number("temp", "Temperature (°C)", "°C", FieldBound::between(-50.0, 50.0)),
        ]);

        let err = set
            .validate([("humidity", FieldValue::Number(150.0)), ("temp", FieldValue::Number(70.0))])
            .unwrap_err();
        assert_eq!(err.field_errors().len(), 2);

        assert!(set.validate([("humidity", FieldValue::Number(60.0))]).is_ok());
    }

    #[test]
    fn overrides_replace_bounds() {
        let set = BoundSet::new(vec![humidity()]);
        let overrides = HashMap::from([("humidity".to_string(), FieldBound::between(10.0, 90.0))]);
        let set = set.with_overrides(&overrides).unwrap();

        assert!(set.validate([("humidity", FieldValue::Number(95.0))]).is_err());
    }

    #[test]
    fn override_of_unknown_field_is_a_config_error() {
        let set = BoundSet::new(vec![humidity()]);
        let overrides = HashMap::from([("pressure".to_string(), FieldBound::at_least(0.0))]);
        assert!(matches!(set.with_overrides(&overrides), Err(DashboardError::Configuration(_))));
    }
}
