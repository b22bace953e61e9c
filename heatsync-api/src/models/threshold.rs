use serde::{Deserialize, Serialize};

use super::TemperatureUnit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSettings {
    /// Lower alert bound
    pub min: f64,
    /// Upper alert bound
    pub max: f64,
    /// Unit of both bounds
    pub unit: TemperatureUnit,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            min: 15.0,
            max: 30.0,
            unit: TemperatureUnit::Celsius,
        }
    }
}

/// Partial update of [`ThresholdSettings`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    /// New lower bound
    pub min: Option<f64>,
    /// New upper bound
    pub max: Option<f64>,
    /// New unit, converting the previous bounds
    pub unit: Option<TemperatureUnit>,
}

impl ThresholdSettings {
    /// Applies `update` on top of the current settings.
    ///
    /// A unit change converts the previous bounds into the new unit and
    /// takes precedence over bounds given in the same update.
    pub fn merge(&self, update: &ThresholdUpdate) -> ThresholdSettings {
        let mut merged = ThresholdSettings {
            min: update.min.unwrap_or(self.min),
            max: update.max.unwrap_or(self.max),
            unit: update.unit.unwrap_or(self.unit),
        };

        if let Some(unit) = update.unit {
            if unit != self.unit {
                merged.min = TemperatureUnit::convert(self.min, self.unit, unit);
                merged.max = TemperatureUnit::convert(self.max, self.unit, unit);
            }
        }

        merged
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_given_fields() {
        let settings = ThresholdSettings::default();

        let merged = settings.merge(&ThresholdUpdate { max: Some(24.0), ..Default::default() });

        assert_eq!(merged, ThresholdSettings { min: 15.0, max: 24.0, unit: TemperatureUnit::Celsius });
    }

    #[test]
    fn test_merge_converts_on_unit_change() {
        let settings = ThresholdSettings::default();

        let merged = settings.merge(&ThresholdUpdate {
            min: Some(0.0),
            unit: Some(TemperatureUnit::Fahrenheit),
            ..Default::default()
        });

        assert_eq!(merged.min, 59.0);
        assert_eq!(merged.max, 86.0);
        assert_eq!(merged.unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_merge_accepts_inverted_bounds() {
        let merged = ThresholdSettings::default().merge(&ThresholdUpdate { min: Some(40.0), ..Default::default() });

        assert_eq!(merged.min, 40.0);
        assert!(!merged.is_ordered());
    }
}
