use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::round_tenth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Degrees Celsius
    #[default]
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Converts `value` from `from` into `to`, rounded to one decimal.
    /// Values already in the target unit are returned untouched.
    pub fn convert(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
        if from == to {
            value
        } else {
            round_tenth(Self::convert_exact(value, from, to))
        }
    }

    /// Unrounded conversion, for comparisons against limits.
    pub fn convert_exact(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
        match (from, to) {
            (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
            (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) * 5.0 / 9.0,
            _ => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Sample time
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Measured value in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: TemperatureUnit,
}

impl TemperatureReading {
    pub fn new(timestamp: OffsetDateTime, value: f64, unit: TemperatureUnit) -> Self {
        Self { timestamp, value, unit }
    }

    /// A Celsius reading stamped with the current time.
    pub fn celsius(value: f64) -> Self {
        Self::new(OffsetDateTime::now_utc(), value, TemperatureUnit::Celsius)
    }

    pub fn in_unit(&self, unit: TemperatureUnit) -> f64 {
        TemperatureUnit::convert(self.value, self.unit, unit)
    }

    pub fn exact_in(&self, unit: TemperatureUnit) -> f64 {
        TemperatureUnit::convert_exact(self.value, self.unit, unit)
    }

    /// The same sample expressed in `unit`.
    pub fn converted(&self, unit: TemperatureUnit) -> Self {
        Self::new(self.timestamp, self.in_unit(unit), unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_between_units() {
        assert_eq!(TemperatureUnit::convert(25.0, TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit), 77.0);
        assert_eq!(TemperatureUnit::convert(71.6, TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius), 22.0);
        assert_eq!(TemperatureUnit::convert(21.37, TemperatureUnit::Celsius, TemperatureUnit::Celsius), 21.37);
    }

    #[test]
    fn test_reading_in_unit() {
        let reading = TemperatureReading::celsius(30.0);

        assert_eq!(reading.in_unit(TemperatureUnit::Fahrenheit), 86.0);
        assert_eq!(reading.in_unit(TemperatureUnit::Celsius), 30.0);
    }

    #[test]
    fn test_exact_conversion_keeps_precision() {
        let reading = TemperatureReading::celsius(25.02);

        assert_eq!(reading.in_unit(TemperatureUnit::Fahrenheit), 77.0);
        assert!(reading.exact_in(TemperatureUnit::Fahrenheit) > 77.0);

        let converted = reading.converted(TemperatureUnit::Fahrenheit);
        assert_eq!(converted.timestamp, reading.timestamp);
        assert_eq!(converted.unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_unit_serializes_lowercase() {
        let json = serde_json::to_string(&TemperatureUnit::Fahrenheit).unwrap();

        assert_eq!(json, "\"fahrenheit\"");
    }
}
