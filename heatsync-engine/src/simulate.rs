use heatsync_api::models::{round_tenth, ControlState, TemperatureReading, TemperatureUnit};
use rand::Rng;
use time::{Duration, OffsetDateTime};

const BASE_MIN: f64 = 19.0;
const BASE_MAX: f64 = 24.0;
/// Heater RPM per degree of upward shift.
const RPM_PER_DEGREE: f64 = 2000.0;
const SPRAYER_COOLING: f64 = 3.0;
const FLOOR: f64 = 17.0;
const MIN_WIDTH: f64 = 2.0;

const READINGS_PER_DAY: i64 = 24;

/// Range the simulated sensor draws from, in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationBounds {
    pub min: f64,
    pub max: f64,
}

impl GenerationBounds {
    pub fn for_control(control: &ControlState) -> Self {
        let (mut min, mut max) = (BASE_MIN, BASE_MAX);

        if control.is_heater_active {
            let shift = control.heater_rpm as f64 / RPM_PER_DEGREE;
            min += shift;
            max += shift;

            if control.is_sprayer_active {
                min -= SPRAYER_COOLING;
                max -= SPRAYER_COOLING;
            }
        }

        let min = min.max(FLOOR);
        let max = max.max(min + MIN_WIDTH);

        Self { min, max }
    }
}

/// Draws a one-decimal value uniformly from `bounds`.
///
/// Sampling happens on the tenths grid inside the range so rounding can
/// never step outside it.
pub fn draw<R: Rng + ?Sized>(bounds: GenerationBounds, rng: &mut R) -> f64 {
    let low = (bounds.min * 10.0).ceil() as i64;
    let high = (bounds.max * 10.0).floor() as i64;

    rng.random_range(low..=high) as f64 / 10.0
}

/// Hourly backfill for the last `days` days plus the current one, ending at `now`.
/// Values wander ±5 degrees around room temperature.
pub fn seed_history<R: Rng + ?Sized>(
    days: u32,
    unit: TemperatureUnit,
    now: OffsetDateTime,
    rng: &mut R,
) -> Vec<TemperatureReading> {
    let base = TemperatureUnit::convert(22.0, TemperatureUnit::Celsius, unit);
    let count = (days as i64 + 1) * READINGS_PER_DAY;

    (0..count)
        .rev()
        .map(|hours_ago| {
            let value = round_tenth(base + rng.random_range(-5.0..5.0));
            TemperatureReading::new(now - Duration::hours(hours_ago), value, unit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    impl GenerationBounds {
        fn contains(&self, value: f64) -> bool {
            value >= self.min && value <= self.max
        }
    }

    fn control(heater: bool, sprayer: bool, rpm: u32) -> ControlState {
        ControlState {
            is_heater_active: heater,
            is_sprayer_active: sprayer,
            heater_rpm: rpm,
            ..ControlState::default()
        }
    }

    #[test]
    fn test_standby_bounds() {
        assert_eq!(
            GenerationBounds::for_control(&control(false, false, 5000)),
            GenerationBounds { min: 19.0, max: 24.0 }
        );
    }

    #[test]
    fn test_heater_shifts_bounds_up() {
        assert_eq!(
            GenerationBounds::for_control(&control(true, false, 3000)),
            GenerationBounds { min: 20.5, max: 25.5 }
        );
        assert_eq!(
            GenerationBounds::for_control(&control(true, false, 5000)),
            GenerationBounds { min: 21.5, max: 26.5 }
        );
    }

    #[test]
    fn test_sprayer_cools_heater_range() {
        assert_eq!(
            GenerationBounds::for_control(&control(true, true, 3000)),
            GenerationBounds { min: 17.5, max: 22.5 }
        );
    }

    #[test]
    fn test_floor_and_width_clamp() {
        let bounds = GenerationBounds::for_control(&control(true, true, 0));

        assert_eq!(bounds.min, 17.0);
        assert_eq!(bounds.max, 21.0);

        // Sprayer flag without the heater has no effect
        assert_eq!(
            GenerationBounds::for_control(&control(false, true, 3000)),
            GenerationBounds { min: 19.0, max: 24.0 }
        );
    }

    #[test]
    fn test_draw_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);

        for rpm in (1000..=5000).step_by(100) {
            for (heater, sprayer) in [(false, false), (true, false), (true, true)] {
                let bounds = GenerationBounds::for_control(&control(heater, sprayer, rpm));
                for _ in 0..50 {
                    let value = draw(bounds, &mut rng);
                    assert!(bounds.contains(value), "{value} outside {bounds:?}");
                    assert_eq!(value, round_tenth(value));
                }
            }
        }
    }

    #[test]
    fn test_seed_history_is_hourly_and_ends_now() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = OffsetDateTime::now_utc();

        let history = seed_history(7, TemperatureUnit::Celsius, now, &mut rng);

        assert_eq!(history.len(), 8 * 24);
        assert_eq!(history.last().unwrap().timestamp, now);
        assert_eq!(history[1].timestamp - history[0].timestamp, Duration::hours(1));
        assert!(history.iter().all(|r| (17.0..=27.0).contains(&r.value)));
    }

    #[test]
    fn test_seed_history_in_fahrenheit() {
        let mut rng = StdRng::seed_from_u64(2);

        let history = seed_history(0, TemperatureUnit::Fahrenheit, OffsetDateTime::now_utc(), &mut rng);

        assert_eq!(history.len(), 24);
        assert!(history.iter().all(|r| r.unit == TemperatureUnit::Fahrenheit));
        assert!(history.iter().all(|r| (66.6..=76.6).contains(&r.value)));
    }
}
