//! Declarative trigger descriptions, deserializable from configuration
//! files.
//!
//! A [`TriggerSpec`] is the serializable counterpart of a generator: an
//! application can keep its timing setup in TOML, deserialize it with
//! `serde`, and call [`TriggerSpec::build`] to obtain the generator to hand
//! to a [`TimerSet`](crate::engine::TimerSet).

use crate::align::alignment_unit;
use crate::error::TickError;
use crate::generator::{BoxGenerator, PeriodicTriggers, ScheduleTriggers};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// A declarative description of when a stream should fire.
///
/// ```toml
/// mode = "periodic"
/// interval_ms = 2000
/// alignment = "auto"
/// timezone = "Europe/Berlin"
/// ```
///
/// ```toml
/// mode = "schedule"
/// at = ["2026-09-01T08:00:00Z", "2026-09-01T12:00:00Z"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TriggerSpec {
    /// Fire every `interval_ms`, snapped per `alignment` in `timezone`.
    Periodic {
        interval_ms: u64,
        #[serde(default)]
        alignment: AlignmentSpec,
        #[serde(default = "default_timezone")]
        timezone: Tz,
    },
    /// Fire once at each listed instant, in ascending order.
    Schedule { at: Vec<DateTime<Utc>> },
}

/// How a periodic spec aligns its triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentSpec {
    /// Derive the unit from the interval's coarsest non-zero field.
    #[default]
    Auto,
    /// No snapping; triggers keep the phase of the first call.
    Off,
    /// An explicit alignment unit in milliseconds.
    Unit { unit_ms: u64 },
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl TriggerSpec {
    /// Builds the generator this spec describes.
    ///
    /// # Errors
    /// Propagates the construction-time validation of the underlying
    /// generator, e.g. [`TickError::NonPositiveInterval`] for
    /// `interval_ms = 0`.
    pub fn build(&self) -> Result<BoxGenerator, TickError> {
        match self {
            Self::Periodic {
                interval_ms,
                alignment,
                timezone,
            } => {
                let interval = Duration::milliseconds(*interval_ms as i64);
                let unit = match alignment {
                    AlignmentSpec::Auto => alignment_unit(interval),
                    AlignmentSpec::Off => Duration::zero(),
                    AlignmentSpec::Unit { unit_ms } => Duration::milliseconds(*unit_ms as i64),
                };
                let generator =
                    PeriodicTriggers::aligned(interval, unit)?.with_timezone(*timezone);
                Ok(Box::new(generator))
            }
            Self::Schedule { at } => Ok(Box::new(ScheduleTriggers::new(at.iter().copied()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::TriggerGenerator;

    #[test]
    fn deserializes_a_periodic_spec_from_toml() {
        let spec: TriggerSpec = toml::from_str(
            r#"
            mode = "periodic"
            interval_ms = 1500
            alignment = "off"
            "#,
        )
        .unwrap();
        match spec {
            TriggerSpec::Periodic {
                interval_ms,
                alignment,
                timezone,
            } => {
                assert_eq!(interval_ms, 1500);
                assert_eq!(alignment, AlignmentSpec::Off);
                assert_eq!(timezone, Tz::UTC);
            }
            other => panic!("expected periodic, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_a_schedule_spec_from_toml() {
        let spec: TriggerSpec = toml::from_str(
            r#"
            mode = "schedule"
            at = ["2026-09-01T08:00:00Z", "2026-09-01T07:00:00Z"]
            "#,
        )
        .unwrap();
        let mut generator = spec.build().unwrap();
        let now = "2026-08-25T00:00:00Z".parse().unwrap();
        assert_eq!(
            generator.next_trigger(now),
            Some("2026-09-01T07:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn building_a_zero_interval_fails_fast() {
        let spec = TriggerSpec::Periodic {
            interval_ms: 0,
            alignment: AlignmentSpec::Auto,
            timezone: Tz::UTC,
        };
        assert!(matches!(
            spec.build(),
            Err(TickError::NonPositiveInterval(_))
        ));
    }

    #[test]
    fn auto_alignment_follows_the_interval_unit() {
        let spec = TriggerSpec::Periodic {
            interval_ms: 60_000,
            alignment: AlignmentSpec::Auto,
            timezone: Tz::UTC,
        };
        let mut generator = spec.build().unwrap();
        let now: DateTime<Utc> = "2026-08-25T12:00:30.500Z".parse().unwrap();
        let trigger = generator.next_trigger(now).unwrap();
        assert_eq!(trigger, "2026-08-25T12:01:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
