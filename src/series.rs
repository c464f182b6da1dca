//! Synthesizing the time series of one leaf.

use chrono_tz::Tz;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use sha2::{Digest, Sha256};

use crate::{
    config_tree::GeneratorParams,
    date_and_time::{local_midnight, TimeWindow},
    error::MockDataError,
    leaf_path::LeafPath,
    period::Period,
};

/// One generated value at `time` (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}

/// Strictly increasing in time; never modified after generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    points: Vec<SeriesPoint>,
}

impl RawSeries {
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = i64> + '_ {
        self.points.iter().map(|p| p.time)
    }
}

/// The timestamps of a series over `window`: step `n` is midnight
/// (in `tz`) of the day containing the window start plus `n` times
/// `granularity`, keeping the steps that fall inside the window.
/// Depends only on the arguments, never on random draws. Each step is
/// resolved on its own, so a DST gap at midnight moves only that step.
pub fn series_timestamps(window: &TimeWindow, granularity: &Period, tz: &Tz) -> Vec<i64> {
    let start = window.start_millis();
    let end = window.end_millis();
    let anchor = local_midnight(&window.start().with_timezone(tz));
    let mut times: Vec<i64> = Vec::new();
    for n in 0.. {
        let Some(t) = granularity.nth_step(&anchor, tz, n) else {
            // out of range
            break;
        };
        let t = t.timestamp_millis();
        if t >= end {
            break;
        }
        // Two calendar steps can resolve to the same instant when
        // one lands in a DST gap; keep the times strictly increasing.
        if t >= start && times.last().map_or(true, |last| t > *last) {
            times.push(t);
        }
    }
    times
}

/// Draw one value per timestamp from Normal(mean, std), rounded half
/// away from zero and clamped to be non-negative (values are counts).
pub fn synthesize(
    params: &GeneratorParams,
    window: &TimeWindow,
    granularity: &Period,
    tz: &Tz,
    rng: &mut impl Rng,
) -> Result<RawSeries, MockDataError> {
    let GeneratorParams { mean, std } = *params;
    let dist = Normal::new(mean, std).map_err(|e| {
        MockDataError::malformed("", format!("invalid generator parameters {params:?}: {e}"))
    })?;
    let points = series_timestamps(window, granularity, tz)
        .into_iter()
        .map(|time| {
            let value = dist.sample(&mut *rng).round();
            SeriesPoint {
                time,
                // also turns -0.0 into 0.0
                value: if value > 0. { value } else { 0. },
            }
        })
        .collect();
    Ok(RawSeries { points })
}

/// The random number generator for the leaf at `path`. With a
/// `seed`, it depends only on the seed and the path, thus the values
/// do not depend on the order (or parallelism) of the generation.
pub fn leaf_rng(seed: Option<u64>, path: &LeafPath) -> Xoshiro256PlusPlus {
    match seed {
        Some(seed) => {
            let mut hasher = Sha256::new();
            hasher.update(seed.to_le_bytes());
            for segment in path.segments() {
                hasher.update(segment.as_bytes());
                hasher.update([0u8]);
            }
            Xoshiro256PlusPlus::from_seed(hasher.finalize().into())
        }
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::date_and_time::parse_timezone;

    fn utc_millis(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        chrono::Utc
            .from_utc_datetime(
                &NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, min, 0)
                    .unwrap(),
            )
            .timestamp_millis()
    }

    const HOUR: i64 = 3600 * 1000;

    #[test]
    fn t_timestamps_aligned_to_hours() -> Result<()> {
        let tz = parse_timezone("UTC")?;
        // Starts at 10:20, the first step inside is 11:00.
        let window = TimeWindow::from_millis(
            utc_millis(2024, 5, 1, 10, 20),
            utc_millis(2024, 5, 1, 14, 0),
        )?;
        let times = series_timestamps(&window, &"1hour".parse()?, &tz);
        let t11 = utc_millis(2024, 5, 1, 11, 0);
        assert_eq!(times, [t11, t11 + HOUR, t11 + 2 * HOUR]);
        Ok(())
    }

    #[test]
    fn t_sub_day_granularity_anchors_to_midnight() -> Result<()> {
        let tz = parse_timezone("UTC")?;
        // 7-hour steps from midnight: 00:00, 07:00, 14:00, 21:00
        let window = TimeWindow::from_millis(
            utc_millis(2024, 5, 1, 5, 0),
            utc_millis(2024, 5, 1, 22, 0),
        )?;
        let times = series_timestamps(&window, &"7hours".parse()?, &tz);
        assert_eq!(
            times,
            [
                utc_millis(2024, 5, 1, 7, 0),
                utc_millis(2024, 5, 1, 14, 0),
                utc_millis(2024, 5, 1, 21, 0)
            ]
        );
        Ok(())
    }

    #[test]
    fn t_day_in_time_zone() -> Result<()> {
        let tz = parse_timezone("America/Los_Angeles")?;
        // Midnight in LA is 07:00 UTC in May.
        let window = TimeWindow::from_millis(
            utc_millis(2024, 5, 1, 0, 0),
            utc_millis(2024, 5, 4, 0, 0),
        )?;
        let times = series_timestamps(&window, &"1day".parse()?, &tz);
        assert_eq!(
            times,
            [
                utc_millis(2024, 5, 1, 7, 0),
                utc_millis(2024, 5, 2, 7, 0),
                utc_millis(2024, 5, 3, 7, 0)
            ]
        );
        Ok(())
    }

    #[test]
    fn t_overlapping_windows_agree_across_gap() -> Result<()> {
        // Midnight of 2018-11-04 does not exist in Sao Paulo, clocks
        // jumped to 01:00.
        let tz = parse_timezone("America/Sao_Paulo")?;
        let day: Period = "1day".parse()?;
        let end = utc_millis(2018, 11, 8, 0, 0);
        let earlier = TimeWindow::from_millis(utc_millis(2018, 11, 4, 14, 0), end)?;
        let later = TimeWindow::from_millis(utc_millis(2018, 11, 5, 14, 0), end)?;
        let earlier_times = series_timestamps(&earlier, &day, &tz);
        let later_times = series_timestamps(&later, &day, &tz);
        let as_local = |times: &[i64]| -> Vec<String> {
            times
                .iter()
                .map(|t| tz.timestamp_millis_opt(*t).unwrap().to_rfc3339())
                .collect()
        };
        assert_eq!(
            as_local(&earlier_times),
            [
                "2018-11-05T00:00:00-02:00",
                "2018-11-06T00:00:00-02:00",
                "2018-11-07T00:00:00-02:00"
            ]
        );
        let overlap: Vec<i64> = earlier_times
            .into_iter()
            .filter(|t| later.contains_millis(*t))
            .collect();
        assert_eq!(overlap, later_times);
        Ok(())
    }

    #[test]
    fn t_empty_window() -> Result<()> {
        let tz = parse_timezone("UTC")?;
        let t = utc_millis(2024, 5, 1, 3, 0);
        let window = TimeWindow::from_millis(t, t)?;
        assert!(series_timestamps(&window, &"1hour".parse()?, &tz).is_empty());
        Ok(())
    }

    #[test]
    fn t_values_non_negative_and_rounded() -> Result<()> {
        let tz = parse_timezone("UTC")?;
        let window = TimeWindow::from_millis(
            utc_millis(2024, 5, 1, 0, 0),
            utc_millis(2024, 5, 8, 0, 0),
        )?;
        let params = GeneratorParams::new(0.5, 3.)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let series = synthesize(&params, &window, &"1hour".parse()?, &tz, &mut rng)?;
        assert_eq!(series.len(), 7 * 24);
        for p in series.points() {
            assert!(p.value >= 0.);
            assert!(p.value.is_sign_positive());
            assert_eq!(p.value, p.value.round());
            assert!(window.contains_millis(p.time));
        }
        assert!(series.times().zip(series.times().skip(1)).all(|(a, b)| a < b));
        Ok(())
    }

    #[test]
    fn t_zero_std_is_constant() -> Result<()> {
        let tz = parse_timezone("UTC")?;
        let window = TimeWindow::from_millis(0, 10 * HOUR)?;
        let params = GeneratorParams::new(12.5, 0.)?;
        let series = synthesize(
            &params,
            &window,
            &"1hour".parse()?,
            &tz,
            &mut Xoshiro256PlusPlus::seed_from_u64(7),
        )?;
        assert_eq!(series.len(), 10);
        // half away from zero
        assert!(series.points().iter().all(|p| p.value == 13.));
        Ok(())
    }

    #[test]
    fn t_leaf_rng_seeded() {
        let a = LeafPath::metric_prefix("d", "m").child("us");
        let b = LeafPath::metric_prefix("d", "m").child("eu");
        let draw = |seed, path: &LeafPath| -> Vec<u64> {
            let mut rng = leaf_rng(seed, path);
            (0..4).map(|_| rng.gen()).collect()
        };
        assert_eq!(draw(Some(3), &a), draw(Some(3), &a));
        assert_ne!(draw(Some(3), &a), draw(Some(3), &b));
        assert_ne!(draw(Some(3), &a), draw(Some(4), &a));
    }
}
