//! Groups 3-hourly forecast samples into daily summaries.

use chrono::NaiveDate;

use crate::{
    model::{DayForecast, ForecastSample},
    units::round_half_up,
};

/// Number of days shown; a partial sixth day from the raw horizon is dropped.
pub const MAX_DAYS: usize = 5;

/// Buckets samples by calendar date, in first-seen order, and summarizes
/// at most [`MAX_DAYS`] of them.
///
/// The date comes straight from each sample's timestamp; no timezone
/// conversion happens here. Empty input yields an empty result.
pub fn aggregate_daily(samples: &[ForecastSample]) -> Vec<DayForecast> {
    let mut buckets: Vec<(NaiveDate, Vec<&ForecastSample>)> = Vec::new();

    for sample in samples {
        let date = sample.date();
        match buckets.iter_mut().find(|(d, _)| *d == date) {
            Some((_, bucket)) => bucket.push(sample),
            None => {
                if buckets.len() == MAX_DAYS {
                    continue;
                }
                buckets.push((date, vec![sample]));
            }
        }
    }

    buckets
        .into_iter()
        .filter_map(|(date, bucket)| summarize_day(date, &bucket))
        .collect()
}

fn summarize_day(date: NaiveDate, bucket: &[&ForecastSample]) -> Option<DayForecast> {
    // min_by_key keeps the first of equally distant samples, so 09:00 beats 15:00.
    let representative = bucket.iter().min_by_key(|s| s.distance_from_noon())?;

    let (min, max) = bucket.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.temperature), hi.max(s.temperature))
    });

    Some(DayForecast {
        date,
        min_temp: round_half_up(min),
        max_temp: round_half_up(max),
        representative: (*representative).clone(),
        label: date.format("%a").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample(ts: &str, temperature: f64, code: i32) -> ForecastSample {
        ForecastSample {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            temperature,
            condition_code: Some(code),
            condition_text: Some(format!("code {code}")),
        }
    }

    /// Full 3-hourly run starting at midnight of `first_day` (May 2024).
    fn horizon(first_day: u32, days: u32) -> Vec<ForecastSample> {
        let mut out = Vec::new();
        for day in first_day..first_day + days {
            for hour in (0..24).step_by(3) {
                let ts = format!("2024-05-{day:02} {hour:02}:00:00");
                out.push(sample(&ts, f64::from(hour) + f64::from(day), 800));
            }
        }
        out
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[test]
    fn keeps_only_first_five_dates_in_order() {
        let samples = horizon(1, 7);
        let days = aggregate_daily(&samples);

        assert_eq!(days.len(), MAX_DAYS);
        let dates: Vec<u32> = days.iter().map(|d| chrono::Datelike::day(&d.date)).collect();
        assert_eq!(dates, vec![1, 2, 3, 4, 5]);
        assert!(days.iter().all(|d| d.min_temp <= d.max_temp));
    }

    #[test]
    fn partial_first_and_sixth_days() {
        // Typical provider horizon starting mid-afternoon.
        let mut samples: Vec<_> = horizon(1, 6).into_iter().skip(5).collect();
        samples.truncate(40);
        let days = aggregate_daily(&samples);

        assert_eq!(days.len(), 5);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].representative.timestamp.format("%H").to_string(), "15");
    }

    #[test]
    fn min_and_max_are_rounded() {
        let samples = vec![
            sample("2024-05-01 06:00:00", 7.4, 800),
            sample("2024-05-01 12:00:00", 18.5, 801),
            sample("2024-05-01 18:00:00", 12.0, 500),
        ];
        let days = aggregate_daily(&samples);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].min_temp, 7);
        assert_eq!(days[0].max_temp, 19);
        assert_eq!(days[0].representative.condition_code, Some(801));
    }

    #[test]
    fn tie_break_prefers_chronologically_first() {
        let samples = vec![
            sample("2024-05-01 09:00:00", 10.0, 500),
            sample("2024-05-01 15:00:00", 14.0, 800),
        ];
        let days = aggregate_daily(&samples);

        assert_eq!(days[0].representative.condition_code, Some(500));
    }

    #[test]
    fn labels_are_short_weekdays() {
        // 2024-05-01 was a Wednesday.
        let days = aggregate_daily(&[sample("2024-05-01 12:00:00", 10.0, 800)]);
        assert_eq!(days[0].label, "Wed");
    }

    #[test]
    fn non_contiguous_dates_keep_first_seen_order() {
        let samples = vec![
            sample("2024-05-02 12:00:00", 10.0, 800),
            sample("2024-05-01 12:00:00", 11.0, 800),
            sample("2024-05-02 15:00:00", 13.0, 800),
        ];
        let days = aggregate_daily(&samples);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(days[0].max_temp, 13);
    }
}
