//! Code for working with the hourly time steps of a scenario.
//!
//! A scenario covers `days` whole days starting from a given day of the year. Each hour of the
//! horizon is a [`TimeStep`], numbered from 1.
use crate::units::Dimensionless;
use anyhow::{Result, ensure};
use std::fmt::Display;
use std::ops::{Index, IndexMut, RangeInclusive};
use strum::{EnumIter, IntoEnumIterator};

/// Number of time steps in a day
pub const STEPS_PER_DAY: u32 = 24;

/// Number of hours in a (non-leap) year
pub const HOURS_PER_YEAR: u32 = 8760;

/// Number of days in a (non-leap) year
const DAYS_PER_YEAR: u32 = 365;

/// Horizons up to this many hours are charged a single peak tariff
const SINGLE_BUCKET_MAX_STEPS: u32 = 168;

/// Adjustment applied to the peak tariff when a single bucket covers the horizon.
///
/// The tariff is quoted for three-hour blocks of a monthly peak.
const SINGLE_BUCKET_PRICE_FACTOR: f64 = 0.25;

/// A one-hour time step, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStep(u32);

impl TimeStep {
    /// Create a time step from its 1-based number.
    ///
    /// Panics if `number` is zero.
    pub fn new(number: u32) -> Self {
        assert!(number > 0, "Time steps are numbered from 1");
        Self(number)
    }

    /// The 1-based number of this time step
    pub fn number(self) -> u32 {
        self.0
    }

    /// The 0-based position of this time step in a series
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// The preceding time step, if any
    pub fn previous(self) -> Option<TimeStep> {
        (self.0 > 1).then(|| TimeStep(self.0 - 1))
    }
}

impl Display for TimeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The calendar months of a non-leap year
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, strum::Display)]
#[allow(missing_docs)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// Number of days in the month
    pub fn days(self) -> u32 {
        match self {
            Month::February => 28,
            Month::April | Month::June | Month::September | Month::November => 30,
            _ => 31,
        }
    }

    /// The month containing the given 1-based day of the year, along with the day of the month.
    ///
    /// Days beyond the end of the year wrap into the following year.
    pub fn from_day_of_year(day: u32) -> (Month, u32) {
        let mut day = (day.max(1) - 1) % DAYS_PER_YEAR + 1;
        for month in Month::iter() {
            if day <= month.days() {
                return (month, day);
            }
            day -= month.days();
        }

        unreachable!("Day of year is always within a month")
    }
}

/// A contiguous run of time steps over which a single peak tariff is charged
#[derive(Debug, Clone, PartialEq)]
pub struct PeakBucket {
    /// First time step in the bucket
    pub first: TimeStep,
    /// Last time step in the bucket
    pub last: TimeStep,
    /// Multiplier applied to the peak tariff at `first`
    pub price_factor: Dimensionless,
}

impl PeakBucket {
    /// Iterate over the time steps in the bucket
    pub fn iter(&self) -> impl Iterator<Item = TimeStep> + use<> {
        (self.first.0..=self.last.0).map(TimeStep)
    }

    /// The number of time steps in the bucket
    pub fn len(&self) -> u32 {
        self.last.0 - self.first.0 + 1
    }

    /// Whether the bucket contains the given time step
    pub fn contains(&self, step: TimeStep) -> bool {
        (self.first..=self.last).contains(&step)
    }
}

/// The period covered by a scenario
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    days: u32,
    start_day: u32,
}

impl Horizon {
    /// Create a new horizon of `days` days starting at `start_day` (1-based day of the year)
    pub fn new(days: u32, start_day: u32) -> Result<Self> {
        ensure!(days > 0, "The horizon must cover at least one day");
        ensure!(
            (1..=DAYS_PER_YEAR).contains(&start_day),
            "start_day must be between 1 and {DAYS_PER_YEAR}"
        );

        Ok(Self { days, start_day })
    }

    /// Number of days covered
    pub fn days(&self) -> u32 {
        self.days
    }

    /// The day of the year on which the horizon starts
    pub fn start_day(&self) -> u32 {
        self.start_day
    }

    /// Number of time steps (H)
    pub fn num_steps(&self) -> u32 {
        self.days * STEPS_PER_DAY
    }

    /// The first time step
    pub fn first(&self) -> TimeStep {
        TimeStep(1)
    }

    /// The last time step
    pub fn last(&self) -> TimeStep {
        TimeStep(self.num_steps())
    }

    /// Iterate over all time steps in order
    pub fn iter(&self) -> impl Iterator<Item = TimeStep> + use<> {
        (1..=self.num_steps()).map(TimeStep)
    }

    /// The range of valid step numbers
    pub fn step_numbers(&self) -> RangeInclusive<u32> {
        1..=self.num_steps()
    }

    /// The horizon length as a fraction of a year
    pub fn period(&self) -> Dimensionless {
        Dimensionless(self.num_steps() as f64 / HOURS_PER_YEAR as f64)
    }

    /// Split the horizon into peak-tariff buckets.
    ///
    /// Horizons of up to a week form a single bucket with an adjusted price. Longer horizons are
    /// split at calendar month boundaries, starting from `start_day`.
    pub fn peak_buckets(&self) -> Vec<PeakBucket> {
        let num_steps = self.num_steps();
        if num_steps <= SINGLE_BUCKET_MAX_STEPS {
            return vec![PeakBucket {
                first: self.first(),
                last: self.last(),
                price_factor: Dimensionless(SINGLE_BUCKET_PRICE_FACTOR),
            }];
        }

        let mut buckets = Vec::new();
        let mut first = 1;
        let mut day_of_year = self.start_day;
        while first <= num_steps {
            let (month, day_of_month) = Month::from_day_of_year(day_of_year);
            let days_left_in_month = month.days() - day_of_month + 1;
            let len = (days_left_in_month * STEPS_PER_DAY).min(num_steps - first + 1);
            buckets.push(PeakBucket {
                first: TimeStep(first),
                last: TimeStep(first + len - 1),
                price_factor: Dimensionless(1.0),
            });

            first += len;
            day_of_year += days_left_in_month;
        }

        buckets
    }
}

/// A value for every time step of a horizon
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T>(Vec<T>);

impl<T> TimeSeries<T> {
    /// Wrap a vector of values, the first being for time step 1
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    /// Number of time steps covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The values in time step order
    pub fn values(&self) -> &[T] {
        &self.0
    }

    /// Iterate over time steps and their values
    pub fn iter(&self) -> impl Iterator<Item = (TimeStep, &T)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, value)| (TimeStep(i as u32 + 1), value))
    }

    /// Apply a function to each value
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> TimeSeries<U> {
        TimeSeries(self.0.iter().map(f).collect())
    }
}

impl<T: Copy> TimeSeries<T> {
    /// A series with the same value at every step
    pub fn constant(value: T, len: u32) -> Self {
        Self(vec![value; len as usize])
    }
}

impl<T: Copy + std::iter::Sum> TimeSeries<T> {
    /// Sum of the values over all time steps
    pub fn total(&self) -> T {
        self.0.iter().copied().sum()
    }
}

impl<T> Index<TimeStep> for TimeSeries<T> {
    type Output = T;

    fn index(&self, step: TimeStep) -> &T {
        &self.0[step.index()]
    }
}

impl<T> IndexMut<TimeStep> for TimeSeries<T> {
    fn index_mut(&mut self, step: TimeStep) -> &mut T {
        &mut self.0[step.index()]
    }
}

impl<T> FromIterator<T> for TimeSeries<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Energy;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    #[test]
    fn test_horizon_new_invalid() {
        assert!(Horizon::new(0, 1).is_err());
        assert!(Horizon::new(1, 0).is_err());
        assert!(Horizon::new(1, 366).is_err());
    }

    #[test]
    fn test_horizon_steps() {
        let horizon = Horizon::new(2, 1).unwrap();
        assert_eq!(horizon.num_steps(), 48);
        assert_eq!(horizon.last(), TimeStep::new(48));
        assert_eq!(horizon.iter().count(), 48);
        assert_approx_eq!(Dimensionless, horizon.period(), Dimensionless(48.0 / 8760.0));
    }

    #[test]
    fn test_time_step_previous() {
        assert_eq!(TimeStep::new(1).previous(), None);
        assert_eq!(TimeStep::new(5).previous(), Some(TimeStep::new(4)));
    }

    #[rstest]
    #[case(1, Month::January, 1)]
    #[case(31, Month::January, 31)]
    #[case(32, Month::February, 1)]
    #[case(59, Month::February, 28)]
    #[case(60, Month::March, 1)]
    #[case(365, Month::December, 31)]
    #[case(366, Month::January, 1)]
    fn test_month_from_day_of_year(
        #[case] day: u32,
        #[case] month: Month,
        #[case] day_of_month: u32,
    ) {
        assert_eq!(Month::from_day_of_year(day), (month, day_of_month));
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    fn test_peak_buckets_week_or_less(#[case] days: u32) {
        let horizon = Horizon::new(days, 100).unwrap();
        let buckets = horizon.peak_buckets();
        assert_eq!(
            buckets,
            [PeakBucket {
                first: TimeStep::new(1),
                last: horizon.last(),
                price_factor: Dimensionless(0.25),
            }]
        );
    }

    #[test]
    fn test_peak_buckets_year() {
        let horizon = Horizon::new(365, 1).unwrap();
        let buckets = horizon.peak_buckets();
        let days = buckets.iter().map(|b| b.len() / STEPS_PER_DAY).collect_vec();
        assert_eq!(days, [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]);
        assert!(buckets.iter().all(|b| b.price_factor == Dimensionless(1.0)));
        assert_eq!(buckets.last().unwrap().last, horizon.last());
    }

    #[test]
    fn test_peak_buckets_start_day_offset() {
        // 20 days from 20 January: 12 days of January then 8 of February
        let horizon = Horizon::new(20, 20).unwrap();
        let buckets = horizon.peak_buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].first, TimeStep::new(1));
        assert_eq!(buckets[0].last, TimeStep::new(12 * 24));
        assert_eq!(buckets[1].first, TimeStep::new(12 * 24 + 1));
        assert_eq!(buckets[1].last, horizon.last());
    }

    #[test]
    fn test_peak_buckets_wrap_year() {
        // 40 days from 1 December: 31 days of December then 9 of January
        let horizon = Horizon::new(40, 335).unwrap();
        let days = horizon
            .peak_buckets()
            .iter()
            .map(|b| b.len() / STEPS_PER_DAY)
            .collect_vec();
        assert_eq!(days, [31, 9]);
    }

    #[test]
    fn test_peak_buckets_cover_horizon() {
        let horizon = Horizon::new(100, 45).unwrap();
        let buckets = horizon.peak_buckets();
        for step in horizon.iter() {
            assert_eq!(buckets.iter().filter(|b| b.contains(step)).count(), 1);
        }
    }

    #[test]
    fn test_time_series() {
        let series = TimeSeries::new(vec![Energy(1.0), Energy(2.0), Energy(3.0)]);
        assert_eq!(series[TimeStep::new(2)], Energy(2.0));
        assert_eq!(series.total(), Energy(6.0));
        assert_eq!(series.iter().last(), Some((TimeStep::new(3), &Energy(3.0))));
    }
}
