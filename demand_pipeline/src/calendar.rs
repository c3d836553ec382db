//! Bank holidays and school vacations per state, and the `datecode` feature
//! derived from them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use demand_ingestor::{
    models::calendar::HolidayEntry,
    providers::{HolidaySource, VacationSource},
    requests::retry::RetryPolicy,
};
use tracing::info;

use crate::error::PipelineError;

/// Regional holidays that only count when the provider attaches no note.
///
/// The provider notes the years or areas in which these are not observed, e.g.
/// Reformationstag was a bank holiday in BW only in 2017.
pub const REGIONAL_EXCEPTIONS: [(&str, &[&str]); 2] = [
    ("BW", &["Gründonnerstag", "Reformationstag"]),
    ("BY", &["Augsburger Friedensfest", "Buß und Bettag"]),
];

/// Whether `entry` counts as a bank holiday in `state`.
pub fn keep_holiday(state: &str, entry: &HolidayEntry) -> bool {
    let listed = REGIONAL_EXCEPTIONS
        .iter()
        .find(|(s, _)| *s == state)
        .is_some_and(|(_, names)| names.contains(&entry.name.as_str()));
    !listed || entry.note.is_empty()
}

/// Holiday and vacation days of one state, and the years they cover.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateCalendar {
    pub holidays: BTreeSet<NaiveDate>,
    pub vacations: BTreeSet<NaiveDate>,
    years: BTreeSet<i32>,
}

impl StateCalendar {
    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    /// 0 none, 1 holiday, 2 vacation, 3 day before a holiday, 4 two days
    /// before a holiday.
    ///
    /// Codes are assigned in the order 4, 3, 2, 1 and a later match replaces an
    /// earlier one.
    pub fn datecode(&self, date: NaiveDate) -> u8 {
        let holiday_after = |n| {
            date.checked_add_days(Days::new(n))
                .is_some_and(|d| self.holidays.contains(&d))
        };
        let mut code = 0;
        if holiday_after(2) {
            code = 4;
        }
        if holiday_after(1) {
            code = 3;
        }
        if self.vacations.contains(&date) {
            code = 2;
        }
        if self.holidays.contains(&date) {
            code = 1;
        }
        code
    }
}

/// Extend-only calendar cache keyed by state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CalendarCache {
    states: BTreeMap<String, StateCalendar>,
}

impl CalendarCache {
    pub fn state(&self, state: &str) -> Option<&StateCalendar> {
        self.states.get(state)
    }

    /// Years in `needed` that `state` has not been fetched for.
    pub fn missing_years(&self, state: &str, needed: &BTreeSet<i32>) -> Vec<i32> {
        match self.states.get(state) {
            Some(cal) => needed.difference(&cal.years).copied().collect(),
            None => needed.iter().copied().collect(),
        }
    }
}

/// Fills a [`CalendarCache`] from the holiday and vacation providers.
pub struct CalendarService<'a> {
    holidays: &'a dyn HolidaySource,
    vacations: &'a dyn VacationSource,
    retry: RetryPolicy,
}

impl<'a> CalendarService<'a> {
    pub fn new(holidays: &'a dyn HolidaySource, vacations: &'a dyn VacationSource) -> Self {
        Self {
            holidays,
            vacations,
            retry: RetryPolicy::ONCE,
        }
    }

    /// Fetches every (state, year) in `states` × `years` the cache lacks.
    ///
    /// Returns the number of (state, year) pairs fetched; zero when the cache
    /// already covers the request. Nothing is ever removed from the cache.
    pub async fn extend(
        &self,
        cache: &mut CalendarCache,
        states: &BTreeSet<String>,
        years: &BTreeSet<i32>,
    ) -> Result<usize, PipelineError> {
        let mut fetched = 0;
        for state in states {
            for year in cache.missing_years(state, years) {
                info!(%state, year, "updating vacations and bank holidays");
                let holidays = self
                    .retry
                    .run("bank holidays", move || self.holidays.bank_holidays(state, year))
                    .await?;
                let vacations = self
                    .retry
                    .run("school vacations", move || {
                        self.vacations.school_vacations(state, year)
                    })
                    .await?;

                let entry = cache.states.entry(state.clone()).or_default();
                entry.holidays.extend(
                    holidays
                        .iter()
                        .filter(|h| keep_holiday(state, h))
                        .map(|h| h.date),
                );
                entry
                    .vacations
                    .extend(vacations.iter().flat_map(|range| range.days()));
                entry.years.insert(year);
                fetched += 1;
            }
        }
        Ok(fetched)
    }
}
