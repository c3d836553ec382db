use chrono::NaiveDate;

/// A bank holiday as reported by the holiday provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayEntry {
    pub name: String,
    pub date: NaiveDate,
    /// Informational note; empty when the provider has nothing to add.
    pub note: String,
}

/// An inclusive school vacation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VacationRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl VacationRange {
    /// Every day in the range, both ends included. Empty if `end < start`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
    }
}
