//! Time-range resolution from month/year phrases
//!
//! Rules are tried in a fixed priority order and the first one that produces a
//! range wins:
//!
//! 1. `between <month> <year> and <month> <year>` - closed range
//! 2. `after|from|since <month> <year>` - open-ended start
//! 3. `before|until|till <month> <year>` - open-ended end
//! 4. the fallback year next to "after"/"from" with no month - open-ended start on January 1st
//! 5. `of|in|from|during <year>` - the whole year
//!
//! Anything else resolves to no range at all.

use ahash::AHashMap;
use chrono::{Months, NaiveDate};
use regex::{Captures, Regex};

use crate::config::BetweenEndDay;
use crate::error::CompileError;
use crate::types::TimeRange;

const MONTH: &str = "(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec)";
const ORDINAL: &str = r"(?:\d{1,2}(?:st|nd|rd|th)\s+)?";

/// Priority-ordered resolution rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRule {
    Between,
    After,
    Before,
    OpenYearFallback,
    WholeYear,
}

impl TimeRule {
    pub const ORDER: [TimeRule; 5] = [
        TimeRule::Between,
        TimeRule::After,
        TimeRule::Before,
        TimeRule::OpenYearFallback,
        TimeRule::WholeYear,
    ];
}

pub struct TimeRangeResolver {
    between: Regex,
    after: Regex,
    before: Regex,
    whole_year: Regex,
    months: AHashMap<&'static str, u32>,
    end_day: BetweenEndDay,
    open_year_fallback: i32,
}

impl TimeRangeResolver {
    pub fn new(end_day: BetweenEndDay, open_year_fallback: i32) -> Self {
        let between = format!(
            r"\bbetween\s+{o}{m}\s+(\d{{4}})\s+and\s+{o}{m}\s+(\d{{4}})",
            o = ORDINAL,
            m = MONTH
        );
        let after = format!(r"\b(?:after|from|since)\s+{}{}\s+(\d{{4}})", ORDINAL, MONTH);
        let before = format!(r"\b(?:before|until|till)\s+{}{}\s+(\d{{4}})", ORDINAL, MONTH);

        let months: AHashMap<&'static str, u32> = [
            ("jan", 1), ("january", 1),
            ("feb", 2), ("february", 2),
            ("mar", 3), ("march", 3),
            ("apr", 4), ("april", 4),
            ("may", 5),
            ("jun", 6), ("june", 6),
            ("jul", 7), ("july", 7),
            ("aug", 8), ("august", 8),
            ("sep", 9), ("september", 9),
            ("oct", 10), ("october", 10),
            ("nov", 11), ("november", 11),
            ("dec", 12), ("december", 12),
        ]
        .into_iter()
        .collect();

        Self {
            between: Regex::new(&between).expect("Invalid regex pattern"),
            after: Regex::new(&after).expect("Invalid regex pattern"),
            before: Regex::new(&before).expect("Invalid regex pattern"),
            whole_year: Regex::new(r"\b(?:of|in|from|during)\s+(\d{4})\b").expect("Invalid regex pattern"),
            months,
            end_day,
            open_year_fallback,
        }
    }

    /// Resolve a time range, or `None` when no rule applies
    pub fn resolve(&self, text: &str) -> Option<TimeRange> {
        let text_lower = text.to_lowercase();
        TimeRule::ORDER
            .iter()
            .find_map(|rule| self.apply(*rule, &text_lower))
    }

    /// Like [`resolve`](Self::resolve) but reports the miss as an error
    pub fn try_resolve(&self, text: &str) -> Result<TimeRange, CompileError> {
        self.resolve(text)
            .ok_or(CompileError::UnrecognizedPattern { feature: "time_range" })
    }

    /// Apply a single rule to already lower-cased text
    pub fn apply(&self, rule: TimeRule, text_lower: &str) -> Option<TimeRange> {
        match rule {
            TimeRule::Between => {
                let cap = self.between.captures(text_lower)?;
                let start = self.month_start(&cap, 1, 2)?;
                let (year, month) = self.month_year(&cap, 3, 4)?;
                let end = self.between_end(year, month)?;
                Some(TimeRange::closed(start, end))
            }
            TimeRule::After => {
                let cap = self.after.captures(text_lower)?;
                Some(TimeRange::starting(self.month_start(&cap, 1, 2)?))
            }
            TimeRule::Before => {
                let cap = self.before.captures(text_lower)?;
                Some(TimeRange::ending(self.month_start(&cap, 1, 2)?))
            }
            TimeRule::OpenYearFallback => {
                let year = self.open_year_fallback.to_string();
                if text_lower.contains(&year)
                    && (text_lower.contains("after") || text_lower.contains("from"))
                {
                    NaiveDate::from_ymd_opt(self.open_year_fallback, 1, 1).map(TimeRange::starting)
                } else {
                    None
                }
            }
            TimeRule::WholeYear => {
                let year: i32 = self.whole_year.captures(text_lower)?.get(1)?.as_str().parse().ok()?;
                Some(TimeRange::closed(
                    NaiveDate::from_ymd_opt(year, 1, 1)?,
                    NaiveDate::from_ymd_opt(year, 12, 31)?,
                ))
            }
        }
    }

    fn month_year(&self, cap: &Captures<'_>, month_idx: usize, year_idx: usize) -> Option<(i32, u32)> {
        let month = *self.months.get(cap.get(month_idx)?.as_str())?;
        let year = cap.get(year_idx)?.as_str().parse().ok()?;
        Some((year, month))
    }

    fn month_start(&self, cap: &Captures<'_>, month_idx: usize, year_idx: usize) -> Option<NaiveDate> {
        let (year, month) = self.month_year(cap, month_idx, year_idx)?;
        NaiveDate::from_ymd_opt(year, month, 1)
    }

    fn between_end(&self, year: i32, month: u32) -> Option<NaiveDate> {
        match self.end_day {
            BetweenEndDay::ReferencePad => NaiveDate::from_ymd_opt(year, month, 3),
            BetweenEndDay::FirstOfMonth => NaiveDate::from_ymd_opt(year, month, 1),
            BetweenEndDay::LastOfMonth => NaiveDate::from_ymd_opt(year, month, 1)?
                .checked_add_months(Months::new(1))?
                .pred_opt(),
        }
    }
}

impl Default for TimeRangeResolver {
    fn default() -> Self {
        Self::new(BetweenEndDay::default(), 2025)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_between_pads_end_day() {
        let resolver = TimeRangeResolver::default();
        let range = resolver.resolve("between March 2025 and June 2025").unwrap();
        assert_eq!(range, TimeRange::closed(date(2025, 3, 1), date(2025, 6, 3)));
    }

    #[test]
    fn test_between_end_day_policies() {
        let first = TimeRangeResolver::new(BetweenEndDay::FirstOfMonth, 2025);
        let last = TimeRangeResolver::new(BetweenEndDay::LastOfMonth, 2025);
        let text = "most watched between 1st jan 2024 and 3rd feb 2024";

        assert_eq!(first.resolve(text).unwrap().end, Some(date(2024, 2, 1)));
        assert_eq!(last.resolve(text).unwrap().end, Some(date(2024, 2, 29)));
        assert_eq!(last.resolve("between nov 2024 and dec 2024").unwrap().end, Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_after_is_open_ended() {
        let resolver = TimeRangeResolver::default();
        let range = resolver.resolve("movies after Jan 2024").unwrap();
        assert_eq!(range, TimeRange::starting(date(2024, 1, 1)));

        let range = resolver.resolve("watched since September 2023").unwrap();
        assert_eq!(range.start, Some(date(2023, 9, 1)));
    }

    #[test]
    fn test_before_is_open_ended() {
        let resolver = TimeRangeResolver::default();
        let range = resolver.resolve("popular until may 2022").unwrap();
        assert_eq!(range, TimeRange::ending(date(2022, 5, 1)));

        let range = resolver.resolve("popular till dec 2023").unwrap();
        assert_eq!(range, TimeRange::ending(date(2023, 12, 1)));
    }

    #[test]
    fn test_open_year_fallback() {
        let resolver = TimeRangeResolver::default();
        let range = resolver.resolve("most watched after 2025").unwrap();
        assert_eq!(range, TimeRange::starting(date(2025, 1, 1)));

        // Fallback outranks the whole-year rule for the configured year
        let range = resolver.resolve("action movies from 2025").unwrap();
        assert_eq!(range, TimeRange::starting(date(2025, 1, 1)));
    }

    #[test]
    fn test_whole_year() {
        let resolver = TimeRangeResolver::default();
        let range = resolver.resolve("Find most watched movies of 2025").unwrap();
        assert_eq!(range, TimeRange::closed(date(2025, 1, 1), date(2025, 12, 31)));

        let range = resolver.resolve("Show me action movies from 2024").unwrap();
        assert_eq!(range, TimeRange::closed(date(2024, 1, 1), date(2024, 12, 31)));

        let range = resolver.resolve("released during 1999").unwrap();
        assert_eq!(range.start, Some(date(1999, 1, 1)));
    }

    #[test]
    fn test_no_range() {
        let resolver = TimeRangeResolver::default();
        assert!(resolver.resolve("show me comedies").is_none());
        assert!(resolver.resolve("after dinner").is_none());
        assert_eq!(
            resolver.try_resolve("top films"),
            Err(CompileError::UnrecognizedPattern { feature: "time_range" })
        );
    }

    #[test]
    fn test_rule_priority() {
        let resolver = TimeRangeResolver::default();
        let text = "from jan 2020 until feb 2021";
        assert!(resolver.apply(TimeRule::Before, text).is_some());
        assert_eq!(resolver.resolve(text), Some(TimeRange::starting(date(2020, 1, 1))));
    }
}
