//! Play-window guards.
//!
//! A [`ConditionalWindow`] compiles to an `expr` attribute evaluated by the
//! player runtime. Comparisons go through `adapi-compare`, which returns a
//! negative, zero or positive number like `strcmp`. The `>` and `<` are
//! emitted pre-escaped since the expression lands inside an attribute.

use crate::playlist_store::{ConditionalWindow, WeekTime};
use chrono::{NaiveDate, NaiveTime};

const DATE_ACCESSOR: &str = "substring-before(adapi-date(), 'T')";
const TIME_ACCESSOR: &str = "substring-after(adapi-date(), 'T')";
const END_OF_DAY: &str = "23:59:59";

/// Quarter hours in a day.
const TICKS_PER_DAY: u16 = 96;
const SECONDS_PER_TICK: u32 = 900;

const EVERY_DAY: u8 = 0b111_1111;

fn lower_bound(accessor: &str, literal: &str) -> String {
    format!("adapi-compare({}, '{}')&gt;=0", accessor, literal)
}

fn upper_bound(accessor: &str, literal: &str) -> String {
    format!("adapi-compare({}, '{}')&lt;=0", accessor, literal)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Midnight as an upper bound means the end of that day.
fn format_until(time: NaiveTime) -> String {
    if time == NaiveTime::MIN {
        END_OF_DAY.to_string()
    } else {
        format_time(time)
    }
}

fn format_ticks(ticks: u16) -> String {
    let seconds = ticks as u32 * SECONDS_PER_TICK;
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn format_from_ticks(ticks: u16) -> String {
    if ticks >= TICKS_PER_DAY {
        END_OF_DAY.to_string()
    } else {
        format_ticks(ticks)
    }
}

fn format_until_ticks(ticks: u16) -> String {
    if ticks == 0 || ticks >= TICKS_PER_DAY {
        END_OF_DAY.to_string()
    } else {
        format_ticks(ticks)
    }
}

/// `adapi-weekday()` counts from Sunday = 0, the mask from Monday = bit 1.
fn weekday_index(bit: u8) -> Option<u8> {
    if bit == 0 || !bit.is_power_of_two() || bit > 64 {
        return None;
    }
    Some(((bit.trailing_zeros() + 1) % 7) as u8)
}

fn weektime_disjunct(index: u8, window: &WeekTime) -> String {
    format!(
        "(adapi-weekday()={} and {} and {})",
        index,
        lower_bound(TIME_ACCESSOR, &format_from_ticks(window.from)),
        upper_bound(TIME_ACCESSOR, &format_until_ticks(window.until))
    )
}

fn weekday_group(window: &ConditionalWindow) -> Option<String> {
    let disjuncts: Vec<String> = if !window.weektimes.is_empty() {
        window
            .weektimes
            .iter()
            .filter_map(|(bit, times)| {
                weekday_index(*bit).map(|index| weektime_disjunct(index, times))
            })
            .collect()
    } else if window.weekdays != 0 && window.weekdays & EVERY_DAY != EVERY_DAY {
        (0..7)
            .map(|shift| 1u8 << shift)
            .filter(|bit| window.weekdays & bit != 0)
            .filter_map(weekday_index)
            .map(|index| format!("adapi-weekday()={}", index))
            .collect()
    } else {
        Vec::new()
    };

    if disjuncts.is_empty() {
        None
    } else {
        Some(format!("({})", disjuncts.join(" or ")))
    }
}

/// The bare guard expression, empty for an always-active window.
pub fn compile_expression(window: &ConditionalWindow) -> String {
    let mut clauses = Vec::new();
    if let Some(date) = window.date_from {
        clauses.push(lower_bound(DATE_ACCESSOR, &format_date(date)));
    }
    if let Some(date) = window.date_until {
        clauses.push(upper_bound(DATE_ACCESSOR, &format_date(date)));
    }
    if let Some(time) = window.time_from {
        clauses.push(lower_bound(TIME_ACCESSOR, &format_time(time)));
    }
    if let Some(time) = window.time_until {
        clauses.push(upper_bound(TIME_ACCESSOR, &format_until(time)));
    }
    // The weekday group sits directly after the chain, with no connective.
    let chain = clauses.join(" and ");
    match weekday_group(window) {
        Some(group) => format!("{}{}", chain, group),
        None => chain,
    }
}

/// `expr="..." ` ready to splice into an element, or empty.
pub fn compile_conditional(window: &ConditionalWindow) -> String {
    let expression = compile_expression(window);
    if expression.is_empty() {
        String::new()
    } else {
        format!("expr=\"{}\" ", expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn default_window_compiles_to_nothing() {
        assert_eq!(compile_conditional(&ConditionalWindow::default()), "");
        let every_day = ConditionalWindow {
            weekdays: 127,
            ..Default::default()
        };
        assert_eq!(compile_conditional(&every_day), "");
    }

    #[test]
    fn date_range_compiles_to_two_clauses() {
        let window = ConditionalWindow {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 1),
            date_until: NaiveDate::from_ymd_opt(2024, 3, 31),
            ..Default::default()
        };
        assert_eq!(
            compile_conditional(&window),
            "expr=\"adapi-compare(substring-before(adapi-date(), 'T'), '2024-03-01')&gt;=0 and \
             adapi-compare(substring-before(adapi-date(), 'T'), '2024-03-31')&lt;=0\" "
        );
    }

    #[test]
    fn midnight_until_means_end_of_day() {
        let window = ConditionalWindow {
            time_from: Some(time(8, 30, 0)),
            time_until: Some(time(0, 0, 0)),
            ..Default::default()
        };
        let expr = compile_expression(&window);
        assert_eq!(
            expr,
            "adapi-compare(substring-after(adapi-date(), 'T'), '08:30:00')&gt;=0 and \
             adapi-compare(substring-after(adapi-date(), 'T'), '23:59:59')&lt;=0"
        );
    }

    #[test]
    fn weektimes_build_an_or_group_in_bit_order() {
        let mut window = ConditionalWindow::default();
        // Sunday 10:00 - 12:00 and Monday 08:00 - end of day
        window.weektimes.insert(64, WeekTime { from: 40, until: 48 });
        window.weektimes.insert(1, WeekTime { from: 32, until: 0 });
        let expr = compile_expression(&window);
        assert_eq!(
            expr,
            "((adapi-weekday()=1 and \
             adapi-compare(substring-after(adapi-date(), 'T'), '08:00:00')&gt;=0 and \
             adapi-compare(substring-after(adapi-date(), 'T'), '23:59:59')&lt;=0) or \
             (adapi-weekday()=0 and \
             adapi-compare(substring-after(adapi-date(), 'T'), '10:00:00')&gt;=0 and \
             adapi-compare(substring-after(adapi-date(), 'T'), '12:00:00')&lt;=0))"
        );
    }

    #[test]
    fn weekday_group_is_concatenated_after_the_and_chain() {
        let mut window = ConditionalWindow {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        window.weektimes.insert(4, WeekTime { from: 0, until: 96 });
        let expr = compile_expression(&window);
        assert!(expr.starts_with(
            "adapi-compare(substring-before(adapi-date(), 'T'), '2025-01-01')&gt;=0((adapi-weekday()=3 and "
        ));
        assert!(expr.contains("'00:00:00')&gt;=0"));
        assert!(expr.ends_with("'23:59:59')&lt;=0))"));
    }

    #[test]
    fn partial_weekday_mask_without_times() {
        // Monday, Wednesday, Saturday
        let window = ConditionalWindow {
            weekdays: 1 | 4 | 32,
            ..Default::default()
        };
        assert_eq!(
            compile_expression(&window),
            "(adapi-weekday()=1 or adapi-weekday()=3 or adapi-weekday()=6)"
        );
    }

    #[test]
    fn invalid_weektime_keys_are_skipped() {
        let mut window = ConditionalWindow::default();
        window.weektimes.insert(3, WeekTime { from: 1, until: 2 });
        assert_eq!(compile_conditional(&window), "");
    }

    #[test]
    fn ticks_render_as_clock_time() {
        assert_eq!(format_ticks(0), "00:00:00");
        assert_eq!(format_ticks(1), "00:15:00");
        assert_eq!(format_ticks(95), "23:45:00");
        assert_eq!(format_until_ticks(0), "23:59:59");
        assert_eq!(format_until_ticks(96), "23:59:59");
    }
}
