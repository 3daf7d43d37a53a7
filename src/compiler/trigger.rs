//! Begin-trigger expressions for interrupt content.

use crate::playlist_store::{TriggerSet, WallclockTrigger};

/// Appends `<value><unit>` when the magnitude is non-zero.
fn push_component(out: &mut String, value: u32, unit: char) {
    if value > 0 {
        out.push_str(&value.to_string());
        out.push(unit);
    }
}

/// ISO-8601 duration `P[nY][nM][nW][nD][T[nH][nM]]`, or `None` when every
/// magnitude is zero.
fn repeat_interval(trigger: &WallclockTrigger) -> Option<String> {
    let mut period = String::from("P");
    push_component(&mut period, trigger.repeat_years, 'Y');
    push_component(&mut period, trigger.repeat_months, 'M');
    push_component(&mut period, trigger.repeat_weeks, 'W');
    push_component(&mut period, trigger.repeat_days, 'D');
    if trigger.repeat_hours > 0 || trigger.repeat_minutes > 0 {
        period.push('T');
        push_component(&mut period, trigger.repeat_hours, 'H');
        push_component(&mut period, trigger.repeat_minutes, 'M');
    }
    (period.len() > 1).then_some(period)
}

fn with_weekday_qualifier(iso_date_time: &str, offset: i8) -> String {
    if offset == 0 {
        return iso_date_time.to_string();
    }
    let sign = if offset > 0 { '+' } else { '-' };
    let qualifier = format!("{}w{}", sign, offset.unsigned_abs());
    match iso_date_time.find('T') {
        Some(pos) => format!(
            "{}{}{}",
            &iso_date_time[..pos],
            qualifier,
            &iso_date_time[pos..]
        ),
        None => format!("{}{}", iso_date_time, qualifier),
    }
}

pub fn compile_wallclock(trigger: &WallclockTrigger) -> String {
    let date_time = with_weekday_qualifier(&trigger.iso_date_time, trigger.weekday_offset);
    let repeat = match trigger.repeat_count {
        count if count < 0 => None,
        0 => Some("R/".to_string()),
        count => Some(format!("R{}/", count)),
    };
    match repeat.zip(repeat_interval(trigger)) {
        Some((prefix, interval)) => format!("wallclock({}{}/{})", prefix, date_time, interval),
        None => format!("wallclock({})", date_time),
    }
}

/// All triggers joined with `;` in the order wallclocks, access keys,
/// touches, notifies.
pub fn compile_trigger(triggers: &TriggerSet) -> String {
    let wallclocks = triggers.wallclocks.iter().map(compile_wallclock);
    let accesskeys = triggers
        .accesskeys
        .iter()
        .map(|t| format!("accesskey({})", t.key));
    let touches = triggers
        .touches
        .iter()
        .map(|t| format!("{}.activateEvent", t.item_id));
    let notifies = triggers
        .notifies
        .iter()
        .map(|t| format!("notify({})", t.token));

    wallclocks
        .chain(accesskeys)
        .chain(touches)
        .chain(notifies)
        .collect::<Vec<_>>()
        .join(";")
}

/// `begin="..." ` ready to splice into an element, or empty.
pub fn compile_begin(triggers: &TriggerSet) -> String {
    let expression = compile_trigger(triggers);
    if expression.is_empty() {
        String::new()
    } else {
        format!("begin=\"{}\" ", expression)
    }
}
