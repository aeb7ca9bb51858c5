//! Compact one-line session descriptions for the feed, e.g.
//! `Basketball @ IM Basketball Courts | Today 7 PM-9 PM (cap 10)`.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use super::session::Session;

pub fn make_title(session: &Session, now: NaiveDateTime) -> String {
    let sport = session
        .custom_sport
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(&session.sport);

    let start = session.starts_at;
    let end = session.ends_at;

    let mut time_str = if start.date() == now.date() {
        format!("Today {}", clock(start.time()))
    } else {
        format!("{} {}", start.format("%b %-d"), clock(start.time()))
    };
    // Only worth showing the end time for longer sessions.
    if end - start > Duration::hours(1) {
        time_str.push('-');
        time_str.push_str(&clock(end.time()));
    }

    let mut parts = vec![sport.to_string()];
    if let Some(address) = session.address.as_deref().filter(|a| !a.is_empty()) {
        parts.push(format!("@ {address}"));
    }
    parts.push(format!("| {time_str}"));
    if let Some(positions) = session.positions.as_ref().filter(|p| !p.is_empty()) {
        parts.push(format!("• Need {}", positions.join(", ")));
    }
    if session.equipment_needed {
        parts.push("• Bring equipment".to_string());
    }
    parts.push(format!("(cap {})", session.capacity));

    parts.join(" ")
}

fn clock(time: NaiveTime) -> String {
    if time.minute() > 0 {
        time.format("%-I:%M %p").to_string()
    } else {
        time.format("%-I %p").to_string()
    }
}
