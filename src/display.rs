use std::fmt::Write;

use chrono::{Local, TimeZone, Utc};

use crate::roster::{Player, Roster};
use crate::rotation::{History, LINE_SIZE};
use crate::state::Session;

/// How many past points the history listing shows
pub const RECENT_POINTS: usize = 12;

/// Formats a player as `name [MM] handler either`
pub fn format_player(player: &Player) -> String {
    format!(
        "{} [{}] {} {}",
        player.name,
        player.gender.label(),
        player.position.as_str(),
        player.pref.as_str()
    )
}

/// Local wall-clock time of an epoch-millisecond timestamp
pub fn format_timestamp(timestamp: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp).single() {
        Some(t) => t.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

pub fn render_roster(roster: &Roster) -> String {
    if roster.is_empty() {
        return "No players yet.\n".to_string();
    }
    let mut out = String::new();
    for p in roster.sorted_by_name() {
        let flag = if p.available { "" } else { "  (unavailable)" };
        let _ = writeln!(
            out,
            "{:<8} {}  Pts: {}{}",
            p.id.as_str(),
            format_player(p),
            p.points_played,
            flag
        );
    }
    out
}

/// The line being built, with a warning when it is short
pub fn render_line(session: &Session) -> String {
    let players = session.line_players();
    if players.is_empty() {
        return "No line yet.\n".to_string();
    }

    let summary = session.line_summary();
    let mut out = String::new();
    let _ = write!(
        out,
        "Total {}/{} • {}MM-{}WM",
        summary.size, LINE_SIZE, summary.men, summary.women
    );
    if let Some(target) = summary.target {
        let _ = write!(out, " • Target {}", target);
    }
    out.push('\n');
    if summary.short {
        let _ = writeln!(out, "Warning: only {} players on the line", summary.size);
    }
    for (slot, p) in players.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<8} {}  Pts: {}",
            slot + 1,
            p.id.as_str(),
            format_player(p),
            p.points_played
        );
    }
    out
}

/// Most recent points first. Players deleted since are shown as `—`.
pub fn render_history(history: &History, roster: &Roster) -> String {
    if history.is_empty() {
        return "No points recorded yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in history.recent(RECENT_POINTS) {
        let names: Vec<&str> = entry
            .line
            .iter()
            .map(|id| roster.get(id).map_or("—", |p| p.name.as_str()))
            .collect();
        let _ = writeln!(
            out,
            "{} • {} • {}\n    {}",
            format_timestamp(entry.timestamp),
            entry.context,
            entry.ratio,
            names.join(", ")
        );
    }
    out
}
