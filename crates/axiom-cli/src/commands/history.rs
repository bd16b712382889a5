//! `axiom history`: inspect or purge stored calculations without a solver.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use axiom_application::render::{UnicodeTypesetter, render_record};
use axiom_core::schema::CalculationRecord;

use crate::context::AppContext;
use crate::display;

pub const CLEAR_PROMPT: &str = "Purge calculation history? (y/N) ";

pub fn list(context: &AppContext) -> Result<()> {
    let history = context.repository()?.load();
    display::print_history(&history, None);
    Ok(())
}

pub fn show(context: &AppContext, entry: &str) -> Result<()> {
    let history = context.repository()?.load();
    let Some(record) = find_entry(&history, entry) else {
        bail!("No history entry matches '{}'", entry);
    };
    display::print_view(&render_record(record, &UnicodeTypesetter));
    Ok(())
}

pub fn clear(context: &AppContext, yes: bool) -> Result<()> {
    let confirmed = yes || confirm_on_stdin()?;
    if !confirmed {
        display::print_note("History kept.");
        return Ok(());
    }
    context.repository()?.clear()?;
    display::print_note("History cleared.");
    Ok(())
}

fn confirm_on_stdin() -> Result<bool> {
    print!("{CLEAR_PROMPT}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Looks up a record by 1-based list position, full id, or unique id prefix.
pub fn find_entry<'a>(history: &'a [CalculationRecord], key: &str) -> Option<&'a CalculationRecord> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    if let Ok(position) = key.parse::<usize>() {
        return position.checked_sub(1).and_then(|index| history.get(index));
    }

    if let Some(record) = history.iter().find(|record| record.id == key) {
        return Some(record);
    }

    let mut matches = history.iter().filter(|record| record.id.starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Some(record),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::schema::{MathResponse, MathStep};

    fn record(id: &str) -> CalculationRecord {
        CalculationRecord {
            id: id.to_string(),
            timestamp: 0,
            problem: format!("problem {id}"),
            response: MathResponse {
                domain: "Arithmetic".to_string(),
                problem: "p".to_string(),
                assumptions: None,
                steps: vec![MathStep {
                    title: "t".to_string(),
                    explanation: "e".to_string(),
                    formula: None,
                }],
                alternative_methods: None,
                final_answer: "a".to_string(),
                latex_answer: "a".to_string(),
            },
        }
    }

    #[test]
    fn test_find_by_position() {
        let history = vec![record("aaa1"), record("bbb2")];
        assert_eq!(find_entry(&history, "2").map(|r| r.id.as_str()), Some("bbb2"));
        assert!(find_entry(&history, "0").is_none());
        assert!(find_entry(&history, "3").is_none());
    }

    #[test]
    fn test_find_by_id_or_unique_prefix() {
        let history = vec![record("abc-1"), record("abd-2")];
        assert_eq!(find_entry(&history, "abd-2").map(|r| r.id.as_str()), Some("abd-2"));
        assert_eq!(find_entry(&history, "abc").map(|r| r.id.as_str()), Some("abc-1"));
        assert!(find_entry(&history, "ab").is_none(), "ambiguous prefix");
        assert!(find_entry(&history, "zzz").is_none());
        assert!(find_entry(&history, " ").is_none());
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }
}
