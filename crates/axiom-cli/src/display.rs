//! Terminal output for rendered views, errors and the history list.

use axiom_application::render::{
    RenderBlock, RenderedStep, RenderedView, RichText, TextSegment, Typeset,
};
use axiom_core::schema::{CalculationRecord, MathDomain};
use chrono::{Local, TimeZone};
use colored::{ColoredString, Colorize};

const PREVIEW_CHARS: usize = 48;

pub fn print_view(view: &RenderedView) {
    println!();
    for block in &view.blocks {
        match block {
            RenderBlock::Query(problem) => {
                println!("{}", "ACTIVE QUERY".bright_black().bold());
                println!("{}", problem.bold());
            }
            RenderBlock::DomainBadge { label, domain } => {
                println!("{}", domain_badge(label, *domain));
            }
            RenderBlock::Assumptions(items) => {
                println!();
                println!("{}", "Assumptions".yellow().bold());
                for item in items {
                    println!("  {} {}", "•".yellow(), rich_text(item));
                }
            }
            RenderBlock::Steps(steps) => {
                println!();
                println!("{}", "Step-by-step derivation".bright_blue().bold());
                for step in steps {
                    print_step(step);
                }
            }
            RenderBlock::AlternativeMethods(methods) => {
                println!();
                println!("{}", "Alternative methods".bright_magenta().bold());
                for method in methods {
                    println!("  {} {}", "→".bright_magenta(), rich_text(method));
                }
            }
            RenderBlock::FinalAnswer { plain, typeset } => {
                println!();
                println!("{}", "Final answer".bright_green().bold());
                for line in typeset.text().lines() {
                    println!("  {}", formula(typeset, line).bright_green().bold());
                }
                if plain.trim() != typeset.text().trim() {
                    println!("  {}", plain.green());
                }
            }
        }
    }
    println!();
}

fn print_step(step: &RenderedStep) {
    println!(
        "  {} {}",
        format!("{}.", step.index).bright_blue().bold(),
        step.title.bold()
    );
    println!("     {}", rich_text(&step.explanation));
    if let Some(typeset) = &step.formula {
        for line in typeset.text().lines() {
            println!("       {}", formula(typeset, line).cyan());
        }
    }
}

fn formula(typeset: &Typeset, line: &str) -> ColoredString {
    match typeset {
        Typeset::Rendered(_) => line.normal(),
        // Raw formulas are marked so they read as source, not output.
        Typeset::Fallback(_) => line.italic(),
    }
}

fn rich_text(text: &RichText) -> String {
    text.segments
        .iter()
        .map(|segment| match segment {
            TextSegment::Plain(plain) => plain.normal().to_string(),
            TextSegment::Math(typeset) => typeset.text().cyan().to_string(),
        })
        .collect()
}

fn domain_badge(label: &str, domain: MathDomain) -> ColoredString {
    let badge = format!("[{}]", label.to_uppercase());
    match domain {
        MathDomain::Arithmetic | MathDomain::NumberTheory => badge.bright_white().bold(),
        MathDomain::Algebra | MathDomain::Matrices => badge.bright_cyan().bold(),
        MathDomain::Trigonometry | MathDomain::Geometry => badge.bright_yellow().bold(),
        MathDomain::Calculus => badge.bright_magenta().bold(),
        MathDomain::Probability => badge.bright_green().bold(),
        MathDomain::Other => badge.white().bold(),
    }
}

pub fn print_error(message: &str) {
    println!();
    println!("{}", "Calculation error".red().bold());
    println!("  {}", message.red());
    println!();
}

pub fn print_loading() {
    println!("{}", "Reasoning…".bright_black().italic());
}

pub fn print_history(history: &[CalculationRecord], active_id: Option<&str>) {
    if history.is_empty() {
        println!("{}", "No calculations yet.".bright_black());
        return;
    }
    println!("{}", "Calculation history".bold());
    for (i, record) in history.iter().enumerate() {
        let marker = if active_id == Some(record.id.as_str()) {
            "▶".bright_green()
        } else {
            " ".normal()
        };
        println!(
            "{} {:>3}. {}  {}  {}",
            marker,
            i + 1,
            format_timestamp(record.timestamp).bright_black(),
            format!("[{}]", record.response.domain).bright_cyan(),
            record.preview(PREVIEW_CHARS)
        );
    }
}

pub fn print_note(message: &str) {
    println!("{}", message.bright_black());
}

fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}
