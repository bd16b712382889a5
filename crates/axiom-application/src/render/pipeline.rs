//! Turns a solved response into an ordered list of display blocks.

use axiom_core::schema::{CalculationRecord, MathDomain, MathResponse};
use once_cell::sync::Lazy;
use regex::Regex;

use super::typeset::{DisplayMode, Typeset, Typesetter, typeset_or_fallback};

/// `$$...$$` is tried before `$...$` so display math is never split in two.
static INLINE_MATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\$\$(.+?)\$\$|\$([^$]+)\$").expect("invalid inline math regex")
});

/// A piece of prose with inline math segments resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Plain(String),
    Math(Typeset),
}

/// Prose that may contain inline formulas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub segments: Vec<TextSegment>,
}

impl RichText {
    /// Flattens the segments into one displayable string.
    pub fn to_plain_string(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                TextSegment::Plain(text) => text.as_str(),
                TextSegment::Math(typeset) => typeset.text(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStep {
    /// 1-based position in the derivation.
    pub index: usize,
    pub title: String,
    pub explanation: RichText,
    pub formula: Option<Typeset>,
}

/// One visual block, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    /// The problem as the user typed it.
    Query(String),
    DomainBadge { label: String, domain: MathDomain },
    Assumptions(Vec<RichText>),
    Steps(Vec<RenderedStep>),
    AlternativeMethods(Vec<RichText>),
    FinalAnswer { plain: String, typeset: Typeset },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub blocks: Vec<RenderBlock>,
}

impl RenderedView {
    pub fn final_answer(&self) -> Option<(&str, &Typeset)> {
        self.blocks.iter().find_map(|block| match block {
            RenderBlock::FinalAnswer { plain, typeset } => Some((plain.as_str(), typeset)),
            _ => None,
        })
    }

    pub fn steps(&self) -> &[RenderedStep] {
        self.blocks
            .iter()
            .find_map(|block| match block {
                RenderBlock::Steps(steps) => Some(steps.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Lays out a response: badge, assumptions, steps, alternatives, answer.
pub fn render_response(response: &MathResponse, typesetter: &dyn Typesetter) -> RenderedView {
    let mut blocks = Vec::with_capacity(5);

    blocks.push(RenderBlock::DomainBadge {
        label: response.domain.trim().to_string(),
        domain: MathDomain::classify(&response.domain),
    });

    if let Some(assumptions) = non_empty(&response.assumptions) {
        blocks.push(RenderBlock::Assumptions(
            assumptions
                .iter()
                .map(|item| render_rich_text(item, typesetter))
                .collect(),
        ));
    }

    let steps = response
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| RenderedStep {
            index: i + 1,
            title: step.title.clone(),
            explanation: render_rich_text(&step.explanation, typesetter),
            formula: step
                .formula
                .as_deref()
                .filter(|formula| !formula.trim().is_empty())
                .map(|formula| typeset_or_fallback(typesetter, formula, DisplayMode::Block)),
        })
        .collect();
    blocks.push(RenderBlock::Steps(steps));

    if let Some(methods) = non_empty(&response.alternative_methods) {
        blocks.push(RenderBlock::AlternativeMethods(
            methods
                .iter()
                .map(|item| render_rich_text(item, typesetter))
                .collect(),
        ));
    }

    blocks.push(RenderBlock::FinalAnswer {
        plain: response.final_answer.clone(),
        typeset: typeset_or_fallback(typesetter, &response.latex_answer, DisplayMode::Block),
    });

    RenderedView { blocks }
}

/// Same as [`render_response`], headed by the submitted problem text.
pub fn render_record(record: &CalculationRecord, typesetter: &dyn Typesetter) -> RenderedView {
    let mut view = render_response(&record.response, typesetter);
    view.blocks.insert(0, RenderBlock::Query(record.problem.clone()));
    view
}

/// Splits prose on `$$...$$` and `$...$` and typesets each math segment inline.
pub fn render_rich_text(text: &str, typesetter: &dyn Typesetter) -> RichText {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in INLINE_MATH.captures_iter(text) {
        let formula = captures.get(1).or_else(|| captures.get(2));
        let (Some(whole), Some(formula)) = (captures.get(0), formula) else {
            continue;
        };
        if whole.start() > cursor {
            segments.push(TextSegment::Plain(text[cursor..whole.start()].to_string()));
        }
        let typeset = match typeset_or_fallback(typesetter, formula.as_str(), DisplayMode::Inline)
        {
            Typeset::Fallback(_) => Typeset::Fallback(whole.as_str().to_string()),
            rendered => rendered,
        };
        segments.push(TextSegment::Math(typeset));
        cursor = whole.end();
    }

    if cursor < text.len() {
        segments.push(TextSegment::Plain(text[cursor..].to_string()));
    }

    RichText { segments }
}

fn non_empty(items: &Option<Vec<String>>) -> Option<&[String]> {
    items
        .as_deref()
        .filter(|items| items.iter().any(|item| !item.trim().is_empty()))
}
