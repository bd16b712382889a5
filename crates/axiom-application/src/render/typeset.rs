//! Typesetting capability.
//!
//! The render pipeline never talks to a concrete engine; it goes through
//! [`Typesetter`] and always ends up with something displayable.

use thiserror::Error;

/// Layout requested for a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Flows with surrounding text.
    Inline,
    /// Stands on its own line(s).
    Block,
}

/// Why an engine rejected a formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesetError {
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("missing argument for {0}")]
    MissingArgument(String),
    #[error("'{0}' without an operand")]
    DanglingScript(char),
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("\\end{{{found}}} does not close \\begin{{{expected}}}")]
    MismatchedEnvironment { expected: String, found: String },
    #[error("\\begin{{{0}}} is never closed")]
    UnclosedEnvironment(String),
    #[error("\\left and \\right do not pair up")]
    UnmatchedDelimiter,
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("typesetting engine unavailable")]
    Unavailable,
}

/// A formula-to-visual-notation engine.
pub trait Typesetter: Send + Sync {
    fn typeset(&self, formula: &str, mode: DisplayMode) -> Result<String, TypesetError>;
}

/// Result of typesetting one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Typeset {
    /// The engine's output.
    Rendered(String),
    /// The raw formula, shown as plain text because the engine rejected it.
    Fallback(String),
}

impl Typeset {
    pub fn text(&self) -> &str {
        match self {
            Typeset::Rendered(text) | Typeset::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Typeset::Fallback(_))
    }
}

/// Typesets `formula`, falling back to the raw string on any engine failure.
///
/// A panicking engine is treated like a rejecting one.
pub fn typeset_or_fallback(
    typesetter: &dyn Typesetter,
    formula: &str,
    mode: DisplayMode,
) -> Typeset {
    let attempt = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        typesetter.typeset(formula, mode)
    }));

    match attempt {
        Ok(Ok(rendered)) => Typeset::Rendered(rendered),
        Ok(Err(err)) => {
            tracing::debug!(%formula, error = %err, "typesetting failed, showing raw formula");
            Typeset::Fallback(formula.to_string())
        }
        Err(_) => {
            tracing::warn!(%formula, "typesetting engine panicked, showing raw formula");
            Typeset::Fallback(formula.to_string())
        }
    }
}

/// Engine that shows formulas verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTypesetter;

impl Typesetter for PlainTypesetter {
    fn typeset(&self, formula: &str, _mode: DisplayMode) -> Result<String, TypesetError> {
        Ok(formula.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingTypesetter;

    impl Typesetter for RejectingTypesetter {
        fn typeset(&self, _formula: &str, _mode: DisplayMode) -> Result<String, TypesetError> {
            Err(TypesetError::Unavailable)
        }
    }

    struct PanickingTypesetter;

    impl Typesetter for PanickingTypesetter {
        fn typeset(&self, _formula: &str, _mode: DisplayMode) -> Result<String, TypesetError> {
            panic!("engine crashed")
        }
    }

    #[test]
    fn test_rejection_falls_back_to_raw_text() {
        let result = typeset_or_fallback(&RejectingTypesetter, "\\frac{1}{2", DisplayMode::Block);
        assert_eq!(result, Typeset::Fallback("\\frac{1}{2".to_string()));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_panic_falls_back_to_raw_text() {
        let result = typeset_or_fallback(&PanickingTypesetter, "x^2", DisplayMode::Inline);
        assert_eq!(result.text(), "x^2");
    }

    #[test]
    fn test_plain_typesetter_is_identity() {
        let result = typeset_or_fallback(&PlainTypesetter, "x^2", DisplayMode::Inline);
        assert_eq!(result, Typeset::Rendered("x^2".to_string()));
    }
}
