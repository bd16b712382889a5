//! LaTeX subset to Unicode text.
//!
//! Covers what step-by-step answers actually use: groups, scripts, fractions,
//! roots, Greek letters, common operators, text runs, `\left`/`\right` and
//! row-based environments. Anything structurally broken is rejected so the
//! caller can show the raw formula instead.

use super::typeset::{DisplayMode, TypesetError, Typesetter};

const ROW_BREAK: char = '\n';

/// Deepest group or command nesting accepted before giving up.
const MAX_NESTING: usize = 256;

/// Converts LaTeX math to terminal-friendly Unicode.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeTypesetter;

impl Typesetter for UnicodeTypesetter {
    fn typeset(&self, formula: &str, mode: DisplayMode) -> Result<String, TypesetError> {
        let body = strip_math_delimiters(formula);
        let tokens = tokenize(body)?;
        let mut parser = Parser::new(tokens);
        let raw = parser.parse_document()?;

        let rows: Vec<String> = raw
            .split(ROW_BREAK)
            .map(collapse_spaces)
            .filter(|row| !row.is_empty())
            .collect();

        let separator = match mode {
            DisplayMode::Block => "\n",
            DisplayMode::Inline => "; ",
        };
        Ok(rows.join(separator))
    }
}

fn strip_math_delimiters(formula: &str) -> &str {
    let trimmed = formula.trim();
    for (open, close) in [("$$", "$$"), ("\\[", "\\]"), ("\\(", "\\)"), ("$", "$")] {
        if trimmed.len() >= open.len() + close.len()
            && trimmed.starts_with(open)
            && trimmed.ends_with(close)
        {
            return trimmed[open.len()..trimmed.len() - close.len()].trim();
        }
    }
    trimmed
}

fn collapse_spaces(row: &str) -> String {
    row.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Command(String),
    Open,
    Close,
    Sup,
    Sub,
    Align,
    Char(char),
}

fn tokenize(input: &str) -> Result<Vec<Token>, TypesetError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => {
                let Some(&next) = chars.peek() else {
                    return Err(TypesetError::TrailingBackslash);
                };
                if next.is_ascii_alphabetic() {
                    let mut name = String::new();
                    while let Some(&letter) = chars.peek() {
                        if !letter.is_ascii_alphabetic() {
                            break;
                        }
                        name.push(letter);
                        chars.next();
                    }
                    Token::Command(name)
                } else {
                    chars.next();
                    Token::Command(next.to_string())
                }
            }
            '{' => Token::Open,
            '}' => Token::Close,
            '^' => Token::Sup,
            '_' => Token::Sub,
            '&' => Token::Align,
            '%' => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                continue;
            }
            other => Token::Char(other),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    environments: Vec<String>,
    open_delimiters: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            environments: Vec::new(),
            open_delimiters: 0,
            depth: 0,
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, TypesetError>,
    ) -> Result<T, TypesetError> {
        if self.depth >= MAX_NESTING {
            return Err(TypesetError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_document(&mut self) -> Result<String, TypesetError> {
        let out = self.parse_sequence(false)?;
        if let Some(env) = self.environments.pop() {
            return Err(TypesetError::UnclosedEnvironment(env));
        }
        if self.open_delimiters > 0 {
            return Err(TypesetError::UnmatchedDelimiter);
        }
        Ok(out)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(Token::Char(c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Parses until end of input, or until the closing brace when `in_group`.
    fn parse_sequence(&mut self, in_group: bool) -> Result<String, TypesetError> {
        self.nested(|parser| parser.parse_sequence_body(in_group))
    }

    fn parse_sequence_body(&mut self, in_group: bool) -> Result<String, TypesetError> {
        let mut out = String::new();
        loop {
            let Some(token) = self.next() else {
                if in_group {
                    return Err(TypesetError::UnbalancedBraces);
                }
                return Ok(out);
            };
            match token {
                Token::Close => {
                    if in_group {
                        return Ok(out);
                    }
                    return Err(TypesetError::UnbalancedBraces);
                }
                Token::Open => out.push_str(&self.parse_sequence(true)?),
                Token::Sup => {
                    let arg = self.parse_argument_for("^")?;
                    out.push_str(&superscript(&arg));
                }
                Token::Sub => {
                    let arg = self.parse_argument_for("_")?;
                    out.push_str(&subscript(&arg));
                }
                Token::Align => out.push_str(self.alignment_separator()),
                Token::Char('$') => {}
                Token::Char('~') => out.push(' '),
                Token::Char('\'') => out.push('′'),
                Token::Char('*') => out.push('·'),
                Token::Char(c) => out.push(c),
                Token::Command(name) => {
                    let rendered = self.render_command(&name)?;
                    out.push_str(&rendered);
                }
            }
        }
    }

    /// Reads one argument: a braced group, a single character or a command.
    fn parse_argument_for(&mut self, owner: &str) -> Result<String, TypesetError> {
        self.skip_spaces();
        match self.next() {
            Some(Token::Open) => self.parse_sequence(true),
            Some(Token::Char(c)) => Ok(match c {
                '\'' => '′'.to_string(),
                other => other.to_string(),
            }),
            Some(Token::Command(name)) => self.render_command(&name),
            Some(Token::Close) | None => Err(self.missing_argument(owner)),
            Some(Token::Sup) | Some(Token::Sub) | Some(Token::Align) => {
                Err(self.missing_argument(owner))
            }
        }
    }

    fn missing_argument(&self, owner: &str) -> TypesetError {
        match owner {
            "^" => TypesetError::DanglingScript('^'),
            "_" => TypesetError::DanglingScript('_'),
            other => TypesetError::MissingArgument(format!("\\{other}")),
        }
    }

    /// Reads `[...]` when present, as used by `\sqrt[n]{x}`.
    fn parse_optional_argument(&mut self) -> Result<Option<String>, TypesetError> {
        self.skip_spaces();
        if self.peek() != Some(&Token::Char('[')) {
            return Ok(None);
        }
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.next() {
                Some(Token::Char(']')) => return Ok(Some(out)),
                Some(Token::Char(c)) => out.push(c),
                Some(Token::Open) => out.push_str(&self.parse_sequence(true)?),
                Some(Token::Command(name)) => out.push_str(&self.render_command(&name)?),
                Some(_) | None => return Err(TypesetError::MissingArgument("\\sqrt".into())),
            }
        }
    }

    /// Reads the raw name inside `{...}` for `\begin`/`\end`.
    fn parse_environment_name(&mut self, owner: &str) -> Result<String, TypesetError> {
        self.skip_spaces();
        if self.next() != Some(Token::Open) {
            return Err(TypesetError::MissingArgument(format!("\\{owner}")));
        }
        let mut name = String::new();
        loop {
            match self.next() {
                Some(Token::Close) => return Ok(name),
                Some(Token::Char(c)) => name.push(c),
                Some(_) => {}
                None => return Err(TypesetError::UnbalancedBraces),
            }
        }
    }

    fn alignment_separator(&self) -> &'static str {
        match self.environments.last().map(String::as_str) {
            Some("align" | "align*" | "aligned" | "alignat" | "eqnarray" | "split" | "gather") => {
                ""
            }
            Some(_) => "  ",
            None => " ",
        }
    }

    fn render_command(&mut self, name: &str) -> Result<String, TypesetError> {
        self.nested(|parser| parser.render_command_body(name))
    }

    fn render_command_body(&mut self, name: &str) -> Result<String, TypesetError> {
        if let Some(symbol) = symbol(name) {
            return Ok(symbol.to_string());
        }
        if FUNCTION_NAMES.contains(&name) {
            return Ok(name.to_string());
        }

        let rendered = match name {
            "\\" | "cr" | "newline" => ROW_BREAK.to_string(),
            "frac" | "dfrac" | "tfrac" | "cfrac" => {
                let numerator = self.parse_argument_for(name)?;
                let denominator = self.parse_argument_for(name)?;
                format!("{}/{}", wrap_compound(&numerator), wrap_compound(&denominator))
            }
            "binom" | "dbinom" | "tbinom" => {
                let n = self.parse_argument_for(name)?;
                let k = self.parse_argument_for(name)?;
                format!("C({n}, {k})")
            }
            "sqrt" => {
                let index = self.parse_optional_argument()?;
                let radicand = self.parse_argument_for(name)?;
                let radicand = if radicand.chars().count() == 1
                    || radicand.chars().all(|c| c.is_ascii_digit())
                {
                    radicand
                } else {
                    format!("({radicand})")
                };
                let sign = match index.as_deref().map(str::trim) {
                    None | Some("2") => "√".to_string(),
                    Some("3") => "∛".to_string(),
                    Some("4") => "∜".to_string(),
                    Some(other) => format!("{}√", superscript(other)),
                };
                format!("{sign}{radicand}")
            }
            "text" | "textrm" | "textit" | "textbf" | "mathrm" | "mathit" | "mathbf"
            | "mathsf" | "mathtt" | "boldsymbol" | "operatorname" | "mbox" => {
                self.parse_argument_for(name)?
            }
            "mathbb" => {
                let arg = self.parse_argument_for(name)?;
                arg.chars().map(double_struck).collect()
            }
            "overline" | "bar" => combine(&self.parse_argument_for(name)?, '\u{0304}'),
            "hat" | "widehat" => combine(&self.parse_argument_for(name)?, '\u{0302}'),
            "tilde" | "widetilde" => combine(&self.parse_argument_for(name)?, '\u{0303}'),
            "dot" => combine(&self.parse_argument_for(name)?, '\u{0307}'),
            "ddot" => combine(&self.parse_argument_for(name)?, '\u{0308}'),
            "vec" | "overrightarrow" => combine(&self.parse_argument_for(name)?, '\u{20D7}'),
            "underline" => combine(&self.parse_argument_for(name)?, '\u{0332}'),
            "left" => {
                self.open_delimiters += 1;
                self.parse_delimiter()?
            }
            "right" => {
                if self.open_delimiters == 0 {
                    return Err(TypesetError::UnmatchedDelimiter);
                }
                self.open_delimiters -= 1;
                self.parse_delimiter()?
            }
            "begin" => {
                let env = self.parse_environment_name(name)?;
                if env == "array" {
                    // Column spec, e.g. {cc|c}.
                    self.skip_spaces();
                    if self.peek() == Some(&Token::Open) {
                        self.pos += 1;
                        self.parse_sequence(true)?;
                    }
                }
                let opening = environment_delimiters(&env).0;
                self.environments.push(env);
                format!("{opening}{ROW_BREAK}")
            }
            "end" => {
                let env = self.parse_environment_name(name)?;
                match self.environments.pop() {
                    Some(open) if open == env => {}
                    Some(open) => {
                        return Err(TypesetError::MismatchedEnvironment {
                            expected: open,
                            found: env,
                        });
                    }
                    None => {
                        return Err(TypesetError::MismatchedEnvironment {
                            expected: String::new(),
                            found: env,
                        });
                    }
                }
                format!("{ROW_BREAK}{}", environment_delimiters(&env).1)
            }
            "displaystyle" | "textstyle" | "scriptstyle" | "limits" | "nolimits" | "big"
            | "Big" | "bigg" | "Bigg" | "bigl" | "bigr" | "Bigl" | "Bigr" | "biggl" | "biggr"
            | "middle" | "nonumber" | "notag" | "!" => String::new(),
            "," | ";" | ":" | " " | "quad" => " ".to_string(),
            "qquad" => "  ".to_string(),
            "{" | "}" | "%" | "$" | "&" | "_" | "#" | "(" | ")" | "[" | "]" => name.to_string(),
            "|" => "‖".to_string(),
            other => format!("\\{other}"),
        };
        Ok(rendered)
    }

    fn parse_delimiter(&mut self) -> Result<String, TypesetError> {
        self.skip_spaces();
        match self.next() {
            Some(Token::Char('.')) => Ok(String::new()),
            Some(Token::Char(c)) => Ok(c.to_string()),
            Some(Token::Command(name)) => Ok(match name.as_str() {
                "{" | "lbrace" => "{".to_string(),
                "}" | "rbrace" => "}".to_string(),
                "langle" => "⟨".to_string(),
                "rangle" => "⟩".to_string(),
                "|" | "Vert" => "‖".to_string(),
                "vert" => "|".to_string(),
                "lfloor" => "⌊".to_string(),
                "rfloor" => "⌋".to_string(),
                "lceil" => "⌈".to_string(),
                "rceil" => "⌉".to_string(),
                _ => return Err(TypesetError::UnmatchedDelimiter),
            }),
            _ => Err(TypesetError::UnmatchedDelimiter),
        }
    }
}

fn environment_delimiters(env: &str) -> (&'static str, &'static str) {
    match env {
        "pmatrix" => ("(", ")"),
        "bmatrix" => ("[", "]"),
        "Bmatrix" => ("{", "}"),
        "vmatrix" => ("|", "|"),
        "Vmatrix" => ("‖", "‖"),
        "cases" => ("{", ""),
        _ => ("", ""),
    }
}

/// Parenthesizes multi-term operands so `a/b` stays unambiguous.
fn wrap_compound(operand: &str) -> String {
    let operand = operand.trim();
    let compound = operand
        .chars()
        .any(|c| c.is_whitespace() || "+-−±∓=·×÷/<>≤≥".contains(c));
    if compound {
        format!("({operand})")
    } else {
        operand.to_string()
    }
}

fn combine(base: &str, mark: char) -> String {
    let mut out = String::new();
    for c in base.chars() {
        out.push(c);
        if !c.is_whitespace() {
            out.push(mark);
        }
    }
    out
}

fn superscript(arg: &str) -> String {
    let arg = arg.trim();
    match arg {
        "∘" | "\\circ" => return "°".to_string(),
        "′" | "′′" | "′′′" => return arg.to_string(),
        _ => {}
    }
    let mapped: Option<String> = arg.chars().map(superscript_char).collect();
    match mapped {
        Some(text) if !text.is_empty() => text,
        _ if arg.chars().count() == 1 => format!("^{arg}"),
        _ => format!("^({arg})"),
    }
}

fn subscript(arg: &str) -> String {
    let arg = arg.trim();
    let mapped: Option<String> = arg.chars().map(subscript_char).collect();
    match mapped {
        Some(text) if !text.is_empty() => text,
        _ if arg.chars().count() == 1 => format!("_{arg}"),
        _ => format!("_({arg})"),
    }
}

fn superscript_char(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' | '−' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        'T' => 'ᵀ',
        ' ' => ' ',
        _ => return None,
    })
}

fn subscript_char(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' | '−' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        'r' => 'ᵣ',
        's' => 'ₛ',
        't' => 'ₜ',
        'u' => 'ᵤ',
        'v' => 'ᵥ',
        'x' => 'ₓ',
        _ => return None,
    })
}

fn double_struck(c: char) -> char {
    match c {
        'R' => 'ℝ',
        'N' => 'ℕ',
        'Z' => 'ℤ',
        'Q' => 'ℚ',
        'C' => 'ℂ',
        'P' => 'ℙ',
        other => other,
    }
}

const FUNCTION_NAMES: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "lg", "exp", "lim", "limsup", "liminf", "max", "min", "sup", "inf",
    "det", "dim", "ker", "deg", "gcd", "arg", "Pr", "mod",
];

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "varpi" => "ϖ",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Upsilon" => "Υ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        "cdot" => "·",
        "times" => "×",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "ast" => "∗",
        "circ" => "∘",
        "bullet" => "•",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "equiv" => "≡",
        "sim" => "∼",
        "simeq" => "≃",
        "cong" => "≅",
        "propto" => "∝",
        "ll" => "≪",
        "gg" => "≫",
        "in" => "∈",
        "notin" => "∉",
        "subset" => "⊂",
        "subseteq" => "⊆",
        "supset" => "⊃",
        "supseteq" => "⊇",
        "cup" => "∪",
        "cap" => "∩",
        "setminus" => "∖",
        "emptyset" | "varnothing" => "∅",
        "forall" => "∀",
        "exists" => "∃",
        "neg" | "lnot" => "¬",
        "land" | "wedge" => "∧",
        "lor" | "vee" => "∨",
        "to" | "rightarrow" => "→",
        "leftarrow" | "gets" => "←",
        "leftrightarrow" => "↔",
        "Rightarrow" | "implies" => "⇒",
        "Leftarrow" => "⇐",
        "Leftrightarrow" | "iff" => "⇔",
        "mapsto" => "↦",
        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "iint" => "∬",
        "iiint" => "∭",
        "oint" => "∮",
        "angle" => "∠",
        "perp" => "⊥",
        "parallel" => "∥",
        "triangle" => "△",
        "degree" => "°",
        "prime" => "′",
        "ldots" | "dots" | "dotsc" => "…",
        "cdots" | "dotsb" => "⋯",
        "vdots" => "⋮",
        "ddots" => "⋱",
        "therefore" => "∴",
        "because" => "∵",
        "hbar" => "ℏ",
        "ell" => "ℓ",
        "Re" => "ℜ",
        "Im" => "ℑ",
        "aleph" => "ℵ",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lfloor" => "⌊",
        "rfloor" => "⌋",
        "lceil" => "⌈",
        "rceil" => "⌉",
        "lbrace" => "{",
        "rbrace" => "}",
        "vert" => "|",
        "Vert" => "‖",
        "mid" => "|",
        "nmid" => "∤",
        "checkmark" => "✓",
        "square" | "Box" => "□",
        _ => return None,
    })
}
