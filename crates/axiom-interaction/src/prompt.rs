//! Fixed system instruction for the reasoning engine.

use axiom_core::schema::MathDomain;

/// Builds the system instruction sent with every solve request.
pub fn system_instruction() -> String {
    let domains = MathDomain::labels().join(", ");
    format!(
        "You are an advanced AI Mathematics Engine called Axiom.\n\
         Your role is to solve any mathematical problem by pure reasoning and logical derivation.\n\
         \n\
         Guidelines:\n\
         1. Identify the domain. Prefer one of: {domains}.\n\
         2. Provide a step-by-step breakdown. Each step has a short title, an explanation, \
         and a formula when one applies.\n\
         3. Use LaTeX notation for all formulas. Inside explanations, wrap inline math in $...$.\n\
         4. Provide clear assumptions (e.g., domain of x, degrees vs radians).\n\
         5. Always include a finalAnswer (plain text) and a latexAnswer (full LaTeX formatting).\n\
         6. If multiple valid solution methods exist, provide them in alternativeMethods.\n\
         \n\
         Return the response strictly in JSON format."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_every_output_field() {
        let instruction = system_instruction();
        for needle in ["finalAnswer", "latexAnswer", "alternativeMethods", "assumptions", "LaTeX"] {
            assert!(instruction.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_instruction_lists_known_domains() {
        let instruction = system_instruction();
        assert!(instruction.contains("Coordinate Geometry"));
        assert!(instruction.contains("Number Theory"));
    }
}
