//! The analysis prompt sent to the generation model.

/// Fill the fixed analysis template with the user's idea and the retrieved records.
pub fn render_prompt(idea: &str, records: &str) -> String {
    format!(
        "You are a professional startup intelligence assistant.
User Idea: {idea}
Retrieved Data: {records}

Provide a concise analysis:
1. Survival Patterns
2. Growth Signals
3. Target Users
4. Strategic Risks

Tone: Analytical, high-tech, like a VC dashboard.
"
    )
}
