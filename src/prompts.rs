//! Prompts for 16×16 pixel-art generation.
//!
//! Callers can override the system prompt via
//! [`crate::config::GenerationConfig::system_prompt`]; the constant here is
//! used only when no override is provided. Whatever the prompt says, the
//! extraction pipeline assumes nothing about the answer's shape.

/// Default system prompt asking for a bare JSON array of pixels.
pub const DEFAULT_SYSTEM_PROMPT: &str = r##"You are a professional pixel artist generating 16x16 pixel art from a short description.

1. COMPOSITION
   - Draw the subject on a 16x16 grid so that it fits entirely inside the canvas
   - Center the subject and keep it proportional
   - Use as much of the canvas as possible
   - Start with a clear outline, then add interior detail

2. COORDINATES
   - 0-based: row 0-15 (top to bottom), column 0-15 (left to right)
   - The background is white (#FFFFFF) and must NOT be included

3. COLOR
   - Use realistic, subject-appropriate colors in #RRGGBB form
   - For characters, prioritise face, eyes, body and signature accessories
   - For objects, use light, mid and dark tones for depth
   - NEVER output white pixels (#FFFFFF)

4. SIZE
   - Use between 140 and 256 non-white pixels so the subject is recognisable

5. OUTPUT FORMAT
   - Output ONLY a JSON array, nothing before or after it
   - Do NOT wrap the array in ```json fences
   - Each entry has exactly: "hexCode" (string), "column" (integer), "row" (integer)

Example for "purple circle" (abbreviated):
[
  { "hexCode": "#D1B3FF", "column": 6, "row": 3 },
  { "hexCode": "#C084FC", "column": 7, "row": 3 },
  { "hexCode": "#9333EA", "column": 8, "row": 3 }
]"##;

/// Build the user message for a subject description.
pub fn user_message(prompt: &str) -> String {
    format!(
        "Generate a complete 16x16 pixel art image for: \"{}\"",
        prompt.trim()
    )
}
