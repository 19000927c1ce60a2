//! Prompt assembly

/// Label introducing the theme's style modifier in a prompt
pub const STYLE_LABEL: &str = "Visual Style:";

/// Combine a scene description with a theme's style modifier.
///
/// The scene comes first; the modifier, when present, follows after a blank
/// line as `Visual Style: ...`. A blank modifier leaves the scene untouched.
pub fn compose(scene_text: &str, style_modifier: &str) -> String {
    let modifier = style_modifier.trim();
    if modifier.is_empty() {
        return scene_text.to_string();
    }
    format!("{}\n\n{} {}", scene_text, STYLE_LABEL, modifier)
}
