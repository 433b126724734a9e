// StudioScript Offline Screenplay Generator
// Copyright (c) 2026 StudioScript

use super::{collapse_summary, ScriptInput};

/// Scene count for the demo screenplay: one scene per five pages, never fewer than eight.
pub fn scene_count(minutes: u32) -> u32 {
    (minutes / 5).max(8)
}

/// Builds a deterministic Fountain skeleton from the form input.
/// Used when no credential is configured or the LLM call fails.
pub fn generate_script(input: &ScriptInput) -> String {
    let duration = input.duration.minutes();
    let scenes = scene_count(duration);
    let tone = input.tone.as_str();
    let genre = input.genre.as_str();

    let mut out = String::new();
    out.push_str(&format!(
        "Title: Untitled {} Project\nWritten by: StudioScript AI\n\n",
        genre
    ));
    out.push_str(&format!(
        "INT. BLACK SCREEN\n\nSUPER: \"{} {}\"\n\nFADE IN:\n\n",
        tone.to_uppercase(),
        genre.to_uppercase()
    ));
    out.push_str(&format!("VOICE OVER\n{}\n\n", collapse_summary(&input.summary)));

    for i in 1..=scenes {
        out.push_str(&format!("INT./EXT. LOCATION {} - DAY\n\n", i));
        out.push_str(&format!(
            "Character {}\n(quietly)\nWe move the story forward, beat by beat.\n\n",
            i
        ));
        out.push_str(&format!(
            "A moment of action, decision, or reversal. The {} tone colors the scene.\n\nCUT TO:\n\n",
            tone.to_lowercase()
        ));
    }

    out.push_str("\nFADE OUT.\n\nTHE END\n");
    out.push_str(&format!(
        "\n[Demo preview: Generated {} scenes for {} minutes. Expand in editor or connect live AI.]",
        scenes, duration
    ));
    out
}
