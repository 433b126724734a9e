// StudioScript Editor Operations
// Copyright (c) 2026 StudioScript

use anyhow::{bail, Result};

pub const NEW_BEAT: &str =
    "\n\nINT. INSERT - NIGHT\nA quick new beat adds texture to the moment.\nCUT TO:\n";
pub const NEW_SHOT: &str = "\n\nSHOT X (0-2s)\nVISUAL: Quick cut – insert your new shot.\nVO: Add a punchy line.\nSFX: Whoosh\nMUSIC: Continues\n";

/// Which editor a text belongs to; drives the scale toggle wording and floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Screenplay,
    Ad,
}

impl ScriptKind {
    fn expansion_marker(&self) -> &'static str {
        match self {
            ScriptKind::Screenplay => "[Expanded content... add more dialogues and descriptions]",
            ScriptKind::Ad => "[Expanded content... add more VO, SFX, and visuals]",
        }
    }

    /// Shrinking never cuts below this many characters.
    fn min_len(&self) -> usize {
        match self {
            ScriptKind::Screenplay => 200,
            ScriptKind::Ad => 100,
        }
    }

    pub fn export_file_name(&self) -> &'static str {
        match self {
            ScriptKind::Screenplay => "screenplay.fountain",
            ScriptKind::Ad => "ad-script.txt",
        }
    }
}

pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// "Regenerate Scene": appends a fixed insert beat.
pub fn append_beat(text: &str) -> String {
    format!("{}{}", text, NEW_BEAT)
}

/// "Add Shot": appends a placeholder shot.
pub fn append_shot(text: &str) -> String {
    format!("{}{}", text, NEW_SHOT)
}

/// Flips the scale toggle. Expanding appends a marker; shrinking keeps
/// `max(min_len, floor(len * 0.9))` characters. Returns the text and new flag.
pub fn toggle_scale(text: &str, expanded: bool, kind: ScriptKind) -> (String, bool) {
    if !expanded {
        return (format!("{}\n\n{}", text, kind.expansion_marker()), true);
    }

    let len = text.chars().count();
    let keep = kind.min_len().max(len * 9 / 10);
    (text.chars().take(keep).collect(), false)
}

/// Prompt extraction needs some text to work from.
pub fn require_text(text: &str, kind: ScriptKind) -> Result<()> {
    if text.trim().is_empty() {
        match kind {
            ScriptKind::Screenplay => bail!("Please add screenplay text first."),
            ScriptKind::Ad => bail!("Please add ad script text first."),
        }
    }
    Ok(())
}
