// StudioScript Offline Ad Generator
// Copyright (c) 2026 StudioScript

use super::{collapse_summary, AdScriptInput};

const MIN_SHOTS: u32 = 6;
const MAX_SHOTS: u32 = 18;
const CTA_SECONDS: u32 = 4;

/// Shot layout for a spot of `seconds` length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotPlan {
    pub shots: u32,
    pub seconds_per_shot: u32,
}

impl ShotPlan {
    pub fn for_duration(seconds: u32) -> Self {
        let shots = ((seconds as f64 / 5.0).round() as u32).clamp(MIN_SHOTS, MAX_SHOTS);
        let seconds_per_shot = ((seconds as f64 / shots as f64).round() as u32).max(2);
        Self {
            shots,
            seconds_per_shot,
        }
    }

    /// `(start, end)` of every shot; contiguous from zero and capped at `seconds`.
    pub fn ranges(&self, seconds: u32) -> Vec<(u32, u32)> {
        let mut t = 0;
        (0..self.shots)
            .map(|_| {
                let start = t;
                let end = seconds.min(t + self.seconds_per_shot);
                t = end;
                (start, end)
            })
            .collect()
    }
}

/// Builds a deterministic shot-by-shot ad script from the form input.
pub fn generate_ad_script(input: &AdScriptInput) -> String {
    let seconds = input.duration_seconds.seconds();
    let plan = ShotPlan::for_duration(seconds);
    let tone = input.tone.as_str();
    let genre = input.genre.as_str();

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("AD TITLE: Untitled {} Spot", genre));
    lines.push(format!(
        "LOG LINE: A {} {} ad in ~{}s.",
        tone.to_lowercase(),
        genre.to_lowercase(),
        seconds
    ));
    lines.push(String::new());
    lines.push(collapse_summary(&input.summary));
    lines.push(String::new());

    for (idx, (start, end)) in plan.ranges(seconds).into_iter().enumerate() {
        let i = idx + 1;
        lines.push(format!("SHOT {} ({}s–{}s)", i, start, end));
        lines.push(format!(
            "VISUAL: Dynamic visuals advancing the message. Cut {}.",
            i
        ));
        lines.push("ON-SCREEN: Key value prop or micro CTA.".to_string());
        lines.push(format!("VO: Line {} that sells the benefit succinctly.", i));
        lines.push("SFX: Subtle whoosh / click.".to_string());
        lines.push("MUSIC: Modern, upbeat track continues.".to_string());
        lines.push(String::new());
    }

    lines.push(format!(
        "CTA ({}s–{}s)",
        seconds.saturating_sub(CTA_SECONDS),
        seconds
    ));
    lines.push("VISUAL: Logo lockup + URL / QR.".to_string());
    lines.push("ON-SCREEN: Try it free today → Brand.com".to_string());
    lines.push("VO: Try it free today at Brand dot com.".to_string());
    lines.push("SFX: Button click.".to_string());
    lines.push("MUSIC: Button-out sting.".to_string());

    lines.push(String::new());
    lines.push(format!(
        "[Demo preview: Generated {} shots for ~{}s.]",
        plan.shots, seconds
    ));
    lines.join("\n")
}
