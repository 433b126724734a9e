// StudioScript Prompt Builders
// Copyright (c) 2026 StudioScript

use crate::script::{AdScriptInput, ScriptInput};

pub const SCREENPLAY_TITLE: &str = "StudioScript AI";
pub const ADS_TITLE: &str = "StudioScript AI - Ads";
pub const SCENE_PROMPTS_TITLE: &str = "StudioScript AI - Scene Prompts";
pub const IMAGES_TITLE: &str = "StudioScript AI - Images";

/// A system/user message pair ready for a chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

pub fn screenplay_prompt(input: &ScriptInput) -> PromptPair {
    let system = "You are a professional screenwriter. Output only the screenplay in Fountain format. \
                  Match industry conventions. Scale content to the requested duration (≈1 page per minute). \
                  No preamble or explanations.";

    let user = format!(
        "Create a complete, production-ready screenplay in Fountain format with the following parameters:\n\n\
         Summary: {}\n\
         Desired Duration: {} minutes\n\
         Tone: {}\n\
         Genre: {}\n\n\
         Requirements:\n\
         - Use proper scene headings, action, character, dialogue, parentheticals, and transitions.\n\
         - Structure acts and major beats naturally for the chosen duration.\n\
         - Do not include any commentary or markdown — only the screenplay text.",
        input.summary, input.duration, input.tone, input.genre
    );

    PromptPair {
        system: system.to_string(),
        user,
    }
}

pub fn ad_prompt(input: &AdScriptInput) -> PromptPair {
    let system = "You are an award-winning advertising copywriter and director. \
                  Create a production-ready TV/web ad script. Output plain text only.";

    let seconds = input.duration_seconds;
    let user = format!(
        "Create a complete advertising script designed for video production with the following parameters:\n\n\
         Summary: {summary}\n\
         Desired Duration: {seconds} seconds\n\
         Tone: {tone}\n\
         Genre/Category: {genre}\n\n\
         Format requirements (STRICT):\n\
         - Start with an uppercase title line: AD TITLE: <Title>\n\
         - Include a one-line LOG LINE.\n\
         - Break the ad into numbered SHOTS with timestamps that sum to ~{seconds}s.\n\
         - For each shot include: TIME RANGE (e.g., 0-3s), VISUAL DESCRIPTION, ON-SCREEN TEXT (if any), \
         VOICE OVER (VO), DIALOGUE (if any), SFX, MUSIC.\n\
         - Include a clear CTA near the end with on-screen text.\n\
         - Keep language concise and production-ready. No markdown. No extra commentary.\n",
        summary = input.summary,
        seconds = seconds,
        tone = input.tone,
        genre = input.genre,
    );

    PromptPair {
        system: system.to_string(),
        user,
    }
}

pub fn scene_prompts_prompt(screenplay: &str) -> PromptPair {
    let system = "You are a senior film prompt engineer. Parse a screenplay written in Fountain format \
                  and produce extremely detailed, production-ready visual prompts per scene.";

    let user = format!(
        "From the following screenplay in Fountain format, extract all scenes and return ONLY a valid JSON object with this shape:\n\n\
         {{\"scenes\":[{{\"scene_number\":1,\"title\":\"string\",\"prompt\":\"string\"}}]}}\n\n\
         Guidelines:\n\
         - Infer scene titles from scene headings (e.g., INT./EXT., location, time).\n\
         - The 'prompt' must be 120-200 words and cover: environment, time of day, lighting, camera and lens, \
         composition and framing, character descriptions (attire, age, posture, expression), actions, props, mood, \
         color palette, weather/atmosphere, and style references.\n\
         - Do NOT include fountain markup, scene numbers, or screenplay formatting in the prompt text. \
         Focus on cinematic visuals.\n\
         - Return ONLY a minified JSON object without code fences.\n\n\
         SCREENPLAY:\n{}",
        screenplay
    );

    PromptPair {
        system: system.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{AdDuration, FeatureDuration, Genre, Tone};

    #[test]
    fn test_screenplay_prompt_carries_parameters() {
        let input = ScriptInput {
            summary: "Two rivals share a lighthouse.".into(),
            duration: FeatureDuration::try_from(120).unwrap(),
            tone: Tone::Dark,
            genre: Genre::Thriller,
        };
        let pair = screenplay_prompt(&input);
        assert!(pair.system.contains("Fountain format"));
        assert!(pair.user.contains("Summary: Two rivals share a lighthouse.\n"));
        assert!(pair.user.contains("Desired Duration: 120 minutes\n"));
        assert!(pair.user.contains("Tone: Dark\nGenre: Thriller\n\nRequirements:"));
    }

    #[test]
    fn test_ad_prompt_mentions_total_seconds_twice() {
        let input = AdScriptInput {
            summary: "Solar backpacks".into(),
            duration_seconds: AdDuration::try_from(45).unwrap(),
            tone: Tone::Comedic,
            genre: Genre::SciFi,
        };
        let pair = ad_prompt(&input);
        assert!(pair.user.contains("Desired Duration: 45 seconds"));
        assert!(pair.user.contains("timestamps that sum to ~45s."));
        assert!(pair.user.contains("Genre/Category: Sci-Fi"));
    }

    #[test]
    fn test_scene_prompt_embeds_schema_and_script() {
        let pair = scene_prompts_prompt("INT. LAB - NIGHT");
        assert!(pair
            .user
            .contains(r#"{"scenes":[{"scene_number":1,"title":"string","prompt":"string"}]}"#));
        assert!(pair.user.ends_with("SCREENPLAY:\nINT. LAB - NIGHT"));
    }
}
