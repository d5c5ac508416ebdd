use anyhow::{Context, Result};
use dialoguer::Input;

use crate::scorer::AudioStream;

// Asks for the page URL, pre-filling `default` when there is one
pub fn prompt_input(prompt: &str, default: Option<String>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(default) = default {
        input = input.default(default);
    }

    input.interact_text().context("Failed to read input")
}

pub fn render_best(stream: &AudioStream) -> String {
    format!(
        "Best audio stream found:\nURL: {}\nFormat: {}\nQuality Score: {}",
        stream.url, stream.format, stream.quality_score
    )
}

pub fn render_list(streams: &[AudioStream]) -> String {
    let mut out = format!("Found {} audio stream(s):\n{}\n", streams.len(), "-".repeat(80));
    for (i, stream) in streams.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   Format: {}\n   Quality Score: {}\n\n",
            i + 1,
            stream.url,
            stream.format,
            stream.quality_score
        ));
    }
    out
}

/// What to print when nothing was found. JSON mode prints an empty value so
/// stdout stays parseable.
pub fn render_no_streams(json: bool, list_all: bool) -> String {
    match (json, list_all) {
        (true, true) => "[]".to_string(),
        (true, false) => "null".to_string(),
        (false, _) => "No audio streams found.".to_string(),
    }
}

pub fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize streams")
}
