/// Placeholder replaced by the video transcript.
pub const TRANSCRIPTION_PLACEHOLDER: &str = "{transcription}";

/// Substitute the transcript into the first placeholder of `template`.
///
/// A template without the placeholder is returned as is and the transcript
/// goes unused.
pub fn compose_prompt(template: &str, transcript: &str) -> String {
    template.replacen(TRANSCRIPTION_PLACEHOLDER, transcript, 1)
}
