use chrono::{DateTime, SecondsFormat, Utc};

/// Audio file name derived from the creation instant, e.g.
/// `2026-10-15T08-30-00-123Z.mp3`. Colons and dots are replaced so the name is
/// safe on every filesystem and in a URL path.
pub fn audio_file_name(created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("{}.mp3", stamp.replace([':', '.'], "-"))
}

/// Rejects names that could escape the audio directory.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
