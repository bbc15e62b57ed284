use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// Generates a stored filename from a millisecond timestamp and a random
/// integer below 1e9, keeping the original file's extension.
///
/// Concurrent uploads could in theory collide; the probability is treated as
/// negligible and no uniqueness probe is made.
pub fn generate_filename(original_name: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        suffix,
        file_extension(original_name)
    )
}

/// Extension of `name` including the leading dot, empty when there is none.
pub fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
