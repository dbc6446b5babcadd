//! Shared key generation and parsing for upload objects.
//!
//! Key format: `input/{job_id}/{unix_millis}-{sanitized_filename}`. The job
//! id segment is the correlation point between upload notifications and job
//! records, so both sides of the contract live in this module.

use uuid::Uuid;

/// Prefix for all upload keys. Notifications for keys outside this prefix
/// are not upload events and must be ignored.
pub const INPUT_PREFIX: &str = "input/";

/// Replace any character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate the storage key for a job's upload.
pub fn generate_input_key(job_id: Uuid, file_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    format!(
        "input/{}/{}-{}",
        job_id,
        timestamp,
        sanitize_file_name(file_name)
    )
}

/// Extract the job id from an upload key.
///
/// Returns `None` unless the key has the `input/` prefix and a valid UUID
/// second segment. The trailing `{millis}-{filename}` part is not validated;
/// only the correlation segment matters.
pub fn parse_job_id_from_key(key: &str) -> Option<Uuid> {
    let mut segments = key.split('/');
    if segments.next() != Some("input") {
        return None;
    }
    let job_segment = segments.next()?;
    Uuid::parse_str(job_segment).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_file_name("my clip (1).mp4"), "my_clip__1_.mp4");
        assert_eq!(sanitize_file_name("weird/../path.mp4"), "weird_.._path.mp4");
        assert_eq!(sanitize_file_name("ünicode.mov"), "_nicode.mov");
        assert_eq!(sanitize_file_name("dash-dot.ok"), "dash-dot.ok");
    }

    #[test]
    fn test_generate_and_parse_round_trip() {
        let job_id = Uuid::new_v4();
        let key = generate_input_key(job_id, "clip.mp4");
        assert!(key.starts_with(&format!("input/{}/", job_id)));
        assert!(key.ends_with("-clip.mp4"));
        assert_eq!(parse_job_id_from_key(&key), Some(job_id));
    }

    #[test]
    fn test_parse_job_id_from_key() {
        let id = Uuid::parse_str("9b9ae4c2-1c43-4d30-9f2c-0a3c6a2f5f11").unwrap();
        assert_eq!(
            parse_job_id_from_key("input/9b9ae4c2-1c43-4d30-9f2c-0a3c6a2f5f11/171-clip.mp4"),
            Some(id)
        );
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(parse_job_id_from_key("output/abc/1-clip.mp4"), None);
        assert_eq!(parse_job_id_from_key("input/not-a-uuid/1-clip.mp4"), None);
        assert_eq!(parse_job_id_from_key("input/"), None);
        assert_eq!(parse_job_id_from_key(""), None);
        assert_eq!(
            parse_job_id_from_key("9b9ae4c2-1c43-4d30-9f2c-0a3c6a2f5f11"),
            None
        );
    }

    #[test]
    fn test_parse_tolerates_missing_filename_segment() {
        let id = Uuid::parse_str("9b9ae4c2-1c43-4d30-9f2c-0a3c6a2f5f11").unwrap();
        // Correlation only needs the first two segments.
        assert_eq!(
            parse_job_id_from_key("input/9b9ae4c2-1c43-4d30-9f2c-0a3c6a2f5f11"),
            Some(id)
        );
    }
}
