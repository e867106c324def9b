use rand::{distributions::Alphanumeric, thread_rng, Rng};
use uuid::Uuid;

pub fn generate_access_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Unguessable video room for one interview.
pub fn meeting_link(base_url: &str, interview_id: Uuid) -> String {
    let short = interview_id.simple().to_string();
    format!(
        "{}/mockhire-{}-{}",
        base_url.trim_end_matches('/'),
        &short[..8],
        generate_access_token(12).to_lowercase()
    )
}
