use sha2::{Digest, Sha256};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";
const AVATAR_SIZE: u32 = 200;
const AVATAR_RATING: &str = "pg";
const AVATAR_DEFAULT: &str = "mm";

/// Gravatar URL for an email address. Same address in, same URL out.
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = hex::encode(Sha256::digest(normalized.as_bytes()));
    format!(
        "{GRAVATAR_BASE}/{digest}?s={AVATAR_SIZE}&r={AVATAR_RATING}&d={AVATAR_DEFAULT}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_deterministic_and_case_insensitive() {
        let a = gravatar_url("Ada@Example.com");
        let b = gravatar_url("  ada@example.com ");
        assert_eq!(a, b);
        assert_ne!(a, gravatar_url("bob@example.com"));
    }

    #[test]
    fn url_carries_fixed_parameters() {
        let url = gravatar_url("ada@example.com");
        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
        assert!(url.ends_with("?s=200&r=pg&d=mm"));
        // sha256 hex digest
        let hash = url
            .trim_start_matches("https://www.gravatar.com/avatar/")
            .split('?')
            .next()
            .unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
