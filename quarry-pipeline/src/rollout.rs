//! Staged-pipeline rollout selection: environment override, else an
//! explicit flag, else a stable percentage hash-rollout keyed by user id,
//! else disabled.

const ROLLOUT_ENV_VAR: &str = "QUARRY_USE_STAGED_PIPELINE";

/// FNV-1a: deterministic across processes and platforms, unlike the
/// std library's randomized `DefaultHasher` — a rollout bucket must be
/// stable for the same user id every time it's computed.
fn stable_hash(input: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    input
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}

/// Whether the staged pipeline path should run, given an optional
/// `user_id` for bucketing and a rollout `percentage` (0-100).
///
/// Precedence: the `QUARRY_USE_STAGED_PIPELINE` environment variable
/// (`true`/`1`/`yes`/`on`, case-insensitive) overrides everything; absent
/// that, `override_flag` wins if set; absent that, `user_id` is bucketed
/// by a stable hash against `percentage`; with no user id, defaults to
/// disabled.
pub fn staged_enabled(user_id: Option<&str>, override_flag: Option<bool>, percentage: u8) -> bool {
    if let Ok(value) = std::env::var(ROLLOUT_ENV_VAR) {
        return matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on");
    }

    if let Some(flag) = override_flag {
        return flag;
    }

    match user_id {
        Some(id) if percentage > 0 => (stable_hash(id) % 100) < percentage as u64,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_override_wins_over_everything() {
        std::env::set_var(ROLLOUT_ENV_VAR, "true");
        assert!(staged_enabled(Some("u1"), Some(false), 0));
        std::env::set_var(ROLLOUT_ENV_VAR, "off");
        assert!(!staged_enabled(Some("u1"), Some(true), 100));
        std::env::remove_var(ROLLOUT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn explicit_flag_wins_when_no_env_override() {
        std::env::remove_var(ROLLOUT_ENV_VAR);
        assert!(staged_enabled(Some("u1"), Some(true), 0));
        assert!(!staged_enabled(Some("u1"), Some(false), 100));
    }

    #[test]
    #[serial]
    fn percentage_rollout_is_deterministic_per_user() {
        std::env::remove_var(ROLLOUT_ENV_VAR);
        let first = staged_enabled(Some("stable-user"), None, 50);
        let second = staged_enabled(Some("stable-user"), None, 50);
        assert_eq!(first, second);
    }

    #[test]
    #[serial]
    fn zero_percent_never_enables() {
        std::env::remove_var(ROLLOUT_ENV_VAR);
        for i in 0..20 {
            assert!(!staged_enabled(Some(&format!("user-{i}")), None, 0));
        }
    }

    #[test]
    #[serial]
    fn hundred_percent_always_enables() {
        std::env::remove_var(ROLLOUT_ENV_VAR);
        for i in 0..20 {
            assert!(staged_enabled(Some(&format!("user-{i}")), None, 100));
        }
    }

    #[test]
    #[serial]
    fn no_user_id_defaults_disabled() {
        std::env::remove_var(ROLLOUT_ENV_VAR);
        assert!(!staged_enabled(None, None, 100));
    }
}
