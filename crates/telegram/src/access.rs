//! Admin allow-list.
//!
//! Mutating commands (filter toggles, backend re-pointing) are restricted to
//! a fixed set of Telegram user ids from the config. Everything else is open
//! to any chat the bot is in.

/// Whether `user_id` may run admin commands.
#[must_use]
pub fn is_admin(admins: &[u64], user_id: u64) -> bool {
    admins.contains(&user_id)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_user_is_admin() {
        assert!(is_admin(&[141_566, 1_972_749], 141_566));
        assert!(is_admin(&[141_566, 1_972_749], 1_972_749));
    }

    #[test]
    fn unlisted_user_is_not_admin() {
        assert!(!is_admin(&[141_566, 1_972_749], 7));
    }

    #[test]
    fn empty_list_denies_everyone() {
        assert!(!is_admin(&[], 141_566));
    }
}
