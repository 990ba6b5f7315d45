use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::modules::auth::error::{AuthError, AuthResult};
use crate::modules::auth::store::{validate_username, AccountId, AccountSettings, AccountStore};
use crate::modules::utils::logging::log_data_operation;

pub const BIO_MAX_LEN: usize = 200;
pub const ICON_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Fields of a profile edit. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub icon: Option<String>,
}

/// What one account sees on another account's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub id: AccountId,
    pub username: String,
    pub bio: String,
    pub icon_path: PathBuf,
    pub is_public: bool,
    pub follower_count: usize,
    pub following_count: usize,
    /// `None` when viewing your own profile
    pub is_following: Option<bool>,
}

/// Entry in user listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub username: String,
    pub icon: String,
}

/// Reduce an uploaded file name to a plain, safe file name.
///
/// Directory components are dropped, whitespace becomes `_`, and every
/// character outside `[A-Za-z0-9_.-]` is removed. Leading dots and
/// underscores are stripped.
pub fn sanitize_icon_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or_default();
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    cleaned.trim_start_matches(&['.', '_'][..]).to_string()
}

/// Sanitized icon name with an allowed image extension
pub fn validate_icon(name: &str) -> AuthResult<String> {
    let safe = sanitize_icon_name(name);
    let allowed = Path::new(&safe)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ICON_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false);
    if !allowed || Path::new(&safe).file_stem().is_none() {
        return Err(AuthError::InvalidProfile(format!(
            "icon must be a {} file",
            ICON_EXTENSIONS.join("/")
        )));
    }
    Ok(safe)
}

pub fn icon_path(icon_dir: &Path, icon: &str) -> PathBuf {
    icon_dir.join(icon)
}

impl AccountStore {
    /// Apply a profile edit. Every field is checked before anything changes.
    pub fn update_profile(&mut self, id: AccountId, update: &ProfileUpdate) -> AuthResult<()> {
        self.account(id)?;

        let username = match &update.username {
            Some(name) => {
                let name = validate_username(name)?;
                if matches!(self.find_by_username(&name), Some(owner) if owner.id != id) {
                    return Err(AuthError::DuplicateUsername);
                }
                Some(name)
            }
            None => None,
        };

        let bio = match &update.bio {
            Some(bio) => {
                let bio = bio.trim();
                if bio.chars().count() > BIO_MAX_LEN {
                    return Err(AuthError::InvalidProfile(format!(
                        "bio must be at most {} characters",
                        BIO_MAX_LEN
                    )));
                }
                Some(bio.to_string())
            }
            None => None,
        };

        let icon = update.icon.as_deref().map(validate_icon).transpose()?;

        if let Some(name) = username {
            self.set_username(id, &name)?;
        }
        let account = self.account_mut(id)?;
        if let Some(bio) = bio {
            account.bio = bio;
        }
        if let Some(icon) = icon {
            account.icon = icon;
        }

        log_data_operation("update_profile", &id.to_string(), "profile", true, None);
        Ok(())
    }

    fn toggle_setting(
        &mut self,
        id: AccountId,
        name: &str,
        flag: fn(&mut AccountSettings) -> &mut bool,
    ) -> AuthResult<bool> {
        let account = self.account_mut(id)?;
        let value = flag(&mut account.settings);
        *value = !*value;
        let new_value = *value;
        log::info!("Account {} set {} to {}", id, name, new_value);
        Ok(new_value)
    }

    pub fn toggle_visibility(&mut self, id: AccountId) -> AuthResult<bool> {
        self.toggle_setting(id, "is_public", |s| &mut s.is_public)
    }

    pub fn toggle_follow_notifications(&mut self, id: AccountId) -> AuthResult<bool> {
        self.toggle_setting(id, "follow_notify", |s| &mut s.follow_notify)
    }

    pub fn toggle_comment_notifications(&mut self, id: AccountId) -> AuthResult<bool> {
        self.toggle_setting(id, "comment_notify", |s| &mut s.comment_notify)
    }

    pub fn toggle_dark_mode(&mut self, id: AccountId) -> AuthResult<bool> {
        self.toggle_setting(id, "dark_mode", |s| &mut s.dark_mode)
    }

    pub fn profile_view(&self, viewer: AccountId, target: AccountId, icon_dir: &Path) -> AuthResult<ProfileView> {
        self.account(viewer)?;
        let account = self.account(target)?;
        Ok(ProfileView {
            id: account.id,
            username: account.username.clone(),
            bio: account.bio.clone(),
            icon_path: icon_path(icon_dir, &account.icon),
            is_public: account.settings.is_public,
            follower_count: self.follower_count(target),
            following_count: self.following_count(target),
            is_following: (viewer != target).then(|| self.is_following(viewer, target)),
        })
    }

    fn summaries(&self, ids: impl IntoIterator<Item = AccountId>) -> Vec<AccountSummary> {
        ids.into_iter()
            .filter_map(|id| self.get(id))
            .map(|a| AccountSummary {
                id: a.id,
                username: a.username.clone(),
                icon: a.icon.clone(),
            })
            .collect()
    }

    /// Every account, ordered by id
    pub fn directory(&self) -> Vec<AccountSummary> {
        self.summaries(self.accounts().map(|a| a.id).collect::<Vec<_>>())
    }

    pub fn follower_summaries(&self, id: AccountId) -> AuthResult<Vec<AccountSummary>> {
        self.account(id)?;
        Ok(self.summaries(self.followers(id)))
    }

    pub fn following_summaries(&self, id: AccountId) -> AuthResult<Vec<AccountSummary>> {
        self.account(id)?;
        Ok(self.summaries(self.following(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::store::test_store;

    #[test]
    fn test_sanitize_icon_name() {
        assert_eq!(sanitize_icon_name("avatar.png"), "avatar.png");
        assert_eq!(sanitize_icon_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_icon_name("C:\\Users\\me\\my photo.JPG"), "my_photo.JPG");
        assert_eq!(sanitize_icon_name(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_icon_name("顔写真.png"), "png");
    }

    #[test]
    fn test_validate_icon() {
        assert_eq!(validate_icon("me.jpeg").unwrap(), "me.jpeg");
        assert_eq!(validate_icon("dir/me.PNG").unwrap(), "me.PNG");
        assert!(validate_icon("me.gif").is_err());
        assert!(validate_icon("script.png.exe").is_err());
        assert!(validate_icon("顔写真.png").is_err());
        assert!(validate_icon("").is_err());
    }

    #[test]
    fn test_update_profile() {
        let mut store = test_store();
        let id = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;

        store
            .update_profile(
                id,
                &ProfileUpdate {
                    username: Some("alicia".to_string()),
                    bio: Some("  likes tea  ".to_string()),
                    icon: Some("uploads/cat.jpg".to_string()),
                },
            )
            .unwrap();

        let account = store.get(id).unwrap();
        assert_eq!(account.username, "alicia");
        assert_eq!(account.bio, "likes tea");
        assert_eq!(account.icon, "cat.jpg");
        assert!(store.find_by_username("alice").is_none());
        assert_eq!(store.find_by_username("alicia").unwrap().id, id);

        // Keeping your own name is not a conflict
        let same = ProfileUpdate {
            username: Some("Alicia".to_string()),
            ..ProfileUpdate::default()
        };
        store.update_profile(id, &same).unwrap();
    }

    #[test]
    fn test_rejected_update_changes_nothing() {
        let mut store = test_store();
        let alice = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;
        store.register("bob", "bob@example.com", "secret123", 0).unwrap();

        let taken = ProfileUpdate {
            username: Some("bob".to_string()),
            bio: Some("new bio".to_string()),
            icon: None,
        };
        assert_eq!(store.update_profile(alice, &taken).unwrap_err(), AuthError::DuplicateUsername);

        let long_bio = ProfileUpdate {
            username: Some("alice2".to_string()),
            bio: Some("x".repeat(BIO_MAX_LEN + 1)),
            icon: None,
        };
        assert!(matches!(
            store.update_profile(alice, &long_bio),
            Err(AuthError::InvalidProfile(_))
        ));

        let bad_icon = ProfileUpdate {
            username: Some("alice3".to_string()),
            icon: Some("virus.exe".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(store.update_profile(alice, &bad_icon).is_err());

        let account = store.get(alice).unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.bio, "");
        assert_eq!(account.icon, "default.png");
        assert_eq!(store.find_by_username("alice").unwrap().id, alice);

        let max_bio = ProfileUpdate {
            bio: Some("あ".repeat(BIO_MAX_LEN)),
            ..ProfileUpdate::default()
        };
        store.update_profile(alice, &max_bio).unwrap();
    }

    #[test]
    fn test_toggles() {
        let mut store = test_store();
        let id = store.register("carol", "carol@example.com", "secret123", 0).unwrap().id;

        assert!(!store.toggle_visibility(id).unwrap());
        assert!(store.toggle_visibility(id).unwrap());
        assert!(!store.toggle_follow_notifications(id).unwrap());
        assert!(!store.toggle_comment_notifications(id).unwrap());
        assert!(store.toggle_dark_mode(id).unwrap());

        let settings = store.get(id).unwrap().settings;
        assert!(settings.is_public);
        assert!(!settings.follow_notify);
        assert!(!settings.comment_notify);
        assert!(settings.dark_mode);

        assert_eq!(store.toggle_dark_mode(id + 1).unwrap_err(), AuthError::AccountNotFound);
    }

    #[test]
    fn test_profile_view_and_listings() {
        let mut store = test_store();
        let alice = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;
        let bob = store.register("bob", "bob@example.com", "secret123", 0).unwrap().id;
        let carol = store.register("carol", "carol@example.com", "secret123", 0).unwrap().id;
        store.follow(alice, bob).unwrap();
        store.follow(carol, bob).unwrap();

        let icons = Path::new("static/icons");
        let view = store.profile_view(alice, bob, icons).unwrap();
        assert_eq!(view.username, "bob");
        assert_eq!(view.icon_path, PathBuf::from("static/icons/default.png"));
        assert_eq!(view.follower_count, 2);
        assert_eq!(view.following_count, 0);
        assert_eq!(view.is_following, Some(true));

        assert_eq!(store.profile_view(bob, alice, icons).unwrap().is_following, Some(false));
        assert_eq!(store.profile_view(bob, bob, icons).unwrap().is_following, None);
        assert!(store.profile_view(bob, 42, icons).is_err());

        let names: Vec<String> = store
            .follower_summaries(bob)
            .unwrap()
            .into_iter()
            .map(|s| s.username)
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(store.following_summaries(alice).unwrap()[0].id, bob);

        let ids: Vec<AccountId> = store.directory().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![alice, bob, carol]);
    }
}
