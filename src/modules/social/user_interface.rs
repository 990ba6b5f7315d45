use itertools::Itertools;
use std::path::Path;

use super::profile::{AccountSummary, ProfileUpdate, ProfileView};
use crate::modules::auth::store::{AccountId, AccountStore};

fn resolve(store: &AccountStore, username: &str) -> Result<AccountId, String> {
    store
        .find_by_username(username)
        .map(|a| a.id)
        .ok_or_else(|| format!("User not found: {}", username))
}

/// Render a profile page as plain text
pub fn format_profile(view: &ProfileView) -> String {
    let mut out = format!(
        "Username: {}\nBio: {}\nIcon: {}\nVisibility: {}\nFollowers: {}\nFollowing: {}",
        view.username,
        if view.bio.is_empty() { "(none)" } else { view.bio.as_str() },
        view.icon_path.display(),
        if view.is_public { "public" } else { "private" },
        view.follower_count,
        view.following_count
    );
    if let Some(following) = view.is_following {
        out.push_str(if following {
            "\nYou follow this user"
        } else {
            "\nYou do not follow this user"
        });
    }
    out
}

fn format_summaries(title: &str, summaries: &[AccountSummary]) -> String {
    if summaries.is_empty() {
        return format!("{}: none", title);
    }
    let rows = summaries
        .iter()
        .map(|s| format!("  [{}] {} ({})", s.id, s.username, s.icon))
        .join("\n");
    format!("{} ({}):\n{}", title, summaries.len(), rows)
}

/// Handle the 'profile' command. Without a username, shows your own profile.
pub fn handle_profile_command(
    store: &AccountStore,
    viewer: AccountId,
    username: Option<&str>,
    icon_dir: &Path,
) -> Result<String, String> {
    let target = match username {
        Some(name) => resolve(store, name)?,
        None => viewer,
    };
    let view = store
        .profile_view(viewer, target, icon_dir)
        .map_err(|e| e.to_string())?;
    Ok(format_profile(&view))
}

pub fn handle_edit_profile(store: &mut AccountStore, id: AccountId, update: &ProfileUpdate) -> Result<String, String> {
    if update == &ProfileUpdate::default() {
        return Err("Nothing to update. Pass --username, --bio or --icon.".to_string());
    }
    store
        .update_profile(id, update)
        .map(|_| "Profile updated.".to_string())
        .map_err(|e| format!("Profile update failed: {}", e))
}

pub fn handle_follow_command(
    store: &mut AccountStore,
    id: AccountId,
    username: &str,
    follow: bool,
) -> Result<String, String> {
    let target = resolve(store, username)?;
    if target == id {
        return Err("You cannot follow yourself.".to_string());
    }

    let changed = if follow {
        store.follow(id, target)
    } else {
        store.unfollow(id, target)
    }
    .map_err(|e| e.to_string())?;

    Ok(match (follow, changed) {
        (true, true) => format!("You are now following {}.", username),
        (true, false) => format!("You already follow {}.", username),
        (false, true) => format!("You unfollowed {}.", username),
        (false, false) => format!("You were not following {}.", username),
    })
}

pub fn handle_followers_command(
    store: &AccountStore,
    viewer: AccountId,
    username: Option<&str>,
) -> Result<String, String> {
    let target = match username {
        Some(name) => resolve(store, name)?,
        None => viewer,
    };
    let list = store.follower_summaries(target).map_err(|e| e.to_string())?;
    Ok(format_summaries("Followers", &list))
}

pub fn handle_following_command(
    store: &AccountStore,
    viewer: AccountId,
    username: Option<&str>,
) -> Result<String, String> {
    let target = match username {
        Some(name) => resolve(store, name)?,
        None => viewer,
    };
    let list = store.following_summaries(target).map_err(|e| e.to_string())?;
    Ok(format_summaries("Following", &list))
}

pub fn handle_users_command(store: &AccountStore) -> String {
    format_summaries("Users", &store.directory())
}

/// Flip one account setting by its CLI name
pub fn handle_settings_command(store: &mut AccountStore, id: AccountId, setting: &str) -> Result<String, String> {
    let result = match setting {
        "visibility" => store
            .toggle_visibility(id)
            .map(|public| format!("Account is now {}.", if public { "public" } else { "private" })),
        "follow-notify" => store
            .toggle_follow_notifications(id)
            .map(|on| format!("Follow notifications {}.", if on { "enabled" } else { "disabled" })),
        "comment-notify" => store
            .toggle_comment_notifications(id)
            .map(|on| format!("Comment notifications {}.", if on { "enabled" } else { "disabled" })),
        "dark-mode" => store
            .toggle_dark_mode(id)
            .map(|on| format!("Dark mode {}.", if on { "enabled" } else { "disabled" })),
        other => return Err(format!("Unknown setting: {}", other)),
    };
    result.map_err(|e| e.to_string())
}
