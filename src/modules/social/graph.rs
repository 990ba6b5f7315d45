use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::modules::auth::error::{AuthError, AuthResult};
use crate::modules::auth::store::{AccountId, AccountStore};
use crate::modules::utils::logging::log_data_operation;

/// Directed follower → followed edges.
///
/// Both directions are kept as ordered pair sets so follower and following
/// lookups are range scans. The two sets always hold the same edges.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct FollowGraph {
    // (follower, followed)
    forward: BTreeSet<(AccountId, AccountId)>,
    // (followed, follower)
    reverse: BTreeSet<(AccountId, AccountId)>,
}

impl FollowGraph {
    /// Returns true if a new edge was added. Self edges are ignored.
    pub fn follow(&mut self, follower: AccountId, followed: AccountId) -> bool {
        if follower == followed || !self.forward.insert((follower, followed)) {
            return false;
        }
        self.reverse.insert((followed, follower));
        true
    }

    /// Returns true if an edge was removed
    pub fn unfollow(&mut self, follower: AccountId, followed: AccountId) -> bool {
        if !self.forward.remove(&(follower, followed)) {
            return false;
        }
        self.reverse.remove(&(followed, follower));
        true
    }

    pub fn is_following(&self, follower: AccountId, followed: AccountId) -> bool {
        self.forward.contains(&(follower, followed))
    }

    /// Accounts following `id`, ascending
    pub fn followers(&self, id: AccountId) -> Vec<AccountId> {
        self.reverse
            .range((id, AccountId::MIN)..=(id, AccountId::MAX))
            .map(|&(_, follower)| follower)
            .collect()
    }

    /// Accounts `id` follows, ascending
    pub fn following(&self, id: AccountId) -> Vec<AccountId> {
        self.forward
            .range((id, AccountId::MIN)..=(id, AccountId::MAX))
            .map(|&(_, followed)| followed)
            .collect()
    }

    pub fn follower_count(&self, id: AccountId) -> usize {
        self.reverse.range((id, AccountId::MIN)..=(id, AccountId::MAX)).count()
    }

    pub fn following_count(&self, id: AccountId) -> usize {
        self.forward.range((id, AccountId::MIN)..=(id, AccountId::MAX)).count()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.len()
    }
}

impl AccountStore {
    fn ensure_pair(&self, follower: AccountId, followed: AccountId) -> AuthResult<()> {
        if self.contains(follower) && self.contains(followed) {
            Ok(())
        } else {
            Err(AuthError::AccountNotFound)
        }
    }

    pub fn follow(&mut self, follower: AccountId, followed: AccountId) -> AuthResult<bool> {
        self.ensure_pair(follower, followed)?;
        let added = self.graph.follow(follower, followed);
        if added {
            log_data_operation("follow", &follower.to_string(), "follow_graph", true, None);
        }
        Ok(added)
    }

    pub fn unfollow(&mut self, follower: AccountId, followed: AccountId) -> AuthResult<bool> {
        self.ensure_pair(follower, followed)?;
        let removed = self.graph.unfollow(follower, followed);
        if removed {
            log_data_operation("unfollow", &follower.to_string(), "follow_graph", true, None);
        }
        Ok(removed)
    }

    pub fn is_following(&self, follower: AccountId, followed: AccountId) -> bool {
        self.graph.is_following(follower, followed)
    }

    pub fn follower_count(&self, id: AccountId) -> usize {
        self.graph.follower_count(id)
    }

    pub fn following_count(&self, id: AccountId) -> usize {
        self.graph.following_count(id)
    }

    pub fn followers(&self, id: AccountId) -> Vec<AccountId> {
        self.graph.followers(id)
    }

    pub fn following(&self, id: AccountId) -> Vec<AccountId> {
        self.graph.following(id)
    }

    pub fn graph(&self) -> &FollowGraph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::store::test_store;

    #[test]
    fn test_follow_and_unfollow() {
        let mut graph = FollowGraph::default();

        assert!(graph.follow(1, 2));
        assert!(graph.is_following(1, 2));
        assert!(!graph.is_following(2, 1));
        assert_eq!(graph.follower_count(2), 1);
        assert_eq!(graph.following_count(1), 1);

        assert!(graph.unfollow(1, 2));
        assert!(!graph.is_following(1, 2));
        assert_eq!(graph.follower_count(2), 0);
        assert_eq!(graph.following_count(1), 0);
    }

    #[test]
    fn test_follow_is_idempotent() {
        let mut graph = FollowGraph::default();
        assert!(graph.follow(1, 2));
        assert!(!graph.follow(1, 2));
        assert_eq!(graph.follower_count(2), 1);
        assert_eq!(graph.edge_count(), 1);

        assert!(!graph.unfollow(3, 2));
        assert!(graph.unfollow(1, 2));
        assert!(!graph.unfollow(1, 2));
    }

    #[test]
    fn test_no_self_edges() {
        let mut graph = FollowGraph::default();
        assert!(!graph.follow(5, 5));
        assert!(!graph.is_following(5, 5));
        assert_eq!(graph.follower_count(5), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_counts_match_lists() {
        let mut graph = FollowGraph::default();
        for (a, b) in [(1, 3), (2, 3), (4, 3), (3, 1), (3, 9), (2, 1)] {
            graph.follow(a, b);
        }

        assert_eq!(graph.followers(3), vec![1, 2, 4]);
        assert_eq!(graph.following(3), vec![1, 9]);
        assert_eq!(graph.followers(1), vec![2, 3]);

        for id in 1..=9 {
            assert_eq!(graph.follower_count(id), graph.followers(id).len());
            assert_eq!(graph.following_count(id), graph.following(id).len());
            for follower in graph.followers(id) {
                assert!(graph.following(follower).contains(&id));
            }
        }
    }

    #[test]
    fn test_store_rejects_unknown_accounts() {
        let mut store = test_store();
        let alice = store.register("alice", "alice@example.com", "secret123", 0).unwrap().id;
        let bob = store.register("bob", "bob@example.com", "secret123", 0).unwrap().id;

        assert_eq!(store.follow(alice, 99).unwrap_err(), AuthError::AccountNotFound);
        assert_eq!(store.unfollow(99, bob).unwrap_err(), AuthError::AccountNotFound);

        assert!(store.follow(alice, bob).unwrap());
        assert!(!store.follow(alice, bob).unwrap());
        assert!(!store.follow(alice, alice).unwrap());
        assert_eq!(store.followers(bob), vec![alice]);
        assert_eq!(store.following_count(alice), 1);

        assert!(store.unfollow(alice, bob).unwrap());
        assert_eq!(store.follower_count(bob), 0);
    }
}
