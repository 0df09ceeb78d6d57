use super::errors::{business_rule_violation, GuardError, GuardResult};
use crate::models::{Advertisement, UserRole};
use crate::store::ListingStore;
use async_trait::async_trait;

/// Trait for implementing state transition guards
#[async_trait]
pub trait StateGuard<T> {
    /// Check if a transition is allowed
    async fn check(&self, entity: &T, store: &dyn ListingStore) -> GuardResult<bool>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard to check that the acting user is an admin
pub struct ActorIsAdminGuard {
    pub actor_id: i64,
}

#[async_trait]
impl StateGuard<Advertisement> for ActorIsAdminGuard {
    async fn check(&self, _ad: &Advertisement, store: &dyn ListingStore) -> GuardResult<bool> {
        let user = store
            .get_user(self.actor_id)
            .await?
            .ok_or_else(|| business_rule_violation(format!("Unknown user {}", self.actor_id)))?;
        if !user.is_admin() {
            return Err(business_rule_violation(format!(
                "User {} is not an admin",
                user.id
            )));
        }
        Ok(true)
    }

    fn description(&self) -> &'static str {
        "Acting user must be an admin"
    }
}

/// Guard to check that the acting user holds a reviewing role
pub struct ActorIsReviewerGuard {
    pub actor_id: i64,
}

#[async_trait]
impl StateGuard<Advertisement> for ActorIsReviewerGuard {
    async fn check(&self, _ad: &Advertisement, store: &dyn ListingStore) -> GuardResult<bool> {
        let user = store
            .get_user(self.actor_id)
            .await?
            .ok_or_else(|| business_rule_violation(format!("Unknown user {}", self.actor_id)))?;
        if !user.role.is_reviewer() {
            return Err(business_rule_violation(format!(
                "User {} with role {} may not review listings",
                user.id, user.role
            )));
        }
        Ok(true)
    }

    fn description(&self) -> &'static str {
        "Acting user must be an admin, dispatcher or agent"
    }
}

/// Guard to check that the acting user is attached to the listing (or is an
/// admin, who may act on any listing)
pub struct ActorIsAttachedGuard {
    pub actor_id: i64,
}

#[async_trait]
impl StateGuard<Advertisement> for ActorIsAttachedGuard {
    async fn check(&self, ad: &Advertisement, store: &dyn ListingStore) -> GuardResult<bool> {
        let user = store
            .get_user(self.actor_id)
            .await?
            .ok_or_else(|| business_rule_violation(format!("Unknown user {}", self.actor_id)))?;
        if user.is_admin() {
            return Ok(true);
        }
        let attached = ad.pinned_dispatcher == Some(self.actor_id)
            || ad.pinned_agent == Some(self.actor_id);
        if !attached {
            return Err(business_rule_violation(format!(
                "User {} is not attached to listing {}",
                self.actor_id, ad.id
            )));
        }
        Ok(true)
    }

    fn description(&self) -> &'static str {
        "Acting user must be attached to the listing or be an admin"
    }
}

/// Resolve the user to pin for a role. An explicit choice is validated
/// against the role; without one, a lone holder of the role is picked
/// automatically, and anything else requires the caller to choose.
pub async fn resolve_assignee(
    store: &dyn ListingStore,
    role: UserRole,
    explicit: Option<i64>,
) -> GuardResult<i64> {
    if let Some(user_id) = explicit {
        let user = store
            .get_user(user_id)
            .await?
            .ok_or_else(|| business_rule_violation(format!("Unknown user {user_id}")))?;
        if user.role != role {
            return Err(business_rule_violation(format!(
                "User {} does not hold role {}",
                user_id, role
            )));
        }
        return Ok(user_id);
    }

    let candidates = store.list_by_role(role).await?;
    match candidates.len() {
        0 => Err(GuardError::ResourceUnavailable {
            resource: format!("no user holds role {role}"),
        }),
        1 => Ok(candidates[0].id),
        n => Err(GuardError::AssignmentChoiceRequired {
            role: match role {
                UserRole::Dispatcher => "dispatcher",
                UserRole::Agent => "agent",
                _ => "user",
            },
            candidates: n,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryListingStore;

    #[tokio::test]
    async fn test_resolve_assignee_auto_picks_lone_dispatcher() {
        let store = MemoryListingStore::new();
        store
            .upsert_user(NewUser {
                id: 10,
                username: None,
                role: UserRole::Dispatcher,
            })
            .await
            .unwrap();

        let picked = resolve_assignee(&store, UserRole::Dispatcher, None)
            .await
            .unwrap();
        assert_eq!(picked, 10);
    }

    #[tokio::test]
    async fn test_resolve_assignee_requires_choice_with_many() {
        let store = MemoryListingStore::new();
        for id in [10, 11] {
            store
                .upsert_user(NewUser {
                    id,
                    username: None,
                    role: UserRole::Dispatcher,
                })
                .await
                .unwrap();
        }

        let err = resolve_assignee(&store, UserRole::Dispatcher, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GuardError::AssignmentChoiceRequired { candidates: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_assignee_rejects_wrong_role() {
        let store = MemoryListingStore::new();
        store
            .upsert_user(NewUser {
                id: 10,
                username: None,
                role: UserRole::Agent,
            })
            .await
            .unwrap();

        let err = resolve_assignee(&store, UserRole::Dispatcher, Some(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::BusinessRuleViolation { .. }));
    }
}
