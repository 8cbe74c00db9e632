use crate::types::{Collection, Document, GroupMembership, Permission, User, UserMembership};

/// Every membership that applies to one actor: the user's own rows plus the
/// rows of each group they belong to. Loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct Grants {
    /// Groups the actor belongs to.
    pub group_ids: Vec<String>,
    pub user_memberships: Vec<UserMembership>,
    pub group_memberships: Vec<GroupMembership>,
}

impl Grants {
    #[must_use]
    pub fn in_group(&self, group_id: &str) -> bool {
        self.group_ids.iter().any(|id| id == group_id)
    }

    /// Highest explicit permission on a collection, from user or group rows.
    #[must_use]
    pub fn collection_permission(&self, collection_id: &str) -> Option<Permission> {
        let users = self
            .user_memberships
            .iter()
            .filter(|m| m.collection_id.as_deref() == Some(collection_id))
            .map(|m| m.permission);
        let groups = self
            .group_memberships
            .iter()
            .filter(|m| m.collection_id.as_deref() == Some(collection_id))
            .map(|m| m.permission);
        users.chain(groups).max()
    }

    /// Highest explicit permission on a document, direct or sourced.
    #[must_use]
    pub fn document_permission(&self, document_id: &str) -> Option<Permission> {
        let users = self
            .user_memberships
            .iter()
            .filter(|m| m.document_id.as_deref() == Some(document_id))
            .map(|m| m.permission);
        let groups = self
            .group_memberships
            .iter()
            .filter(|m| m.document_id.as_deref() == Some(document_id))
            .map(|m| m.permission);
        users.chain(groups).max()
    }

    /// Whether any membership on the collection reaches `required`.
    #[must_use]
    pub fn includes_collection_membership(
        &self,
        collection_id: &str,
        required: Permission,
    ) -> bool {
        self.collection_permission(collection_id)
            .is_some_and(|p| p.has(required))
    }
}

/// Resolves what a user may do in a collection.
///
/// An explicit membership replaces the collection default outright, so it
/// can raise or lower access. Without one, team members other than guests
/// get the default, viewers capped at read, and nobody gets anything from a
/// private or `none` collection.
#[must_use]
pub fn effective_collection_permission(
    user: &User,
    collection: &Collection,
    grants: &Grants,
) -> Option<Permission> {
    if user.team_id != collection.team_id || user.is_suspended() {
        return None;
    }

    if let Some(explicit) = grants.collection_permission(&collection.id) {
        return Some(explicit);
    }

    if user.is_guest() {
        return None;
    }

    let default = collection.default_permission()?;
    if user.is_viewer() {
        Some(default.min(Permission::Read))
    } else {
        Some(default)
    }
}

/// Resolves what a user may do with a document: the best of its own
/// memberships and what its collection grants. The creator of a draft that
/// has no collection owns it outright.
#[must_use]
pub fn effective_document_permission(
    user: &User,
    document: &Document,
    collection: Option<&Collection>,
    grants: &Grants,
) -> Option<Permission> {
    if user.team_id != document.team_id || user.is_suspended() {
        return None;
    }

    let direct = grants.document_permission(&document.id);
    let inherited = collection
        .filter(|c| document.collection_id.as_deref() == Some(c.id.as_str()))
        .and_then(|c| effective_collection_permission(user, c, grants));
    let owner = (document.collection_id.is_none() && document.created_by_id == user.id)
        .then_some(Permission::Admin);

    [direct, inherited, owner].into_iter().flatten().max()
}
