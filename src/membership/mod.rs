mod resolver;
pub mod sourced;

pub use resolver::{Grants, effective_collection_permission, effective_document_permission};
pub use sourced::{
    grant_group_collection, grant_group_document, grant_user_collection, grant_user_document,
    recalculate_for_documents, revoke_group_collection, revoke_group_document,
    revoke_user_collection, revoke_user_document, root_memberships_for_document,
};
