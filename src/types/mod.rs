mod models;
mod navigation;
mod permission;
pub mod url;

pub use models::*;
pub use navigation::NavigationNode;
pub use permission::{CollectionPermission, Permission, UserRole};
