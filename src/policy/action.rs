use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A named ability an actor may hold on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Read,
    Update,
    Delete,
    Share,
    Move,
    Duplicate,
    Archive,
    Unarchive,
    Restore,
    PermanentDelete,
    Publish,
    Unpublish,
    CreateChildDocument,
    Pin,
    Unpin,
    PinToHome,
    ManageUsers,
    Comment,
    Download,
    Star,
    Unstar,
    Subscribe,
    Unsubscribe,
    Export,
    ReadDocument,
    UpdateDocument,
    CreateDocument,
    DeleteDocument,
    CreateCollection,
    CreateGroup,
    CreateTemplate,
    InviteUser,
    Promote,
    Demote,
    Suspend,
    Activate,
}

impl Action {
    pub const ALL: [Action; 36] = [
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Share,
        Action::Move,
        Action::Duplicate,
        Action::Archive,
        Action::Unarchive,
        Action::Restore,
        Action::PermanentDelete,
        Action::Publish,
        Action::Unpublish,
        Action::CreateChildDocument,
        Action::Pin,
        Action::Unpin,
        Action::PinToHome,
        Action::ManageUsers,
        Action::Comment,
        Action::Download,
        Action::Star,
        Action::Unstar,
        Action::Subscribe,
        Action::Unsubscribe,
        Action::Export,
        Action::ReadDocument,
        Action::UpdateDocument,
        Action::CreateDocument,
        Action::DeleteDocument,
        Action::CreateCollection,
        Action::CreateGroup,
        Action::CreateTemplate,
        Action::InviteUser,
        Action::Promote,
        Action::Demote,
        Action::Suspend,
        Action::Activate,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Share => "share",
            Action::Move => "move",
            Action::Duplicate => "duplicate",
            Action::Archive => "archive",
            Action::Unarchive => "unarchive",
            Action::Restore => "restore",
            Action::PermanentDelete => "permanentDelete",
            Action::Publish => "publish",
            Action::Unpublish => "unpublish",
            Action::CreateChildDocument => "createChildDocument",
            Action::Pin => "pin",
            Action::Unpin => "unpin",
            Action::PinToHome => "pinToHome",
            Action::ManageUsers => "manageUsers",
            Action::Comment => "comment",
            Action::Download => "download",
            Action::Star => "star",
            Action::Unstar => "unstar",
            Action::Subscribe => "subscribe",
            Action::Unsubscribe => "unsubscribe",
            Action::Export => "export",
            Action::ReadDocument => "readDocument",
            Action::UpdateDocument => "updateDocument",
            Action::CreateDocument => "createDocument",
            Action::DeleteDocument => "deleteDocument",
            Action::CreateCollection => "createCollection",
            Action::CreateGroup => "createGroup",
            Action::CreateTemplate => "createTemplate",
            Action::InviteUser => "inviteUser",
            Action::Promote => "promote",
            Action::Demote => "demote",
            Action::Suspend => "suspend",
            Action::Activate => "activate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown action: {s}")))
    }
}

/// Kinds of actor a rule can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    User,
}

/// Kinds of target a rule can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Team,
    Collection,
    Document,
    Group,
    User,
}

impl TargetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetKind::Team => "team",
            TargetKind::Collection => "collection",
            TargetKind::Document => "document",
            TargetKind::Group => "group",
            TargetKind::User => "user",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
