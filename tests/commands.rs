mod common;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use common::Fixture;
use folio::commands::{
    Context, CreateDocument, DuplicateDocument, MoveDocument, document_archiver, document_deleter,
    document_duplicator, document_mover, document_publisher, document_restorer, document_unarchiver,
};
use folio::error::{Error, ErrorKind};
use folio::membership::{grant_group_document, grant_user_document, revoke_user_document};
use folio::store::Store;
use folio::types::{
    CollectionPermission, Document, Group, GroupUser, Permission, Pin, UserMembership,
};

fn move_to(
    fixture: &Fixture,
    document: &Document,
    collection_id: Option<&str>,
    parent: Option<&Document>,
    index: Option<usize>,
) -> folio::error::Result<folio::commands::MoveOutcome> {
    fixture.store.transaction(|tx| {
        document_mover(
            tx,
            &Context::new(&fixture.admin),
            document,
            MoveDocument {
                collection_id: collection_id.map(str::to_string),
                parent_document_id: parent.map(|p| p.id.clone()),
                index,
            },
        )
    })
}

fn sourced_rows(
    fixture: &Fixture,
    document_id: &str,
    root: &UserMembership,
) -> Vec<UserMembership> {
    fixture
        .store
        .list_document_user_memberships(document_id)
        .unwrap()
        .into_iter()
        .filter(|m| m.source_id.as_deref() == Some(root.id.as_str()))
        .collect()
}

#[test]
fn test_create_published_document_joins_tree() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));

    let parent = fixture.publish(&collection, None, "Onboarding");
    let child = fixture.publish(&collection, Some(&parent), "First week");
    let draft = fixture.draft(&fixture.member, Some(&collection), "Notes");

    let tree = fixture.reload_collection(&collection.id).document_structure;
    assert_eq!(tree.ids(), vec![parent.id.clone(), child.id.clone()]);
    assert!(!tree.contains(&draft.id));
    fixture.assert_consistent(&collection.id);

    let events = fixture.store.list_document_events(&child.id).unwrap();
    assert!(events.iter().any(|e| e.name == "documents.create"));
}

#[test]
fn test_create_rejects_publish_without_collection() {
    let fixture = Fixture::new();

    let err = fixture
        .store
        .transaction(|tx| {
            folio::commands::document_creator(
                tx,
                &Context::new(&fixture.member),
                CreateDocument {
                    title: "Loose".to_string(),
                    publish: true,
                    ..CreateDocument::default()
                },
            )
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_create_rejects_overlong_title() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));

    let err = fixture
        .store
        .transaction(|tx| {
            folio::commands::document_creator(
                tx,
                &Context::new(&fixture.member).with_max_title_length(5),
                CreateDocument {
                    title: "Far too long".to_string(),
                    collection_id: Some(collection.id.clone()),
                    ..CreateDocument::default()
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_move_within_parent_compensates_index() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let docs: Vec<Document> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|title| fixture.publish(&collection, None, title))
        .collect();

    let outcome = move_to(&fixture, &docs[2], Some(&collection.id), None, Some(4)).unwrap();
    assert!(!outcome.collection_changed);

    let expected: Vec<String> = [0, 1, 3, 2, 4].iter().map(|&i| docs[i].id.clone()).collect();
    assert_eq!(fixture.root_ids(&collection.id), expected);
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_move_to_earlier_index_is_not_compensated() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let docs: Vec<Document> = ["A", "B", "C", "D"]
        .iter()
        .map(|title| fixture.publish(&collection, None, title))
        .collect();

    move_to(&fixture, &docs[3], Some(&collection.id), None, Some(1)).unwrap();

    let expected: Vec<String> = [0, 3, 1, 2].iter().map(|&i| docs[i].id.clone()).collect();
    assert_eq!(fixture.root_ids(&collection.id), expected);
}

#[test]
fn test_move_subtree_across_collections() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));

    let x = fixture.publish(&source, None, "X");
    let y = fixture.publish(&source, Some(&x), "Y");

    let outcome = move_to(&fixture, &x, Some(&target.id), None, None).unwrap();
    assert!(outcome.collection_changed);
    assert_eq!(outcome.collections.len(), 2);
    assert!(outcome.documents.iter().any(|d| d.id == y.id));

    let target_tree = fixture.reload_collection(&target.id).document_structure;
    assert_eq!(target_tree.nodes()[0].id, x.id);
    assert_eq!(target_tree.nodes()[0].children[0].id, y.id);
    assert!(fixture.reload_collection(&source.id).document_structure.is_empty());

    assert_eq!(fixture.reload_document(&x.id).collection_id, Some(target.id.clone()));
    assert_eq!(fixture.reload_document(&y.id).collection_id, Some(target.id.clone()));
    assert_eq!(fixture.reload_document(&y.id).parent_document_id, Some(x.id.clone()));

    fixture.assert_consistent(&source.id);
    fixture.assert_consistent(&target.id);

    let events = fixture.store.list_document_events(&x.id).unwrap();
    let moved = events
        .iter()
        .find(|e| e.name == "documents.move")
        .expect("move event");
    assert_eq!(moved.data["documentIds"], json!([x.id, y.id]));
}

#[test]
fn test_move_removes_source_collection_pins() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));
    let document = fixture.publish(&source, None, "Pinned");

    for collection_id in [Some(source.id.clone()), None] {
        fixture
            .store
            .create_pin(&Pin {
                id: Uuid::new_v4().to_string(),
                team_id: fixture.team.id.clone(),
                document_id: document.id.clone(),
                collection_id,
                created_by_id: fixture.admin.id.clone(),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    move_to(&fixture, &document, Some(&target.id), None, None).unwrap();

    let pins = fixture.store.list_document_pins(&document.id).unwrap();
    assert_eq!(pins.len(), 1);
    assert!(pins[0].collection_id.is_none());
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");
    let grandchild = fixture.publish(&collection, Some(&child), "Grandchild");
    let before = fixture.reload_collection(&collection.id).document_structure;

    for new_parent in [&parent, &grandchild] {
        let err = move_to(&fixture, &parent, Some(&collection.id), Some(new_parent), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    assert_eq!(fixture.reload_collection(&collection.id).document_structure, before);
}

#[test]
fn test_move_to_other_team_collection_is_forbidden() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let (other_team, _) = fixture.other_team();
    let foreign =
        fixture.collection_for(&other_team, "Foreign", Some(CollectionPermission::ReadWrite));
    let document = fixture.publish(&collection, None, "Secret");

    let err = move_to(&fixture, &document, Some(&foreign.id), None, None).unwrap_err();

    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(fixture.root_ids(&collection.id), vec![document.id.clone()]);
    assert!(fixture.reload_collection(&foreign.id).document_structure.is_empty());
}

#[test]
fn test_detach_to_drafts_promotes_children() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let first = fixture.publish(&collection, None, "First");
    let parent = fixture.publish(&collection, None, "Parent");
    let last = fixture.publish(&collection, None, "Last");
    let child_a = fixture.publish(&collection, Some(&parent), "Child A");
    let child_b = fixture.publish(&collection, Some(&parent), "Child B");

    let outcome = move_to(&fixture, &parent, None, None, None).unwrap();
    assert!(outcome.collection_changed);

    let detached = fixture.reload_document(&parent.id);
    assert!(detached.collection_id.is_none());
    assert!(detached.published_at.is_none());

    assert_eq!(
        fixture.root_ids(&collection.id),
        vec![first.id.clone(), child_a.id.clone(), child_b.id.clone(), last.id.clone()]
    );
    assert!(fixture.reload_document(&child_a.id).parent_document_id.is_none());
    assert!(fixture.reload_document(&child_b.id).parent_document_id.is_none());
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_detach_repoints_children_to_new_parent() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let grand = fixture.publish(&collection, None, "Grand");
    let parent = fixture.publish(&collection, Some(&grand), "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");
    let leaf = fixture.publish(&collection, Some(&child), "Leaf");

    move_to(&fixture, &parent, None, None, None).unwrap();

    let moved = fixture.reload_document(&parent.id);
    let child = fixture.reload_document(&child.id);
    assert_eq!(child.parent_document_id, moved.parent_document_id);
    assert!(child.parent_document_id.is_none());
    assert_eq!(
        fixture.reload_document(&leaf.id).parent_document_id,
        Some(child.id.clone())
    );

    assert_eq!(fixture.root_ids(&collection.id), vec![grand.id.clone(), child.id.clone()]);
    let tree = fixture.reload_collection(&collection.id).document_structure;
    assert!(tree.find(&grand.id).unwrap().children.is_empty());
    assert_eq!(tree.find_parent_id(&leaf.id), Some(child.id.clone()));
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_move_event_records_ip() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    let document = fixture.publish(&collection, None, "Document");

    fixture
        .store
        .transaction(|tx| {
            document_mover(
                tx,
                &Context {
                    ip: Some("10.0.0.1"),
                    ..Context::new(&fixture.admin)
                },
                &document,
                MoveDocument {
                    collection_id: Some(collection.id.clone()),
                    parent_document_id: Some(parent.id.clone()),
                    index: None,
                },
            )
        })
        .unwrap();

    let events = fixture.store.list_document_events(&document.id).unwrap();
    let moved = events.iter().find(|e| e.name == "documents.move").unwrap();
    assert_eq!(moved.ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(moved.actor_id, fixture.admin.id);
}

#[test]
fn test_move_under_parent_missing_from_tree_inserts_at_root() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    let document = fixture.publish(&collection, None, "Document");

    // Drop the parent's node behind the store's back.
    let mut drifted = fixture.reload_collection(&collection.id);
    drifted.document_structure.remove(&parent.id);
    fixture.store.update_collection(&drifted).unwrap();

    move_to(&fixture, &document, Some(&collection.id), Some(&parent), None).unwrap();

    assert_eq!(fixture.root_ids(&collection.id), vec![document.id.clone()]);
    assert!(fixture.reload_document(&document.id).parent_document_id.is_none());
}

#[test]
fn test_move_of_document_missing_from_tree_still_succeeds() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));
    let document = fixture.publish(&source, None, "Unsynced");

    let mut drifted = fixture.reload_collection(&source.id);
    drifted.document_structure.remove(&document.id);
    fixture.store.update_collection(&drifted).unwrap();

    move_to(&fixture, &document, Some(&target.id), None, None).unwrap();

    assert_eq!(fixture.root_ids(&target.id), vec![document.id.clone()]);
    fixture.assert_consistent(&target.id);
}

#[test]
fn test_template_move_only_retags() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));
    let template = fixture.create(
        &fixture.admin,
        CreateDocument {
            title: "Meeting notes".to_string(),
            collection_id: Some(source.id.clone()),
            template: true,
            publish: true,
            ..CreateDocument::default()
        },
    );
    assert!(fixture.reload_collection(&source.id).document_structure.is_empty());

    let unchanged = move_to(&fixture, &template, Some(&source.id), None, None).unwrap();
    assert!(!unchanged.collection_changed);

    let moved = move_to(&fixture, &template, Some(&target.id), None, None).unwrap();
    assert!(moved.collection_changed);
    assert_eq!(fixture.reload_document(&template.id).collection_id, Some(target.id.clone()));
    assert!(fixture.reload_collection(&target.id).document_structure.is_empty());
}

#[test]
fn test_failed_transaction_leaves_tree_untouched() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));
    let document = fixture.publish(&source, None, "Doc");

    let result: folio::error::Result<()> = fixture.store.transaction(|tx| {
        document_mover(
            tx,
            &Context::new(&fixture.admin),
            &document,
            MoveDocument {
                collection_id: Some(target.id.clone()),
                parent_document_id: None,
                index: None,
            },
        )?;
        Err(Error::validation("abort after move"))
    });

    assert!(result.is_err());
    assert_eq!(fixture.root_ids(&source.id), vec![document.id.clone()]);
    assert!(fixture.reload_collection(&target.id).document_structure.is_empty());
    assert_eq!(fixture.reload_document(&document.id).collection_id, Some(source.id.clone()));
}

#[test]
fn test_move_recomputes_sourced_memberships() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", None);
    let old_parent = fixture.publish(&collection, None, "Old parent");
    let new_parent = fixture.publish(&collection, None, "New parent");
    let moved = fixture.publish(&collection, Some(&old_parent), "Moved");
    let leaf = fixture.publish(&collection, Some(&moved), "Leaf");

    let (old_root, new_root) = fixture
        .store
        .transaction(|tx| {
            let old_root = grant_user_document(
                tx,
                &fixture.member.id,
                &old_parent.id,
                Permission::ReadWrite,
                &fixture.admin.id,
            )?;
            let new_root = grant_user_document(
                tx,
                &fixture.viewer.id,
                &new_parent.id,
                Permission::Admin,
                &fixture.admin.id,
            )?;
            Ok((old_root, new_root))
        })
        .unwrap();
    assert_eq!(sourced_rows(&fixture, &leaf.id, &old_root).len(), 1);

    move_to(&fixture, &moved, Some(&collection.id), Some(&new_parent), None).unwrap();

    for id in [&moved.id, &leaf.id] {
        assert!(sourced_rows(&fixture, id, &old_root).is_empty());
        let fresh = sourced_rows(&fixture, id, &new_root);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].permission, Permission::Admin);
        assert_eq!(fresh[0].user_id, fixture.viewer.id);
    }
}

#[test]
fn test_move_keeps_memberships_rooted_inside_subtree() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::Read));
    let destination = fixture.collection("Archive", Some(CollectionPermission::Read));
    let moved = fixture.publish(&collection, None, "Moved");
    let leaf = fixture.publish(&collection, Some(&moved), "Leaf");

    let root = fixture
        .store
        .transaction(|tx| {
            grant_user_document(
                tx,
                &fixture.member.id,
                &moved.id,
                Permission::ReadWrite,
                &fixture.admin.id,
            )
        })
        .unwrap();

    move_to(&fixture, &moved, Some(&destination.id), None, None).unwrap();

    assert_eq!(sourced_rows(&fixture, &leaf.id, &root).len(), 1);
}

#[test]
fn test_group_grant_is_sourced_onto_descendants() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", None);
    let parent = fixture.publish(&collection, None, "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");

    let group = Group {
        id: Uuid::new_v4().to_string(),
        team_id: fixture.team.id.clone(),
        name: "Editors".to_string(),
        created_by_id: None,
        created_at: Utc::now(),
    };
    fixture.store.create_group(&group).unwrap();
    fixture
        .store
        .add_group_user(&GroupUser {
            group_id: group.id.clone(),
            user_id: fixture.member.id.clone(),
            created_at: Utc::now(),
        })
        .unwrap();

    fixture
        .store
        .transaction(|tx| {
            grant_group_document(tx, &group.id, &parent.id, Permission::Read, &fixture.admin.id)
        })
        .unwrap();

    let rows = fixture.store.list_document_group_memberships(&child.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].source_id.is_some());

    let grants = fixture.grants(&fixture.member);
    assert_eq!(grants.document_permission(&child.id), Some(Permission::Read));
}

#[test]
fn test_revoke_removes_sourced_rows() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", None);
    let parent = fixture.publish(&collection, None, "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");

    let root = fixture
        .store
        .transaction(|tx| {
            grant_user_document(
                tx,
                &fixture.member.id,
                &parent.id,
                Permission::Read,
                &fixture.admin.id,
            )
        })
        .unwrap();
    assert_eq!(sourced_rows(&fixture, &child.id, &root).len(), 1);

    let removed = fixture
        .store
        .transaction(|tx| revoke_user_document(tx, &fixture.member.id, &parent.id))
        .unwrap();

    assert!(removed);
    assert!(fixture.store.list_document_user_memberships(&child.id).unwrap().is_empty());
}

#[test]
fn test_child_created_under_granted_parent_inherits_membership() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", None);
    let parent = fixture.publish(&collection, None, "Parent");

    let root = fixture
        .store
        .transaction(|tx| {
            grant_user_document(
                tx,
                &fixture.member.id,
                &parent.id,
                Permission::ReadWrite,
                &fixture.admin.id,
            )
        })
        .unwrap();

    let child = fixture.publish(&collection, Some(&parent), "Child");
    assert_eq!(sourced_rows(&fixture, &child.id, &root).len(), 1);
}

#[test]
fn test_duplicate_recursive_copies_subtree() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let x = fixture.create(
        &fixture.admin,
        CreateDocument {
            title: "X".to_string(),
            text: "root text".to_string(),
            content: Some(json!({
                "type": "doc",
                "content": [{"type": "text", "text": "hi", "marks": [{"type": "comment"}]}]
            })),
            icon: Some("star".to_string()),
            color: Some("#ff0000".to_string()),
            collection_id: Some(collection.id.clone()),
            publish: true,
            ..CreateDocument::default()
        },
    );
    let y = fixture.publish(&collection, Some(&x), "Y");
    let z = fixture.publish(&collection, Some(&x), "Z");
    let w = fixture.publish(&collection, Some(&y), "W");

    let duplicates = fixture
        .store
        .transaction(|tx| {
            document_duplicator(
                tx,
                &Context::new(&fixture.member),
                &x,
                DuplicateDocument {
                    title: Some("X copy".to_string()),
                    recursive: true,
                    ..DuplicateDocument::default()
                },
            )
        })
        .unwrap();

    assert_eq!(duplicates.len(), 4);
    let titles: Vec<&str> = duplicates.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["X copy", "Y", "W", "Z"]);

    let root = &duplicates[0];
    assert_eq!(root.text, "root text");
    assert_eq!(root.icon.as_deref(), Some("star"));
    assert_eq!(root.color.as_deref(), Some("#ff0000"));
    assert!(root.content.as_ref().unwrap()["content"][0].get("marks").is_none());
    assert_eq!(duplicates[1].text, y.text);
    assert_eq!(duplicates[1].parent_document_id, Some(root.id.clone()));
    assert_eq!(duplicates[2].parent_document_id, Some(duplicates[1].id.clone()));

    for duplicate in &duplicates {
        assert!(![&x.id, &y.id, &z.id, &w.id].contains(&&duplicate.id));
        assert!(!duplicate.is_draft());
    }
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_duplicate_into_other_collection_as_draft() {
    let fixture = Fixture::new();
    let source = fixture.collection("A", Some(CollectionPermission::ReadWrite));
    let target = fixture.collection("B", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&source, None, "Parent");
    let child = fixture.publish(&source, Some(&parent), "Child");

    let duplicates = fixture
        .store
        .transaction(|tx| {
            document_duplicator(
                tx,
                &Context::new(&fixture.admin),
                &child,
                DuplicateDocument {
                    collection_id: Some(target.id.clone()),
                    publish: Some(false),
                    ..DuplicateDocument::default()
                },
            )
        })
        .unwrap();

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].title, "Child");
    assert_eq!(duplicates[0].collection_id, Some(target.id.clone()));
    assert!(duplicates[0].parent_document_id.is_none());
    assert!(duplicates[0].is_draft());
    assert!(fixture.reload_collection(&target.id).document_structure.is_empty());
}

#[test]
fn test_duplicate_skips_archived_children_of_live_source() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    fixture.publish(&collection, Some(&parent), "Live");
    let stale = fixture.publish(&collection, Some(&parent), "Stale");

    fixture
        .store
        .transaction(|tx| document_archiver(tx, &Context::new(&fixture.admin), &stale))
        .unwrap();

    let duplicates = fixture
        .store
        .transaction(|tx| {
            document_duplicator(
                tx,
                &Context::new(&fixture.admin),
                &parent,
                DuplicateDocument {
                    recursive: true,
                    ..DuplicateDocument::default()
                },
            )
        })
        .unwrap();

    let titles: Vec<&str> = duplicates.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Parent", "Live"]);
}

#[test]
fn test_duplicate_archived_source_copies_only_archived_children() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    let child_a = fixture.publish(&collection, Some(&parent), "Child A");
    fixture.publish(&collection, Some(&child_a), "Child A1");
    fixture.publish(&collection, Some(&parent), "Child B");

    fixture
        .store
        .transaction(|tx| document_archiver(tx, &Context::new(&fixture.admin), &parent))
        .unwrap();
    let fresh = fixture.create(
        &fixture.admin,
        CreateDocument {
            title: "Fresh".to_string(),
            collection_id: Some(collection.id.clone()),
            parent_document_id: Some(parent.id.clone()),
            ..CreateDocument::default()
        },
    );
    assert!(!fresh.is_archived());

    let archived = fixture.reload_document(&parent.id);
    let duplicates = fixture
        .store
        .transaction(|tx| {
            document_duplicator(
                tx,
                &Context::new(&fixture.admin),
                &archived,
                DuplicateDocument {
                    recursive: true,
                    ..DuplicateDocument::default()
                },
            )
        })
        .unwrap();

    let titles: Vec<&str> = duplicates.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Parent", "Child A", "Child A1", "Child B"]);
    assert!(duplicates.iter().all(|d| !d.is_archived()));
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_publish_draft_into_collection() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let draft = fixture.draft(&fixture.member, None, "Idea");

    let published = fixture
        .store
        .transaction(|tx| {
            document_publisher(
                tx,
                &Context::new(&fixture.member),
                &draft,
                Some(&collection.id),
                None,
            )
        })
        .unwrap();

    assert!(!published.is_draft());
    assert_eq!(fixture.root_ids(&collection.id), vec![draft.id.clone()]);
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_archive_and_unarchive_round_trip() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let first = fixture.publish(&collection, None, "First");
    let parent = fixture.publish(&collection, None, "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");

    let archived = fixture
        .store
        .transaction(|tx| document_archiver(tx, &Context::new(&fixture.admin), &parent))
        .unwrap();
    assert_eq!(archived, vec![parent.id.clone(), child.id.clone()]);
    assert_eq!(fixture.root_ids(&collection.id), vec![first.id.clone()]);
    assert!(fixture.reload_document(&child.id).is_archived());
    fixture.assert_consistent(&collection.id);

    fixture
        .store
        .transaction(|tx| document_unarchiver(tx, &Context::new(&fixture.admin), &parent))
        .unwrap();

    let tree = fixture.reload_collection(&collection.id).document_structure;
    assert_eq!(tree.ids(), vec![first.id.clone(), parent.id.clone(), child.id.clone()]);
    assert!(!fixture.reload_document(&child.id).is_archived());
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_delete_and_restore_round_trip() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let parent = fixture.publish(&collection, None, "Parent");
    let child = fixture.publish(&collection, Some(&parent), "Child");
    let leaf = fixture.publish(&collection, Some(&child), "Leaf");

    let root = fixture
        .store
        .transaction(|tx| {
            grant_user_document(
                tx,
                &fixture.member.id,
                &parent.id,
                Permission::Read,
                &fixture.admin.id,
            )
        })
        .unwrap();

    let deleted = fixture
        .store
        .transaction(|tx| document_deleter(tx, &Context::new(&fixture.admin), &child))
        .unwrap();
    assert_eq!(deleted, vec![child.id.clone(), leaf.id.clone()]);
    assert!(fixture.store.get_document(&leaf.id).unwrap().is_none());
    assert_eq!(
        fixture.reload_collection(&collection.id).document_structure.ids(),
        vec![parent.id.clone()]
    );
    assert!(sourced_rows(&fixture, &child.id, &root).is_empty());
    fixture.assert_consistent(&collection.id);

    fixture
        .store
        .transaction(|tx| document_restorer(tx, &Context::new(&fixture.admin), &child))
        .unwrap();

    let tree = fixture.reload_collection(&collection.id).document_structure;
    assert_eq!(tree.ids(), vec![parent.id.clone(), child.id.clone(), leaf.id.clone()]);
    assert_eq!(sourced_rows(&fixture, &leaf.id, &root).len(), 1);
    fixture.assert_consistent(&collection.id);
}

#[test]
fn test_restore_requires_existing_collection() {
    let fixture = Fixture::new();
    let collection = fixture.collection("Handbook", Some(CollectionPermission::ReadWrite));
    let document = fixture.publish(&collection, None, "Doc");

    fixture
        .store
        .transaction(|tx| document_deleter(tx, &Context::new(&fixture.admin), &document))
        .unwrap();
    fixture.store.delete_collection(&collection.id).unwrap();

    let err = fixture
        .store
        .transaction(|tx| document_restorer(tx, &Context::new(&fixture.admin), &document))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound("collection")));
}
