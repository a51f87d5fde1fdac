//! End-to-end access control tests for cove.
//!
//! These tests drive the full stack: service operations mutate the
//! library, then resolution and tree output are checked from the point of
//! view of several actors.

use cove::access::{Capability, CapabilityResolver, EntityKind, TreeBuilder, TreeNode, TreeOptions};
use cove::file::{FileStorage, LibraryService, NewFolder};
use cove::{Actor, Database, ProductLink, StaticEntitlements};

use tempfile::TempDir;

async fn setup() -> (Database, TempDir) {
    let db = Database::open_in_memory().await.unwrap();
    let dir = TempDir::new().unwrap();
    (db, dir)
}

fn service<'a>(db: &'a Database, dir: &TempDir) -> LibraryService<'a> {
    LibraryService::new(db.pool(), FileStorage::new(dir.path()))
}

fn find(forest: &[TreeNode], id: i64) -> bool {
    forest
        .iter()
        .any(|n| n.id == id || find(&n.children, id))
}

/// A department library: staff see their subtree, a contractor sees one
/// file, and the administrator sees everything.
#[tokio::test]
async fn test_department_library_flow() {
    let (db, dir) = setup().await;
    let svc = service(&db, &dir);
    let admin = Actor::admin(1);

    let company = svc.create_folder(&admin, NewFolder::new("Company")).await.unwrap();
    let hr = svc
        .create_folder(&admin, NewFolder::new("HR").with_parent(company.id))
        .await
        .unwrap();
    let payroll = svc
        .create_folder(&admin, NewFolder::new("Payroll").with_parent(hr.id))
        .await
        .unwrap();
    let eng = svc
        .create_folder(&admin, NewFolder::new("Engineering").with_parent(company.id))
        .await
        .unwrap();

    svc.set_role_view_grants(&admin, EntityKind::Folder, hr.id, &["hr_staff".to_string()])
        .await
        .unwrap();

    let handbook = svc
        .add_file(&admin, hr.id, "handbook.pdf", "application/pdf", b"rules")
        .await
        .unwrap();
    let salaries = svc
        .add_file(&admin, payroll.id, "salaries.csv", "text/csv", b"1,2,3")
        .await
        .unwrap();

    let resolver = CapabilityResolver::new(db.pool());
    let staff = Actor::new(10, ["hr_staff"]);
    let engineer = Actor::new(11, ["engineer"]);

    // Grant on HR covers HR itself and descends to Payroll and the files
    assert_eq!(
        resolver
            .effective_capability(&staff, EntityKind::Folder, payroll.id)
            .await
            .unwrap(),
        Capability::View
    );
    assert_eq!(
        resolver
            .effective_capability(&staff, EntityKind::File, salaries.id)
            .await
            .unwrap(),
        Capability::View
    );
    assert_eq!(
        resolver
            .effective_capability(&engineer, EntityKind::File, handbook.id)
            .await
            .unwrap(),
        Capability::None
    );

    // A contractor is let into one file only
    svc.set_user_view_grants(&admin, EntityKind::File, handbook.id, &[99])
        .await
        .unwrap();
    let contractor = Actor::new(99, Vec::<String>::new());
    assert_eq!(
        resolver
            .effective_capability(&contractor, EntityKind::File, handbook.id)
            .await
            .unwrap(),
        Capability::View
    );
    // The contractor's grant says nothing about staff, who still reach
    // the file through the folder chain
    assert_eq!(
        resolver
            .effective_capability(&staff, EntityKind::File, handbook.id)
            .await
            .unwrap(),
        Capability::View
    );
    // The payroll file still inherits from the folder chain
    assert_eq!(
        resolver
            .effective_capability(&staff, EntityKind::File, salaries.id)
            .await
            .unwrap(),
        Capability::View
    );

    // Tree per actor
    let builder = TreeBuilder::new(db.pool(), TreeOptions::default());

    let staff_forest = builder.visible_tree(&staff).await.unwrap();
    assert!(find(&staff_forest, company.id));
    assert!(find(&staff_forest, hr.id));
    assert!(find(&staff_forest, payroll.id));
    assert!(!find(&staff_forest, eng.id));

    let engineer_forest = builder.visible_tree(&engineer).await.unwrap();
    assert!(engineer_forest.is_empty());

    let admin_forest = builder.visible_tree(&admin).await.unwrap();
    assert!(find(&admin_forest, eng.id));
}

/// Stored grants never yield upload; only ownership or admin reach manage.
#[tokio::test]
async fn test_grants_cap_at_view() {
    let (db, dir) = setup().await;
    let svc = service(&db, &dir);
    let admin = Actor::admin(1);

    let folder = svc
        .create_folder(&admin, NewFolder::new("Shared").with_owner(20))
        .await
        .unwrap();
    svc.set_role_view_grants(&admin, EntityKind::Folder, folder.id, &["editor".to_string()])
        .await
        .unwrap();

    let resolver = CapabilityResolver::new(db.pool());

    let editor = Actor::new(30, ["editor"]);
    let cap = resolver
        .effective_capability(&editor, EntityKind::Folder, folder.id)
        .await
        .unwrap();
    assert_eq!(cap, Capability::View);
    assert!(!cap.allows(Capability::Upload));

    let owner = Actor::new(20, Vec::<String>::new());
    assert_eq!(
        resolver
            .effective_capability(&owner, EntityKind::Folder, folder.id)
            .await
            .unwrap(),
        Capability::Manage
    );
}

/// A buyer sees a product file through entitlements, and it surfaces in no
/// tree because the reserved folder stays hidden.
#[tokio::test]
async fn test_product_documents() {
    let (db, dir) = setup().await;
    let svc = service(&db, &dir);
    let admin = Actor::admin(1);

    let docs = svc
        .create_folder(&admin, NewFolder::new("Product Docs"))
        .await
        .unwrap();
    let manual = svc
        .add_file(&admin, docs.id, "manual.pdf", "application/pdf", b"manual")
        .await
        .unwrap();

    let mut entitlements = StaticEntitlements::new();
    entitlements.link_file(manual.id, ProductLink::new(500));
    entitlements.grant_product(40, 500);

    let resolver = CapabilityResolver::new(db.pool()).with_entitlements(&entitlements);

    let buyer = Actor::new(40, Vec::<String>::new());
    assert_eq!(
        resolver
            .effective_capability(&buyer, EntityKind::File, manual.id)
            .await
            .unwrap(),
        Capability::View
    );
    // The containing folder grants the buyer nothing
    assert_eq!(
        resolver
            .effective_capability(&buyer, EntityKind::Folder, docs.id)
            .await
            .unwrap(),
        Capability::None
    );

    let options = TreeOptions {
        reserved_folder_id: docs.id,
    };
    let builder = TreeBuilder::new(db.pool(), options).with_entitlements(&entitlements);
    let forest = builder.visible_tree(&buyer).await.unwrap();
    assert!(!find(&forest, docs.id));

    let admin_forest = builder.visible_tree(&admin).await.unwrap();
    assert!(find(&admin_forest, docs.id));
}

/// Deleting a subtree removes rows, grants, and blobs; reorganizing with
/// moves keeps blobs readable and rejects cycles.
#[tokio::test]
async fn test_reorganize_and_delete() {
    let (db, dir) = setup().await;
    let svc = service(&db, &dir);
    let admin = Actor::admin(1);

    let archive = svc.create_folder(&admin, NewFolder::new("Archive")).await.unwrap();
    let y2025 = svc
        .create_folder(&admin, NewFolder::new("2025").with_parent(archive.id))
        .await
        .unwrap();
    let q1 = svc
        .create_folder(&admin, NewFolder::new("Q1").with_parent(y2025.id))
        .await
        .unwrap();

    let report = svc
        .add_file(&admin, q1.id, "report.txt", "text/plain", b"numbers")
        .await
        .unwrap();

    // Cycle rejected, tree untouched
    assert!(matches!(
        svc.move_folder(&admin, archive.id, q1.id).await,
        Err(cove::CoveError::CycleRejected)
    ));

    // Legal move: Q1 straight under Archive
    svc.move_folder(&admin, q1.id, archive.id).await.unwrap();
    let (_, data) = svc.read_file(report.id).await.unwrap();
    assert_eq!(data, b"numbers");

    // Move the file out before deleting the rest
    let keep = svc.create_folder(&admin, NewFolder::new("Keep")).await.unwrap();
    svc.move_file(&admin, report.id, keep.id).await.unwrap();

    let outcome = svc.delete_folder_subtree(&admin, archive.id).await.unwrap();
    assert_eq!(outcome.folders_deleted, 3);
    assert_eq!(outcome.files_deleted, 0);

    // The rescued file is intact
    let (record, data) = svc.read_file(report.id).await.unwrap();
    assert_eq!(record.folder_id, keep.id);
    assert_eq!(data, b"numbers");

    // Deleted folders are gone from resolution and the tree
    let resolver = CapabilityResolver::new(db.pool());
    assert_eq!(
        resolver
            .effective_capability(&Actor::new(5, ["any"]), EntityKind::Folder, q1.id)
            .await
            .unwrap(),
        Capability::None
    );
    let builder = TreeBuilder::new(db.pool(), TreeOptions::default());
    let forest = builder.visible_tree(&admin).await.unwrap();
    assert!(!find(&forest, archive.id));
    assert!(find(&forest, keep.id));
}
