//! CLI integration tests for the folio binary.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir_str(&self) -> String {
        self.temp_dir.path().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("folio").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .args(["--data-dir", &self.data_dir_str()]);
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd().arg("init").assert()
    }

    /// Runs a command that prints `...: <id>` and returns the id.
    fn create(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().expect("failed to run command");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        parse_id(&String::from_utf8_lossy(&output.stdout))
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().expect("failed to run command");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    /// Initializes a data directory with a team, an admin and a collection.
    fn seeded() -> (Self, Seed) {
        let ctx = Self::new();
        ctx.init().success();

        let team = ctx.create(&["team", "create", "--name", "Acme"]);
        let admin = ctx.create(&[
            "user", "create", "--team", &team, "--name", "Ada", "--role", "admin",
        ]);
        let collection =
            ctx.create(&["collection", "create", "--as", &admin, "--name", "Handbook"]);

        (
            ctx,
            Seed {
                team,
                admin,
                collection,
            },
        )
    }

    fn publish(&self, seed: &Seed, title: &str, parent: Option<&str>) -> String {
        let mut args = vec![
            "document",
            "create",
            "--as",
            &seed.admin,
            "--title",
            title,
            "--collection",
            &seed.collection,
            "--publish",
        ];
        if let Some(parent) = parent {
            args.extend(["--parent", parent]);
        }
        self.create(&args)
    }

    fn tree(&self, seed: &Seed) -> Value {
        self.json(&[
            "collection",
            "tree",
            "--as",
            &seed.admin,
            "--collection",
            &seed.collection,
            "--json",
        ])
    }
}

struct Seed {
    team: String,
    admin: String,
    collection: String,
}

fn parse_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.rsplit_once(": ").map(|(_, id)| id.trim().to_string()))
        .expect("no id in output")
}

#[test]
fn test_init_creates_config_and_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized folio"));

    assert!(ctx.temp_dir.path().join("folio.toml").exists());
    assert!(ctx.temp_dir.path().join("folio.db").exists());
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("Already initialized"));
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["team", "create", "--name", "Acme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("folio init"));
}

#[test]
fn test_team_and_user_create() {
    let ctx = TestContext::new();
    ctx.init().success();

    let team = ctx.create(&["team", "create", "--name", "Acme"]);

    ctx.cmd()
        .args(["user", "create", "--team", &team, "--name", "Grace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created member \"Grace\""));
}

#[test]
fn test_user_create_rejects_unknown_role() {
    let ctx = TestContext::new();
    ctx.init().success();
    let team = ctx.create(&["team", "create", "--name", "Acme"]);

    ctx.cmd()
        .args(["user", "create", "--team", &team, "--name", "Grace", "--role", "owner"])
        .assert()
        .failure();
}

#[test]
fn test_document_create_and_tree() {
    let (ctx, seed) = TestContext::seeded();

    let parent = ctx.publish(&seed, "Onboarding", None);
    let child = ctx.publish(&seed, "First week", Some(&parent));

    let tree = ctx.tree(&seed);
    assert_eq!(tree[0]["id"], parent.as_str());
    assert_eq!(tree[0]["children"][0]["id"], child.as_str());

    ctx.cmd()
        .args(["collection", "tree", "--as", &seed.admin, "--collection", &seed.collection])
        .assert()
        .success()
        .stdout(predicate::str::contains("Handbook"))
        .stdout(predicate::str::contains("    - First week"));
}

#[test]
fn test_document_move_json() {
    let (ctx, seed) = TestContext::seeded();
    let first = ctx.publish(&seed, "First", None);
    let second = ctx.publish(&seed, "Second", None);

    let outcome = ctx.json(&[
        "document",
        "move",
        "--as",
        &seed.admin,
        "--document",
        &second,
        "--collection",
        &seed.collection,
        "--parent",
        &first,
        "--json",
    ]);
    assert_eq!(outcome["collectionChanged"], false);
    assert_eq!(outcome["documents"][0]["id"], second.as_str());

    let tree = ctx.tree(&seed);
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["children"][0]["id"], second.as_str());

    ctx.cmd()
        .args(["collection", "verify", "--collection", &seed.collection])
        .assert()
        .success()
        .stdout(predicate::str::contains("is consistent"));
}

#[test]
fn test_document_move_into_descendant_fails() {
    let (ctx, seed) = TestContext::seeded();
    let parent = ctx.publish(&seed, "Parent", None);
    let child = ctx.publish(&seed, "Child", Some(&parent));

    ctx.cmd()
        .args([
            "document",
            "move",
            "--as",
            &seed.admin,
            "--document",
            &parent,
            "--collection",
            &seed.collection,
            "--parent",
            &child,
        ])
        .assert()
        .failure();

    let tree = ctx.tree(&seed);
    assert_eq!(tree[0]["id"], parent.as_str());
}

#[test]
fn test_viewer_cannot_create_documents() {
    let (ctx, seed) = TestContext::seeded();
    let viewer = ctx.create(&[
        "user", "create", "--team", &seed.team, "--name", "Linus", "--role", "viewer",
    ]);

    ctx.cmd()
        .args([
            "document",
            "create",
            "--as",
            &viewer,
            "--title",
            "Nope",
            "--collection",
            &seed.collection,
            "--publish",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forbidden"));
}

#[test]
fn test_duplicate_recursive() {
    let (ctx, seed) = TestContext::seeded();
    let parent = ctx.publish(&seed, "Parent", None);
    ctx.publish(&seed, "Child", Some(&parent));

    ctx.cmd()
        .args([
            "document",
            "duplicate",
            "--as",
            &seed.admin,
            "--document",
            &parent,
            "--title",
            "Parent copy",
            "--recursive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created \"Parent copy\""))
        .stdout(predicate::str::contains("Created \"Child\""));

    let tree = ctx.tree(&seed);
    assert_eq!(tree.as_array().unwrap().len(), 2);
    assert_eq!(tree[1]["title"], "Parent copy");
    assert_eq!(tree[1]["children"].as_array().unwrap().len(), 1);
}

#[test]
fn test_delete_and_restore() {
    let (ctx, seed) = TestContext::seeded();
    let parent = ctx.publish(&seed, "Parent", None);
    ctx.publish(&seed, "Child", Some(&parent));

    ctx.cmd()
        .args(["document", "delete", "--as", &seed.admin, "--document", &parent])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 documents)"));
    assert_eq!(ctx.tree(&seed).as_array().unwrap().len(), 0);

    ctx.cmd()
        .args(["document", "restore", "--as", &seed.admin, "--document", &parent])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored \"Parent\""));

    let tree = ctx.tree(&seed);
    assert_eq!(tree[0]["id"], parent.as_str());
    assert_eq!(tree[0]["children"].as_array().unwrap().len(), 1);
}

#[test]
fn test_grant_opens_private_collection() {
    let (ctx, seed) = TestContext::seeded();
    let member = ctx.create(&["user", "create", "--team", &seed.team, "--name", "Grace"]);
    let private = ctx.create(&[
        "collection",
        "create",
        "--as",
        &seed.admin,
        "--name",
        "Board",
        "--permission",
        "private",
    ]);

    let before = ctx.json(&["abilities", "--as", &member, "--collection", &private]);
    assert_eq!(before["read"], false);

    ctx.cmd()
        .args([
            "grant",
            "--as",
            &seed.admin,
            "--user",
            &member,
            "--collection",
            &private,
            "--permission",
            "read_write",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Granted read_write"));

    let after = ctx.json(&["abilities", "--as", &member, "--collection", &private]);
    assert_eq!(after["read"], true);
    assert_eq!(after["updateDocument"], true);

    ctx.cmd()
        .args(["revoke", "--as", &seed.admin, "--user", &member, "--collection", &private])
        .assert()
        .success()
        .stdout(predicate::str::contains("Revoked membership"));
}

#[test]
fn test_abilities_for_team() {
    let (ctx, seed) = TestContext::seeded();

    let abilities = ctx.json(&["abilities", "--as", &seed.admin]);
    assert_eq!(abilities["createCollection"], true);
    assert_eq!(abilities["delete"], true);
}
