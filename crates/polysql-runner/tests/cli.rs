//! End-to-end runs of the `polysql` binary.

mod common;

use std::path::Path;
use std::process::{Command, Output};

use polysql_runner::loader::parse_schema;

fn polysql(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_polysql"))
        .args(args)
        .env_remove("POLYSQL_VENDOR")
        .env_remove("DATABASE_URL")
        .output()
        .expect("Failed to run polysql")
}

fn write_shop(dir: &Path) -> String {
    let path = dir.join("shop.json");
    std::fs::write(&path, common::SHOP).unwrap();
    path.display().to_string()
}

#[test]
fn test_ddl_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_shop(dir.path());

    let output = polysql(&["ddl", "--vendor", "postgresql", "--schema", &schema]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let script = String::from_utf8(output.stdout).unwrap();
    assert!(script.starts_with("DROP TABLE IF EXISTS \"line\""));
    assert!(script.contains("CREATE TYPE \"customer_tier\""));
    assert!(script.contains("\"id\" BIGSERIAL NOT NULL"));
}

#[test]
fn test_ddl_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_shop(dir.path());
    let out = dir.path().join("shop.sql");

    let output = polysql(&[
        "ddl",
        "--vendor",
        "mysql",
        "--schema",
        &schema,
        "--output",
        &out.display().to_string(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let script = std::fs::read_to_string(out).unwrap();
    assert!(script.contains("CREATE TABLE `customer`"));
    assert!(script.contains("AUTO_INCREMENT"));
}

#[test]
fn test_unknown_vendor_fails() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_shop(dir.path());

    let output = polysql(&["ddl", "--vendor", "db2", "--schema", &schema]);
    assert!(!output.status.success());
}

#[test]
fn test_apply_then_introspect() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_shop(dir.path());
    let database = format!("sqlite:{}?mode=rwc", dir.path().join("shop.db").display());

    let output = polysql(&["apply", "--database", &database, "--schema", &schema]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = polysql(&["introspect", "--database", &database]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let live = parse_schema(&String::from_utf8(output.stdout).unwrap()).unwrap();
    let names: Vec<&str> = live.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["customer", "product", "purchase", "line"]);
}

#[test]
fn test_vendors_lists_registry() {
    let output = polysql(&["vendors"]);
    assert!(output.status.success());
    let listing = String::from_utf8(output.stdout).unwrap();
    assert_eq!(listing.lines().count(), 6);
}
