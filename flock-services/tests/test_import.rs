//! Pipe-delimited member import end to end.

mod common;

use std::io::Write;

use common::create_test_db;
use flock_models::{EducationLevel, Involvement, MaritalStatus};
use flock_services::{ImportService, MemberService};

const HEADER: &str =
    "first|last|email|phone|marital|children|household|occupation|education|involvement|disabilities";

#[test]
fn test_import_skips_malformed_line() {
    let (db, _dir) = create_test_db();
    let text = format!(
        "{HEADER}\n\
         Thabo|Nkosi|thabo@example.org|+27821110000|Married|2|4|Teacher|College|Server|No\n\
         Anna|Botha|anna@example.org|+27822220000|Single|0|1|Nurse|Matric|Congregant|No\n\
         Bad|Line|bad@example.org|+27823330000|Married|1|3|Clerk|College\n"
    );

    let report = ImportService::new(db.clone()).import_str(&text).unwrap();
    assert_eq!(report.imported.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 4);
    assert!(report.rejected.is_empty());

    let members = MemberService::new(db);
    assert_eq!(members.list_members().unwrap().count(), 2);

    let thabo = members.find_by_email("thabo@example.org").unwrap().unwrap();
    let profile = members.get_profile(thabo.id.unwrap()).unwrap().unwrap();
    let demo = profile.demographics.unwrap();
    assert_eq!(demo.marital_status, Some(MaritalStatus::Married));
    assert_eq!(demo.children, 2);
    assert_eq!(demo.education_level, Some(EducationLevel::College));
    assert_eq!(demo.involvement, Some(Involvement::Server));
}

#[test]
fn test_import_rejects_duplicate_email() {
    let (db, _dir) = create_test_db();
    let text = format!(
        "{HEADER}\n\
         Thabo|Nkosi|thabo@example.org||Married|2|4||College|Server|No\n\
         Thabo|Other|thabo@example.org||Married|2|4||College|Server|No\n"
    );

    let report = ImportService::new(db.clone()).import_str(&text).unwrap();
    assert_eq!(report.imported.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].line, 3);
    assert_eq!(db.stats().unwrap().demographics, 1);
}

#[test]
fn test_import_file() {
    let (db, dir) = create_test_db();
    let path = dir.path().join("members.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "Lerato|Dlamini|||Widowed||||Post Grad|Officer|Yes").unwrap();
    drop(file);

    let report = ImportService::new(db.clone()).import_file(&path).unwrap();
    assert_eq!(report.imported.len(), 1);
    assert_eq!(db.stats().unwrap().members, 1);
}

#[test]
fn test_import_missing_file_fails() {
    let (db, dir) = create_test_db();
    let result = ImportService::new(db).import_file(&dir.path().join("absent.txt"));
    assert!(result.is_err());
}

#[test]
fn test_import_file_skips_line_that_is_not_utf8() {
    let (db, dir) = create_test_db();
    let path = dir.path().join("latin1.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "Thabo|Nkosi|thabo@example.org|+27821110000|Married|2|4|Teacher|College|Server|No").unwrap();
    file.write_all(b"Jos\xe9|Silva|jose@example.org|+27824440000|Married|1|3||College|Congregant|No\n")
        .unwrap();
    writeln!(file, "Anna|Botha|anna@example.org|+27822220000|Single|0|1|Nurse|Matric|Congregant|No").unwrap();
    drop(file);

    let report = ImportService::new(db.clone()).import_file(&path).unwrap();
    assert_eq!(report.imported.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 3);
    assert!(report.skipped[0].reason.contains("UTF-8"));

    let members = MemberService::new(db);
    assert_eq!(members.list_members().unwrap().count(), 2);
    assert!(members.find_by_email("jose@example.org").unwrap().is_none());
}
