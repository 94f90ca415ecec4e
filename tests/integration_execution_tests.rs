//! # Execution Engine Integration Tests / 执行引擎集成测试
//!
//! End-to-end tests that drive `execute` over real dataset files: the
//! continue-on-failure loop, the terminal structural failures, the
//! diagnostic-capture hook, and the report tooling.
//!
//! 端到端测试，针对真实数据集文件驱动 `execute`：
//! 继续失败循环、终止性的结构失败、诊断捕获钩子和报告工具。

use std::path::PathBuf;
use table_runner::core::dispatch::InvokeError;
use table_runner::reporting::generate_json_report;
use table_runner::{execute, Fixture, ProcedureRegistry, ReadOptions};

/// A stand-in for the embedding application's test context: it counts what
/// the procedures did to it, including diagnostic captures.
///
/// 嵌入方应用测试上下文的替身：统计过程对它做了什么，包括诊断捕获。
#[derive(Default)]
struct Crm {
    created: Vec<(String, String)>,
    invocations: usize,
    screenshots: usize,
}

impl Fixture for Crm {
    fn capture_diagnostics(&mut self) {
        self.screenshots += 1;
    }
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scratch(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A two-argument procedure that fails whenever its first cell is "a".
fn registry_with_foo() -> ProcedureRegistry<Crm> {
    let mut registry = ProcedureRegistry::new();
    registry.register("foo", 2, |crm: &mut Crm, row: &[String]| {
        crm.invocations += 1;
        anyhow::ensure!(row[0] != "a", "first argument must not be 'a'");
        crm.created.push((row[0].clone(), row[1].clone()));
        Ok(())
    });
    registry
}

#[cfg(test)]
mod csv_run_tests {
    use super::*;

    #[test]
    fn test_failing_row_is_reported_and_later_rows_still_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "pairs.csv", "a,b\nc,d\n");
        let options = ReadOptions {
            quote: None,
            ..ReadOptions::default()
        };
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &options);

        assert_eq!(
            report.entries(),
            ["Error in row 1 of 2: first argument must not be 'a'"]
        );
        // The failing first row did not stop the second one.
        assert_eq!(crm.invocations, 2);
        assert_eq!(crm.created, vec![("c".to_string(), "d".to_string())]);
        assert_eq!(report.rows_executed(), 2);
    }

    #[test]
    fn test_every_row_is_attempted_despite_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "five.csv", "ok,1\na,2\nok,3\nok,4\na,5\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert_eq!(crm.invocations, 5);
        assert_eq!(report.failure_count(), 2);
        assert!(report.entries()[0].starts_with("Error in row 2 of 5: "));
        assert!(report.entries()[1].starts_with("Error in row 5 of 5: "));
    }

    #[test]
    fn test_clean_run_returns_an_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "clean.csv", "c,d\ne,f\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert!(report.is_success());
        assert_eq!(report.failure_summary(), None);
        assert_eq!(report.rows_executed(), 2);
    }

    #[test]
    fn test_header_only_file_reports_no_data_and_invokes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "header_only.csv", "first,last\n");
        let options = ReadOptions {
            has_header: true,
            ..ReadOptions::default()
        };
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &options);

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("no data"));
        assert_eq!(crm.invocations, 0);
        assert_eq!(report.rows_executed(), 0);
    }
}

#[cfg(test)]
mod structural_failure_tests {
    use super::*;

    #[test]
    fn test_unresolvable_procedure_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "pairs.csv", "a,b\nc,d\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "missing", &ReadOptions::default());

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0]
            .contains("the procedure name ('missing') or the number of parameters (2)"));
        assert_eq!(crm.invocations, 0);
    }

    #[test]
    fn test_arity_mismatch_with_the_dataset_width_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        // Three columns, but "foo" is registered with two parameters.
        let path = scratch(&dir, "triples.csv", "a,b,c\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("number of parameters (3)"));
        assert_eq!(crm.invocations, 0);
    }

    #[test]
    fn test_restricted_procedure_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "pairs.csv", "c,d\n");
        let mut registry = registry_with_foo();
        registry.restrict("foo", 2);
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("access to the procedure 'foo' is restricted"));
        assert_eq!(crm.invocations, 0);
    }

    #[test]
    fn test_unreadable_file_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("error reading the file"));
        assert_eq!(crm.invocations, 0);
    }

    #[test]
    fn test_unsupported_format_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "data.txt", "a,b\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("the file format must be csv, xls or xlsx"));
    }
}

#[cfg(test)]
mod excel_run_tests {
    use super::*;

    /// Registers a three-argument procedure that requires every cell to be
    /// non-empty, mirroring a contact-creation check.
    fn registry_with_create_contact() -> ProcedureRegistry<Crm> {
        let mut registry = ProcedureRegistry::new();
        registry.register("create_contact", 3, |crm: &mut Crm, row: &[String]| {
            crm.invocations += 1;
            anyhow::ensure!(!row[1].is_empty(), "the last name is missing");
            anyhow::ensure!(!row[2].is_empty(), "the phone is missing");
            crm.created.push((row[0].clone(), row[1].clone()));
            Ok(())
        });
        registry
    }

    #[test]
    fn test_excel_run_collects_failures_and_fires_diagnostics() {
        let options = ReadOptions {
            has_header: true,
            ..ReadOptions::default()
        };
        let registry = registry_with_create_contact();
        let mut crm = Crm::default();

        let report = execute(
            &registry,
            &mut crm,
            fixture_path("contacts.xlsx"),
            "create_contact",
            &options,
        );

        // Rows: Ada/Lovelace/1815.0 passes, Grace/Hopper/<empty> and
        // Linus/<empty>/1969 fail.
        assert_eq!(crm.invocations, 3);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(
            report.entries()[0],
            "Error in row 2 of 3: the phone is missing"
        );
        assert_eq!(
            report.entries()[1],
            "Error in row 3 of 3: the last name is missing"
        );
        // One diagnostic capture per failed row, none for the clean row.
        assert_eq!(crm.screenshots, 2);
        assert_eq!(
            crm.created,
            vec![("Ada".to_string(), "Lovelace".to_string())]
        );
    }

    #[test]
    fn test_header_only_sheet_reports_no_data() {
        let options = ReadOptions {
            has_header: true,
            ..ReadOptions::default()
        };
        let registry = registry_with_create_contact();
        let mut crm = Crm::default();

        let report = execute(
            &registry,
            &mut crm,
            fixture_path("header_only.xlsx"),
            "create_contact",
            &options,
        );

        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0].contains("no data"));
        assert_eq!(crm.invocations, 0);
    }
}

#[cfg(test)]
mod report_tooling_tests {
    use super::*;

    #[test]
    fn test_failure_summary_follows_the_standard_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "pairs.csv", "a,b\na,d\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        let summary = report.failure_summary().unwrap();
        assert!(summary.starts_with("2 errors: ["));
        assert!(summary.contains("Error in row 1 of 2"));
        assert!(summary.contains("Error in row 2 of 2"));
    }

    #[test]
    fn test_json_report_round_trips_entries_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "pairs.csv", "a,b\nc,d\n");
        let registry = registry_with_foo();
        let mut crm = Crm::default();
        let report = execute(&registry, &mut crm, &path, "foo", &ReadOptions::default());

        let output = dir.path().join("reports").join("run.json");
        generate_json_report(&report, &output).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["rows_executed"], 2);
        assert_eq!(
            value["entries"][0],
            "Error in row 1 of 2: first argument must not be 'a'"
        );
    }

    #[test]
    fn test_registered_procedures_can_refuse_binding_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "numbers.csv", "1\nnot-a-number\n3\n");
        let mut registry = ProcedureRegistry::new();
        registry.register("count_up", 1, |crm: &mut Crm, row: &[String]| {
            crm.invocations += 1;
            row[0]
                .parse::<u32>()
                .map_err(|e| InvokeError::bad_argument(e.to_string()))?;
            Ok::<(), InvokeError>(())
        });
        let mut crm = Crm::default();

        let report = execute(&registry, &mut crm, &path, "count_up", &ReadOptions::default());

        // The bad row is recorded and the loop continues to the third row.
        assert_eq!(crm.invocations, 3);
        assert_eq!(report.failure_count(), 1);
        assert!(report.entries()[0]
            .contains("illegal argument invoking the procedure 'count_up'"));
    }
}
