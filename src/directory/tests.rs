#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::collections::VecDeque;

use super::*;
use crate::name::{MemberName, NamePolicy};
use crate::runner::CommandOutput;

const NOT_FOUND: &str = "The specified local group does not exist.\r\n\r\n\
                         More help is available by typing NET HELPMSG 3774.\r\n";

/// Canned responses, consumed in order; records every command it was given.
#[derive(Default)]
struct FakeExecutor {
    responses: RefCell<VecDeque<Result<CommandOutput, ExecutionError>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeExecutor {
    fn ok(self, stdout: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        }));
        self
    }

    fn fail(self, exit_code: i32, stderr: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(ExecutionError::Failed {
                command: "net localgroup".to_string(),
                exit_code,
                stderr: stderr.to_string(),
            }));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for &FakeExecutor {
    fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError> {
        self.calls.borrow_mut().push(command.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .expect("unexpected extra command")
    }
}

fn listing(names: &[&str]) -> String {
    let mut out = String::from("\r\nAliases for \\\\HOST\r\n\r\n");
    out.push_str(&"-".repeat(79));
    out.push_str("\r\n");
    for n in names {
        out.push('*');
        out.push_str(n);
        out.push_str("\r\n");
    }
    out.push_str("The command completed successfully.\r\n\r\n");
    out
}

fn details(name: &str, comment: &str, members: &[&str]) -> String {
    let mut out =
        format!("Alias name     {name}\r\nComment        {comment}\r\n\r\nMembers\r\n\r\n");
    out.push_str(&"-".repeat(79));
    out.push_str("\r\n");
    for m in members {
        out.push_str(m);
        out.push_str("\r\n");
    }
    out.push_str("The command completed successfully.\r\n\r\n");
    out
}

fn valid(name: &str) -> ValidName {
    NamePolicy::default().validate(name).unwrap()
}

// --- list_names ---

#[test]
fn list_names_runs_list_command() {
    let fake = FakeExecutor::default().ok(&listing(&["Administrators", "Users"]));
    let dir = GroupDirectory::new(&fake);
    assert_eq!(dir.list_names().unwrap(), vec!["Administrators", "Users"]);
    assert_eq!(fake.calls(), vec!["net localgroup"]);
}

#[test]
fn list_names_empty_host() {
    let fake = FakeExecutor::default().ok(&listing(&[]));
    let dir = GroupDirectory::new(&fake);
    assert!(dir.list_names().unwrap().is_empty());
}

#[test]
fn list_names_propagates_execution_error() {
    let fake =
        FakeExecutor::default().fail(2, "System error 5 has occurred.\r\n\r\nAccess is denied.");
    let dir = GroupDirectory::new(&fake);
    let err = dir.list_names().unwrap_err();
    assert!(matches!(err, DirectoryError::Execution(_)));
}

#[test]
fn list_names_not_found_text_is_still_an_error() {
    // Only detail lookups treat "does not exist" as an empty result.
    let fake = FakeExecutor::default().fail(2, NOT_FOUND);
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.list_names().unwrap_err(),
        DirectoryError::Execution(_)
    ));
}

#[test]
fn list_names_propagates_malformed_output() {
    let fake = FakeExecutor::default().ok("Aliases for \\\\HOST\r\nAdministrators\r\n");
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.list_names().unwrap_err(),
        DirectoryError::Malformed(_)
    ));
}

// --- get_group ---

#[test]
fn get_group_quotes_validated_name() {
    let fake = FakeExecutor::default().ok(&details("Remote Desktop Users", "Remote", &[]));
    let dir = GroupDirectory::new(&fake);
    let name = dir.validate("  Remote Desktop Users ").unwrap();
    dir.get_group(&name).unwrap();
    assert_eq!(fake.calls(), vec!["net localgroup \"Remote Desktop Users\""]);
}

#[test]
fn get_group_returns_record() {
    let fake = FakeExecutor::default().ok(&details(
        "Administrators",
        "Built-in group",
        &["Admin", r"CORP\Domain Admins"],
    ));
    let dir = GroupDirectory::new(&fake);
    let record = dir.get_group(&valid("Administrators")).unwrap().unwrap();
    assert_eq!(record.name, "Administrators");
    assert_eq!(record.comment.as_deref(), Some("Built-in group"));
    assert_eq!(
        record.members,
        vec![
            MemberName::new("Admin"),
            MemberName::new(r"CORP\Domain Admins")
        ]
    );
}

#[test]
fn get_group_not_found_is_none() {
    let fake = FakeExecutor::default().fail(2, NOT_FOUND);
    let dir = GroupDirectory::new(&fake);
    assert_eq!(dir.get_group(&valid("Nobody Would Name A Group This")).unwrap(), None);
}

#[test]
fn get_group_other_failure_is_error() {
    let fake = FakeExecutor::default().fail(2, "System error 5 has occurred.");
    let dir = GroupDirectory::new(&fake);
    let err = dir.get_group(&valid("Users")).unwrap_err();
    assert!(err.to_string().contains("System error 5"));
}

#[test]
fn get_group_spawn_failure_is_error() {
    let fake = FakeExecutor::default();
    fake.responses
        .borrow_mut()
        .push_back(Err(ExecutionError::Spawn {
            command: "net localgroup".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }));
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.get_group(&valid("Users")).unwrap_err(),
        DirectoryError::Execution(ExecutionError::Spawn { .. })
    ));
}

#[test]
fn get_group_malformed_output_is_error() {
    let fake = FakeExecutor::default().ok("Alias name     Users\r\n\r\nMembers\r\n\r\nbob\r\n");
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.get_group(&valid("Users")).unwrap_err(),
        DirectoryError::Malformed(_)
    ));
}

#[test]
fn custom_command_and_marker() {
    let mut config = Config::default();
    config.command.program = "net.exe".to_string();
    config.command.not_found_marker = "NET HELPMSG 3774".to_string();
    let fake = FakeExecutor::default().fail(2, NOT_FOUND);
    let dir = GroupDirectory::with_config(&fake, config);
    assert_eq!(dir.get_group(&valid("Users")).unwrap(), None);
    assert_eq!(fake.calls(), vec!["net.exe localgroup \"Users\""]);
}

// --- get_all_groups ---

#[test]
fn get_all_groups_in_listing_order() {
    let fake = FakeExecutor::default()
        .ok(&listing(&["Administrators", "Users"]))
        .ok(&details("Administrators", "Admins", &["Admin"]))
        .ok(&details("Users", "Users", &["bob", "alice"]));
    let dir = GroupDirectory::new(&fake);
    let all = dir.get_all_groups().unwrap();
    let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Administrators", "Users"]);
    assert_eq!(all[1].members.len(), 2);
    assert_eq!(
        fake.calls(),
        vec![
            "net localgroup",
            "net localgroup \"Administrators\"",
            "net localgroup \"Users\"",
        ]
    );
}

#[test]
fn get_all_groups_empty_host() {
    let fake = FakeExecutor::default().ok(&listing(&[]));
    let dir = GroupDirectory::new(&fake);
    assert!(dir.get_all_groups().unwrap().is_empty());
    assert_eq!(fake.calls().len(), 1);
}

#[test]
fn get_all_groups_aborts_on_first_failure() {
    let fake = FakeExecutor::default()
        .ok(&listing(&["A", "B", "C"]))
        .ok(&details("A", "a", &[]))
        .fail(2, "System error 5 has occurred.");
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.get_all_groups().unwrap_err(),
        DirectoryError::Execution(_)
    ));
    // C was never requested.
    assert_eq!(fake.calls().len(), 3);
}

#[test]
fn get_all_groups_aborts_on_malformed_details() {
    let fake = FakeExecutor::default()
        .ok(&listing(&["A", "B"]))
        .ok("garbage\r\n");
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.get_all_groups().unwrap_err(),
        DirectoryError::Malformed(_)
    ));
    assert_eq!(fake.calls().len(), 2);
}

#[test]
fn get_all_groups_vanished_group_is_error() {
    let fake = FakeExecutor::default()
        .ok(&listing(&["A", "Gone"]))
        .ok(&details("A", "a", &[]))
        .fail(2, NOT_FOUND);
    let dir = GroupDirectory::new(&fake);
    let err = dir.get_all_groups().unwrap_err();
    assert!(matches!(err, DirectoryError::Vanished(ref n) if n == "Gone"));
}

#[test]
fn get_all_groups_rejects_listed_name_breaking_policy() {
    let fake = FakeExecutor::default().ok(&listing(&["Bad\"Name"]));
    let dir = GroupDirectory::new(&fake);
    assert!(matches!(
        dir.get_all_groups().unwrap_err(),
        DirectoryError::InvalidListedName(NameError::DisallowedChar { ch: '"', .. })
    ));
    // Nothing beyond the listing ran.
    assert_eq!(fake.calls().len(), 1);
}
