use std::path::PathBuf;

use todo_store::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let full = Error::CapacityExceeded { limit: 10 };
    assert_eq!(full.exit_code(), exit_codes::USER_ERROR);

    let locked = Error::LockFailed(PathBuf::from("todos.json.lock"));
    assert_eq!(locked.exit_code(), exit_codes::STORE_UNAVAILABLE);

    let io = Error::Storage {
        path: PathBuf::from("todos.json"),
        source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
    };
    assert_eq!(io.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(io.kind(), "storage");
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::NotFound {
        operation: "update",
        id: 3,
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.error, "update: task 3 not found");
    let details = json.details.expect("details");
    assert_eq!(details["operation"], "update");
    assert_eq!(details["id"], 3);
}

#[test]
fn corrupt_storage_names_both_files() {
    let err = Error::StorageCorrupt {
        path: PathBuf::from("todos.json"),
        backup: PathBuf::from("todos.json.bak"),
        reason: "expected value at line 1".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("todos.json"));
    assert!(message.contains("todos.json.bak"));
    assert_eq!(err.kind(), "storage_corrupt");
}
