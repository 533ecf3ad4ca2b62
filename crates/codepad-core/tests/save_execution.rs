//! Save-execution contract tests
//!
//! Collaborators are mocked so the tests can assert which of them were
//! touched, not just what came back.

use async_trait::async_trait;
use codepad_core::*;
use mockall::mock;
use mockall::predicate::eq;
use std::sync::Arc;

mock! {
    pub Directory {}

    #[async_trait]
    impl UserDirectory for Directory {
        async fn find_user_by_subject(&self, subject: &SubjectId) -> Result<Option<User>, StorageError>;
    }
}

mock! {
    pub Store {}

    #[async_trait]
    impl ExecutionStore for Store {
        async fn insert(&self, execution: NewExecution) -> Result<RecordId, StorageError>;
        async fn list_by_owner(
            &self,
            owner: &SubjectId,
            limit: usize,
        ) -> Result<Vec<ExecutionRecord>, StorageError>;
    }
}

fn service(directory: MockDirectory, store: MockStore) -> ExecutionService {
    ExecutionService::new(Arc::new(directory), Arc::new(store))
}

fn u1() -> AuthContext {
    AuthContext::authenticated(SubjectId::new("u1"))
}

#[tokio::test]
async fn test_unauthenticated_touches_no_collaborator() {
    let mut directory = MockDirectory::new();
    directory.expect_find_user_by_subject().never();
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&AuthContext::anonymous(), SaveExecutionInput::new("python", "print(1)"))
        .await;

    assert!(matches!(result, Err(ExecutionError::Unauthenticated)));
}

#[tokio::test]
async fn test_unauthenticated_checked_before_input_validation() {
    let mut directory = MockDirectory::new();
    directory.expect_find_user_by_subject().never();
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&AuthContext::anonymous(), SaveExecutionInput::new("", ""))
        .await;

    assert!(matches!(result, Err(ExecutionError::Unauthenticated)));
}

#[tokio::test]
async fn test_javascript_allowed_without_user_record() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .with(eq(SubjectId::new("u1")))
        .times(1)
        .returning(|_| Ok(None));
    let mut store = MockStore::new();
    store
        .expect_insert()
        .withf(|e| e.owner().as_str() == "u1" && e.language().as_str() == "javascript")
        .times(1)
        .returning(|_| Ok(RecordId::new()));

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("javascript", "console.log(1)"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_javascript_allowed_for_free_user() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .returning(|s| Ok(Some(User::free(s.clone()))));
    let mut store = MockStore::new();
    store.expect_insert().times(1).returning(|_| Ok(RecordId::new()));

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("javascript", "1 + 1"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_missing_user_denied_paid_language() {
    let mut directory = MockDirectory::new();
    directory.expect_find_user_by_subject().times(1).returning(|_| Ok(None));
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("python", "print(1)"))
        .await;

    match result {
        Err(ExecutionError::Unauthorized { language }) => assert_eq!(language, "python"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_padded_free_language_is_not_free() {
    let mut directory = MockDirectory::new();
    directory.expect_find_user_by_subject().times(1).returning(|_| Ok(None));
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new(" javascript ", "1"))
        .await;

    match result {
        Err(ExecutionError::Unauthorized { language }) => assert_eq!(language, " javascript "),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_language_and_subject_stored_as_sent() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .with(eq(SubjectId::new(" u1 ")))
        .returning(|s| Ok(Some(User::entitled(s.clone()))));
    let mut store = MockStore::new();
    store
        .expect_insert()
        .withf(|e| e.owner().as_str() == " u1 " && e.language().as_str() == "Python ")
        .times(1)
        .returning(|_| Ok(RecordId::new()));

    let result = service(directory, store)
        .save_execution(
            &AuthContext::from_subject(Some(" u1 ")),
            SaveExecutionInput::new("Python ", "print(1)"),
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_free_user_denied_paid_language() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .returning(|s| Ok(Some(User::free(s.clone()))));
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("cpp", "int main() {}"))
        .await;

    assert!(matches!(result, Err(ExecutionError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_entitled_user_persists_with_authenticated_owner() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .returning(|s| Ok(Some(User::entitled(s.clone()))));
    let mut store = MockStore::new();
    store
        .expect_insert()
        .withf(|e| {
            e.owner().as_str() == "u1"
                && e.language().as_str() == "python"
                && e.code() == "print(1)"
                && e.output() == Some("1\n")
                && e.error().is_none()
        })
        .times(1)
        .returning(|_| Ok(RecordId::new()));

    let input = SaveExecutionInput::new("python", "print(1)").with_output("1\n");
    let result = service(directory, store).save_execution(&u1(), input).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_owner_field_in_payload_is_ignored() {
    let payload = r#"{
        "language": "python",
        "code": "print(1)",
        "userId": "mallory",
        "ownerSubjectId": "mallory"
    }"#;
    let input: SaveExecutionInput = serde_json::from_str(payload).unwrap();

    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .with(eq(SubjectId::new("u1")))
        .returning(|s| Ok(Some(User::entitled(s.clone()))));
    let mut store = MockStore::new();
    store
        .expect_insert()
        .withf(|e| e.owner().as_str() == "u1")
        .times(1)
        .returning(|_| Ok(RecordId::new()));

    assert!(service(directory, store).save_execution(&u1(), input).await.is_ok());
}

#[tokio::test]
async fn test_directory_failure_passes_through() {
    let mut directory = MockDirectory::new();
    directory
        .expect_find_user_by_subject()
        .returning(|_| Err(StorageError::Unavailable("replica down".to_string())));
    let mut store = MockStore::new();
    store.expect_insert().never();

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("javascript", "1"))
        .await;

    assert!(matches!(
        result,
        Err(ExecutionError::Storage(StorageError::Unavailable(ref msg))) if msg == "replica down"
    ));
}

#[tokio::test]
async fn test_store_failure_passes_through() {
    let mut directory = MockDirectory::new();
    directory.expect_find_user_by_subject().returning(|_| Ok(None));
    let mut store = MockStore::new();
    store
        .expect_insert()
        .times(1)
        .returning(|_| Err(StorageError::WriteFailed("quota".to_string())));

    let result = service(directory, store)
        .save_execution(&u1(), SaveExecutionInput::new("javascript", "1"))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ExecutionError::Storage(StorageError::WriteFailed(_))));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_identical_calls_create_distinct_records() {
    let store = Arc::new(InMemoryExecutionStore::new());
    let service = ExecutionService::new(Arc::new(InMemoryUserDirectory::new()), store.clone());
    let input = SaveExecutionInput::new("javascript", "console.log('hi')").with_output("hi");

    let first = service.save_execution(&u1(), input.clone()).await.unwrap();
    let second = service.save_execution(&u1(), input).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_read_after_write_for_caller() {
    let directory = Arc::new(InMemoryUserDirectory::with_users([User::entitled(SubjectId::new(
        "u1",
    ))]));
    let service = ExecutionService::new(directory, Arc::new(InMemoryExecutionStore::new()));

    let id = service
        .save_execution(&u1(), SaveExecutionInput::new("rust", "fn main() {}").with_error("E0601"))
        .await
        .unwrap();

    let records = service.list_executions(&u1(), 10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].error.as_deref(), Some("E0601"));
}

#[tokio::test]
async fn test_custom_free_tier() {
    let service = ExecutionService::with_policy(
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryExecutionStore::new()),
        FreeTierPolicy::default().with_language("python"),
    );

    assert!(service
        .save_execution(&u1(), SaveExecutionInput::new("python", "print(1)"))
        .await
        .is_ok());
    assert!(matches!(
        service.save_execution(&u1(), SaveExecutionInput::new("go", "")).await,
        Err(ExecutionError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_callers_do_not_interfere() {
    let store = Arc::new(InMemoryExecutionStore::new());
    let directory = Arc::new(InMemoryUserDirectory::with_users([User::entitled(SubjectId::new(
        "paid",
    ))]));
    let service = ExecutionService::new(directory, store.clone());

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let (subject, language) = if i % 2 == 0 { ("paid", "python") } else { ("free", "python") };
            service
                .save_execution(
                    &AuthContext::authenticated(SubjectId::new(subject)),
                    SaveExecutionInput::new(language, format!("print({i})")),
                )
                .await
        }));
    }

    let mut ok = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ExecutionError::Unauthorized { .. }) => denied += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ok, 16);
    assert_eq!(denied, 16);
    assert!(store.all_records().iter().all(|r| r.owner.as_str() == "paid"));
}

#[tokio::test]
async fn test_interleaved_saves_on_one_task() {
    let store = Arc::new(InMemoryExecutionStore::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let service = ExecutionService::new(directory, store.clone());
    let auth = AuthContext::authenticated(SubjectId::new("u1"));

    let saves = (0..8).map(|i| {
        service.save_execution(&auth, SaveExecutionInput::new("javascript", format!("log({i})")))
    });
    let ids: Vec<RecordId> = futures::future::join_all(saves)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 8);
    assert_eq!(store.len(), 8);
}
