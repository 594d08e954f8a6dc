use qanda_core::db::open_db_in_memory;
use qanda_core::{
    AskQuestionForm, ProfileService, QuestionService, RepoError, SqliteQuestionRepository,
    SqliteSubscriptionRepository, SqliteUserRepository, SubscriptionService, UserId,
};
use rusqlite::Connection;

#[test]
fn subscribe_is_idempotent_and_reversible() {
    let (conn, owner, question) = seed();
    let service = SubscriptionService::new(SqliteSubscriptionRepository::try_new(&conn).unwrap());

    assert!(!service.is_subscribed(owner, question).unwrap());
    assert!(service.subscribe(owner, question).unwrap());
    assert!(!service.subscribe(owner, question).unwrap());
    assert!(service.is_subscribed(owner, question).unwrap());
    assert_eq!(service.subscribers(question).unwrap(), vec![owner]);

    assert!(service.unsubscribe(owner, question).unwrap());
    assert!(!service.unsubscribe(owner, question).unwrap());
    assert!(service.subscribers(question).unwrap().is_empty());
}

#[test]
fn subscribe_to_missing_question_is_not_found() {
    let (conn, owner, _question) = seed();
    let service = SubscriptionService::new(SqliteSubscriptionRepository::try_new(&conn).unwrap());

    let err = service
        .subscribe(owner, uuid::Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "question",
            ..
        }
    ));
}

#[test]
fn new_answer_recipients_exclude_answer_author() {
    let (conn, owner, question) = seed();
    let follower = register(&conn, "follower");
    let author = register(&conn, "author");
    let service = SubscriptionService::new(SqliteSubscriptionRepository::try_new(&conn).unwrap());
    for user in [owner, follower, author] {
        service.subscribe(user, question).unwrap();
    }

    let mut recipients = service.new_answer_recipients(question, author).unwrap();
    recipients.sort();
    let mut expected = vec![owner, follower];
    expected.sort();
    assert_eq!(recipients, expected);
}

fn seed() -> (Connection, UserId, uuid::Uuid) {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner");
    let question = {
        let mut service =
            QuestionService::new(SqliteQuestionRepository::try_new(&mut conn).unwrap());
        service
            .ask_question(
                owner,
                &AskQuestionForm {
                    title: "Follow me".to_string(),
                    body: "Body".to_string(),
                    custom_tags: "follow,notify".to_string(),
                },
            )
            .unwrap()
            .uuid
    };
    (conn, owner, question)
}

fn register(conn: &Connection, username: &str) -> UserId {
    let service = ProfileService::new(SqliteUserRepository::try_new(conn).unwrap());
    service
        .register_user(username, format!("{username}@example.com"))
        .unwrap()
        .uuid
}
