use qanda_core::db::open_db_in_memory;
use qanda_core::{
    AnswerId, AnswerService, AskQuestionForm, CommentId, CommentService, CommentServiceError,
    CommentValidationError, ProfileService, Publishable, QuestionService, RepoError,
    SqliteAnswerRepository, SqliteCommentRepository, SqliteQuestionRepository,
    SqliteUserRepository, UserId,
};
use rusqlite::Connection;

#[test]
fn add_comment_persists_and_lists_oldest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let (asker, answer) = seed_answer(&mut conn);
    let helper = register(&conn, "commenter");
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let first = service.add_comment(asker, answer, "Which version?").unwrap();
    assert_eq!(first.answer, answer);
    assert_eq!(first.owner(), asker);
    assert_eq!(first.body(), "Which version?");
    assert!(first.created_at() > 0);

    let second = service.add_comment(helper, answer, "Stable.").unwrap();
    set_created_at(&conn, first.uuid, 2_000);
    set_created_at(&conn, second.uuid, 1_000);

    let listed: Vec<_> = service
        .comments_for_answer(answer)
        .unwrap()
        .into_iter()
        .map(|comment| comment.uuid)
        .collect();
    assert_eq!(listed, vec![second.uuid, first.uuid]);
}

#[test]
fn add_comment_rejects_blank_body_and_missing_answer() {
    let mut conn = open_db_in_memory().unwrap();
    let (asker, answer) = seed_answer(&mut conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let blank = service.add_comment(asker, answer, " \n ").unwrap_err();
    assert!(matches!(
        blank,
        CommentServiceError::InvalidComment(CommentValidationError::EmptyBody)
    ));

    let missing = uuid::Uuid::new_v4();
    let err = service.add_comment(asker, missing, "Hello?").unwrap_err();
    assert!(matches!(err, CommentServiceError::AnswerNotFound(id) if id == missing));
    assert!(service.comments_for_answer(answer).unwrap().is_empty());
}

#[test]
fn corrupted_comment_row_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    let (asker, answer) = seed_answer(&mut conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let comment = service.add_comment(asker, answer, "Fine.").unwrap();
    conn.execute(
        "UPDATE comments SET body = '' WHERE uuid = ?1;",
        [comment.uuid.to_string()],
    )
    .unwrap();

    assert!(matches!(
        service.comments_for_answer(answer).unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

fn seed_answer(conn: &mut Connection) -> (UserId, AnswerId) {
    let asker = register(conn, "asker");
    let question = {
        let mut service = QuestionService::new(SqliteQuestionRepository::try_new(conn).unwrap());
        service
            .ask_question(
                asker,
                &AskQuestionForm {
                    title: "Where do comments go?".to_string(),
                    body: "Under answers.".to_string(),
                    custom_tags: "comments,answers".to_string(),
                },
            )
            .unwrap()
            .uuid
    };
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(conn).unwrap());
    let answer = service.post_answer(asker, question, "Right here.").unwrap();
    (asker, answer.uuid)
}

fn register(conn: &Connection, username: &str) -> UserId {
    let service = ProfileService::new(SqliteUserRepository::try_new(conn).unwrap());
    service
        .register_user(username, format!("{username}@example.com"))
        .unwrap()
        .uuid
}

fn set_created_at(conn: &Connection, id: CommentId, created_at: i64) {
    conn.execute(
        "UPDATE comments SET created_at = ?1 WHERE uuid = ?2;",
        rusqlite::params![created_at, id.to_string()],
    )
    .unwrap();
}
