use qanda_core::db::open_db_in_memory;
use qanda_core::{
    AnswerId, AnswerService, AnswerServiceError, AskQuestionForm, ProfileService, QuestionId,
    QuestionService, RepoError, SqliteAnswerRepository, SqliteQuestionRepository,
    SqliteUserRepository, UserId,
};
use rusqlite::Connection;

#[test]
fn post_answer_requires_existing_question_and_body() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());

    let answer = service.post_answer(owner, question, "Use a Box.").unwrap();
    assert_eq!(answer.question, question);
    assert!(!answer.accepted);
    assert_eq!(answer.score, 0);

    let missing = service
        .post_answer(owner, uuid::Uuid::new_v4(), "orphan")
        .unwrap_err();
    assert!(matches!(missing, AnswerServiceError::QuestionNotFound(_)));

    let blank = service.post_answer(owner, question, "   ").unwrap_err();
    assert!(matches!(blank, AnswerServiceError::InvalidAnswer(_)));
}

#[test]
fn accepting_second_answer_unaccepts_first() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let helper = register(&conn, "helper");
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    let first = service.post_answer(helper, question, "first").unwrap();
    let second = service.post_answer(helper, question, "second").unwrap();

    let accepted_first = service.set_acceptance(owner, first.uuid, true).unwrap();
    assert!(accepted_first.accepted);
    assert_eq!(service.accepted_answer(question).unwrap(), Some(first.uuid));

    let accepted_second = service.set_acceptance(owner, second.uuid, true).unwrap();
    assert!(accepted_second.accepted);
    assert!(!service.get_answer(first.uuid).unwrap().unwrap().accepted);
    assert_eq!(service.accepted_answer(question).unwrap(), Some(second.uuid));
    drop(service);

    assert_eq!(accepted_count(&conn, question), 1);
}

#[test]
fn accepting_already_accepted_answer_is_a_noop() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    let answer = service.post_answer(owner, question, "self answer").unwrap();

    service.set_acceptance(owner, answer.uuid, true).unwrap();
    let again = service.set_acceptance(owner, answer.uuid, true).unwrap();

    assert!(again.accepted);
    assert_eq!(service.accepted_answer(question).unwrap(), Some(answer.uuid));
}

#[test]
fn unaccepting_leaves_question_without_accepted_answer() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    let answer = service.post_answer(owner, question, "answer").unwrap();

    service.set_acceptance(owner, answer.uuid, true).unwrap();
    let cleared = service.set_acceptance(owner, answer.uuid, false).unwrap();

    assert!(!cleared.accepted);
    assert_eq!(service.accepted_answer(question).unwrap(), None);
}

#[test]
fn only_question_owner_may_change_acceptance() {
    let mut conn = open_db_in_memory().unwrap();
    let (_owner, question) = seed_question(&mut conn);
    let helper = register(&conn, "helper");
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    let answer = service.post_answer(helper, question, "mine").unwrap();

    let err = service.set_acceptance(helper, answer.uuid, true).unwrap_err();
    match err {
        AnswerServiceError::PermissionDenied { user, answer: id } => {
            assert_eq!(user, helper);
            assert_eq!(id, answer.uuid);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.accepted_answer(question).unwrap(), None);

    let missing = service
        .set_acceptance(helper, uuid::Uuid::new_v4(), true)
        .unwrap_err();
    assert!(matches!(missing, AnswerServiceError::AnswerNotFound(_)));
}

#[test]
fn edit_answer_keeps_acceptance_and_checks_author() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let helper = register(&conn, "helper");
    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    let answer = service.post_answer(helper, question, "draft").unwrap();
    service.set_acceptance(owner, answer.uuid, true).unwrap();

    let edited = service.edit_answer(helper, answer.uuid, "final").unwrap();
    assert_eq!(edited.body, "final");
    assert!(edited.accepted);

    let denied = service.edit_answer(owner, answer.uuid, "hijack").unwrap_err();
    assert!(matches!(denied, AnswerServiceError::PermissionDenied { .. }));
}

#[test]
fn answers_for_question_lists_accepted_first_then_oldest() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let helper = register(&conn, "helper");
    let ids: Vec<AnswerId> = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        (0..3)
            .map(|index| {
                service
                    .post_answer(helper, question, format!("answer {index}"))
                    .unwrap()
                    .uuid
            })
            .collect()
    };
    for (index, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE answers SET created_at = ?1 WHERE uuid = ?2;",
            rusqlite::params![1_000 * (index as i64 + 1), id.to_string()],
        )
        .unwrap();
    }

    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    service.set_acceptance(owner, ids[2], true).unwrap();

    let listed: Vec<AnswerId> = service
        .answers_for_question(question)
        .unwrap()
        .into_iter()
        .map(|answer| answer.uuid)
        .collect();
    assert_eq!(listed, vec![ids[2], ids[0], ids[1]]);

    let latest: Vec<AnswerId> = service
        .latest_answers(2)
        .unwrap()
        .into_iter()
        .map(|answer| answer.uuid)
        .collect();
    assert_eq!(latest, vec![ids[2], ids[1]]);
}

#[test]
fn edit_and_acceptance_refresh_modified_at_but_keep_created_at() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let helper = register(&conn, "helper");
    let (first, second) = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        let first = service.post_answer(helper, question, "First take.").unwrap().uuid;
        let second = service.post_answer(helper, question, "Second take.").unwrap().uuid;
        (first, second)
    };

    reset_timestamps(&conn, first);
    {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.edit_answer(helper, first, "First take, revised.").unwrap();
    }
    let (created_at, modified_at) = answer_timestamps(&conn, first);
    assert_eq!(created_at, 1_000);
    assert!(modified_at > 0);

    reset_timestamps(&conn, first);
    {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.set_acceptance(owner, first, true).unwrap();
    }
    let (created_at, modified_at) = answer_timestamps(&conn, first);
    assert_eq!(created_at, 1_000);
    assert!(modified_at > 0);

    // Accepting the second answer flips the first one back through the enforcer.
    reset_timestamps(&conn, first);
    {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.set_acceptance(owner, second, true).unwrap();
        assert!(!service.get_answer(first).unwrap().unwrap().accepted);
    }
    let (created_at, modified_at) = answer_timestamps(&conn, first);
    assert_eq!(created_at, 1_000);
    assert!(modified_at > 0);
}

#[test]
fn corrupted_answer_row_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    let (owner, question) = seed_question(&mut conn);
    let answer = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.post_answer(owner, question, "Looks fine.").unwrap().uuid
    };
    conn.execute(
        "UPDATE answers SET body = '  ' WHERE uuid = ?1;",
        [answer.to_string()],
    )
    .unwrap();

    let mut service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
    assert!(matches!(
        service.get_answer(answer).unwrap_err(),
        RepoError::InvalidData(_)
    ));
    assert!(matches!(
        service.answers_for_question(question).unwrap_err(),
        RepoError::InvalidData(_)
    ));
    assert!(matches!(
        service.set_acceptance(owner, answer, true).unwrap_err(),
        AnswerServiceError::Repo(RepoError::InvalidData(_))
    ));
}

fn seed_question(conn: &mut Connection) -> (UserId, QuestionId) {
    let owner = register(conn, "asker");
    let mut service = QuestionService::new(SqliteQuestionRepository::try_new(conn).unwrap());
    let question = service
        .ask_question(
            owner,
            &AskQuestionForm {
                title: "Why does the borrow checker complain?".to_string(),
                body: "Details inside.".to_string(),
                custom_tags: "rust,borrowck".to_string(),
            },
        )
        .unwrap();
    (owner, question.uuid)
}

fn register(conn: &Connection, username: &str) -> UserId {
    let service = ProfileService::new(SqliteUserRepository::try_new(conn).unwrap());
    service
        .register_user(username, format!("{username}@example.com"))
        .unwrap()
        .uuid
}

fn reset_timestamps(conn: &Connection, id: AnswerId) {
    conn.execute(
        "UPDATE answers SET created_at = 1000, modified_at = 0 WHERE uuid = ?1;",
        [id.to_string()],
    )
    .unwrap();
}

fn answer_timestamps(conn: &Connection, id: AnswerId) -> (i64, i64) {
    conn.query_row(
        "SELECT created_at, modified_at FROM answers WHERE uuid = ?1;",
        [id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap()
}

fn accepted_count(conn: &Connection, question: QuestionId) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM answers WHERE question_uuid = ?1 AND accepted = 1;",
        [question.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
