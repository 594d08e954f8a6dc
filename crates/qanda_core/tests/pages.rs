use qanda_core::db::open_db_in_memory;
use qanda_core::{
    home_page, question_detail, submit_answer, user_detail, AnswerService, AskQuestionForm,
    CommentService, PageError, ProfileService, QuestionId, QuestionService,
    SqliteAnswerRepository, SqliteCommentRepository, SqliteQuestionRepository,
    SqliteSubscriptionRepository, SqliteUserRepository, SqliteVoteRepository,
    SubscriptionService, UserDetailTab, UserId, VoteService, VoteTarget, VoteValue,
};
use rusqlite::Connection;

#[test]
fn home_page_collects_feed_latest_answers_and_top_users() {
    let mut conn = open_db_in_memory().unwrap();
    let asker = register(&conn, "asker");
    let helper = register(&conn, "helper");
    let question = ask(&mut conn, asker, "Home page question");
    let answers: Vec<_> = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        (0..7)
            .map(|index| {
                service
                    .post_answer(helper, question, format!("answer {index}"))
                    .unwrap()
                    .uuid
            })
            .collect()
    };
    {
        let votes = VoteService::new(SqliteVoteRepository::try_new(&conn).unwrap());
        votes
            .cast_vote(asker, VoteTarget::Answer(answers[0]), VoteValue::Up)
            .unwrap();
    }

    let page = home_page(&mut conn, Some("answered"), 1, None).unwrap();

    assert_eq!(page.feed.items.len(), 1);
    assert_eq!(page.feed.items[0].answer_score, 1);
    assert_eq!(page.last_answers.len(), 5);
    assert_eq!(page.top_users[0].user, helper);
    assert_eq!(page.top_users[0].score, 1);
}

#[test]
fn question_detail_counts_view_and_resolves_viewer_votes() {
    let mut conn = open_db_in_memory().unwrap();
    let asker = register(&conn, "asker");
    let helper = register(&conn, "helper");
    let question = ask(&mut conn, asker, "Detail question");
    let (accepted, other) = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        let other = service.post_answer(helper, question, "other").unwrap().uuid;
        let accepted = service.post_answer(helper, question, "accepted").unwrap().uuid;
        service.set_acceptance(asker, accepted, true).unwrap();
        (accepted, other)
    };
    {
        let votes = VoteService::new(SqliteVoteRepository::try_new(&conn).unwrap());
        votes
            .cast_vote(helper, VoteTarget::Question(question), VoteValue::Up)
            .unwrap();
        let subscriptions =
            SubscriptionService::new(SqliteSubscriptionRepository::try_new(&conn).unwrap());
        subscriptions.subscribe(helper, question).unwrap();
    }

    let anonymous = question_detail(&mut conn, question, None).unwrap();
    assert_eq!(anonymous.question.viewed, 1);
    assert_eq!(anonymous.slug, "Detail-question");
    assert!(anonymous.viewer_vote.is_none());
    assert!(!anonymous.can_accept_answers);
    assert!(anonymous.answers.iter().all(|view| view.viewer_vote.is_none()));

    let as_helper = question_detail(&mut conn, question, Some(helper)).unwrap();
    assert_eq!(as_helper.question.viewed, 2);
    assert_eq!(as_helper.question.score, 1);
    assert!(!as_helper.can_accept_answers);
    assert!(as_helper.viewer_subscribed);
    let helper_vote = as_helper.viewer_vote.unwrap();
    assert!(helper_vote.is_saved());
    assert_eq!(helper_vote.value, Some(VoteValue::Up));

    let order: Vec<_> = as_helper
        .answers
        .iter()
        .map(|view| view.answer.uuid)
        .collect();
    assert_eq!(order[0], accepted);
    assert!(order.contains(&other));
    assert!(as_helper.answers[0].answer.accepted);

    let as_owner = question_detail(&mut conn, question, Some(asker)).unwrap();
    assert!(as_owner.can_accept_answers);
    assert!(!as_owner.viewer_subscribed);
    assert!(!as_owner.viewer_vote.unwrap().is_saved());
    for view in &as_owner.answers {
        let vote = view.viewer_vote.as_ref().unwrap();
        assert!(!vote.is_saved());
        assert_eq!(vote.user, asker);
        assert_eq!(vote.target, VoteTarget::Answer(view.answer.uuid));
    }
}

#[test]
fn question_detail_for_missing_question_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let missing = uuid::Uuid::new_v4();

    let err = question_detail(&mut conn, missing, None).unwrap_err();
    assert!(matches!(err, PageError::QuestionNotFound(id) if id == missing));
}

#[test]
fn question_detail_attaches_comments_to_each_answer() {
    let mut conn = open_db_in_memory().unwrap();
    let asker = register(&conn, "asker");
    let helper = register(&conn, "helper");
    let question = ask(&mut conn, asker, "Commented question");
    let answer = {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.post_answer(helper, question, "answer").unwrap().uuid
    };
    {
        let comments = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
        comments.add_comment(asker, answer, "Could you expand?").unwrap();
    }

    let detail = question_detail(&mut conn, question, None).unwrap();
    assert_eq!(detail.answers.len(), 1);
    let bodies: Vec<_> = detail.answers[0]
        .comments
        .iter()
        .map(|comment| comment.body.as_str())
        .collect();
    assert_eq!(bodies, vec!["Could you expand?"]);
}

#[test]
fn submit_answer_notifies_subscribers_except_the_author() {
    let mut conn = open_db_in_memory().unwrap();
    let asker = register(&conn, "asker");
    let follower = register(&conn, "follower");
    let helper = register(&conn, "helper");
    let question = ask(&mut conn, asker, "Notify question");
    {
        let subscriptions =
            SubscriptionService::new(SqliteSubscriptionRepository::try_new(&conn).unwrap());
        for user in [asker, follower, helper] {
            subscriptions.subscribe(user, question).unwrap();
        }
    }

    let posted = submit_answer(&mut conn, helper, question, "Here is how.").unwrap();
    assert_eq!(posted.answer.owner, helper);
    assert_eq!(posted.answer.question, question);
    let mut recipients = posted.recipients.clone();
    recipients.sort();
    let mut expected = vec![asker, follower];
    expected.sort();
    assert_eq!(recipients, expected);
    assert!(!posted.recipients.contains(&helper));

    let stored = {
        let service = AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        service.get_answer(posted.answer.uuid).unwrap()
    };
    assert_eq!(stored.map(|answer| answer.body), Some("Here is how.".to_string()));
}

#[test]
fn submit_answer_to_missing_question_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let helper = register(&conn, "helper");
    let missing = uuid::Uuid::new_v4();

    let err = submit_answer(&mut conn, helper, missing, "orphan").unwrap_err();
    assert!(matches!(err, PageError::QuestionNotFound(id) if id == missing));
}

#[test]
fn user_detail_limits_overview_but_not_full_tabs() {
    let mut conn = open_db_in_memory().unwrap();
    let asker = register(&conn, "asker");
    let mut questions: Vec<QuestionId> = Vec::new();
    for index in 0..6 {
        questions.push(ask(&mut conn, asker, &format!("Question {index}")));
    }
    {
        let mut service =
            AnswerService::new(SqliteAnswerRepository::try_new(&mut conn).unwrap());
        for question in &questions {
            service.post_answer(asker, *question, "self answer").unwrap();
        }
    }

    let overview = user_detail(&mut conn, "asker", None).unwrap();
    assert_eq!(overview.tab, UserDetailTab::Overview);
    assert_eq!(overview.user.uuid, asker);
    assert_eq!(overview.questions.len(), 5);
    assert_eq!(overview.answers.len(), 5);

    let all_questions = user_detail(&mut conn, "ASKER", Some("questions")).unwrap();
    assert_eq!(all_questions.tab, UserDetailTab::Questions);
    assert_eq!(all_questions.questions.len(), 6);

    let all_answers = user_detail(&mut conn, "asker", Some("answers")).unwrap();
    assert_eq!(all_answers.answers.len(), 6);

    let err = user_detail(&mut conn, "nobody", None).unwrap_err();
    assert!(matches!(err, PageError::UserNotFound(name) if name == "nobody"));
}

fn ask(conn: &mut Connection, owner: UserId, title: &str) -> QuestionId {
    let mut service = QuestionService::new(SqliteQuestionRepository::try_new(conn).unwrap());
    service
        .ask_question(
            owner,
            &AskQuestionForm {
                title: title.to_string(),
                body: "Body".to_string(),
                custom_tags: "pages,views".to_string(),
            },
        )
        .unwrap()
        .uuid
}

fn register(conn: &Connection, username: &str) -> UserId {
    let service = ProfileService::new(SqliteUserRepository::try_new(conn).unwrap());
    service
        .register_user(username, format!("{username}@example.com"))
        .unwrap()
        .uuid
}
