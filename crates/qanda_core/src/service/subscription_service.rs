//! Question subscription use-case service.
//!
//! Produces notification recipient lists; delivery itself is external.

use crate::model::question::QuestionId;
use crate::model::user::UserId;
use crate::repo::subscription_repo::SubscriptionRepository;
use crate::repo::RepoResult;
use log::debug;

pub struct SubscriptionService<R: SubscriptionRepository> {
    repo: R,
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Idempotent; returns whether a new subscription was stored.
    pub fn subscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        self.repo.subscribe(user, question)
    }

    pub fn unsubscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        self.repo.unsubscribe(user, question)
    }

    pub fn is_subscribed(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        self.repo.is_subscribed(user, question)
    }

    pub fn subscribers(&self, question: QuestionId) -> RepoResult<Vec<UserId>> {
        self.repo.list_subscribers(question)
    }

    /// Users to notify about a new answer, excluding its author.
    pub fn new_answer_recipients(
        &self,
        question: QuestionId,
        answer_author: UserId,
    ) -> RepoResult<Vec<UserId>> {
        let recipients: Vec<UserId> = self
            .repo
            .list_subscribers(question)?
            .into_iter()
            .filter(|user| *user != answer_author)
            .collect();
        debug!(
            "event=new_answer_fanout module=service status=ok recipients={}",
            recipients.len()
        );
        Ok(recipients)
    }
}
