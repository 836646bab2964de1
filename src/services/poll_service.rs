use crate::config::PointsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewPoll, Poll, PollView};
use crate::repositories::PollRepository;
use crate::services::AuditTrailService;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;
const MAX_QUESTION_LEN: usize = 300;

/// Community polls and the point economy around them
pub struct PollService {
    poll_repo: Arc<PollRepository>,
    points: PointsConfig,
    audit: Arc<AuditTrailService>,
}

impl PollService {
    pub fn new(
        poll_repo: Arc<PollRepository>,
        points: PointsConfig,
        audit: Arc<AuditTrailService>,
    ) -> Self {
        Self {
            poll_repo,
            points,
            audit,
        }
    }

    /// Publish a poll, charging the author the creation cost
    pub async fn create(&self, user_id: Uuid, new: &NewPoll) -> AppResult<PollView> {
        let (question, options) = validate_new_poll(new)?;
        let cost = self.points.poll_creation_cost;

        let poll = self
            .poll_repo
            .create(user_id, &question, &serde_json::json!(options), cost)
            .await?;

        info!("Poll {} created by {} (cost {})", poll.id, user_id, cost);
        self.audit.log_poll_created(&poll, cost).await;
        Ok(PollView::build(poll, &[], None))
    }

    /// All polls with tallies as seen by `user_id`
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<PollView>> {
        let polls = self.poll_repo.list().await?;
        self.views(user_id, polls).await
    }

    pub async fn get(&self, user_id: Uuid, poll_id: Uuid) -> AppResult<PollView> {
        let poll = self.load(poll_id).await?;
        let mut views = self.views(user_id, vec![poll]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    /// Cast the caller's single vote and pay the voting reward
    pub async fn vote(&self, user_id: Uuid, poll_id: Uuid, option_index: i32) -> AppResult<PollView> {
        let poll = self.load(poll_id).await?;

        if poll.user_id == user_id {
            return Err(AppError::Forbidden(
                "You cannot vote on your own poll".to_string(),
            ));
        }
        let option_count = poll.options_vec().len();
        if usize::try_from(option_index).map_or(true, |i| i >= option_count) {
            return Err(AppError::Validation(format!(
                "Option index must be between 0 and {}",
                option_count.saturating_sub(1)
            )));
        }

        let reward = self.points.vote_reward;
        self.poll_repo
            .record_vote(poll.id, user_id, option_index, reward)
            .await?;

        info!("User {} voted {} on poll {}", user_id, option_index, poll.id);
        self.audit
            .log_poll_vote(poll.id, user_id, option_index, reward)
            .await;
        self.get(user_id, poll.id).await
    }

    async fn load(&self, poll_id: Uuid) -> AppResult<Poll> {
        self.poll_repo
            .find_by_id(poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    async fn views(&self, user_id: Uuid, polls: Vec<Poll>) -> AppResult<Vec<PollView>> {
        let ids: Vec<Uuid> = polls.iter().map(|p| p.id).collect();

        let mut counts: HashMap<Uuid, Vec<(i32, i64)>> = HashMap::new();
        for (poll_id, index, count) in self.poll_repo.vote_counts(&ids).await? {
            counts.entry(poll_id).or_default().push((index, count));
        }
        let own_votes: HashMap<Uuid, i32> = self
            .poll_repo
            .user_votes(user_id, &ids)
            .await?
            .into_iter()
            .collect();

        Ok(polls
            .into_iter()
            .map(|poll| {
                let tally = counts.get(&poll.id).map(Vec::as_slice).unwrap_or_default();
                let user_vote = own_votes.get(&poll.id).copied();
                PollView::build(poll, tally, user_vote)
            })
            .collect())
    }
}

/// Trimmed question and options, or the first rule they break
pub fn validate_new_poll(new: &NewPoll) -> AppResult<(String, Vec<String>)> {
    let question = new.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question is required".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(AppError::Validation(format!(
            "Question must be at most {} characters",
            MAX_QUESTION_LEN
        )));
    }

    let options: Vec<String> = new.options.iter().map(|o| o.trim().to_string()).collect();
    if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
        return Err(AppError::Validation(format!(
            "A poll needs between {} and {} options",
            MIN_OPTIONS, MAX_OPTIONS
        )));
    }
    if options.iter().any(String::is_empty) {
        return Err(AppError::Validation("Options cannot be empty".to_string()));
    }
    let mut seen = HashSet::new();
    if !options.iter().all(|o| seen.insert(o.to_lowercase())) {
        return Err(AppError::Validation("Options must be distinct".to_string()));
    }

    Ok((question.to_string(), options))
}
