use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Community opinion poll
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub options: Value, // JSONB array of strings
    pub created_at: NaiveDateTime,
}

impl Poll {
    /// Get options as a vector of strings
    pub fn options_vec(&self) -> Vec<String> {
        match &self.options {
            Value::Array(arr) => arr
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![],
        }
    }
}

/// A single user's vote
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PollVote {
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub option_index: i32,
    pub created_at: NaiveDateTime,
}

/// Poll with tallies, as seen by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    /// Parallel to `options`
    pub votes: Vec<i64>,
    pub total_votes: i64,
    pub user_voted: bool,
    pub user_vote: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl PollView {
    /// Tally `(option_index, count)` rows against the poll's options.
    /// Rows pointing past the option list are ignored.
    pub fn build(poll: Poll, counts: &[(i32, i64)], user_vote: Option<i32>) -> Self {
        let options = poll.options_vec();
        let mut votes = vec![0i64; options.len()];
        for (index, count) in counts {
            if let Some(slot) = usize::try_from(*index).ok().and_then(|i| votes.get_mut(i)) {
                *slot += count;
            }
        }
        let total_votes = votes.iter().sum();

        Self {
            id: poll.id,
            user_id: poll.user_id,
            question: poll.question,
            options,
            votes,
            total_votes,
            user_voted: user_vote.is_some(),
            user_vote,
            created_at: poll.created_at,
        }
    }
}

/// Input for a new poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
}

/// Body of `POST /polls/:id/vote`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option_index: i32,
}
