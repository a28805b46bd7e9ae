//! Domain entities and projections
//!
//! Projections carry the denormalized fields the frontend renders (author
//! nickname, tag names, derived counts) so route handlers never re-query.
//! Wire casing is camelCase, matching the frontend's expectations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Account status. Withdrawal is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Active,
    Deleted,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Full member row, including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    /// None once the member has withdrawn
    pub email: Option<String>,
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Member data safe to put on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: i64,
    pub email: Option<String>,
    pub nickname: String,
    pub role: Role,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Member> for MemberProfile {
    fn from(m: &Member) -> Self {
        Self {
            id: m.id,
            email: m.email.clone(),
            nickname: m.nickname.clone(),
            role: m.role,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Signup payload after boundary-side password hashing.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
}

/// Question category. Fixed vocabulary, seeded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A tag, created lazily on first use and never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Answer projection with author and tags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub member_id: i64,
    pub member_nickname: String,
    pub tag_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An answer as listed on the author's my-page, with its parent question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAnswer {
    pub id: i64,
    pub question_id: i64,
    pub question_title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Question list projection: everything a list row renders, counts derived
/// from the ledger and the active-answer set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub answer_count: i64,
    pub like_count: i64,
    pub member_id: i64,
    pub member_nickname: String,
    pub category_id: i64,
    pub category_name: String,
    pub tag_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single-question view: the summary plus its active answers, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub summary: QuestionSummary,
    pub answers: Vec<AnswerView>,
}

/// Create/update payload for a question.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub title: String,
    pub content: String,
    pub category_id: i64,
    pub tag_names: Vec<String>,
}

/// Create/update payload for an answer.
#[derive(Debug, Clone)]
pub struct AnswerDraft {
    pub content: String,
    pub tag_names: Vec<String>,
}

/// Answer-status filter for question search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Zero active answers
    Waiting,
    /// At least one active answer
    Answered,
}

impl StatusFilter {
    /// `ALL`, empty and unknown values all mean "no filter".
    pub fn parse(s: &str) -> Self {
        match s {
            "WAITING" => Self::Waiting,
            "ANSWERED" => Self::Answered,
            _ => Self::All,
        }
    }
}

/// Composable search filter; every field is independently optional and the
/// predicates are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub status: StatusFilter,
    pub search: Option<String>,
}

/// Totals for the question list header.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCounts {
    pub total: u64,
    pub pending_count: u64,
    pub answered_count: u64,
}

/// A (name, count) pair for dashboard rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCount {
    pub name: String,
    pub count: i64,
}

/// Admin dashboard rollup. Top lists are windowed; the count maps are
/// all-time cumulative.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub top_tags: Vec<ItemCount>,
    pub top_categories: Vec<ItemCount>,
    pub category_counts: BTreeMap<String, i64>,
    pub tag_counts: Vec<ItemCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parsing() {
        assert_eq!(StatusFilter::parse("WAITING"), StatusFilter::Waiting);
        assert_eq!(StatusFilter::parse("ANSWERED"), StatusFilter::Answered);
        assert_eq!(StatusFilter::parse("ALL"), StatusFilter::All);
        assert_eq!(StatusFilter::parse(""), StatusFilter::All);
        assert_eq!(StatusFilter::parse("garbage"), StatusFilter::All);
    }

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
        assert_eq!(Role::parse("nope"), None);
    }

    #[test]
    fn profile_hides_password_hash() {
        let json = serde_json::to_value(MemberProfile {
            id: 1,
            email: Some("a@b.com".into()),
            nickname: "abc".into(),
            role: Role::User,
            status: MemberStatus::Active,
            created_at: Utc::now(),
        })
        .unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["nickname"], "abc");
    }
}
