//! Storage traits implemented by the persistence backend
//!
//! Every trait method is one transactional operation: it either commits
//! wholly or leaves the store untouched. Mutating operations that act on
//! behalf of a member take the actor's id and re-validate that the member
//! still resolves and is ACTIVE before writing.

use crate::error::Result;
use crate::model::{
    AnswerDraft, AnswerView, Category, Dashboard, Member, MemberProfile, MemberUpdate, MyAnswer,
    NewMember, QuestionCounts, QuestionDetail, QuestionDraft, QuestionFilter, QuestionSummary, Tag,
};
use crate::page::{Page, PageRequest};
use async_trait::async_trait;

/// Member accounts.
#[async_trait]
pub trait MemberStore {
    /// Create a member. Fails with Conflict on a duplicate email or
    /// nickname, Validation on a nickname shorter than 2 characters.
    /// Password policy is enforced at the boundary, before hashing.
    async fn create(&self, new: NewMember) -> Result<MemberProfile>;

    /// Resolve an ACTIVE member by email, hash included, for credential
    /// verification. Withdrawn members never resolve (their email is null).
    async fn find_active_by_email(&self, email: &str) -> Result<Option<Member>>;

    async fn get(&self, id: i64) -> Result<MemberProfile>;

    /// Update nickname and/or password hash. Fails when the member has
    /// withdrawn or the nickname is taken by someone else.
    async fn update(&self, id: i64, update: MemberUpdate) -> Result<MemberProfile>;

    /// Irreversible: sets status DELETED and nulls the email.
    async fn withdraw(&self, id: i64) -> Result<()>;
}

/// The fixed category vocabulary.
#[async_trait]
pub trait CategoryStore {
    async fn list(&self) -> Result<Vec<Category>>;

    async fn get(&self, id: i64) -> Result<Category>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Create every named category that does not yet exist. Startup seeding.
    async fn ensure(&self, names: &[String]) -> Result<()>;
}

/// Lazy tag vocabulary.
#[async_trait]
pub trait TagStore {
    /// Find-or-create by exact name. Idempotent; a concurrent first-use
    /// race is absorbed by re-reading the winning row.
    async fn resolve(&self, name: &str) -> Result<Tag>;

    async fn find(&self, name: &str) -> Result<Option<Tag>>;
}

/// Questions, their tag links, likes, and the search composer.
#[async_trait]
pub trait QuestionStore {
    /// Create a question with its tag set. Returns the new id.
    async fn create(&self, author_id: i64, draft: QuestionDraft) -> Result<i64>;

    /// Single-question view. Increments the view counter before the read,
    /// in the same transaction, so the returned count is post-increment.
    async fn fetch(&self, id: i64) -> Result<QuestionDetail>;

    /// Author-only update; the tag set is replaced wholesale.
    async fn update(&self, id: i64, actor_id: i64, draft: QuestionDraft) -> Result<QuestionDetail>;

    /// Author-or-admin delete. Non-admins are rejected while any active
    /// answer exists; admins soft-delete the active answers first.
    async fn delete(&self, id: i64, actor_id: i64) -> Result<()>;

    /// Filtered, paginated, sorted listing of non-deleted questions.
    async fn search(
        &self,
        page: PageRequest,
        filter: QuestionFilter,
    ) -> Result<Page<QuestionSummary>>;

    /// total/pending/answered counts under the same predicate composition.
    async fn counts(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<QuestionCounts>;

    /// Questions authored by a member, newest first. Soft-deleted questions
    /// are excluded, matching the default listing rule.
    async fn by_member(&self, member_id: i64) -> Result<Vec<QuestionSummary>>;

    /// Questions the member currently likes.
    async fn liked_by_member(&self, member_id: i64) -> Result<Vec<QuestionSummary>>;

    /// Toggle the (member, question) like row and return the new ledger
    /// count.
    async fn toggle_like(&self, id: i64, member_id: i64) -> Result<i64>;
}

/// Answers under a question.
#[async_trait]
pub trait AnswerStore {
    async fn create(&self, question_id: i64, author_id: i64, draft: AnswerDraft) -> Result<i64>;

    /// Active answers of a question, oldest first.
    async fn list_for_question(&self, question_id: i64) -> Result<Vec<AnswerView>>;

    /// Author-only update; tag set replaced wholesale.
    async fn update(
        &self,
        question_id: i64,
        answer_id: i64,
        actor_id: i64,
        draft: AnswerDraft,
    ) -> Result<AnswerView>;

    /// Author-or-admin soft delete.
    async fn delete(&self, question_id: i64, answer_id: i64, actor_id: i64) -> Result<()>;

    /// Active answers authored by a member, newest first, with parent
    /// question titles.
    async fn by_member(&self, member_id: i64) -> Result<Vec<MyAnswer>>;
}

/// Read-only aggregate statistics for the admin dashboard.
#[async_trait]
pub trait AdminStore {
    /// Recomputed from the store on every call; `window_days` bounds the
    /// top-tag/top-category lists only.
    async fn dashboard(&self, window_days: u32) -> Result<Dashboard>;
}
