//! End-to-end store behavior over an in-memory database

use knowledgeout_core::store::{
    AdminStore, AnswerStore, CategoryStore, MemberStore, QuestionStore,
};
use knowledgeout_core::{
    AnswerDraft, Error, ErrorCode, NewMember, PageRequest, QuestionDraft, QuestionFilter, Role,
    StatusFilter,
};
use knowledgeout_sqlite::SqliteStores;

async fn stores() -> SqliteStores {
    let stores = SqliteStores::memory().expect("in-memory stores");
    stores
        .categories
        .ensure(&["JAVA".into(), "SPRING".into(), "REACT".into()])
        .await
        .unwrap();
    stores
}

async fn member(stores: &SqliteStores, email: &str, nickname: &str) -> i64 {
    stores
        .members
        .create(NewMember {
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            nickname: nickname.to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn admin(stores: &SqliteStores, email: &str, nickname: &str) -> i64 {
    let id = member(stores, email, nickname).await;
    stores.members.set_role(id, Role::Admin).await.unwrap();
    id
}

async fn category_id(stores: &SqliteStores, name: &str) -> i64 {
    stores
        .categories
        .find_by_name(name)
        .await
        .unwrap()
        .unwrap()
        .id
}

async fn question(
    stores: &SqliteStores,
    author: i64,
    category: &str,
    title: &str,
    tags: &[&str],
) -> i64 {
    let category_id = category_id(stores, category).await;
    stores
        .questions
        .create(
            author,
            QuestionDraft {
                title: title.to_string(),
                content: format!("{title} content"),
                category_id,
                tag_names: tags.iter().map(|t| t.to_string()).collect(),
            },
        )
        .await
        .unwrap()
}

fn filter_with_status(status: StatusFilter) -> QuestionFilter {
    QuestionFilter {
        status,
        ..Default::default()
    }
}

#[tokio::test]
async fn waiting_and_answered_partition_the_active_set() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let helper = member(&stores, "helper@example.com", "helper").await;

    let waiting = question(&stores, author, "JAVA", "unanswered", &[]).await;
    let answered = question(&stores, author, "SPRING", "answered", &[]).await;
    let deleted = question(&stores, author, "REACT", "gone", &[]).await;

    stores
        .answers
        .create(
            answered,
            helper,
            AnswerDraft {
                content: "try this".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap();
    stores.questions.delete(deleted, author).await.unwrap();

    let page = PageRequest::new(0, 10);
    let all = stores
        .questions
        .search(page, filter_with_status(StatusFilter::All))
        .await
        .unwrap();
    let pending = stores
        .questions
        .search(page, filter_with_status(StatusFilter::Waiting))
        .await
        .unwrap();
    let done = stores
        .questions
        .search(page, filter_with_status(StatusFilter::Answered))
        .await
        .unwrap();

    assert_eq!(all.total_elements, 2);
    assert_eq!(pending.total_elements, 1);
    assert_eq!(done.total_elements, 1);
    assert_eq!(pending.content[0].id, waiting);
    assert_eq!(done.content[0].id, answered);

    let counts = stores.questions.counts(None, None).await.unwrap();
    assert_eq!(counts.total, counts.pending_count + counts.answered_count);
}

#[tokio::test]
async fn hash_search_matches_tag_exactly_keyword_matches_text() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;

    let tagged = question(&stores, author, "REACT", "state management", &["react"]).await;
    question(&stores, author, "JAVA", "react to events", &[]).await;
    let mysql = question(&stores, author, "JAVA", "Why is MySQL slow", &[]).await;

    let page = PageRequest::new(0, 10);

    let by_tag = stores
        .questions
        .search(
            page,
            QuestionFilter {
                search: Some("#react".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_tag.total_elements, 1);
    assert_eq!(by_tag.content[0].id, tagged);
    assert_eq!(by_tag.content[0].tag_names, vec!["react".to_string()]);

    let by_keyword = stores
        .questions
        .search(
            page,
            QuestionFilter {
                search: Some("mysql".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_keyword.total_elements, 1);
    assert_eq!(by_keyword.content[0].id, mysql);
}

#[tokio::test]
async fn category_filter_ignores_all_sentinel() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;

    question(&stores, author, "JAVA", "one", &[]).await;
    question(&stores, author, "SPRING", "two", &[]).await;

    let page = PageRequest::new(0, 10);

    let spring = stores
        .questions
        .search(
            page,
            QuestionFilter {
                category: Some("SPRING".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(spring.total_elements, 1);

    let all = stores
        .questions
        .search(
            page,
            QuestionFilter {
                category: Some("ALL".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(all.total_elements, 2);
}

#[tokio::test]
async fn pagination_slices_and_counts_the_whole_set() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;

    for i in 0..5 {
        question(&stores, author, "JAVA", &format!("question {i}"), &[]).await;
    }

    let first = stores
        .questions
        .search(PageRequest::new(0, 2), QuestionFilter::default())
        .await
        .unwrap();
    assert_eq!(first.content.len(), 2);
    assert_eq!(first.total_elements, 5);
    assert_eq!(first.total_pages, 3);

    let last = stores
        .questions
        .search(PageRequest::new(2, 2), QuestionFilter::default())
        .await
        .unwrap();
    assert_eq!(last.content.len(), 1);

    // No overlap between pages under the default ordering
    assert!(first.content.iter().all(|q| q.id != last.content[0].id));
}

#[tokio::test]
async fn viewing_increments_exactly_once_per_fetch() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let id = question(&stores, author, "JAVA", "views", &[]).await;

    for expected in 1..=3 {
        let detail = stores.questions.fetch(id).await.unwrap();
        assert_eq!(detail.summary.view_count, expected);
    }
}

#[tokio::test]
async fn like_toggle_round_trips() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let fan = member(&stores, "fan@example.com", "fan").await;
    let id = question(&stores, author, "JAVA", "likeable", &[]).await;

    assert_eq!(stores.questions.toggle_like(id, fan).await.unwrap(), 1);
    assert_eq!(stores.questions.toggle_like(id, fan).await.unwrap(), 0);

    // Two members like independently
    stores.questions.toggle_like(id, fan).await.unwrap();
    assert_eq!(stores.questions.toggle_like(id, author).await.unwrap(), 2);
}

#[tokio::test]
async fn non_admin_cannot_delete_question_with_active_answer() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let helper = member(&stores, "helper@example.com", "helper").await;
    let id = question(&stores, author, "JAVA", "guarded", &[]).await;

    stores
        .answers
        .create(
            id,
            helper,
            AnswerDraft {
                content: "an answer".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap();

    let err = stores.questions.delete(id, author).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Conflict(ErrorCode::QuestionHasActiveAnswers)
    ));

    // Deleting the answer unblocks the author
    let answers = stores.answers.list_for_question(id).await.unwrap();
    stores
        .answers
        .delete(id, answers[0].id, helper)
        .await
        .unwrap();
    stores.questions.delete(id, author).await.unwrap();
}

#[tokio::test]
async fn admin_delete_cascades_to_active_answers() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let helper = member(&stores, "helper@example.com", "helper").await;
    let boss = admin(&stores, "admin@example.com", "admin").await;

    let id = question(&stores, author, "JAVA", "cascade", &[]).await;
    for i in 0..2 {
        stores
            .answers
            .create(
                id,
                helper,
                AnswerDraft {
                    content: format!("answer {i}"),
                    tag_names: vec![],
                },
            )
            .await
            .unwrap();
    }

    stores.questions.delete(id, boss).await.unwrap();

    // Question gone from default listings, answers retired with it
    let err = stores.questions.fetch(id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ErrorCode::QuestionNotFound)));
    assert!(stores
        .answers
        .list_for_question(id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stranger_cannot_delete_or_edit() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let stranger = member(&stores, "stranger@example.com", "stranger").await;
    let id = question(&stores, author, "JAVA", "mine", &[]).await;

    let err = stores.questions.delete(id, stranger).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(ErrorCode::AccessDenied)));

    let draft = QuestionDraft {
        title: "hijacked".to_string(),
        content: "x".to_string(),
        category_id: category_id(&stores, "JAVA").await,
        tag_names: vec![],
    };
    let err = stores
        .questions
        .update(id, stranger, draft)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(ErrorCode::AccessDenied)));
}

#[tokio::test]
async fn admin_may_delete_answer_but_not_edit_it() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let helper = member(&stores, "helper@example.com", "helper").await;
    let boss = admin(&stores, "admin@example.com", "admin").await;

    let qid = question(&stores, author, "JAVA", "q", &[]).await;
    let aid = stores
        .answers
        .create(
            qid,
            helper,
            AnswerDraft {
                content: "original".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap();

    let err = stores
        .answers
        .update(
            qid,
            aid,
            boss,
            AnswerDraft {
                content: "edited".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(ErrorCode::AccessDenied)));

    stores.answers.delete(qid, aid, boss).await.unwrap();

    // Deleted answers are gone as mutation targets
    let err = stores.answers.delete(qid, aid, boss).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ErrorCode::AnswerNotFound)));
}

#[tokio::test]
async fn answer_must_belong_to_the_path_question() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let helper = member(&stores, "helper@example.com", "helper").await;

    let first = question(&stores, author, "JAVA", "first", &[]).await;
    let second = question(&stores, author, "SPRING", "second", &[]).await;
    let aid = stores
        .answers
        .create(
            first,
            helper,
            AnswerDraft {
                content: "for the first".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap();

    let err = stores
        .answers
        .delete(second, aid, helper)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ErrorCode::AnswerQuestionMismatch)
    ));
}

#[tokio::test]
async fn withdrawn_member_cannot_author_content() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let id = question(&stores, author, "JAVA", "before withdrawal", &[]).await;

    stores.members.withdraw(author).await.unwrap();

    let draft = QuestionDraft {
        title: "after".to_string(),
        content: "x".to_string(),
        category_id: category_id(&stores, "JAVA").await,
        tag_names: vec![],
    };
    let err = stores.questions.create(author, draft).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ErrorCode::MemberNotFound)));

    // Existing content stays attributed and readable
    let detail = stores.questions.fetch(id).await.unwrap();
    assert_eq!(detail.summary.member_nickname, "author");
}

#[tokio::test]
async fn update_replaces_tag_set_wholesale() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let id = question(&stores, author, "JAVA", "tagged", &["java", "jpa"]).await;

    let draft = QuestionDraft {
        title: "tagged".to_string(),
        content: "tagged content".to_string(),
        category_id: category_id(&stores, "JAVA").await,
        tag_names: vec!["spring".to_string(), "jpa".to_string()],
    };
    let detail = stores.questions.update(id, author, draft).await.unwrap();

    let mut tags = detail.summary.tag_names.clone();
    tags.sort();
    assert_eq!(tags, vec!["jpa".to_string(), "spring".to_string()]);
}

#[tokio::test]
async fn my_page_reads_reflect_activity() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;
    let fan = member(&stores, "fan@example.com", "fan").await;

    let qid = question(&stores, author, "JAVA", "by author", &[]).await;
    stores
        .answers
        .create(
            qid,
            fan,
            AnswerDraft {
                content: "fan answer".to_string(),
                tag_names: vec![],
            },
        )
        .await
        .unwrap();
    stores.questions.toggle_like(qid, fan).await.unwrap();

    let my_questions = stores.questions.by_member(author).await.unwrap();
    assert_eq!(my_questions.len(), 1);
    assert_eq!(my_questions[0].like_count, 1);

    let my_answers = stores.answers.by_member(fan).await.unwrap();
    assert_eq!(my_answers.len(), 1);
    assert_eq!(my_answers[0].question_title, "by author");

    let liked = stores.questions.liked_by_member(fan).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, qid);
}

#[tokio::test]
async fn dashboard_rolls_up_tags_and_categories() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;

    question(&stores, author, "JAVA", "a", &["jvm", "gc"]).await;
    question(&stores, author, "JAVA", "b", &["jvm"]).await;
    let deleted = question(&stores, author, "SPRING", "c", &["jvm"]).await;
    stores.questions.delete(deleted, author).await.unwrap();

    let dashboard = stores.admin.dashboard(7).await.unwrap();

    // Windowed top list skips the deleted question
    assert_eq!(dashboard.top_tags[0].name, "jvm");
    assert_eq!(dashboard.top_tags[0].count, 2);
    assert_eq!(dashboard.top_categories[0].name, "JAVA");
    assert_eq!(dashboard.top_categories[0].count, 2);

    // All-time counts are cumulative and include soft-deleted questions
    assert_eq!(dashboard.category_counts.get("JAVA"), Some(&2));
    assert_eq!(dashboard.category_counts.get("SPRING"), Some(&1));
    assert_eq!(dashboard.tag_counts[0].count, 3);
}

#[tokio::test]
async fn dashboard_ties_break_by_name() {
    let stores = stores().await;
    let author = member(&stores, "author@example.com", "author").await;

    question(&stores, author, "JAVA", "a", &["zeta", "alpha"]).await;

    let dashboard = stores.admin.dashboard(7).await.unwrap();
    let names: Vec<&str> = dashboard.top_tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}
