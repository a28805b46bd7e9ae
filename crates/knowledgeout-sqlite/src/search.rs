//! Question search predicate composition
//!
//! Builds the WHERE clause for question listings and counts from the
//! optional filter fields, every predicate ANDed onto the base non-deleted
//! restriction. Only the `q` alias is referenced; associations are matched
//! through EXISTS subqueries, which keeps results duplicate-free without
//! DISTINCT and lets the same composition serve both SELECT and COUNT.

use knowledgeout_core::{QuestionFilter, Sort, SortDirection, SortKey, StatusFilter};
use rusqlite::ToSql;

/// Category value meaning "no category filter".
const CATEGORY_ALL: &str = "ALL";

/// A composed WHERE clause and its positional parameters.
pub(crate) struct Composed {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Composed {
    pub fn where_sql(&self) -> String {
        self.clauses.join(" AND ")
    }

    /// Parameters in clause order; extend with LIMIT/OFFSET values before
    /// binding if the query pages.
    pub fn into_params(self) -> Vec<Box<dyn ToSql>> {
        self.params
    }
}

/// Compose the filter into SQL. Predicate order is fixed so parameter order
/// is deterministic.
pub(crate) fn compose(filter: &QuestionFilter) -> Composed {
    let mut clauses: Vec<String> = vec!["q.deleted = 0".to_string()];
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    // Search term: `#name` is an exact tag match, anything else is a
    // case-insensitive substring over title and content.
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(tag_name) = term.strip_prefix('#') {
            // A bare `#` contributes no predicate
            if !tag_name.is_empty() {
                clauses.push(tag_exists_clause());
                params.push(Box::new(tag_name.to_string()));
            }
        } else {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            clauses.push(
                r"(LOWER(q.title) LIKE ? ESCAPE '\' OR LOWER(q.content) LIKE ? ESCAPE '\')"
                    .to_string(),
            );
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }
    }

    if let Some(category) = filter
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != CATEGORY_ALL)
    {
        clauses.push(
            "EXISTS (SELECT 1 FROM categories c WHERE c.id = q.category_id AND c.name = ?)"
                .to_string(),
        );
        params.push(Box::new(category.to_string()));
    }

    if let Some(tag) = filter.tag.as_deref().filter(|t| !t.is_empty()) {
        clauses.push(tag_exists_clause());
        params.push(Box::new(tag.to_string()));
    }

    match filter.status {
        StatusFilter::All => {}
        StatusFilter::Waiting => clauses.push(
            "NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.deleted = 0)"
                .to_string(),
        ),
        StatusFilter::Answered => clauses.push(
            "EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.deleted = 0)"
                .to_string(),
        ),
    }

    Composed { clauses, params }
}

/// ORDER BY for a whitelisted sort, with the id as a deterministic
/// tiebreaker so pagination never sees a row twice.
pub(crate) fn order_by(sort: Sort) -> &'static str {
    match (sort.key, sort.direction) {
        (SortKey::CreatedAt, SortDirection::Desc) => "q.created_at DESC, q.id DESC",
        (SortKey::CreatedAt, SortDirection::Asc) => "q.created_at ASC, q.id ASC",
        (SortKey::ViewCount, SortDirection::Desc) => "q.view_count DESC, q.id DESC",
        (SortKey::ViewCount, SortDirection::Asc) => "q.view_count ASC, q.id ASC",
    }
}

fn tag_exists_clause() -> String {
    "EXISTS (SELECT 1 FROM question_tags qt JOIN tags t ON t.id = qt.tag_id \
     WHERE qt.question_id = q.id AND t.name = ?)"
        .to_string()
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause_count(filter: &QuestionFilter) -> usize {
        compose(filter).clauses.len()
    }

    #[test]
    fn empty_filter_keeps_only_base_predicate() {
        let composed = compose(&QuestionFilter::default());
        assert_eq!(composed.where_sql(), "q.deleted = 0");
        assert!(composed.into_params().is_empty());
    }

    #[test]
    fn hash_prefix_becomes_tag_predicate() {
        let filter = QuestionFilter {
            search: Some("#react".to_string()),
            ..Default::default()
        };
        let composed = compose(&filter);
        assert!(composed.where_sql().contains("t.name = ?"));
        assert!(!composed.where_sql().contains("LIKE"));
    }

    #[test]
    fn bare_hash_contributes_nothing() {
        let filter = QuestionFilter {
            search: Some("#".to_string()),
            ..Default::default()
        };
        assert_eq!(clause_count(&filter), 1);
    }

    #[test]
    fn keyword_matches_title_or_content() {
        let filter = QuestionFilter {
            search: Some("  MySQL  ".to_string()),
            ..Default::default()
        };
        let composed = compose(&filter);
        assert!(composed.where_sql().contains("LOWER(q.title) LIKE ?"));
        assert!(composed.where_sql().contains("LOWER(q.content) LIKE ?"));
        // Trimmed, lowercased, wrapped in wildcards; bound twice
        assert_eq!(composed.into_params().len(), 2);
    }

    #[test]
    fn like_wildcards_match_literally() {
        assert_eq!(escape_like("50%_done"), r"50\%\_done");
    }

    #[test]
    fn category_all_and_empty_are_ignored() {
        for value in ["ALL", ""] {
            let filter = QuestionFilter {
                category: Some(value.to_string()),
                ..Default::default()
            };
            assert_eq!(clause_count(&filter), 1);
        }

        let filter = QuestionFilter {
            category: Some("SPRING".to_string()),
            ..Default::default()
        };
        assert_eq!(clause_count(&filter), 2);
    }

    #[test]
    fn status_filters_compose_with_others() {
        let filter = QuestionFilter {
            category: Some("SPRING".to_string()),
            tag: Some("jpa".to_string()),
            status: StatusFilter::Waiting,
            search: Some("lazy".to_string()),
        };
        let composed = compose(&filter);
        let sql = composed.where_sql();

        assert!(sql.starts_with("q.deleted = 0 AND "));
        assert!(sql.contains("NOT EXISTS (SELECT 1 FROM answers"));
        // keyword (x2) + category + tag
        assert_eq!(composed.into_params().len(), 4);
    }

    #[test]
    fn sort_whitelist_covers_all_variants() {
        let sort = Sort {
            key: SortKey::ViewCount,
            direction: SortDirection::Asc,
        };
        assert_eq!(order_by(sort), "q.view_count ASC, q.id ASC");
        assert_eq!(order_by(Sort::default()), "q.created_at DESC, q.id DESC");
    }
}
