//! Error taxonomy shared across the workspace
//!
//! Every business failure carries a stable machine-readable code so the
//! frontend can branch on it without parsing messages.

use thiserror::Error;

/// Stable error codes exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication
    InvalidEmailOrPassword,
    LoginRequired,

    // Authorization
    AccessDenied,

    // Members
    MemberNotFound,
    MemberAlreadyWithdrawn,
    DuplicateEmail,
    NicknameDuplicated,
    NicknameLengthViolation,
    PasswordPolicyViolation,

    // Questions and answers
    QuestionNotFound,
    CategoryNotFound,
    AnswerNotFound,
    AnswerQuestionMismatch,
    QuestionHasActiveAnswers,
}

impl ErrorCode {
    /// Wire identifier, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEmailOrPassword => "INVALID_EMAIL_OR_PASSWORD",
            Self::LoginRequired => "LOGIN_REQUIRED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::MemberAlreadyWithdrawn => "MEMBER_ALREADY_WITHDRAWN",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::NicknameDuplicated => "NICKNAME_DUPLICATED",
            Self::NicknameLengthViolation => "NICKNAME_LENGTH_VIOLATION",
            Self::PasswordPolicyViolation => "PASSWORD_POLICY_VIOLATION",
            Self::QuestionNotFound => "QUESTION_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::AnswerNotFound => "ANSWER_NOT_FOUND",
            Self::AnswerQuestionMismatch => "ANSWER_QUESTION_MISMATCH",
            Self::QuestionHasActiveAnswers => "QUESTION_HAS_ACTIVE_ANSWERS",
        }
    }

    /// Human-readable default message. The frontend displays these verbatim,
    /// so keep them consistent.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidEmailOrPassword => "Email or password is incorrect",
            Self::LoginRequired => "Login required",
            Self::AccessDenied => "You do not have permission for this action",
            Self::MemberNotFound => "Member not found",
            Self::MemberAlreadyWithdrawn => "Member has already withdrawn",
            Self::DuplicateEmail => "Email is already registered",
            Self::NicknameDuplicated => "Nickname is already in use",
            Self::NicknameLengthViolation => "Nickname must be at least 2 characters",
            Self::PasswordPolicyViolation => "Password must be at least 8 characters",
            Self::QuestionNotFound => "Question not found",
            Self::CategoryNotFound => "Category not found",
            Self::AnswerNotFound => "Answer not found",
            Self::AnswerQuestionMismatch => "Answer does not belong to this question",
            Self::QuestionHasActiveAnswers => {
                "A question with active answers cannot be deleted"
            }
        }
    }
}

/// Domain error type.
///
/// The variant selects the HTTP status class; the code selects the wire
/// identifier. Storage failures carry no code and surface as a generic 500.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist or is soft-deleted
    #[error("{}", .0.message())]
    NotFound(ErrorCode),

    /// Uniqueness or state conflict
    #[error("{}", .0.message())]
    Conflict(ErrorCode),

    /// Ownership or role check failed
    #[error("{}", .0.message())]
    Forbidden(ErrorCode),

    /// Malformed or policy-violating input
    #[error("{}", .0.message())]
    Validation(ErrorCode),

    /// Missing or unverifiable credentials
    #[error("{}", .0.message())]
    Unauthorized(ErrorCode),

    /// Backend failure, never exposed in detail
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// The machine-readable code, if this is a business error.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::NotFound(c)
            | Self::Conflict(c)
            | Self::Forbidden(c)
            | Self::Validation(c)
            | Self::Unauthorized(c) => Some(*c),
            Self::Storage(_) => None,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::DuplicateEmail.as_str(), "DUPLICATE_EMAIL");
        assert_eq!(
            ErrorCode::QuestionHasActiveAnswers.as_str(),
            "QUESTION_HAS_ACTIVE_ANSWERS"
        );
    }

    #[test]
    fn error_exposes_code() {
        let err = Error::Conflict(ErrorCode::NicknameDuplicated);
        assert_eq!(err.code(), Some(ErrorCode::NicknameDuplicated));
        assert_eq!(err.to_string(), "Nickname is already in use");

        let err = Error::Storage("disk full".into());
        assert_eq!(err.code(), None);
    }
}
