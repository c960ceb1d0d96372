//! Error types for the session layer.

/// Reasons an answer is turned away by [`Session::submit_answer`](crate::Session::submit_answer).
///
/// Rejections never change session state; the message goes back to the
/// participant who sent the answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// This participant already answered the current question.
    #[error("answer already submitted for this question")]
    DuplicateAnswer,

    /// The answer's timestamp is past the deadline, or the question is no
    /// longer open (already scored, or not yet shown).
    #[error("answer arrived after the deadline")]
    AnswerAfterDeadline,

    /// The answer names a question other than the one on screen.
    #[error("answer is for a different question")]
    QuestionMismatch,

    /// The participant was not in the room when this game started.
    #[error("player is not part of the running game")]
    NotInSession,
}

/// Errors from building or loading a [`QuestionBank`](crate::QuestionBank).
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed question data: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record parsed but breaks a rule the game depends on.
    #[error("invalid question {id:?}: {reason}")]
    InvalidQuestion { id: String, reason: String },
}
