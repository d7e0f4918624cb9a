#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod parser;
pub mod remediation;
pub mod session;

pub use error::{QuizAction, QuizError};
pub use model::{AnswerKey, AnswerKeyIssue, OptionRecord, QuestionRecord};
pub use parser::{answer_key_issues, parse_quiz};
pub use remediation::{Remediation, RemediationBrief, RemediationItem};
pub use session::{Disclosure, OptionMark, Position, QuizProgress, QuizSession, QuizSummary};
