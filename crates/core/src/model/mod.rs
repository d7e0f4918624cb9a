mod key;
mod question;

pub use key::AnswerKey;
pub use question::{AnswerKeyIssue, OptionRecord, QuestionRecord};
