mod answer;
mod bank;
mod group;
mod ids;
mod question;
mod user;

pub use answer::{Answer, AnswerState, MarkSet, Selection};
pub use bank::{
    BankEntry, BankError, ContextGroupDraft, QuestionBank, QuestionDraft, SubQuestionDraft,
    flatten, flattened_len, select_subjects,
};
pub use group::{
    Group, GroupError, Invitation, InvitationRequest, InvitationStatus, JoinRequest, NewGroup,
};
pub use ids::{AttemptId, GroupId, ParseIdError, QuestionId};
pub use question::{ContextBlock, ContextLink, QuestionBody, QuestionItem, QuestionKind};
pub use user::{MIN_PASSWORD_LEN, NewUser, RegistrationForm, Role, UserError, UserPublicInfo};
