//! Conversation history and personal medical records
//!
//! Both are collaborators of the agents: the chat log backs the history agent and
//! turn persistence, the record service backs the personal-record agent.

pub mod chat_log;
pub mod memory;
pub mod postgres;
pub mod records;

pub use chat_log::{session_title, ChatLog, LoggedTurn, SessionMessage, SessionSummary};
pub use memory::InMemoryChatLog;
pub use postgres::PgChatLog;
pub use records::{
    Allergy, BackendRecordClient, Condition, HealthProfile, Medication, PersonalRecords, Prescription,
    RecordCategory, UserRecordService, Visit,
};
