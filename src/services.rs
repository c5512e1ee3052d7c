pub mod chats;
pub mod enroll_codes;
pub mod progress;
