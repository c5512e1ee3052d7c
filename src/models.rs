pub mod chats;
pub mod course_units;
pub mod enroll_codes;
pub mod lti;
pub mod messages;
pub mod sessions;
pub mod users;
pub mod websocket;
