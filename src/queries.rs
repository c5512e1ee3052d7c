pub mod chats;
pub mod course_units;
pub mod enroll_codes;
pub mod lti;
pub mod messages;
