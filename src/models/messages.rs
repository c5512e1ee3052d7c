use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::utils::html;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Base,
    Orct,
    Answer,
    Errmod,
    Chatdivider,
    Uniterror,
    Response,
    Message,
    Button,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_input_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Options,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Default,
    User,
    Breakpoint,
}

/// The option set a message offers the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_options", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OptionSet {
    Confidence,
    Selfeval,
    Status,
    Errors,
    Continue,
}

impl OptionSet {
    /// Fixed button labels. `Errors` is filled from the lesson's error
    /// models at render time by the client, so it has none.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            OptionSet::Confidence => &["Just guessing", "Not quite sure", "Pretty sure"],
            OptionSet::Selfeval => &["Different", "Close", "Essentially the same"],
            OptionSet::Status => &[
                "Still confused",
                "OK, but need further review and practice",
                "Solidly",
            ],
            OptionSet::Errors => &[],
            OptionSet::Continue => &["Continue"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_sub_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubKind {
    Canvas,
}

/// Target type of the polymorphic `content_type`/`content_id` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_content_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Unitlesson,
    Response,
    Studenterror,
    Chatdivider,
    Uniterror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub content_type: ContentType,
    pub content_id: i64,
}

/// What the conversation expects after a message is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    AwaitText,
    AwaitChoice,
    AwaitCustom,
    Proceed,
    NewSegment,
    EndBranch,
}

impl MessageKind {
    pub fn follow_up(self, input_type: Option<InputType>) -> FollowUp {
        match self {
            MessageKind::Abort => FollowUp::EndBranch,
            MessageKind::Chatdivider => FollowUp::NewSegment,
            MessageKind::Button => FollowUp::AwaitChoice,
            _ => match input_type {
                Some(InputType::Text) => FollowUp::AwaitText,
                Some(InputType::Options) => FollowUp::AwaitChoice,
                Some(InputType::Custom) => FollowUp::AwaitCustom,
                None => FollowUp::Proceed,
            },
        }
    }

    /// A learner's response to a lesson counts towards chat progress.
    pub fn advances_progress(self) -> bool {
        matches!(self, MessageKind::Response)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub kind: MessageKind,
    pub input_type: Option<InputType>,
    pub message_type: MessageType,
    pub text: Option<String>,
    pub options: Option<OptionSet>,
    pub sub_kind: Option<SubKind>,
    pub content_type: Option<ContentType>,
    pub content_id: Option<i64>,
    pub lesson_to_answer_id: Option<i64>,
    pub response_to_check_id: Option<i64>,
    pub student_error_id: Option<i64>,
    pub is_additional: bool,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn content(&self) -> Option<ContentRef> {
        match (self.content_type, self.content_id) {
            (Some(content_type), Some(content_id)) => Some(ContentRef {
                content_type,
                content_id,
            }),
            _ => None,
        }
    }

    pub fn follow_up(&self) -> FollowUp {
        self.kind.follow_up(self.input_type)
    }

    pub fn is_canvas(&self) -> bool {
        self.sub_kind == Some(SubKind::Canvas)
    }

    pub fn get_html(&self) -> String {
        let text = self.text.as_deref().unwrap_or_default();
        if self.is_canvas() {
            return html::canvas_svg(text);
        }

        let body = html::text_to_html(text);
        let mut out = match self.kind {
            MessageKind::Chatdivider => format!("<div class=\"chat-divider\">{}</div>", body),
            _ => body,
        };
        if let Some(options) = self.options {
            out.push_str(&html::option_buttons(options.labels()));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub owner_id: Uuid,
    pub kind: MessageKind,
    pub input_type: Option<InputType>,
    pub message_type: MessageType,
    pub text: Option<String>,
    pub options: Option<OptionSet>,
    pub sub_kind: Option<SubKind>,
    pub content: Option<ContentRef>,
    pub lesson_to_answer_id: Option<i64>,
    pub response_to_check_id: Option<i64>,
    pub student_error_id: Option<i64>,
    pub is_additional: bool,
}

impl NewMessage {
    pub fn new(chat_id: Uuid, owner_id: Uuid, kind: MessageKind) -> Self {
        Self {
            chat_id,
            owner_id,
            kind,
            input_type: None,
            message_type: MessageType::Default,
            text: None,
            options: None,
            sub_kind: None,
            content: None,
            lesson_to_answer_id: None,
            response_to_check_id: None,
            student_error_id: None,
            is_additional: false,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let needs_options =
            self.kind == MessageKind::Button || self.input_type == Some(InputType::Options);
        if needs_options && self.options.is_none() {
            return Err(AppError::BadRequest(anyhow!(
                "messages offering a choice must name an option set"
            )));
        }
        if self.sub_kind == Some(SubKind::Canvas) && self.input_type != Some(InputType::Custom) {
            return Err(AppError::BadRequest(anyhow!(
                "canvas messages must use the custom input type"
            )));
        }
        Ok(())
    }

    pub fn into_record(self, id: Uuid, timestamp: DateTime<Utc>) -> Message {
        Message {
            id,
            chat_id: Some(self.chat_id),
            owner_id: self.owner_id,
            kind: self.kind,
            input_type: self.input_type,
            message_type: self.message_type,
            text: self.text,
            options: self.options,
            sub_kind: self.sub_kind,
            content_type: self.content.map(|c| c.content_type),
            content_id: self.content.map(|c| c.content_id),
            lesson_to_answer_id: self.lesson_to_answer_id,
            response_to_check_id: self.response_to_check_id,
            student_error_id: self.student_error_id,
            is_additional: self.is_additional,
            timestamp: Some(timestamp),
        }
    }
}

/// Message row for the admin list, with columns derived from the related chat.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageAdminRow {
    pub id: Uuid,
    pub kind: MessageKind,
    pub message_type: MessageType,
    pub owner_id: Uuid,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub chat_id: Option<Uuid>,
    pub chat_state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: MessageKind) -> NewMessage {
        NewMessage::new(Uuid::new_v4(), Uuid::new_v4(), kind)
    }

    #[test]
    fn kind_dispatch() {
        assert_eq!(MessageKind::Abort.follow_up(Some(InputType::Text)), FollowUp::EndBranch);
        assert_eq!(MessageKind::Chatdivider.follow_up(None), FollowUp::NewSegment);
        assert_eq!(MessageKind::Button.follow_up(None), FollowUp::AwaitChoice);
        assert_eq!(MessageKind::Orct.follow_up(Some(InputType::Text)), FollowUp::AwaitText);
        assert_eq!(MessageKind::Errmod.follow_up(Some(InputType::Options)), FollowUp::AwaitChoice);
        assert_eq!(MessageKind::Base.follow_up(Some(InputType::Custom)), FollowUp::AwaitCustom);
        assert_eq!(MessageKind::Message.follow_up(None), FollowUp::Proceed);
    }

    #[test]
    fn only_responses_advance_progress() {
        assert!(MessageKind::Response.advances_progress());
        assert!(!MessageKind::Orct.advances_progress());
        assert!(!MessageKind::Answer.advances_progress());
    }

    #[test]
    fn kinds_serialize_lowercase() {
        let json = serde_json::to_string(&MessageKind::Chatdivider).unwrap();
        assert_eq!(json, "\"chatdivider\"");
        let kind: MessageKind = serde_json::from_str("\"uniterror\"").unwrap();
        assert_eq!(kind, MessageKind::Uniterror);
    }

    #[test]
    fn button_without_options_is_rejected() {
        let msg = message(MessageKind::Button);
        assert!(matches!(msg.validate(), Err(AppError::BadRequest(_))));

        let mut msg = message(MessageKind::Button);
        msg.options = Some(OptionSet::Continue);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn canvas_requires_custom_input() {
        let mut msg = message(MessageKind::Response);
        msg.sub_kind = Some(SubKind::Canvas);
        msg.input_type = Some(InputType::Text);
        assert!(msg.validate().is_err());
        msg.input_type = Some(InputType::Custom);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn content_ref_needs_both_halves() {
        let mut record = message(MessageKind::Orct).into_record(Uuid::new_v4(), Utc::now());
        assert_eq!(record.content(), None);
        record.content_type = Some(ContentType::Unitlesson);
        assert_eq!(record.content(), None);
        record.content_id = Some(7);
        assert_eq!(
            record.content(),
            Some(ContentRef {
                content_type: ContentType::Unitlesson,
                content_id: 7
            })
        );
    }

    #[test]
    fn canvas_html_is_svg() {
        let mut msg = message(MessageKind::Response);
        msg.input_type = Some(InputType::Custom);
        msg.sub_kind = Some(SubKind::Canvas);
        msg.text = Some(
            "drawing: <svg width=\"10\" height=\"10\"><circle r=\"4\"/></svg> trailing".into(),
        );
        let html = msg.into_record(Uuid::new_v4(), Utc::now()).get_html();
        assert!(html.starts_with("<svg"));
        assert!(html.ends_with("</svg>"));
        assert!(html.contains("<circle r=\"4\"/>"));
    }

    #[test]
    fn empty_canvas_still_renders_svg() {
        let mut msg = message(MessageKind::Response);
        msg.input_type = Some(InputType::Custom);
        msg.sub_kind = Some(SubKind::Canvas);
        let html = msg.into_record(Uuid::new_v4(), Utc::now()).get_html();
        assert!(html.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(html.ends_with("</svg>"));
    }

    #[test]
    fn divider_and_options_html() {
        let mut msg = message(MessageKind::Chatdivider);
        msg.text = Some("Part <2>".into());
        let html = msg.into_record(Uuid::new_v4(), Utc::now()).get_html();
        assert_eq!(html, "<div class=\"chat-divider\">Part &lt;2&gt;</div>");

        let mut msg = message(MessageKind::Button);
        msg.options = Some(OptionSet::Confidence);
        let html = msg.into_record(Uuid::new_v4(), Utc::now()).get_html();
        assert!(html.contains("<button class=\"chat-option\">Pretty sure</button>"));
    }
}
