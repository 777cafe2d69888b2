use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Time tag given to a message that arrives without one.
pub const DEFAULT_MESSAGE_TIME: &str = "当天";

/// A stored chat line.
///
/// Rendered as `{age}岁 {sender}: [{content}] [{time}]`; the sender part is
/// omitted when empty and the time part when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub age: u32,
    pub sender: String,
    pub content: String,
    pub time: Option<String>,
}

impl MessageRecord {
    pub fn render(&self) -> String {
        let mut line = format!("{}岁 ", self.age);
        if !self.sender.is_empty() {
            line.push_str(&self.sender);
            line.push_str(": ");
        }
        line.push('[');
        line.push_str(&self.content);
        line.push(']');
        if let Some(time) = &self.time {
            line.push_str(" [");
            line.push_str(time);
            line.push(']');
        }
        line
    }
}

/// Body of a message after its age tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParts {
    pub sender: String,
    pub content: String,
    pub time: Option<String>,
    /// Whether the content was wrapped in brackets.
    pub bracketed: bool,
}

/// Splits a leading `{digits}岁` tag off `text`.
pub fn split_age_tag(text: &str) -> Option<(u32, &str)> {
    let digits_end = text.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let rest = text[digits_end..].strip_prefix('岁')?;
    let age = text[..digits_end].parse().ok()?;
    let rest = rest.trim_start_matches(|c: char| c == '：' || c == ':' || c.is_whitespace());
    Some((age, rest))
}

/// Parses `sender: [content] [time]`, `sender: content` or bare text.
pub fn split_message_body(body: &str) -> MessageParts {
    let (sender, rest) = match body.split_once(':').or_else(|| body.split_once('：')) {
        Some((sender, rest)) => (sender.trim(), rest.trim()),
        None => ("", body.trim()),
    };

    if let Some(inner) = rest.strip_prefix('[') {
        if let Some((content, tail)) = inner.split_once(']') {
            let time = tail
                .trim()
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from);
            return MessageParts {
                sender: sender.to_string(),
                content: content.trim().to_string(),
                time,
                bracketed: true,
            };
        }
    }

    MessageParts {
        sender: sender.to_string(),
        content: rest.to_string(),
        time: None,
        bracketed: false,
    }
}

/// One conversation returned by the chat workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    #[serde(default)]
    pub from_character: String,
    #[serde(default)]
    pub message_chain: Vec<ChatLine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_form() {
        let record = MessageRecord {
            age: 14,
            sender: "小明".into(),
            content: "放学一起走吗".into(),
            time: Some(DEFAULT_MESSAGE_TIME.into()),
        };
        assert_eq!(record.render(), "14岁 小明: [放学一起走吗] [当天]");
    }

    #[test]
    fn age_tag_requires_digits_and_suffix() {
        assert_eq!(split_age_tag("15岁 小红: [hi]"), Some((15, "小红: [hi]")));
        assert_eq!(split_age_tag("15岁：考试"), Some((15, "考试")));
        assert_eq!(split_age_tag("岁月"), None);
        assert_eq!(split_age_tag("15 years"), None);
    }

    #[test]
    fn body_with_brackets_keeps_time() {
        let parts = split_message_body("妈妈: [记得吃饭] [晚上]");
        assert_eq!(parts.sender, "妈妈");
        assert_eq!(parts.content, "记得吃饭");
        assert_eq!(parts.time.as_deref(), Some("晚上"));
        assert!(parts.bracketed);
    }

    #[test]
    fn plain_body_splits_on_first_colon() {
        let parts = split_message_body("老师: 明天交作业: 别忘了");
        assert_eq!(parts.sender, "老师");
        assert_eq!(parts.content, "明天交作业: 别忘了");
        assert_eq!(parts.time, None);
        assert!(!parts.bracketed);
    }

    #[test]
    fn chat_thread_keeps_unknown_fields() {
        let thread: ChatThread = serde_json::from_str(
            r#"{"fromCharacter": "小红", "mood": "happy", "messageChain": [{"text": "在吗"}]}"#,
        )
        .unwrap();
        assert_eq!(thread.from_character, "小红");
        assert_eq!(thread.message_chain[0].text, "在吗");
        assert_eq!(thread.extra["mood"], "happy");
    }
}
