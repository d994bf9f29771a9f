use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an in-flight or completed tool invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Completed,
    Error,
}

/// A single tool invocation attached to a message.
///
/// `arguments` is kept as a serialized JSON value rather than a typed
/// struct: the executor never interprets tool arguments, only carries
/// them, so the conservative choice is the one that does not constrain
/// collaborator tool implementations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    pub status: ToolCallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ToolCall {
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            output: None,
            status: ToolCallStatus::Pending,
            completed_at: None,
        }
    }

    /// Returns a copy of this call marked completed with the given output.
    #[must_use]
    pub fn with_output(&self, output: serde_json::Value) -> Self {
        let mut next = self.clone();
        next.output = Some(output);
        next.status = ToolCallStatus::Completed;
        next.completed_at = Some(Utc::now());
        next
    }
}

/// A message in a conversation, containing a role and text content.
///
/// Messages are the primary data structure for representing chat
/// interactions, AI conversations, and communication between nodes in the
/// workflow system. Each message has a role (typically `"user"`,
/// `"assistant"`, `"system"`, or `"tool"`) and text content.
///
/// # Examples
///
/// ## Basic construction
/// ```
/// use graphflow::message::Message;
///
/// let user_msg = Message::user("What is the weather?");
/// let assistant_msg = Message::assistant("It's sunny today!");
/// let system_msg = Message::system("You are a helpful assistant.");
/// ```
///
/// # Serialization
///
/// Messages implement `Serialize`/`Deserialize` and round-trip through
/// JSON:
/// ```
/// use graphflow::message::Message;
///
/// let msg = Message::user("test");
/// let json = serde_json::to_string(&msg).unwrap();
/// let parsed: Message = serde_json::from_str(&json).unwrap();
/// assert_eq!(msg, parsed);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// The role of the message sender (e.g., "user", "assistant", "system").
    ///
    /// Use the constants on [`Message`] for standardized values.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool-result message role.
    pub const TOOL: &'static str = "tool";

    /// Creates a new message with the specified role and content.
    ///
    /// # Examples
    /// ```
    /// use graphflow::message::Message;
    ///
    /// let msg = Message::new(Message::USER, "Hello!");
    /// assert_eq!(msg.role, "user");
    /// assert_eq!(msg.content, "Hello!");
    /// ```
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            tool_calls: None,
            name: None,
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    #[must_use]
    pub fn tool(content: &str) -> Self {
        Self::new(Self::TOOL, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Returns a copy of this message carrying the given tool calls.
    ///
    /// Messages are immutable; this never mutates `self`.
    #[must_use]
    pub fn with_tool_calls(&self, tool_calls: Vec<ToolCall>) -> Self {
        let mut next = self.clone();
        next.tool_calls = Some(tool_calls);
        next
    }

    /// Returns a copy of this message carrying the given sender name
    /// (used for e.g. named tool/function senders).
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.name = Some(name.into());
        next
    }
}
