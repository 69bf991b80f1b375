//! Platform-neutral message model and the surface a session renders onto.
//!
//! A surface is bound to one originating interaction. Its "original" message
//! is the ephemeral working view a session keeps editing; the channel send is
//! the only way a session publishes anything visible to others.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skript_docs_client::types::UserId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

impl Message {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// The select menu or button bound to `control`, if rendered.
    pub fn component(&self, control: ControlId) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.control() == control)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub colour: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    pub fn field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Stable identifiers of the controls a search session renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    Results,
    ReplyTarget,
    Sources,
    Confirm,
    Cancel,
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Results => "results",
            Self::ReplyTarget => "reply_target",
            Self::Sources => "sources",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Select(SelectMenu),
    Button(Button),
}

impl Component {
    pub fn control(&self) -> ControlId {
        match self {
            Self::Select(menu) => menu.control,
            Self::Button(button) => button.control,
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            Self::Select(menu) => menu.disabled,
            Self::Button(button) => button.disabled,
        }
    }

    pub fn disable(&mut self) {
        match self {
            Self::Select(menu) => menu.disabled = true,
            Self::Button(button) => button.disabled = true,
        }
    }

    pub fn as_select(&self) -> Option<&SelectMenu> {
        match self {
            Self::Select(menu) => Some(menu),
            Self::Button(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectMenu {
    pub control: ControlId,
    pub placeholder: String,
    pub min_values: usize,
    pub max_values: usize,
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub disabled: bool,
}

impl SelectMenu {
    /// Values of the options currently marked as default.
    pub fn selected_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| option.default)
            .map(|option| option.value.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub control: ControlId,
    pub label: String,
    pub style: ButtonStyle,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Success,
    Danger,
}

/// A user as the chat platform presents them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
}

/// A user acting on one of a session's controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInteraction {
    pub control: ControlId,
    #[serde(default)]
    pub values: Vec<String>,
    pub user: Participant,
}

#[async_trait]
pub trait InteractionSurface: Send + Sync {
    /// First reply to the originating interaction. Becomes the original message.
    async fn respond(&self, message: Message) -> Result<()>;
    /// Replaces the original message wholesale.
    async fn edit_original(&self, message: Message) -> Result<()>;
    async fn delete_original(&self) -> Result<()>;
    /// Posts a public message into the channel the interaction came from.
    async fn send_to_channel(&self, message: Message) -> Result<()>;
}
