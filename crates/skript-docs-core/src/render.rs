use skript_docs_client::types::DocumentationElement;

use crate::{
    surface::{Embed, EmbedField, EmbedFooter, SelectOption},
    text::{
        clip_with_ellipsis, escape_code_block_content, escape_markdown, join_english_and,
        truncate_chars,
    },
};

pub const SELECT_OPTION_LABEL_MAX_LENGTH: usize = 100;
pub const EMBED_FIELD_VALUE_MAX_LENGTH: usize = 1024;
pub const ELEMENT_DESCRIPTION_MAX_LENGTH: usize = 200;

const CODE_FENCE_OPEN: &str = "```vb\n";
const CODE_FENCE_CLOSE: &str = "\n```";
const NO_DESCRIPTION: &str = "No description available";

/// Builds the detail panel for `element`.
///
/// Examples win over raw patterns for the code block; only the first example
/// is shown. `icon_url` is the producing provider's attribution image.
#[must_use]
pub fn render_element(element: &DocumentationElement, icon_url: Option<&str>) -> Embed {
    let mut fields = vec![code_field(element)];

    if let Some(return_type) = element
        .return_type
        .as_deref()
        .filter(|value| !value.is_empty())
    {
        fields.push(EmbedField {
            name: "Return type".to_string(),
            value: field_value(&escape_markdown(return_type)),
            inline: true,
        });
    }
    if let Some(values) = element.event_values.as_ref().filter(|values| !values.is_empty()) {
        fields.push(EmbedField {
            name: "Event values".to_string(),
            value: field_value(&escape_markdown(&values.join(", "))),
            inline: false,
        });
    }
    if let Some(cancellable) = element.cancellable {
        fields.push(EmbedField {
            name: "Cancellable".to_string(),
            value: if cancellable { "Yes" } else { "No" }.to_string(),
            inline: true,
        });
    }

    let requirements = requirements(element);
    if !requirements.is_empty() {
        fields.push(EmbedField {
            name: "Requirements".to_string(),
            value: field_value(&join_english_and(&requirements)),
            inline: false,
        });
    }

    Embed {
        title: element.name.clone(),
        description: description(&element.description),
        colour: element.syntax_type.colour(),
        url: element.link.clone(),
        fields,
        footer: Some(EmbedFooter {
            text: format!("Documentation provided by {}", element.provider),
            icon_url: icon_url.map(str::to_string),
        }),
    }
}

/// Picker entry for `element`: label is the detailed name, value the global key.
#[must_use]
pub fn element_option(element: &DocumentationElement, selected: bool) -> SelectOption {
    SelectOption {
        label: truncate_chars(&element.detailed_name(), SELECT_OPTION_LABEL_MAX_LENGTH)
            .to_string(),
        value: element.global_key(),
        emoji: Some(element.syntax_type.emoji().to_string()),
        default: selected,
    }
}

fn description(raw: &str) -> String {
    if raw.is_empty() {
        return NO_DESCRIPTION.to_string();
    }
    if raw.chars().count() > ELEMENT_DESCRIPTION_MAX_LENGTH {
        let clamped = truncate_chars(raw, ELEMENT_DESCRIPTION_MAX_LENGTH).trim();
        format!("{}...", escape_markdown(clamped))
    } else {
        escape_markdown(raw)
    }
}

fn code_field(element: &DocumentationElement) -> EmbedField {
    let first_example = element
        .examples
        .as_ref()
        .and_then(|examples| examples.first());
    let (name, body, inline) = match first_example {
        Some(example) => ("Example", example.clone(), true),
        None => ("Pattern", element.patterns.join("\n"), false),
    };
    EmbedField {
        name: name.to_string(),
        value: code_block(&body),
        inline,
    }
}

fn code_block(body: &str) -> String {
    let budget = EMBED_FIELD_VALUE_MAX_LENGTH - CODE_FENCE_OPEN.len() - CODE_FENCE_CLOSE.len();
    let content = clip_with_ellipsis(&escape_code_block_content(body), budget);
    format!("{CODE_FENCE_OPEN}{content}{CODE_FENCE_CLOSE}")
}

fn field_value(text: &str) -> String {
    clip_with_ellipsis(text, EMBED_FIELD_VALUE_MAX_LENGTH)
}

fn requirements(element: &DocumentationElement) -> Vec<String> {
    let mut requirements = Vec::new();
    if let Some(addon) = &element.required_addon {
        match &element.required_addon_version {
            Some(version) => requirements.push(format!("{addon} {version}")),
            None => requirements.push(addon.clone()),
        }
    }
    if let Some(minecraft) = &element.required_minecraft_version {
        requirements.push(format!("Minecraft {minecraft}+"));
    }
    if let Some(plugins) = &element.required_plugins {
        requirements.extend(plugins.iter().cloned());
    }
    requirements
}

#[cfg(test)]
mod tests {
    use skript_docs_client::types::{ProviderId, SyntaxType};

    use super::*;

    fn give() -> DocumentationElement {
        DocumentationElement {
            id: "1203".to_string(),
            provider: ProviderId::new("Skript Hub"),
            name: "Give".to_string(),
            description: "Gives an item to a *player*.".to_string(),
            patterns: vec![
                "give %itemtypes% to %players%".to_string(),
                "give %players% %itemtypes%".to_string(),
            ],
            examples: None,
            required_addon: Some("Skript".to_string()),
            required_addon_version: Some("2.6".to_string()),
            required_minecraft_version: Some("1.13".to_string()),
            syntax_type: SyntaxType::Effect,
            required_plugins: Some(vec!["Vault".to_string()]),
            return_type: None,
            event_values: None,
            cancellable: None,
            link: Some("https://skripthub.net/docs/?id=1203".to_string()),
        }
    }

    fn outline(embed: &Embed) -> String {
        let mut lines = vec![
            format!("title: {}", embed.title),
            format!("url: {}", embed.url.as_deref().unwrap_or("-")),
            format!("colour: {:06X}", embed.colour),
            format!("description: {}", embed.description),
        ];
        for field in &embed.fields {
            let layout = if field.inline { "inline" } else { "block" };
            lines.push(format!("[{}, {layout}]", field.name));
            lines.push(field.value.clone());
        }
        if let Some(footer) = &embed.footer {
            lines.push(format!(
                "footer: {} ({})",
                footer.text,
                footer.icon_url.as_deref().unwrap_or("no icon")
            ));
        }
        lines.join("\n")
    }

    #[test]
    fn renders_pattern_panel() {
        let embed = render_element(&give(), Some("https://i.imgur.com/YkzJ97l.png"));
        insta::assert_snapshot!(outline(&embed), @r"
        title: Give
        url: https://skripthub.net/docs/?id=1203
        colour: 3498DB
        description: Gives an item to a \*player\*.
        [Pattern, block]
        ```vb
        give %itemtypes% to %players%
        give %players% %itemtypes%
        ```
        [Requirements, block]
        Skript 2.6, Minecraft 1.13+, and Vault
        footer: Documentation provided by Skript Hub (https://i.imgur.com/YkzJ97l.png)
        ");
    }

    #[test]
    fn examples_replace_patterns() {
        let mut element = give();
        element.examples = Some(vec!["give player a diamond".to_string(), "unused".to_string()]);

        let embed = render_element(&element, None);
        let field = &embed.fields[0];

        assert_eq!(field.name, "Example");
        assert!(field.inline);
        assert_eq!(field.value, "```vb\ngive player a diamond\n```");
        assert_eq!(embed.footer.and_then(|footer| footer.icon_url), None);
    }

    #[test]
    fn fetched_but_empty_examples_fall_back_to_patterns() {
        let mut element = give();
        element.examples = Some(Vec::new());

        assert_eq!(render_element(&element, None).fields[0].name, "Pattern");
    }

    #[test]
    fn long_description_is_clamped() {
        let mut element = give();
        element.description = "a".repeat(250);

        let description = render_element(&element, None).description;

        assert_eq!(description, format!("{}...", "a".repeat(200)));
    }

    #[test]
    fn empty_description_has_placeholder() {
        let mut element = give();
        element.description = String::new();

        assert_eq!(render_element(&element, None).description, "No description available");
    }

    #[test]
    fn code_block_fits_field_budget() {
        let mut element = give();
        element.patterns = vec!["x".repeat(5000)];

        let value = render_element(&element, None).fields[0].value.clone();

        assert_eq!(value.chars().count(), EMBED_FIELD_VALUE_MAX_LENGTH);
        assert!(value.ends_with("…\n```"));
    }

    #[test]
    fn optional_sections_render_when_present() {
        let mut element = give();
        element.required_addon = None;
        element.required_minecraft_version = None;
        element.required_plugins = None;
        element.return_type = Some("Number".to_string());
        element.event_values = Some(vec!["event-player".to_string(), "event-world".to_string()]);
        element.cancellable = Some(true);

        let embed = render_element(&element, None);

        assert_eq!(embed.field("Return type").map(|f| f.value.as_str()), Some("Number"));
        assert_eq!(
            embed.field("Event values").map(|f| f.value.as_str()),
            Some("event-player, event-world")
        );
        assert_eq!(embed.field("Cancellable").map(|f| f.value.as_str()), Some("Yes"));
        assert!(embed.field("Requirements").is_none());
    }

    #[test]
    fn option_label_is_truncated() {
        let mut element = give();
        element.name = "n".repeat(150);

        let option = element_option(&element, true);

        assert_eq!(option.label.chars().count(), SELECT_OPTION_LABEL_MAX_LENGTH);
        assert_eq!(option.value, "Skript Hub:1203");
        assert!(option.default);
    }
}
