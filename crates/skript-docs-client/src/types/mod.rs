pub mod models;

pub use models::{
    DocumentationElement, GuildConfig, GuildId, ProviderId, Query, SyntaxType, UserId,
};
