//! Command table shared between live controllers and the chat client.
//!
//! Controllers register named handlers at construction time; the client's
//! dispatch layer routes prefixed chat messages to them. A handler always
//! receives the owning plugin's *current* settings, never a snapshot taken
//! at registration.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{PluginError, PluginResult};
use crate::settings::{Settings, SharedSettings};

/// A chat message as seen by the dispatch layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub author: String,
    pub author_is_admin: bool,
    pub channel: String,
    pub content: String,
}

impl IncomingMessage {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            author_is_admin: false,
            channel: "general".to_string(),
            content: content.into(),
        }
    }

    /// Mark the author as a server administrator.
    pub fn as_admin(mut self) -> Self {
        self.author_is_admin = true;
        self
    }

    pub fn in_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}

/// Invocation context handed to a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Prefix the command was invoked with.
    pub prefix: String,
    pub command: String,
    pub author: String,
    pub author_is_admin: bool,
    pub channel: String,
    pub args: Vec<String>,
}

impl CommandContext {
    /// Positional argument.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// All arguments from `index` on, joined by spaces.
    pub fn rest_from(&self, index: usize) -> Option<String> {
        if index >= self.args.len() {
            return None;
        }
        Some(self.args[index..].join(" "))
    }
}

/// Moderation action a command asks the chat client to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Ban { member: String, reason: String },
    Kick { member: String, reason: String },
    Mute { member: String, role: String, minutes: i64, reason: String },
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ban { member, reason } => write!(f, "ban {member} ({reason})"),
            Self::Kick { member, reason } => write!(f, "kick {member} ({reason})"),
            Self::Mute { member, role, minutes, reason } => {
                write!(f, "mute {member} as '{role}' for {minutes}m ({reason})")
            }
        }
    }
}

/// What a handler sends back: chat replies plus actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReply {
    pub messages: Vec<String>,
    pub actions: Vec<ModerationAction>,
}

impl CommandReply {
    /// Single text reply.
    pub fn text(message: impl Into<String>) -> Self {
        Self { messages: vec![message.into()], actions: Vec::new() }
    }

    /// Append another reply line.
    pub fn and_text(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn with_action(mut self, action: ModerationAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.actions.is_empty()
    }
}

/// Signature of a command handler.
pub type CommandHandler = Arc<dyn Fn(&CommandContext, &Settings) -> CommandReply + Send + Sync>;

struct RegisteredCommand {
    name: String,
    plugin: String,
    settings: SharedSettings,
    handler: CommandHandler,
}

/// Split `content` into a command name and arguments if it carries `prefix`.
pub fn parse_invocation(prefix: &str, content: &str) -> Option<(String, Vec<String>)> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    Some((name.to_string(), parts.map(str::to_string).collect()))
}

/// Named commands registered for one run of the service.
#[derive(Default)]
pub struct CommandTable {
    commands: RwLock<Vec<RegisteredCommand>>,
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable").field("commands", &self.names()).finish()
    }
}

impl CommandTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name` for `plugin`.
    ///
    /// The first registration of a name wins.
    pub fn register<F>(
        &self,
        plugin: &str,
        name: &str,
        settings: SharedSettings,
        handler: F,
    ) -> PluginResult<()>
    where
        F: Fn(&CommandContext, &Settings) -> CommandReply + Send + Sync + 'static,
    {
        let mut commands = self.commands.write();
        if let Some(existing) = commands.iter().find(|c| c.name == name) {
            return Err(PluginError::DuplicateCommand {
                command: name.to_string(),
                owner: existing.plugin.clone(),
            });
        }

        commands.push(RegisteredCommand {
            name: name.to_string(),
            plugin: plugin.to_string(),
            settings,
            handler: Arc::new(handler),
        });
        debug!(plugin, command = name, "Command registered");
        Ok(())
    }

    /// Registered command names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.commands.read().iter().map(|c| c.name.clone()).collect()
    }

    /// Plugin that owns a command.
    pub fn owner(&self, name: &str) -> Option<String> {
        self.commands.read().iter().find(|c| c.name == name).map(|c| c.plugin.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.read().iter().any(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    /// Run a command by name with an already-built context.
    pub fn invoke(&self, ctx: &CommandContext) -> Option<CommandReply> {
        let (handler, settings) = {
            let commands = self.commands.read();
            let command = commands.iter().find(|c| c.name == ctx.command)?;
            (Arc::clone(&command.handler), Arc::clone(&command.settings))
        };

        let current = settings.read();
        Some(handler(ctx, &current))
    }

    /// Route a chat message to its command, if it is one.
    pub fn dispatch(&self, prefix: &str, message: &IncomingMessage) -> Option<CommandReply> {
        let (command, args) = parse_invocation(prefix, &message.content)?;
        let ctx = CommandContext {
            prefix: prefix.to_string(),
            command,
            author: message.author.clone(),
            author_is_admin: message.author_is_admin,
            channel: message.channel.clone(),
            args,
        };
        self.invoke(&ctx)
    }
}
