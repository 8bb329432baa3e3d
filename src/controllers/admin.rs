//! Moderation commands: `ban`, `kick`, `mute`.
//!
//! All three are restricted to server administrators. Each is gated by its
//! own enable flag, read once when the controller is constructed. Reasons,
//! the mute role and the mute duration are read from the live settings on
//! every invocation.

use std::sync::Arc;

use crate::plugin::{
    into_boxed, CommandContext, CommandReply, Controller, ControllerBase, ControllerOptions,
    ModerationAction, PluginHost,
};
use crate::settings::Settings;

const DEFAULT_REASON: &str = "No reason provided";
const DEFAULT_MUTE_ROLE: &str = "Muted";
const DEFAULT_MUTE_MINUTES: i64 = 60;

/// Administrative controller.
#[derive(Debug)]
pub struct AdminController {
    base: ControllerBase,
}

impl AdminController {
    /// Exported type name.
    pub const TYPE_NAME: &'static str = "ControllerAdmin";

    pub fn default_settings() -> Settings {
        Settings::new()
            .with("ban_enabled", true)
            .with("kick_enabled", true)
            .with("mute_enabled", true)
            .with("default_ban_reason", DEFAULT_REASON)
            .with("default_mute_role", DEFAULT_MUTE_ROLE)
            .with("default_mute_duration", DEFAULT_MUTE_MINUTES)
    }

    pub fn new(host: Arc<dyn PluginHost>, options: ControllerOptions) -> Self {
        Self { base: ControllerBase::new(Self::TYPE_NAME, Self::default_settings(), host, options) }
    }

    /// Catalog factory.
    pub fn create(host: Arc<dyn PluginHost>, options: ControllerOptions) -> Box<dyn Controller> {
        into_boxed(Self::new(host, options), options)
    }
}

impl Controller for AdminController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn register_commands(&self) -> Vec<String> {
        let (ban, kick, mute) = {
            let settings = self.base.settings().read();
            (
                settings.bool_or("ban_enabled", true),
                settings.bool_or("kick_enabled", true),
                settings.bool_or("mute_enabled", true),
            )
        };

        let mut registered = Vec::new();
        if ban && self.base.register_command("ban", admin_only(ban_member)) {
            registered.push("ban".to_string());
        }
        if kick && self.base.register_command("kick", admin_only(kick_member)) {
            registered.push("kick".to_string());
        }
        if mute && self.base.register_command("mute", admin_only(mute_member)) {
            registered.push("mute".to_string());
        }
        registered
    }
}

fn admin_only(
    handler: fn(&CommandContext, &Settings) -> CommandReply,
) -> impl Fn(&CommandContext, &Settings) -> CommandReply + Send + Sync + 'static {
    move |ctx, settings| {
        if ctx.author_is_admin {
            handler(ctx, settings)
        } else {
            CommandReply::text("❌ You need administrator permissions to use this command.")
        }
    }
}

fn usage(ctx: &CommandContext, args: &str) -> CommandReply {
    CommandReply::text(format!("Usage: {}{} {args}", ctx.prefix, ctx.command))
}

fn mention(member: &str) -> String {
    format!("@{}", member.trim_start_matches('@'))
}

fn default_reason(settings: &Settings) -> String {
    settings.str_or("default_ban_reason", DEFAULT_REASON).to_string()
}

fn ban_member(ctx: &CommandContext, settings: &Settings) -> CommandReply {
    let Some(member) = ctx.arg(0) else {
        return usage(ctx, "<member> [reason]");
    };
    let reason = ctx.rest_from(1).unwrap_or_else(|| default_reason(settings));

    CommandReply::text(format!("🔨 {} has been banned. Reason: {reason}", mention(member)))
        .with_action(ModerationAction::Ban { member: member.to_string(), reason })
}

fn kick_member(ctx: &CommandContext, _settings: &Settings) -> CommandReply {
    let (Some(member), Some(reason)) = (ctx.arg(0), ctx.rest_from(1)) else {
        return usage(ctx, "<member> <reason>");
    };

    CommandReply::text(format!("👢 {} has been kicked. Reason: {reason}", mention(member)))
        .with_action(ModerationAction::Kick { member: member.to_string(), reason })
}

fn mute_member(ctx: &CommandContext, settings: &Settings) -> CommandReply {
    let Some(member) = ctx.arg(0) else {
        return usage(ctx, "<member> [reason]");
    };
    let reason = ctx.rest_from(1).unwrap_or_else(|| default_reason(settings));
    let role = settings.str_or("default_mute_role", DEFAULT_MUTE_ROLE).to_string();
    let minutes = settings.int_or("default_mute_duration", DEFAULT_MUTE_MINUTES);

    CommandReply::text(format!(
        "🔇 {} has been muted for {minutes} minutes. Reason: {reason}",
        mention(member)
    ))
    .with_action(ModerationAction::Mute { member: member.to_string(), role, minutes, reason })
}
