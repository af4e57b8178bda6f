//! The fixed set of protocol events.
//!
//! Each variant knows which raw command tokens it answers to and how to
//! construct itself from a parsed [`Message`]. The set is closed: new
//! event types are added here, not discovered at runtime.

mod defaults;

pub use defaults::register_default_hooks;

use basalt_proto::{message, Message, User};
use chrono::{DateTime, Utc};

use crate::config::Config;

/// Identifier for an event variant; the key of the hook registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user joined a channel.
    Join,
    /// A user parted a channel.
    Part,
    /// A channel join was refused.
    JoinFailed,
    /// A user was kicked from a channel.
    Kick,
    /// A user changed nick.
    Nick,
    /// The server sent a liveness challenge.
    Ping,
    /// A chat message arrived.
    Message,
    /// A bot command was parsed out of a chat message.
    Command,
    /// The process is shutting down.
    Shutdown,
}

impl EventKind {
    /// Variants constructible straight from an inbound line. `Command` is
    /// derived from a qualifying `Message` event and `Shutdown` is fired
    /// by the supervisor, so neither appears here.
    pub const WIRE: [EventKind; 7] = [
        EventKind::Join,
        EventKind::Part,
        EventKind::JoinFailed,
        EventKind::Kick,
        EventKind::Nick,
        EventKind::Ping,
        EventKind::Message,
    ];

    /// Whether this variant fires for the given raw command token.
    pub fn responds_to(self, command: &str) -> bool {
        match self {
            EventKind::Join => command == "JOIN",
            EventKind::Part => command == "PART",
            EventKind::JoinFailed => join_failure_reason(command).is_some(),
            EventKind::Kick => command == "KICK",
            EventKind::Nick => command == "NICK",
            EventKind::Ping => command == "PING",
            EventKind::Message => command == "PRIVMSG",
            EventKind::Command | EventKind::Shutdown => false,
        }
    }
}

/// Map a join-failure numeric to its fixed human-readable reason.
pub fn join_failure_reason(code: &str) -> Option<&'static str> {
    Some(match code {
        "403" => "No such channel",
        "405" => "Joined too many channels",
        "471" => "Channel is full",
        "473" => "Not invited",
        "474" => "Banned",
        "475" => "Bad password",
        _ => return None,
    })
}

/// A user joined a channel.
#[derive(Clone, Debug)]
pub struct JoinEvent {
    /// Who joined.
    pub source: User,
    /// The channel that was joined.
    pub channel: String,
}

/// A user parted a channel.
#[derive(Clone, Debug)]
pub struct PartEvent {
    /// Who parted.
    pub source: User,
    /// The channel that was parted.
    pub channel: String,
}

/// A channel join was refused.
#[derive(Clone, Debug)]
pub struct JoinFailedEvent {
    /// The channel we attempted to join.
    pub channel: String,
    /// Fixed reason derived from the failure numeric.
    pub reason: &'static str,
}

/// A user was kicked from a channel.
#[derive(Clone, Debug)]
pub struct KickEvent {
    /// Who performed the kick.
    pub source: User,
    /// The channel the target was kicked from.
    pub channel: String,
    /// Nick of the user who was kicked.
    pub target: String,
}

impl KickEvent {
    /// Whether `nick` is the user being kicked. Nicks compare
    /// case-insensitively, as they do on the network.
    pub fn targets(&self, nick: &str) -> bool {
        self.target.eq_ignore_ascii_case(nick)
    }
}

/// A user changed nick. `source.nick` is the old nick.
#[derive(Clone, Debug)]
pub struct NickEvent {
    /// Who changed nick.
    pub source: User,
    /// The new nick.
    pub nick: String,
}

impl NickEvent {
    /// Whether `nick` is the user whose nick changed. Nicks compare
    /// case-insensitively, as they do on the network.
    pub fn is_from(&self, nick: &str) -> bool {
        self.source.nick.eq_ignore_ascii_case(nick)
    }
}

/// The server sent a liveness challenge.
#[derive(Clone, Debug)]
pub struct PingEvent {
    /// Challenge text to echo back in the PONG, verbatim.
    pub challenge: String,
}

/// A chat message.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    /// Who sent the message.
    pub source: User,
    /// Channel (or our own nick for direct messages).
    pub channel: String,
    /// Message text, with any ACTION envelope removed.
    pub content: String,
    /// Whether the message was an emote (`/me`).
    pub action: bool,
    /// When the message arrived.
    pub time: DateTime<Utc>,
}

impl MessageEvent {
    /// Whether this message qualifies as a command invocation: it starts
    /// with the command character, or was sent directly rather than to a
    /// channel, or opens with our nick as a mention.
    pub fn is_command(&self, current_nick: &str, command_char: char) -> bool {
        if self.action || self.content.is_empty() {
            return false;
        }
        starts_with_command(&self.content, command_char)
            || !self.channel.starts_with('#')
            || is_mention(&self.content, current_nick)
    }
}

/// A bot command parsed out of a qualifying chat message.
#[derive(Clone, Debug)]
pub struct CommandEvent {
    /// Who sent the command.
    pub source: User,
    /// Channel the command was sent in (or our nick for direct messages).
    pub channel: String,
    /// Command name, without the trigger prefix.
    pub command: String,
    /// Argument text after the command name; empty if none.
    pub args: String,
    /// When the originating message arrived.
    pub time: DateTime<Utc>,
}

impl CommandEvent {
    /// Derive a command from a chat message by stripping the triggering
    /// prefix (mention or command character) and splitting off the first
    /// token. Returns `None` when no command name remains.
    pub fn derive(
        event: &MessageEvent,
        current_nick: &str,
        command_char: char,
    ) -> Option<CommandEvent> {
        let mut content: &str = &event.content;

        if is_mention(content, current_nick) {
            // Drop the nick plus one separator character, then any
            // whitespace that follows.
            let rest = &content[current_nick.len()..];
            let sep_len = rest.chars().next().map(char::len_utf8).unwrap_or(0);
            content = rest[sep_len..].trim_start();
        }

        if let Some(rest) = content.strip_prefix(command_char) {
            content = rest;
        }

        let content = content.trim_start();
        let (command, args) = match content.split_once(' ') {
            Some((command, args)) => (command, args),
            None => (content, ""),
        };
        if command.is_empty() {
            return None;
        }

        Some(CommandEvent {
            source: event.source.clone(),
            channel: event.channel.clone(),
            command: command.to_string(),
            args: args.to_string(),
            time: event.time,
        })
    }
}

/// An event of which the server has notified us, or which the engine
/// itself raises (`Command`, `Shutdown`).
#[derive(Clone, Debug)]
pub enum Event {
    /// See [`JoinEvent`].
    Join(JoinEvent),
    /// See [`PartEvent`].
    Part(PartEvent),
    /// See [`JoinFailedEvent`].
    JoinFailed(JoinFailedEvent),
    /// See [`KickEvent`].
    Kick(KickEvent),
    /// See [`NickEvent`].
    Nick(NickEvent),
    /// See [`PingEvent`].
    Ping(PingEvent),
    /// See [`MessageEvent`].
    Message(MessageEvent),
    /// See [`CommandEvent`].
    Command(CommandEvent),
    /// Fired exactly once at process termination.
    Shutdown,
}

impl Event {
    /// This event's variant identifier.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Join(_) => EventKind::Join,
            Event::Part(_) => EventKind::Part,
            Event::JoinFailed(_) => EventKind::JoinFailed,
            Event::Kick(_) => EventKind::Kick,
            Event::Nick(_) => EventKind::Nick,
            Event::Ping(_) => EventKind::Ping,
            Event::Message(_) => EventKind::Message,
            Event::Command(_) => EventKind::Command,
            Event::Shutdown => EventKind::Shutdown,
        }
    }

    /// Construct the given wire variant from a parsed message. Returns
    /// `None` when the message lacks the fields the variant needs.
    pub fn from_message(kind: EventKind, msg: &Message) -> Option<Event> {
        let source = || User::parse(msg.source.as_deref().unwrap_or(""));

        match kind {
            EventKind::Join => Some(Event::Join(JoinEvent {
                source: source(),
                channel: strip_leading_colon(&msg.params).to_string(),
            })),
            EventKind::Part => Some(Event::Part(PartEvent {
                source: source(),
                channel: strip_leading_colon(&msg.params).to_string(),
            })),
            EventKind::JoinFailed => {
                let reason = join_failure_reason(&msg.command)?;
                // Numeric params: "<our-nick> <channel> :<text>".
                let channel = msg.params.split_whitespace().nth(1)?;
                Some(Event::JoinFailed(JoinFailedEvent {
                    channel: channel.to_string(),
                    reason,
                }))
            }
            EventKind::Kick => {
                let mut params = msg.params.split_whitespace();
                let channel = params.next()?;
                let target = params.next()?;
                Some(Event::Kick(KickEvent {
                    source: source(),
                    channel: channel.to_string(),
                    target: target.to_string(),
                }))
            }
            EventKind::Nick => Some(Event::Nick(NickEvent {
                source: source(),
                nick: strip_leading_colon(&msg.params).to_string(),
            })),
            EventKind::Ping => Some(Event::Ping(PingEvent {
                challenge: msg.params.clone(),
            })),
            EventKind::Message => {
                let (channel, rest) = msg.params.split_once(' ')?;
                let content = strip_leading_colon(rest);
                let (content, action) = match message::unwrap_action(content) {
                    Some(inner) => (inner.to_string(), true),
                    None => (content.to_string(), false),
                };
                Some(Event::Message(MessageEvent {
                    source: source(),
                    channel: channel.to_string(),
                    content,
                    action,
                    time: msg.time,
                }))
            }
            EventKind::Command | EventKind::Shutdown => None,
        }
    }

    /// Whether this specific instance should be processed at all. Chat
    /// messages from ignored nicks are dropped before any hook runs.
    pub fn should_process(&self, config: &Config) -> bool {
        match self {
            Event::Message(event) => !config.ignore.iter().any(|n| n == &event.source.nick),
            _ => true,
        }
    }
}

fn strip_leading_colon(s: &str) -> &str {
    s.strip_prefix(':').unwrap_or(s)
}

fn starts_with_command(content: &str, command_char: char) -> bool {
    let mut chars = content.chars();
    chars.next() == Some(command_char)
        && matches!(chars.next(), Some(c) if c.is_alphanumeric() || c == '_')
}

/// Whether `content` opens with `nick`, optionally followed by one
/// separator character, followed by whitespace.
fn is_mention(content: &str, nick: &str) -> bool {
    if nick.is_empty() {
        return false;
    }
    let Some(rest) = content.strip_prefix(nick) else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => true,
        Some(_) => matches!(chars.next(), Some(c) if c.is_whitespace()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_event(channel: &str, content: &str) -> MessageEvent {
        MessageEvent {
            source: User::parse("alice!a@host"),
            channel: channel.to_string(),
            content: content.to_string(),
            action: false,
            time: Utc::now(),
        }
    }

    #[test]
    fn test_responds_to_mapping() {
        assert!(EventKind::Join.responds_to("JOIN"));
        assert!(EventKind::Message.responds_to("PRIVMSG"));
        assert!(EventKind::JoinFailed.responds_to("473"));
        assert!(!EventKind::JoinFailed.responds_to("472"));
        assert!(!EventKind::Command.responds_to("PRIVMSG"));
        assert!(!EventKind::Shutdown.responds_to("QUIT"));
    }

    #[test]
    fn test_join_failure_reasons() {
        assert_eq!(join_failure_reason("403"), Some("No such channel"));
        assert_eq!(join_failure_reason("475"), Some("Bad password"));
        assert_eq!(join_failure_reason("001"), None);
    }

    #[test]
    fn test_privmsg_event_construction() {
        let msg = Message::parse(":alice!a@host PRIVMSG #chan :hello there");
        let event = Event::from_message(EventKind::Message, &msg).unwrap();
        let Event::Message(event) = event else {
            panic!("expected message event");
        };
        assert_eq!(event.source.nick, "alice");
        assert_eq!(event.channel, "#chan");
        assert_eq!(event.content, "hello there");
        assert!(!event.action);
    }

    #[test]
    fn test_action_envelope_sets_flag() {
        let msg = Message::parse(":alice!a@host PRIVMSG #chan :\u{1}ACTION waves\u{1}");
        let Some(Event::Message(event)) = Event::from_message(EventKind::Message, &msg) else {
            panic!("expected message event");
        };
        assert!(event.action);
        assert_eq!(event.content, "waves");
    }

    #[test]
    fn test_kick_event_construction() {
        let msg = Message::parse(":op!o@host KICK #chan victim :reason");
        let Some(Event::Kick(event)) = Event::from_message(EventKind::Kick, &msg) else {
            panic!("expected kick event");
        };
        assert_eq!(event.channel, "#chan");
        assert_eq!(event.target, "victim");
        assert_eq!(event.source.nick, "op");
    }

    #[test]
    fn test_nick_event_strips_colon() {
        let msg = Message::parse(":old!u@host NICK :newnick");
        let Some(Event::Nick(event)) = Event::from_message(EventKind::Nick, &msg) else {
            panic!("expected nick event");
        };
        assert_eq!(event.source.nick, "old");
        assert_eq!(event.nick, "newnick");
    }

    #[test]
    fn test_join_failed_extracts_channel() {
        let msg = Message::parse(":irc.example.net 473 basalt #private :Cannot join");
        let Some(Event::JoinFailed(event)) = Event::from_message(EventKind::JoinFailed, &msg)
        else {
            panic!("expected join-failed event");
        };
        assert_eq!(event.channel, "#private");
        assert_eq!(event.reason, "Not invited");
    }

    #[test]
    fn test_kick_target_matches_case_insensitively() {
        let msg = Message::parse(":op!o@host KICK #chan BaSalt :reason");
        let Some(Event::Kick(event)) = Event::from_message(EventKind::Kick, &msg) else {
            panic!("expected kick event");
        };
        assert!(event.targets("basalt"));
        assert!(!event.targets("someone"));
    }

    #[test]
    fn test_nick_source_matches_case_insensitively() {
        let msg = Message::parse(":BaSalt!u@host NICK :newnick");
        let Some(Event::Nick(event)) = Event::from_message(EventKind::Nick, &msg) else {
            panic!("expected nick event");
        };
        assert!(event.is_from("basalt"));
        assert!(!event.is_from("alice"));
    }

    #[test]
    fn test_command_char_triggers_in_channel() {
        let event = message_event("#chan", ",roll 2d6");
        assert!(event.is_command("basalt", ','));
    }

    #[test]
    fn test_plain_text_in_channel_is_not_command() {
        let event = message_event("#chan", "roll 2d6");
        assert!(!event.is_command("basalt", ','));
    }

    #[test]
    fn test_direct_message_is_always_command() {
        let event = message_event("basalt", "roll 2d6");
        assert!(event.is_command("basalt", ','));
    }

    #[test]
    fn test_mention_triggers_in_channel() {
        let event = message_event("#chan", "basalt: roll 2d6");
        assert!(event.is_command("basalt", ','));
    }

    #[test]
    fn test_action_is_never_command() {
        let mut event = message_event("basalt", "roll 2d6");
        event.action = true;
        assert!(!event.is_command("basalt", ','));
    }

    #[test]
    fn test_derive_strips_command_char() {
        let event = message_event("#chan", ",roll 2d6");
        let cmd = CommandEvent::derive(&event, "basalt", ',').unwrap();
        assert_eq!(cmd.command, "roll");
        assert_eq!(cmd.args, "2d6");
    }

    #[test]
    fn test_derive_strips_mention_prefix() {
        let event = message_event("#chan", "basalt: roll 2d6");
        let cmd = CommandEvent::derive(&event, "basalt", ',').unwrap();
        assert_eq!(cmd.command, "roll");
        assert_eq!(cmd.args, "2d6");
    }

    #[test]
    fn test_derive_mention_without_separator() {
        let event = message_event("#chan", "basalt roll 2d6");
        let cmd = CommandEvent::derive(&event, "basalt", ',').unwrap();
        assert_eq!(cmd.command, "roll");
        assert_eq!(cmd.args, "2d6");
    }

    #[test]
    fn test_derive_bare_command_no_args() {
        let event = message_event("basalt", "help");
        let cmd = CommandEvent::derive(&event, "basalt", ',').unwrap();
        assert_eq!(cmd.command, "help");
        assert_eq!(cmd.args, "");
    }

    #[test]
    fn test_derive_empty_content_is_none() {
        let event = message_event("basalt", ",");
        assert!(CommandEvent::derive(&event, "basalt", ',').is_none());
    }

    #[test]
    fn test_ignore_list_short_circuits_messages() {
        let config = Config {
            ignore: vec!["alice".to_string()],
            ..Config::default()
        };
        let msg = Message::parse(":alice!a@host PRIVMSG #chan :hi");
        let event = Event::from_message(EventKind::Message, &msg).unwrap();
        assert!(!event.should_process(&config));

        let msg = Message::parse(":bob!b@host PRIVMSG #chan :hi");
        let event = Event::from_message(EventKind::Message, &msg).unwrap();
        assert!(event.should_process(&config));
    }

    #[test]
    fn test_ignore_does_not_affect_other_events() {
        let config = Config {
            ignore: vec!["alice".to_string()],
            ..Config::default()
        };
        let msg = Message::parse(":alice!a@host JOIN #chan");
        let event = Event::from_message(EventKind::Join, &msg).unwrap();
        assert!(event.should_process(&config));
    }
}
