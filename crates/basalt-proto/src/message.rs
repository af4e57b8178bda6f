//! Raw server line parsing.
//!
//! In IRC protocol language a "message" is any line coming from the server,
//! whether it is a chat message, a nick change, a join notification, or any
//! other traffic. This module parses one line into its structural parts
//! without interpreting the command.

use chrono::{DateTime, Utc};

/// Opening of the CTCP ACTION envelope used for emotes (`/me`).
pub const ACTION_PREFIX: &str = "\x01ACTION ";

/// Closing delimiter of a CTCP envelope.
pub const CTCP_DELIM: char = '\x01';

/// A single line received from the server, split into tags, source,
/// command, and raw parameter text.
///
/// Parsing never fails. Absent groups map to `None`; a line that does not
/// follow the grammar at all yields empty fields. The parameter text is
/// kept verbatim, including any leading `:` that marks a trailing
/// multi-word parameter; callers split it per command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Raw IRCv3 tag string, without the leading `@`.
    pub tags: Option<String>,
    /// Source (prefix) string, without the leading `:`.
    pub source: Option<String>,
    /// Command token, e.g. `PRIVMSG` or a three-digit numeric.
    pub command: String,
    /// Everything after the command, verbatim.
    pub params: String,
    /// Receipt timestamp.
    pub time: DateTime<Utc>,
}

impl Message {
    /// Parse a raw line (trailing line terminator already stripped).
    ///
    /// Grammar: `["@" tags " "] [":" source " "] command [" " params]`.
    pub fn parse(line: &str) -> Self {
        let mut rest = line;

        let mut tags = None;
        if let Some(after) = rest.strip_prefix('@') {
            // The tag group only counts when terminated by a space;
            // otherwise the whole token falls through to the command slot.
            if let Some((t, r)) = after.split_once(' ') {
                tags = Some(t.to_string());
                rest = r;
            }
        }

        let mut source = None;
        if let Some(after) = rest.strip_prefix(':') {
            if let Some((s, r)) = after.split_once(' ') {
                source = Some(s.to_string());
                rest = r;
            }
        }

        let (command, params) = match rest.split_once(' ') {
            Some((c, p)) => (c.to_string(), p.to_string()),
            None => (rest.to_string(), String::new()),
        };

        Self {
            tags,
            source,
            command,
            params,
            time: Utc::now(),
        }
    }
}

/// Return the inner text of a CTCP ACTION envelope, or `None` when the
/// content is not an emote.
pub fn unwrap_action(content: &str) -> Option<&str> {
    content
        .strip_prefix(ACTION_PREFIX)
        .and_then(|inner| inner.strip_suffix(CTCP_DELIM))
}

/// Wrap chat text in the CTCP ACTION envelope.
pub fn wrap_action(content: &str) -> String {
    format!("{ACTION_PREFIX}{content}{CTCP_DELIM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let msg = Message::parse("@tag :nick!user@host PRIVMSG #chan :hello there");
        assert_eq!(msg.tags.as_deref(), Some("tag"));
        assert_eq!(msg.source.as_deref(), Some("nick!user@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, "#chan :hello there");
    }

    #[test]
    fn test_parse_bare_ping() {
        let msg = Message::parse("PING :abc123");
        assert_eq!(msg.tags, None);
        assert_eq!(msg.source, None);
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, ":abc123");
    }

    #[test]
    fn test_parse_source_only() {
        let msg = Message::parse(":irc.example.net 376 bot :End of /MOTD");
        assert_eq!(msg.source.as_deref(), Some("irc.example.net"));
        assert_eq!(msg.command, "376");
        assert_eq!(msg.params, "bot :End of /MOTD");
    }

    #[test]
    fn test_parse_command_without_params() {
        let msg = Message::parse("AWAY");
        assert_eq!(msg.command, "AWAY");
        assert_eq!(msg.params, "");
    }

    #[test]
    fn test_parse_empty_line_degrades() {
        let msg = Message::parse("");
        assert_eq!(msg.tags, None);
        assert_eq!(msg.source, None);
        assert_eq!(msg.command, "");
        assert_eq!(msg.params, "");
    }

    #[test]
    fn test_parse_unterminated_tag_group_is_command() {
        // "@foo" with no following space is not a tag group.
        let msg = Message::parse("@foo");
        assert_eq!(msg.tags, None);
        assert_eq!(msg.command, "@foo");
    }

    #[test]
    fn test_unwrap_action() {
        assert_eq!(unwrap_action("\u{1}ACTION waves\u{1}"), Some("waves"));
        assert_eq!(unwrap_action("just text"), None);
        assert_eq!(unwrap_action("\u{1}ACTION unterminated"), None);
    }

    #[test]
    fn test_wrap_action_round_trip() {
        let wrapped = wrap_action("dances");
        assert_eq!(unwrap_action(&wrapped), Some("dances"));
    }
}
