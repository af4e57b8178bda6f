//! Source-prefix parsing.

/// A user on the IRC network, derived from a message's source field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Nickname.
    pub nick: String,
    /// Username (ident).
    pub username: String,
    /// Host or cloak.
    pub host: String,
}

impl User {
    /// Parse a source string of the form `nick!user@host`.
    ///
    /// A source missing either separator degrades gracefully: the whole
    /// string becomes the nick and the remaining fields are empty. Server
    /// sources (`irc.example.net`) therefore parse as a bare nick.
    pub fn parse(source: &str) -> Self {
        if let Some((nick, rest)) = source.split_once('!') {
            if let Some((username, host)) = rest.split_once('@') {
                return Self {
                    nick: nick.to_string(),
                    username: username.to_string(),
                    host: host.to_string(),
                };
            }
        }

        Self {
            nick: source.to_string(),
            username: String::new(),
            host: String::new(),
        }
    }
}
