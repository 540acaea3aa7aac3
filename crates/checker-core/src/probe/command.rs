use crate::config::CheckerConfig;
use crate::playlist::PlaylistItem;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Flag(&'static str),
    Literal(String),
}

impl Arg {
    fn as_str(&self) -> &str {
        match self {
            Arg::Flag(f) => f,
            Arg::Literal(s) => s,
        }
    }
}

/// A fully resolved invocation of the probing tool for one item.
///
/// Arguments are kept as discrete tokens and handed to the process without a
/// shell. [`ProbeCommand::to_command_line`] renders the same invocation with
/// the header, user agent and URL single-quoted, which is the form traced in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommand {
    program: String,
    args: Vec<Arg>,
}

impl ProbeCommand {
    /// Build the probe invocation for `item`. Never fails; the URL is passed through as-is.
    pub fn build(item: &PlaylistItem, config: &CheckerConfig) -> Self {
        let mut args = vec![
            Arg::Flag("-of"),
            Arg::Flag("json"),
            Arg::Flag("-v"),
            Arg::Flag("error"),
            Arg::Flag("-hide_banner"),
            Arg::Flag("-show_streams"),
        ];

        if !item.http.referrer.is_empty() {
            args.push(Arg::Flag("-headers"));
            args.push(Arg::Literal(format!("Referer: {}", item.http.referrer)));
        }

        let user_agent = if item.http.user_agent.is_empty() {
            config.user_agent.as_deref().unwrap_or_default()
        } else {
            item.http.user_agent.as_str()
        };
        if !user_agent.is_empty() {
            args.push(Arg::Flag("-user_agent"));
            args.push(Arg::Literal(user_agent.to_string()));
        }

        args.push(Arg::Literal(item.url.clone()));

        Self {
            program: config.probe_path.clone(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(Arg::as_str)
    }

    /// The target URL, always the final argument.
    pub fn url(&self) -> &str {
        self.args.last().map(Arg::as_str).unwrap_or_default()
    }

    pub fn to_command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        for arg in &self.args {
            match arg {
                Arg::Flag(f) => parts.push((*f).to_string()),
                Arg::Literal(s) => parts.push(shell_quote(s)),
            }
        }
        parts.join(" ")
    }
}

/// Quote `s` as a single POSIX shell word.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
