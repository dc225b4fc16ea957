//! Parser for the ngrok agent's logfmt output.
//!
//! A line looks like
//! `t=2024-05-01T10:00:00+0000 lvl=info msg="started tunnel" obj=tunnels url=https://abc.ngrok.app`.

/// Severity of an agent log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLevel {
    Debug,
    Info,
    Warn,
    Error,
    Other,
}

impl FrameLevel {
    fn parse(raw: &str) -> Self {
        match raw {
            "dbug" | "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "eror" | "err" | "error" | "crit" => Self::Error,
            _ => Self::Other,
        }
    }
}

/// One parsed logfmt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFrame {
    fields: Vec<(String, String)>,
}

impl LogFrame {
    /// Parse a logfmt line. Returns `None` for lines without a `lvl` key,
    /// which the agent prints for banners and the like.
    pub fn parse(line: &str) -> Option<Self> {
        let fields = parse_pairs(line);
        if fields.iter().any(|(k, _)| k == "lvl") {
            Some(Self { fields })
        } else {
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn level(&self) -> FrameLevel {
        self.get("lvl").map_or(FrameLevel::Other, FrameLevel::parse)
    }

    pub fn message(&self) -> &str {
        self.get("msg").unwrap_or_default()
    }

    /// Error detail attached to the line, if any.
    pub fn error(&self) -> Option<&str> {
        self.get("err").filter(|e| !e.is_empty() && *e != "<nil>")
    }

    /// Public URL announced when a tunnel session starts.
    pub fn public_url(&self) -> Option<&str> {
        let announces_tunnel =
            self.message() == "started tunnel" || self.get("obj") == Some("tunnels");
        if !announces_tunnel {
            return None;
        }
        self.get("url").filter(|u| u.starts_with("https://") || u.starts_with("http://"))
    }

    /// Message plus error detail, for re-emitting through tracing.
    pub fn describe(&self) -> String {
        match self.error() {
            Some(err) => format!("{} ({err})", self.message()),
            None => self.message().to_string(),
        }
    }
}

fn parse_pairs(line: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut chars = line.trim().chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
        }

        if !key.is_empty() {
            fields.push((key, value));
        }
    }

    fields
}
