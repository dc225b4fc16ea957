use std::fmt;
use std::str::FromStr;

use super::error::TunnelError;

/// Public URL assigned to a tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrl {
    url: String,
    host: String,
}

impl PublicUrl {
    pub fn parse(raw: &str) -> Result<Self, TunnelError> {
        let url = raw.trim();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| TunnelError::InvalidUrl(raw.to_string()))?;
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = authority.split(':').next().unwrap_or_default();
        if host.is_empty() {
            return Err(TunnelError::InvalidUrl(raw.to_string()));
        }
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            host: host.to_ascii_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Host part of the URL, used as the CloudFront origin domain.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl FromStr for PublicUrl {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PublicUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn host_is_extracted() {
        let url = PublicUrl::parse("https://abc123.tunnel.example").unwrap();
        assert_eq!(url.host(), "abc123.tunnel.example");
        assert_eq!(url.as_str(), "https://abc123.tunnel.example");
    }

    #[test]
    fn port_path_and_trailing_slash_are_stripped_from_host() {
        let url = PublicUrl::parse("http://Abc.Tunnel.Example:8443/path?q=1").unwrap();
        assert_eq!(url.host(), "abc.tunnel.example");

        let url = PublicUrl::parse("https://abc.tunnel.example/").unwrap();
        assert_eq!(url.to_string(), "https://abc.tunnel.example");
    }

    #[test]
    fn host_starting_with_scheme_letters_survives() {
        // A naive character strip of "https://" would eat the leading "h", "t" and "s".
        let url = PublicUrl::parse("https://shttp.tunnel.example").unwrap();
        assert_eq!(url.host(), "shttp.tunnel.example");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(PublicUrl::parse("tcp://0.tcp.ngrok.io:12345").is_err());
        assert!(PublicUrl::parse("https://").is_err());
        assert!("".parse::<PublicUrl>().is_err());
    }
}
