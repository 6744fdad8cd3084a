use std::fmt;

use crate::error::FigError;

/// A node identifier: a pair of (session, local) counters assigned by the
/// source tool. Unique within a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id {
    pub session: u32,
    pub local: u32,
}

impl Id {
    pub fn new(session: u32, local: u32) -> Self {
        Self { session, local }
    }

    /// Accepts both `"session:local"` and `"session-local"` forms.
    pub fn parse(s: &str) -> Result<Self, FigError> {
        let sep = if s.contains(':') {
            ':'
        } else if s.contains('-') {
            '-'
        } else {
            return Err(FigError::Corrupt {
                offset: 0,
                reason: format!("id `{s}` has no `:` or `-` separator"),
            });
        };
        let mut parts = s.splitn(2, sep);
        let session = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| FigError::Corrupt { offset: 0, reason: format!("bad id `{s}`") })?;
        let local = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| FigError::Corrupt { offset: 0, reason: format!("bad id `{s}`") })?;
        Ok(Self { session, local })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_and_dash_forms_agree() {
        assert_eq!(Id::parse("3:7").unwrap(), Id::parse("3-7").unwrap());
    }

    #[test]
    fn round_trips_colon_form() {
        let id = Id::new(11, 22);
        assert_eq!(Id::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(Id::parse("nope").is_err());
    }
}
