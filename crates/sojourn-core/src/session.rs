//! Session provider: supplies the authenticated cookie used to download
//! track exports.

/// Source of the session cookie for the track download.
pub trait SessionProvider: Send + Sync {
  fn is_authenticated(&self) -> bool;

  /// The raw `Cookie` header value, if a session exists.
  fn session_cookie(&self) -> Option<String>;
}

/// A session backed by a fixed cookie string, typically read from config.
///
/// Counts as authenticated when the cookie carries a `SID=` entry.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
  cookie: Option<String>,
}

impl StaticSession {
  pub fn new(cookie: Option<String>) -> Self {
    Self {
      cookie: cookie.filter(|c| !c.trim().is_empty()),
    }
  }
}

impl SessionProvider for StaticSession {
  fn is_authenticated(&self) -> bool {
    self.cookie.as_deref().is_some_and(|c| c.contains("SID="))
  }

  fn session_cookie(&self) -> Option<String> { self.cookie.clone() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cookie_with_sid_is_authenticated() {
    let s = StaticSession::new(Some("HSID=x; SID=abc; NID=1".into()));
    assert!(s.is_authenticated());
    assert_eq!(s.session_cookie().as_deref(), Some("HSID=x; SID=abc; NID=1"));
  }

  #[test]
  fn missing_or_blank_cookie_is_not_authenticated() {
    assert!(!StaticSession::new(None).is_authenticated());
    let blank = StaticSession::new(Some("   ".into()));
    assert!(!blank.is_authenticated());
    assert!(blank.session_cookie().is_none());
  }

  #[test]
  fn cookie_without_sid_is_not_authenticated() {
    let s = StaticSession::new(Some("NID=1; OTHER=2".into()));
    assert!(!s.is_authenticated());
    assert!(s.session_cookie().is_some());
  }
}
