use serde::{Deserialize, Serialize};

use crate::domain_utils::DomainUtils;

/// One allowlisted domain and the sender addresses known to use it.
///
/// `allowed_senders` is documentary: the addresses observed sending
/// legitimate mail for this domain. Matching is by domain alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustEntry {
    pub domain: String,
    #[serde(default)]
    pub allowed_senders: Vec<String>,
}

/// Ordered registry of trusted sender domains. Loaded once at startup,
/// shared read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct TrustRegistry {
    entries: Vec<TrustEntry>,
}

impl TrustRegistry {
    pub fn new(entries: Vec<TrustEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.domain = entry.domain.trim().to_lowercase();
                entry
            })
            .filter(|entry| !entry.domain.is_empty())
            .collect();

        Self { entries }
    }

    /// First entry whose domain covers `sender_domain`, in registration order.
    ///
    /// Strict dot-boundary suffix matching: "mail.google.com" hits a
    /// "google.com" entry, "evilgoogle.com" and "google.com.evil.com" do not.
    pub fn lookup(&self, sender_domain: &str) -> Option<&TrustEntry> {
        if sender_domain.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|entry| DomainUtils::is_under_domain(sender_domain, &entry.domain))
    }

    pub fn is_trusted(&self, sender_domain: &str) -> bool {
        self.lookup(sender_domain).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(domain: &str) -> TrustEntry {
        TrustEntry {
            domain: domain.to_string(),
            allowed_senders: vec![],
        }
    }

    fn registry() -> TrustRegistry {
        TrustRegistry::new(vec![entry("google.com"), entry("linkedin.com")])
    }

    #[test]
    fn test_exact_and_subdomain_match() {
        let registry = registry();

        assert!(registry.is_trusted("google.com"));
        assert!(registry.is_trusted("mail.google.com"));
        assert!(registry.is_trusted("linkedin.com"));
        assert!(!registry.is_trusted("other.com"));
    }

    #[test]
    fn test_suffix_is_dot_bounded() {
        let registry = registry();

        // Naive endswith would accept this
        assert!(!registry.is_trusted("evilgoogle.com"));
        // Substring matching would accept this
        assert!(!registry.is_trusted("google.com.evil.com"));
    }

    #[test]
    fn test_first_entry_wins() {
        let registry = TrustRegistry::new(vec![
            TrustEntry {
                domain: "mail.example.com".to_string(),
                allowed_senders: vec!["team@mail.example.com".to_string()],
            },
            entry("example.com"),
        ]);

        let hit = registry.lookup("mail.example.com").unwrap();
        assert_eq!(hit.domain, "mail.example.com");

        let hit = registry.lookup("news.example.com").unwrap();
        assert_eq!(hit.domain, "example.com");
    }

    #[test]
    fn test_empty_domain_never_matches() {
        let registry = registry();
        assert!(!registry.is_trusted(""));
    }

    #[test]
    fn test_entries_normalized_at_load() {
        let registry = TrustRegistry::new(vec![entry(" Google.COM "), entry("")]);

        assert_eq!(registry.len(), 1);
        assert!(registry.is_trusted("mail.google.com"));
    }
}
