/// Minimal sender address utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Extract domain from email address, lowercased
    pub fn extract_domain(email: &str) -> Option<String> {
        email
            .split('@')
            .nth(1)
            .filter(|domain| !domain.is_empty())
            .map(|domain| domain.to_lowercase())
    }

    /// Check if domain equals base or is a subdomain of it.
    /// Dot-boundary suffix only: "mail.google.com" is under "google.com",
    /// "evilgoogle.com" is not.
    pub fn is_under_domain(domain: &str, base: &str) -> bool {
        let domain_lower = domain.to_lowercase();
        let base_lower = base.to_lowercase();

        if base_lower.is_empty() {
            return false;
        }

        domain_lower == base_lower || domain_lower.ends_with(&format!(".{}", base_lower))
    }
}
