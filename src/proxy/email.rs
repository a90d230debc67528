/// Email domain allow-list
///
/// - `*` allows every address
/// - `.example.com` or `*.example.com` allows subdomains of example.com
/// - `example.com` allows exactly that domain
///
/// An empty list allows nothing.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    allow_all: bool,
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl EmailValidator {
    pub fn new(domains: &[String]) -> Self {
        let mut allow_all = false;
        let mut exact = Vec::new();
        let mut suffixes = Vec::new();

        for domain in domains {
            let domain = domain.trim().to_ascii_lowercase();
            if domain == "*" {
                allow_all = true;
            } else if let Some(rest) = domain.strip_prefix("*.") {
                suffixes.push(format!(".{}", rest));
            } else if domain.starts_with('.') {
                suffixes.push(domain);
            } else if !domain.is_empty() {
                exact.push(domain);
            }
        }

        EmailValidator {
            allow_all,
            exact,
            suffixes,
        }
    }

    pub fn is_valid(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        let Some((local, domain)) = email.rsplit_once('@') else {
            return false;
        };
        if local.is_empty() || domain.is_empty() {
            return false;
        }
        if self.allow_all {
            return true;
        }

        self.exact.iter().any(|d| d == domain)
            || self.suffixes.iter().any(|suffix| domain.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(domains: &[&str]) -> EmailValidator {
        let domains: Vec<String> = domains.iter().map(|d| d.to_string()).collect();
        EmailValidator::new(&domains)
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let v = validator(&["*"]);
        assert!(v.is_valid("octocat@github.com"));
        assert!(v.is_valid("someone@example.org"));
        assert!(!v.is_valid("not-an-email"));
    }

    #[test]
    fn test_exact_domains() {
        let v = validator(&["a.com", "b.com"]);
        assert!(v.is_valid("x@a.com"));
        assert!(v.is_valid("X@B.COM"));
        assert!(!v.is_valid("x@c.com"));
        assert!(!v.is_valid("x@sub.a.com"));
        assert!(!v.is_valid("x@evila.com"));
    }

    #[test]
    fn test_subdomain_entries() {
        let v = validator(&[".example.com", "*.corp.io"]);
        assert!(v.is_valid("x@eng.example.com"));
        assert!(!v.is_valid("x@example.com"));
        assert!(v.is_valid("x@a.b.corp.io"));
        assert!(!v.is_valid("x@notcorp.io"));
    }

    #[test]
    fn test_empty_list_rejects() {
        let v = validator(&[]);
        assert!(!v.is_valid("x@a.com"));
    }

    #[test]
    fn test_empty_email_rejected() {
        let v = validator(&["*"]);
        assert!(!v.is_valid(""));
        assert!(!v.is_valid("@a.com"));
    }
}
