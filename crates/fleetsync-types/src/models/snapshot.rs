//! Configuration snapshot: the identifier-free, timestamp-free aggregate of
//! everything a follower mirrors from its leader.
//!
//! Every entity is keyed by a business key (domain name, rule file, username)
//! rather than a storage id, since ids are not portable across nodes. Two
//! nodes holding equivalent configuration must produce byte-identical
//! canonical encodings after [`Snapshot::normalize`].

use serde::{Deserialize, Serialize};

/// Synchronizable entity categories, in canonical order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Proxied domains
    Domains,
    /// TLS certificate material
    Certificates,
    /// Vendor and custom WAF rule sets
    WafRules,
    /// Access-control rules
    AccessRules,
    /// Dashboard users
    Users,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Self; 5] =
        [Self::Domains, Self::Certificates, Self::WafRules, Self::AccessRules, Self::Users];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domains => "domains",
            Self::Certificates => "certificates",
            Self::WafRules => "waf_rules",
            Self::AccessRules => "access_rules",
            Self::Users => "users",
        }
    }
}

/// An entity that can be matched across nodes by business key.
pub trait SyncEntity: Clone + PartialEq {
    /// Category the entity belongs to.
    const CATEGORY: Category;

    /// Stable, human-meaningful key used for cross-node matching.
    fn business_key(&self) -> &str;

    /// Sort any inner collections so equal content encodes identically.
    fn normalize(&mut self) {}
}

/// Load-balancing policy for a domain's backends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LbPolicy {
    /// Rotate through backends
    #[default]
    RoundRobin,
    /// Pick the backend with fewest active connections
    LeastConn,
    /// Hash client address onto a backend
    IpHash,
}

/// One upstream of a proxied domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Backend {
    /// Upstream host or IP
    pub address: String,
    /// Upstream port
    pub port: u16,
    /// Relative weight
    #[serde(default = "default_weight")]
    pub weight: u32,
}

const fn default_weight() -> u32 {
    1
}

/// A proxied domain definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainConfig {
    /// Domain name (business key)
    pub domain: String,
    /// Upstreams
    #[serde(default)]
    pub backends: Vec<Backend>,
    /// Load-balancing policy
    #[serde(default)]
    pub lb_policy: LbPolicy,
    /// Terminate TLS for this domain
    #[serde(default)]
    pub ssl_enabled: bool,
    /// Name of the certificate to serve
    #[serde(default)]
    pub certificate: Option<String>,
    /// Run requests through the WAF
    #[serde(default)]
    pub waf_enabled: bool,
}

impl DomainConfig {
    /// Plain domain with a single backend and default policy.
    pub fn new(domain: impl Into<String>, backend: Backend) -> Self {
        Self {
            domain: domain.into(),
            backends: vec![backend],
            lb_policy: LbPolicy::default(),
            ssl_enabled: false,
            certificate: None,
            waf_enabled: false,
        }
    }
}

impl SyncEntity for DomainConfig {
    const CATEGORY: Category = Category::Domains;

    fn business_key(&self) -> &str {
        &self.domain
    }

    fn normalize(&mut self) {
        self.backends.sort();
    }
}

/// TLS certificate material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate name (business key)
    pub name: String,
    /// Domains covered by the certificate
    #[serde(default)]
    pub domains: Vec<String>,
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: String,
    /// Renew automatically before expiry
    #[serde(default)]
    pub auto_renew: bool,
}

impl SyncEntity for Certificate {
    const CATEGORY: Category = Category::Certificates;

    fn business_key(&self) -> &str {
        &self.name
    }

    fn normalize(&mut self) {
        self.domains.sort();
        self.domains.dedup();
    }
}

/// Origin of a WAF rule set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WafRuleKind {
    /// Shipped by the rule vendor
    #[default]
    Vendor,
    /// Written by an operator
    Custom,
}

/// A WAF rule set, identified by its rule file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WafRule {
    /// Rule file name (business key)
    pub rule_file: String,
    /// Vendor or custom
    #[serde(default)]
    pub kind: WafRuleKind,
    /// Rule text
    pub content: String,
    /// Whether the rule set is active
    #[serde(default)]
    pub enabled: bool,
}

impl SyncEntity for WafRule {
    const CATEGORY: Category = Category::WafRules;

    fn business_key(&self) -> &str {
        &self.rule_file
    }
}

/// Allow or deny.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    /// Let matching traffic through
    Allow,
    /// Block matching traffic
    Deny,
}

/// An access-control rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessRule {
    /// Rule name (business key)
    pub name: String,
    /// Allow or deny
    pub action: AccessAction,
    /// Source network in CIDR notation
    pub cidr: String,
    /// Restrict the rule to one domain
    #[serde(default)]
    pub domain: Option<String>,
    /// Lower runs first
    #[serde(default)]
    pub priority: i32,
}

impl SyncEntity for AccessRule {
    const CATEGORY: Category = Category::AccessRules;

    fn business_key(&self) -> &str {
        &self.name
    }
}

/// A dashboard user with a pre-hashed credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    /// Login name (business key)
    pub username: String,
    /// Password hash, copied verbatim
    pub password_hash: String,
    /// Role name
    pub role: String,
    /// Whether the user may log in
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl SyncEntity for UserAccount {
    const CATEGORY: Category = Category::Users;

    fn business_key(&self) -> &str {
        &self.username
    }
}

/// Deterministic aggregate of all synchronizable configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Proxied domains
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
    /// TLS certificates
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    /// WAF rule sets
    #[serde(default)]
    pub waf_rules: Vec<WafRule>,
    /// Access rules
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    /// Users
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

fn normalize_category<T: SyncEntity>(entities: &mut Vec<T>) {
    for entity in entities.iter_mut() {
        entity.normalize();
    }
    entities.sort_by(|a, b| a.business_key().cmp(b.business_key()));
}

impl Snapshot {
    /// Sort every category by business key and every inner collection.
    pub fn normalize(&mut self) {
        normalize_category(&mut self.domains);
        normalize_category(&mut self.certificates);
        normalize_category(&mut self.waf_rules);
        normalize_category(&mut self.access_rules);
        normalize_category(&mut self.users);
    }

    /// Consume and return the normalized form.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Number of entities in a category.
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Domains => self.domains.len(),
            Category::Certificates => self.certificates.len(),
            Category::WafRules => self.waf_rules.len(),
            Category::AccessRules => self.access_rules.len(),
            Category::Users => self.users.len(),
        }
    }

    /// Total entity count.
    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(address: &str) -> Backend {
        Backend { address: address.to_string(), port: 80, weight: 1 }
    }

    #[test]
    fn test_normalize_sorts_by_business_key() {
        let mut snapshot = Snapshot {
            domains: vec![
                DomainConfig::new("b.com", backend("10.0.0.2")),
                DomainConfig::new("a.com", backend("10.0.0.1")),
            ],
            users: vec![
                UserAccount {
                    username: "zoe".into(),
                    password_hash: "h".into(),
                    role: "admin".into(),
                    enabled: true,
                },
                UserAccount {
                    username: "adam".into(),
                    password_hash: "h".into(),
                    role: "viewer".into(),
                    enabled: true,
                },
            ],
            ..Snapshot::default()
        };
        snapshot.normalize();

        assert_eq!(snapshot.domains[0].domain, "a.com");
        assert_eq!(snapshot.users[0].username, "adam");
    }

    #[test]
    fn test_normalize_sorts_inner_collections() {
        let mut domain = DomainConfig::new("a.com", backend("10.0.0.9"));
        domain.backends.push(backend("10.0.0.1"));
        let mut snapshot = Snapshot { domains: vec![domain], ..Snapshot::default() };
        snapshot.normalize();

        assert_eq!(snapshot.domains[0].backends[0].address, "10.0.0.1");
    }

    #[test]
    fn test_counts() {
        let snapshot = Snapshot {
            domains: vec![DomainConfig::new("a.com", backend("10.0.0.1"))],
            waf_rules: vec![WafRule {
                rule_file: "crs-941.conf".into(),
                kind: WafRuleKind::Vendor,
                content: "SecRule ...".into(),
                enabled: true,
            }],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.count(Category::Domains), 1);
        assert_eq!(snapshot.count(Category::Users), 0);
        assert_eq!(snapshot.total(), 2);
    }
}
