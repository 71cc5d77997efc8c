use std::collections::HashMap;

use super::Pass;
use crate::domain::Domain;

/// An ordered set of exact-substring replacements
#[derive(Debug)]
pub struct TerminologyTable {
    pub name: &'static str,
    pub replacements: &'static [(&'static str, &'static str)],
}

impl TerminologyTable {
    /// Applies every replacement in declaration order
    pub fn apply(&self, text: &str) -> String {
        self.replacements
            .iter()
            .fold(text.to_string(), |acc, (generic, specific)| {
                acc.replace(generic, specific)
            })
    }
}

/// General tech-ops wording
pub static TECH_OPS: TerminologyTable = TerminologyTable {
    name: "tech_ops",
    replacements: &[
        ("monitoring tools", "Prometheus and Grafana stack"),
        ("CI/CD pipelines", "GitLab CI/CD and Jenkins pipelines"),
        ("automated patching solution", "Ansible-driven automated patching workflow"),
        ("cloud infrastructure on AWS", "multi-region AWS architecture using Terraform"),
        ("Linux servers", "RHEL and Ubuntu instances"),
        ("vulnerability assessments", "OWASP ZAP vulnerability scans"),
        ("network routing and switching", "BGP routing and Cisco Nexus switching"),
    ],
};

/// Indian startup ecosystem wording for product management bullets
pub static INDIA_PRODUCT: TerminologyTable = TerminologyTable {
    name: "india_product",
    replacements: &[
        ("market trends", "Tier-1 & Tier-2 city adoption patterns"),
        ("product roadmap", "strategic roadmap (Jira/Linear)"),
        ("competitor data", "competitive benchmarking"),
        ("customer feedback", "user feedback (via Intercom/Razorpay logs)"),
        ("sales and marketing", "Sales and Growth teams"),
        ("stakeholders", "cross-functional stakeholders"),
        ("go-to-market strategy", "GTM strategy across APAC regions"),
    ],
};

/// Product analytics wording used while balancing revenue claims
pub static PRODUCT_SIGNALS: TerminologyTable = TerminologyTable {
    name: "product_signals",
    replacements: &[
        ("market trends", "market signals (Google Trends/Nielsen)"),
        ("product roadmap", "strategic roadmap (Jira)"),
    ],
};

/// Registry resolving the terminology table for each domain
#[derive(Debug, Default)]
pub struct TerminologyRegistry {
    tables: HashMap<Domain, &'static TerminologyTable>,
}

impl TerminologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `table` attached to every domain in `domains`
    pub fn uniform(table: &'static TerminologyTable, domains: &[Domain]) -> Self {
        let mut registry = Self::new();
        for domain in domains {
            registry.register(*domain, table);
        }
        registry
    }

    /// Tables used by each built-in pass
    pub fn for_pass(pass: Pass) -> Self {
        match pass {
            Pass::Humanize => Self::uniform(&TECH_OPS, &Domain::ALL),
            Pass::Localize => Self::uniform(&INDIA_PRODUCT, &[Domain::Product]),
            Pass::Balance => Self::uniform(&PRODUCT_SIGNALS, &[Domain::Product, Domain::It]),
        }
    }

    /// Register (or replace) the table for a domain
    pub fn register(&mut self, domain: Domain, table: &'static TerminologyTable) {
        self.tables.insert(domain, table);
    }

    pub fn table_for(&self, domain: Domain) -> Option<&'static TerminologyTable> {
        self.tables.get(&domain).copied()
    }

    /// List all domains with a registered table
    pub fn list_domains(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.tables.keys().copied().collect();
        domains.sort();
        domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tech_ops_table_rewrites_generic_phrases() {
        let out = TECH_OPS.apply("Built monitoring tools for 40 Linux servers");
        assert_eq!(out, "Built Prometheus and Grafana stack for 40 RHEL and Ubuntu instances");
    }

    #[test]
    fn test_replacement_is_case_sensitive() {
        let text = "Tracked Market Trends weekly";
        assert_eq!(PRODUCT_SIGNALS.apply(text), text);
    }

    #[test]
    fn test_registry_for_localize_only_covers_product() {
        let registry = TerminologyRegistry::for_pass(Pass::Localize);
        assert_eq!(registry.list_domains(), vec![Domain::Product]);
        assert!(registry.table_for(Domain::It).is_none());
        assert_eq!(registry.table_for(Domain::Product).map(|t| t.name), Some("india_product"));
    }

    #[test]
    fn test_registry_register_overrides() {
        let mut registry = TerminologyRegistry::for_pass(Pass::Humanize);
        registry.register(Domain::Marketing, &PRODUCT_SIGNALS);
        assert_eq!(registry.table_for(Domain::Marketing).map(|t| t.name), Some("product_signals"));
        assert_eq!(registry.list_domains().len(), 5);
    }
}
