// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Enumeration Configuration
 * Scope rules, blacklist, recursion threshold, session identity
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Registrable domains that define the enumeration scope.
    #[validate(length(min = 1))]
    pub domains: Vec<String>,

    /// Names (and everything under them) excluded from processing.
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Number of times a subdomain must be observed before recursive
    /// brute-force / source-level enumeration stops being re-triggered.
    #[validate(range(min = 1))]
    #[serde(default = "default_min_for_recursive")]
    pub min_for_recursive: u32,

    /// Session identity stamped on every graph write.
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
}

fn default_min_for_recursive() -> u32 {
    1
}

impl Config {
    pub fn new(domains: Vec<String>) -> Self {
        Self {
            domains: domains.into_iter().map(|d| d.to_lowercase()).collect(),
            blacklist: Vec::new(),
            min_for_recursive: default_min_for_recursive(),
            uuid: Uuid::new_v4(),
        }
    }

    pub fn with_blacklist(mut self, blacklist: Vec<String>) -> Self {
        self.blacklist = blacklist.into_iter().map(|b| b.to_lowercase()).collect();
        self
    }

    pub fn with_min_for_recursive(mut self, min: u32) -> Self {
        self.min_for_recursive = min;
        self
    }

    /// The configured scope domain that `name` falls under, if any.
    /// Prefers the longest match so `a.b.example.com` resolves against
    /// `b.example.com` before `example.com` when both are in scope.
    pub fn which_domain(&self, name: &str) -> Option<&str> {
        let name = name.trim_end_matches('.');
        let mut best: Option<&str> = None;
        for domain in &self.domains {
            if Self::under(name, domain) {
                match best {
                    Some(b) if b.len() >= domain.len() => {}
                    _ => best = Some(domain.as_str()),
                }
            }
        }
        best
    }

    pub fn is_domain_in_scope(&self, name: &str) -> bool {
        self.which_domain(name).is_some()
    }

    /// Whether the name matches (or falls under) a blacklist entry.
    pub fn blacklisted(&self, name: &str) -> bool {
        let name = name.trim_end_matches('.');
        self.blacklist.iter().any(|entry| Self::under(name, entry))
    }

    fn under(name: &str, root: &str) -> bool {
        let name = name.to_lowercase();
        let root = root.to_lowercase();
        name == root || name.ends_with(&format!(".{}", root))
    }
}
