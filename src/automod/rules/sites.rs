//! Banned websites and known-bad hosts

use super::{BaseRule, CheckOutcome, Rule, RuleState, extract_hosts};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Already-cached reputation data for hosts.
///
/// Implementations must answer from memory; the per-message path never waits
/// on the network.
#[cfg_attr(test, mockall::automock)]
pub trait SiteReputation: Send + Sync {
    /// Whether `host` is known to be malicious
    ///
    /// # Errors
    /// Returns a `RuleError` if the reputation data cannot be consulted.
    fn is_flagged(&self, host: &str) -> RuleResult<bool>;
}

/// In-memory set of flagged hosts, fed by whatever refreshes reputation data
#[derive(Debug, Default)]
pub struct FlaggedHosts {
    hosts: DashSet<String>,
}

impl FlaggedHosts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self, host: impl AsRef<str>) {
        self.hosts.insert(normalize_host(host.as_ref()));
    }

    pub fn unflag(&self, host: &str) {
        self.hosts.remove(&normalize_host(host));
    }
}

impl SiteReputation for FlaggedHosts {
    fn is_flagged(&self, host: &str) -> RuleResult<bool> {
        Ok(host_suffixes(host).any(|suffix| self.hosts.contains(suffix)))
    }
}

/// Strip scheme, `www.`, port and path
fn normalize_host(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower.split_once("://").map_or(lower.as_str(), |(_, rest)| rest);
    let host = without_scheme
        .split(['/', '?', '#', ':'])
        .next()
        .unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

/// `a.b.example.com` yields itself, `b.example.com`, `example.com`, `com`
fn host_suffixes(host: &str) -> impl Iterator<Item = &str> {
    std::iter::once(host).chain(host.match_indices('.').map(move |(i, _)| &host[i + 1..]))
}

/// Triggers on links to banned websites (including their subdomains), and
/// optionally on hosts flagged by the reputation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesRule {
    #[serde(flatten)]
    pub base: BaseRule,
    pub banned_websites: Vec<String>,
    pub check_reputation: bool,
    #[serde(skip)]
    banned_hosts: HashSet<String>,
}

impl SitesRule {
    /// A compiled rule banning `sites`
    pub fn new<I, S>(base: BaseRule, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = Self {
            base,
            banned_websites: sites.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        rule.compile();
        rule
    }

    /// Build the banned host set from `banned_websites`
    pub fn compile(&mut self) {
        self.banned_hosts = self
            .banned_websites
            .iter()
            .map(|site| normalize_host(site))
            .filter(|host| !host.is_empty())
            .collect();
    }

    fn banned_match<'a>(&self, host: &'a str) -> Option<&'a str> {
        host_suffixes(host).find(|suffix| self.banned_hosts.contains(*suffix))
    }
}

impl Rule for SitesRule {
    fn name(&self) -> &'static str {
        "sites"
    }

    fn should_ignore(
        &self,
        channel: &ChannelContext,
        message: &AutomodMessage,
        member: &MemberContext,
    ) -> bool {
        self.base.should_ignore(channel, message, member)
    }

    fn check(
        &self,
        message: &AutomodMessage,
        _channel: &ChannelContext,
        state: &RuleState,
    ) -> RuleResult<CheckOutcome> {
        for host in extract_hosts(&message.content) {
            let host = host.strip_prefix("www.").unwrap_or(&host);

            if let Some(banned) = self.banned_match(host) {
                return Ok(self
                    .base
                    .violation(format!("Sent a link to a banned website: `{banned}`")));
            }

            if self.check_reputation && state.reputation.is_flagged(host)? {
                return Ok(self
                    .base
                    .violation(format!("Sent a link to a flagged website: `{host}`")));
            }
        }

        Ok(CheckOutcome::clean())
    }

    fn mute_duration(&self) -> u32 {
        self.base.mute_duration
    }
}
