//! Port grouping by inferred name prefix.
//!
//! Port names are tokenized at underscores and CamelCase boundaries; a
//! group forms around the longest token prefix shared by at least two
//! ports (or a single well-known bus root). Clock and reset ports get
//! dedicated single-port groups; everything ungroupable lands in the
//! residual.

use ipforge_sv::{Module, Port};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single-token prefixes accepted as a group on their own.
const KNOWN_BUS_ROOTS: [&str; 7] = ["AXI", "APB", "AHB", "CHI", "DFI", "ACE", "ATB"];

const CLOCK_NAMES: [&str; 3] = ["clk", "clock", "aclk"];
const RESET_NAMES: [&str; 4] = ["rst", "rst_n", "reset", "aresetn"];

/// What a group represents.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GroupKind {
    /// A candidate bus instance.
    Bus,
    /// A single clock port.
    Clock,
    /// A single reset port.
    Reset,
}

/// A named cluster of ports sharing an inferred prefix.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortGroup {
    /// The prefix in the casing of the first member port.
    pub name: String,
    /// Classification.
    pub kind: GroupKind,
    /// Number of name tokens covered by the prefix (0 for clock/reset
    /// groups, whose whole name is the signal).
    pub prefix_tokens: usize,
    /// Member ports as indices into the module's port list, source order.
    pub ports: Vec<usize>,
}

/// The grouper's output: groups plus the ungrouped residual.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct GroupedPorts {
    /// Groups ordered by name.
    pub groups: Vec<PortGroup>,
    /// Indices of ports assigned to no group.
    pub residual: Vec<usize>,
}

/// Splits a port name into normalized (upper-case) tokens.
///
/// Names containing underscores split there; otherwise CamelCase word
/// boundaries split (`MAxiAwaddr` → `M`, `AXI`, `AWADDR`). Digit runs are
/// their own tokens.
pub fn tokenize(name: &str) -> Vec<String> {
    let cleaned = name.replace('-', "_");
    let tokens: Vec<String> = if cleaned.contains('_') {
        cleaned
            .split('_')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_ascii_uppercase())
            .collect()
    } else {
        camel_split(&cleaned)
    };
    if tokens.is_empty() {
        vec![cleaned.to_ascii_uppercase()]
    } else {
        tokens
    }
}

fn camel_split(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens = Vec::new();
    let mut start = 0usize;
    for i in 1..chars.len() {
        let prev = chars[i - 1];
        let cur = chars[i];
        let boundary = (cur.is_ascii_uppercase() && prev.is_ascii_lowercase())
            || (cur.is_ascii_uppercase()
                && prev.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()))
            || (cur.is_ascii_digit() && !prev.is_ascii_digit())
            || (!cur.is_ascii_digit() && prev.is_ascii_digit());
        if boundary {
            tokens.push(chars[start..i].iter().collect::<String>().to_ascii_uppercase());
            start = i;
        }
    }
    if start < chars.len() {
        tokens.push(chars[start..].iter().collect::<String>().to_ascii_uppercase());
    }
    tokens.retain(|t| !t.is_empty());
    tokens
}

/// Partitions a module's ports into prefix groups, clock/reset groups,
/// and a residual.
pub fn group_ports(module: &Module) -> GroupedPorts {
    let mut out = GroupedPorts::default();

    // Pass 1: route clocks/resets and collect token lists for the rest.
    let mut bus_candidates: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, port) in module.ports.iter().enumerate() {
        if port.interface_ref {
            out.residual.push(idx);
        } else if let Some(kind) = classify_clock_reset(&port.name) {
            out.groups.push(PortGroup {
                name: port.name.clone(),
                kind,
                prefix_tokens: 0,
                ports: vec![idx],
            });
        } else {
            bus_candidates.push((idx, tokenize(&port.name)));
        }
    }

    // Pass 2: count how many ports carry each candidate prefix. Only
    // proper prefixes count, so a port can never be grouped under its
    // own full name.
    let mut prefix_ports: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, tokens) in &bus_candidates {
        for len in 1..tokens.len() {
            let key = tokens[..len].join("_");
            prefix_ports.entry(key).or_default().push(*idx);
        }
    }

    // Pass 3: each port joins the longest eligible prefix it carries.
    let mut members: BTreeMap<String, (usize, Vec<usize>)> = BTreeMap::new();
    for (idx, tokens) in &bus_candidates {
        let mut chosen: Option<(usize, String)> = None;
        for len in (1..tokens.len()).rev() {
            let key = tokens[..len].join("_");
            if is_eligible(&key, len, prefix_ports[&key].len()) {
                chosen = Some((len, key));
                break;
            }
        }
        match chosen {
            Some((len, key)) => {
                members.entry(key).or_insert_with(|| (len, Vec::new())).1.push(*idx);
            }
            None => out.residual.push(*idx),
        }
    }

    for (key, (prefix_tokens, ports)) in members {
        // The display name keeps the casing of the first member.
        let first = &module.ports[ports[0]].name;
        let name = display_prefix(first, prefix_tokens).unwrap_or(key);
        out.groups.push(PortGroup {
            name,
            kind: GroupKind::Bus,
            prefix_tokens,
            ports,
        });
    }

    out.groups.sort_by(|a, b| a.name.cmp(&b.name));
    out.residual.sort_unstable();
    out
}

/// A prefix is a group key when two ports share it, or when it is a
/// well-known single-token bus root.
fn is_eligible(key: &str, token_len: usize, port_count: usize) -> bool {
    if token_len == 1 && KNOWN_BUS_ROOTS.contains(&key) {
        return true;
    }
    port_count >= 2
}

fn classify_clock_reset(name: &str) -> Option<GroupKind> {
    let lower = name.to_ascii_lowercase();
    if CLOCK_NAMES.contains(&lower.as_str()) {
        Some(GroupKind::Clock)
    } else if RESET_NAMES.contains(&lower.as_str()) {
        Some(GroupKind::Reset)
    } else {
        None
    }
}

/// Cuts `name` after its first `token_count` tokens, preserving original
/// casing (`m_axi_awaddr` with 2 tokens → `m_axi`).
fn display_prefix(name: &str, token_count: usize) -> Option<String> {
    let cleaned = name.replace('-', "_");
    if cleaned.contains('_') {
        let parts: Vec<&str> = cleaned.split('_').filter(|t| !t.is_empty()).collect();
        if parts.len() < token_count {
            return None;
        }
        Some(parts[..token_count].join("_"))
    } else {
        // CamelCase names: re-split and count characters.
        let tokens = camel_split(&cleaned);
        if tokens.len() < token_count {
            return None;
        }
        let chars: usize = tokens[..token_count].iter().map(|t| t.chars().count()).sum();
        Some(name.chars().take(chars).collect())
    }
}
