//! Weighted scoring of port groups against catalog abstractions.
//!
//! Every bus group is scored against every `(abstraction, side)` pair.
//! Alignment maps physical names onto logical names via normalized suffix
//! candidates; direction and width disagreements penalize the score but
//! do not reject the mapping. The best candidate wins if it clears the
//! threshold and matched at least one required signal; a runner-up inside
//! the ambiguity margin is reported but never selected.

use crate::group::{tokenize, GroupKind, GroupedPorts, PortGroup};
use crate::interface::{
    sanitize_interface_name, AddressSpaceSpec, BusInterface, MatchOutcome, MemoryMapSpec, PortMap,
    Role,
};
use ipforge_diagnostics::{code, Diagnostic, DiagnosticSink};
use ipforge_library::{
    AbstractionDefinition, BusDefinition, BusKind, Catalog, LogicalDirection, PortRole, Presence,
    Side,
};
use ipforge_source::Span;
use ipforge_sv::{Direction, Module, Port};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunable weights for the scoring formula.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum score for acceptance.
    pub threshold: f64,
    /// Weight of a matched required signal.
    pub w_required: f64,
    /// Weight of a matched optional signal.
    pub w_optional: f64,
    /// Deduction per direction or width mismatch.
    pub w_penalty: f64,
    /// Two candidates closer than this trigger an ambiguity warning.
    pub ambiguity_margin: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            w_required: 1.0,
            w_optional: 0.3,
            w_penalty: 0.5,
            ambiguity_margin: 0.05,
        }
    }
}

/// A scored `(abstraction, side)` candidate for one group.
#[derive(Clone, Debug)]
pub(crate) struct Candidate<'a> {
    abstraction: &'a AbstractionDefinition,
    bus: &'a BusDefinition,
    side: Side,
    score: f64,
    required_matched: usize,
    /// `(logical index in the abstraction, port index in the module)`.
    maps: Vec<(usize, usize)>,
}

/// Matches all groups and assembles the outcome.
///
/// Never fails: a group without an acceptable candidate sends its ports
/// to the unmatched list with an informational note, per the graceful
/// degradation policy.
pub fn match_module(
    module: &Module,
    grouped: &GroupedPorts,
    catalog: &Catalog,
    config: &MatchConfig,
    sink: &DiagnosticSink,
) -> MatchOutcome {
    let mut outcome = MatchOutcome {
        interfaces: Vec::new(),
        unmatched: grouped.residual.clone(),
    };

    for group in &grouped.groups {
        let result = match group.kind {
            GroupKind::Bus => match_bus_group(module, group, catalog, config, sink),
            GroupKind::Clock => match_special_group(module, group, catalog, BusKind::Clock),
            GroupKind::Reset => match_special_group(module, group, catalog, BusKind::Reset),
        };
        match result {
            Some((interface, mapped)) => {
                for &idx in &group.ports {
                    if !mapped.contains(&idx) {
                        outcome.unmatched.push(idx);
                    }
                }
                outcome.interfaces.push(interface);
            }
            None => {
                sink.emit(Diagnostic::note(
                    code::NO_MATCH,
                    format!(
                        "no protocol match for group '{}' ({} ports)",
                        group.name,
                        group.ports.len()
                    ),
                    Span::NONE,
                ));
                outcome.unmatched.extend(&group.ports);
            }
        }
    }

    outcome.interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    outcome.unmatched.sort_unstable();
    outcome
}

fn match_bus_group(
    module: &Module,
    group: &PortGroup,
    catalog: &Catalog,
    config: &MatchConfig,
    sink: &DiagnosticSink,
) -> Option<(BusInterface, Vec<usize>)> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for (abstraction, bus) in catalog.protocol_entries() {
        for side in Side::BOTH {
            if let Some(c) = score_candidate(module, &group.ports, abstraction, bus, side, config) {
                candidates.push(c);
            }
        }
    }

    // Deterministic order: score descending; equal scores prefer the
    // candidate that explains more of the group (a full AXI4 group also
    // scores 1.0 against the AXI4-Lite subset), then VLNV and side.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.maps.len().cmp(&a.maps.len()))
            .then_with(|| a.abstraction.vlnv.cmp(&b.abstraction.vlnv))
            .then_with(|| side_rank(a.side).cmp(&side_rank(b.side)))
    });

    let best = candidates.first()?;
    if best.score < config.threshold || best.required_matched == 0 {
        return None;
    }

    // Ambiguity: the nearest rival from a *different* abstraction; a
    // group's own mirror side is not a rival.
    if let Some(runner) = candidates
        .iter()
        .find(|c| c.abstraction.vlnv != best.abstraction.vlnv)
    {
        if best.score - runner.score <= config.ambiguity_margin {
            sink.emit(
                Diagnostic::warning(
                    code::AMBIGUOUS_MATCH,
                    format!(
                        "group '{}' matches {} ({}) and {} ({}) within margin",
                        group.name,
                        best.abstraction.vlnv,
                        best.side,
                        runner.abstraction.vlnv,
                        runner.side,
                    ),
                    Span::NONE,
                )
                .with_note(format!(
                    "scores {:.3} vs {:.3}, margin {:.3}",
                    best.score, runner.score, config.ambiguity_margin
                )),
            );
        }
    }

    Some(build_interface(module, group, best))
}

fn side_rank(side: Side) -> u8 {
    match side {
        Side::Master => 0,
        Side::Slave => 1,
    }
}

/// Scores one `(abstraction, side)` pair against a group. Returns `None`
/// when the side defines no signals or nothing aligns at all.
pub(crate) fn score_candidate<'a>(
    module: &Module,
    group_ports: &[usize],
    abstraction: &'a AbstractionDefinition,
    bus: &'a BusDefinition,
    side: Side,
    config: &MatchConfig,
) -> Option<Candidate<'a>> {
    // Logical ports usable on this side.
    let mut required = 0usize;
    let mut optional = 0usize;
    let mut by_normalized: HashMap<String, usize> = HashMap::new();
    let mut usable: Vec<(usize, &PortRole)> = Vec::new();
    for (idx, logical) in abstraction.ports.iter().enumerate() {
        let Some(role) = logical.on(side) else { continue };
        match role.presence {
            Presence::Illegal => continue,
            Presence::Required => required += 1,
            Presence::Optional => optional += 1,
        }
        by_normalized.insert(normalize(&logical.name), usable.len());
        usable.push((idx, role));
    }
    if usable.is_empty() {
        return None;
    }

    let mut claimed = vec![false; usable.len()];
    let mut maps: Vec<(usize, usize)> = Vec::new();
    let mut direction_mismatches = 0usize;
    let mut width_mismatches = 0usize;
    let mut required_matched = 0usize;
    let mut optional_matched = 0usize;

    for &port_idx in group_ports {
        let port = &module.ports[port_idx];
        for candidate in suffix_candidates(&port.name) {
            let Some(&slot) = by_normalized.get(&candidate) else {
                continue;
            };
            if claimed[slot] {
                continue;
            }
            let (logical_idx, role) = usable[slot];
            claimed[slot] = true;
            maps.push((logical_idx, port_idx));

            if !direction_compatible(port.direction, role.direction, side) {
                direction_mismatches += 1;
            }
            if let (Some(lw), Some(pw)) = (role.literal_width(), physical_width(port)) {
                if lw != pw {
                    width_mismatches += 1;
                }
            }
            match role.presence {
                Presence::Required => required_matched += 1,
                Presence::Optional => optional_matched += 1,
                Presence::Illegal => {}
            }
            break;
        }
    }

    if maps.is_empty() {
        return None;
    }

    let denominator = config.w_required * required as f64 + config.w_optional * optional as f64;
    if denominator == 0.0 {
        return None;
    }
    let raw = config.w_required * required_matched as f64
        + config.w_optional * optional_matched as f64
        - config.w_penalty * (direction_mismatches + width_mismatches) as f64;
    let score = (raw / denominator).max(0.0);

    Some(Candidate {
        abstraction,
        bus,
        side,
        score,
        required_matched,
        maps,
    })
}

/// Normalized suffix candidates for a physical name, best first.
///
/// Every contiguous token suffix is a candidate, each also in variants
/// with trailing direction/instance tokens (`o`, `i`, digits) stripped.
/// Longer candidates come first; among equals, fewer strips win.
fn suffix_candidates(name: &str) -> Vec<String> {
    let tokens = tokenize(name);
    // (normalized, token count, strips)
    let mut raw: Vec<(String, usize, usize)> = Vec::new();
    for start in 0..tokens.len() {
        let slice = &tokens[start..];
        let mut strippable = 0;
        while strippable < slice.len() && is_strippable(&slice[slice.len() - 1 - strippable]) {
            strippable += 1;
        }
        for strips in 0..=strippable {
            let kept = &slice[..slice.len() - strips];
            if kept.is_empty() {
                continue;
            }
            raw.push((kept.concat(), kept.len(), strips));
        }
    }
    raw.sort_by(|a, b| {
        b.0.len()
            .cmp(&a.0.len())
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter(|(s, _, _)| seen.insert(s.clone()))
        .map(|(s, _, _)| s)
        .collect()
}

fn is_strippable(token: &str) -> bool {
    token == "O" || token == "I" || token.chars().all(|c| c.is_ascii_digit())
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// The logical direction is from the matched side's own perspective, so
/// `out` means the side drives and the physical port must be an output.
fn direction_compatible(physical: Direction, logical: LogicalDirection, _side: Side) -> bool {
    match physical {
        Direction::Inout => true,
        Direction::Input => logical == LogicalDirection::In,
        Direction::Output => logical == LogicalDirection::Out,
    }
}

fn physical_width(port: &Port) -> Option<u64> {
    match &port.range {
        Some(range) => range.literal_width(),
        None => Some(1),
    }
}

/// Builds the final interface from the winning candidate.
fn build_interface(
    module: &Module,
    group: &PortGroup,
    best: &Candidate,
) -> (BusInterface, Vec<usize>) {
    let name = sanitize_interface_name(&group.name);
    let role = match best.side {
        Side::Master => Role::Master,
        Side::Slave => Role::Slave,
    };

    // portMaps in the abstraction's logical declaration order.
    let mut maps = best.maps.clone();
    maps.sort_by_key(|&(logical_idx, _)| logical_idx);
    let port_maps: Vec<PortMap> = maps
        .iter()
        .map(|&(logical_idx, port_idx)| PortMap {
            logical: best.abstraction.ports[logical_idx].name.clone(),
            physical: module.ports[port_idx].name.clone(),
            slice: None,
        })
        .collect();
    let mapped: Vec<usize> = maps.iter().map(|&(_, p)| p).collect();

    let parameters = propagate_parameters(best.bus, module);

    let (memory_map, address_space) = if best.bus.is_addressable {
        match role {
            Role::Slave => (Some(memory_map_spec(&name, module)), None),
            Role::Master => (None, Some(address_space_spec(&name, module, best))),
            _ => (None, None),
        }
    } else {
        (None, None)
    };

    (
        BusInterface {
            name,
            bus_ref: best.bus.vlnv.clone(),
            abstraction_ref: best.abstraction.vlnv.clone(),
            role,
            port_maps,
            parameters,
            memory_map,
            address_space,
        },
        mapped,
    )
}

/// For each declared bus parameter, finds a module parameter whose
/// tokenized name contains the bus parameter's tokens as a contiguous
/// run, and propagates the pair.
fn propagate_parameters(bus: &BusDefinition, module: &Module) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for bus_param in &bus.parameters {
        let want = tokenize(bus_param);
        let found = module
            .parameters
            .iter()
            .filter(|p| !p.is_local)
            .find(|p| contains_token_run(&tokenize(&p.name), &want));
        if let Some(param) = found {
            out.push((bus_param.clone(), param.name.clone()));
        }
    }
    out
}

fn contains_token_run(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

const DEFAULT_DATA_WIDTH: u64 = 32;
const DEFAULT_ADDR_WIDTH: u32 = 32;
const SLAVE_BLOCK_RANGE: u64 = 4096;

fn module_data_width(module: &Module) -> u64 {
    module
        .parameter("DATA_WIDTH")
        .and_then(|p| p.literal_default())
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(DEFAULT_DATA_WIDTH)
}

fn memory_map_spec(name: &str, module: &Module) -> MemoryMapSpec {
    MemoryMapSpec {
        name: format!("MM_{name}"),
        address_block: format!("BLK_{name}"),
        base_address: 0,
        range: SLAVE_BLOCK_RANGE,
        width: module_data_width(module),
    }
}

fn address_space_spec(name: &str, module: &Module, best: &Candidate) -> AddressSpaceSpec {
    let logical_width = |needle: &str| {
        best.maps.iter().find_map(|&(logical_idx, _)| {
            let logical = &best.abstraction.ports[logical_idx];
            if !logical.name.to_ascii_uppercase().contains(needle) {
                return None;
            }
            logical.on(best.side)?.literal_width()
        })
    };

    let addr_width = logical_width("ADDR")
        .and_then(|w| u32::try_from(w).ok())
        .unwrap_or(DEFAULT_ADDR_WIDTH);
    let range = (1u128 << addr_width).to_string();
    let width = logical_width("DATA").unwrap_or_else(|| module_data_width(module));

    AddressSpaceSpec {
        name: format!("AS_{name}"),
        range,
        width,
    }
}

/// Clock/reset groups match only the catalog's special bus definitions.
fn match_special_group(
    module: &Module,
    group: &PortGroup,
    catalog: &Catalog,
    kind: BusKind,
) -> Option<(BusInterface, Vec<usize>)> {
    let bus = catalog.special_bus(kind)?;
    let abstraction = catalog.abstraction_for_bus(&bus.vlnv)?;
    let logical = abstraction.ports.first()?;

    let port_idx = *group.ports.first()?;
    let port = &module.ports[port_idx];

    let mut parameters = Vec::new();
    match kind {
        BusKind::Clock => parameters.push(("isClock".to_string(), "true".to_string())),
        BusKind::Reset => {
            parameters.push(("isReset".to_string(), "true".to_string()));
            let polarity = if port.name.to_ascii_lowercase().ends_with('n') {
                "ACTIVE_LOW"
            } else {
                "ACTIVE_HIGH"
            };
            parameters.push(("POLARITY".to_string(), polarity.to_string()));
        }
        BusKind::Protocol => {}
    }

    let role = match port.direction {
        Direction::Output => Role::Master,
        _ => Role::Slave,
    };

    Some((
        BusInterface {
            name: sanitize_interface_name(&group.name),
            bus_ref: bus.vlnv.clone(),
            abstraction_ref: abstraction.vlnv.clone(),
            role,
            port_maps: vec![PortMap {
                logical: logical.name.clone(),
                physical: port.name.clone(),
                slice: None,
            }],
            parameters,
            memory_map: None,
            address_space: None,
        },
        vec![port_idx],
    ))
}
