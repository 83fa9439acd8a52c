//! Peer access tiers and the deprecated flat fields they replaced
//!
//! Older configurations describe a single path with flat attributes
//! (`access_tiers`, `connectors`, `public_cidrs_include`, ...). They are
//! folded into peers ahead of any `peer_access_tiers` blocks. On the way back
//! the flat fields either keep what the user wrote, when the server still
//! holds exactly that fold, or mirror the first peer. A mirrored copy is
//! recorded as a digest in `legacy_mirror` so it is never mistaken for user
//! input on the next write.

use std::collections::HashMap;

use banyan_client::service_tunnel::{IncludeExclude, PeerAccessTier};
use banyan_core::resource::{BlockExt, ResourceData, Value};

use crate::helpers::{block, blocks_value};

/// Include/exclude blocks a peer can carry, with their flat field prefix
const SCOPES: [&str; 3] = ["public_cidrs", "public_domains", "applications"];

/// Computed attribute holding the digest of the last mirrored flat fields
pub(super) const MIRROR_MARKER: &str = "legacy_mirror";

const VIA_ACCESS_TIER: &str = "public_traffic_tunnel_via_access_tier";

fn non_empty(scope: IncludeExclude) -> Option<IncludeExclude> {
    (!scope.is_empty()).then_some(scope)
}

fn scope_of<'a>(peer: &'a PeerAccessTier, name: &str) -> Option<&'a IncludeExclude> {
    match name {
        "public_cidrs" => peer.public_cidrs.as_ref(),
        "public_domains" => peer.public_domains.as_ref(),
        _ => peer.applications.as_ref(),
    }
}

fn set_scope(peer: &mut PeerAccessTier, name: &str, scope: Option<IncludeExclude>) {
    match name {
        "public_cidrs" => peer.public_cidrs = scope,
        "public_domains" => peer.public_domains = scope,
        _ => peer.applications = scope,
    }
}

/// The deprecated flat fields of a tunnel
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct LegacyPeers {
    pub access_tiers: Vec<String>,
    pub connectors: Vec<String>,
    pub access_tier_group: String,
    /// Keyed by scope name, in `SCOPES` order
    pub scopes: [IncludeExclude; 3],
    pub via_access_tier: String,
}

impl LegacyPeers {
    pub fn from_bag(data: &ResourceData) -> Self {
        Self {
            access_tiers: data.get_string_set("access_tiers"),
            connectors: data.get_string_set("connectors"),
            access_tier_group: data.get_string("access_tier_group"),
            scopes: SCOPES.map(|name| IncludeExclude {
                include: data.get_string_set(&format!("{}_include", name)),
                exclude: data.get_string_set(&format!("{}_exclude", name)),
            }),
            via_access_tier: data.get_string(VIA_ACCESS_TIER),
        }
    }

    /// Every flat attribute name
    fn keys() -> Vec<String> {
        let mut keys = vec![
            "access_tiers".to_string(),
            "connectors".to_string(),
            "access_tier_group".to_string(),
            VIA_ACCESS_TIER.to_string(),
        ];
        for name in SCOPES {
            keys.push(format!("{}_include", name));
            keys.push(format!("{}_exclude", name));
        }
        keys
    }

    /// Stable fingerprint of the bag form
    fn digest(&self) -> String {
        serde_json::json!({
            "access_tiers": self.access_tiers,
            "connectors": self.connectors,
            "access_tier_group": self.access_tier_group,
            "scopes": self.scopes,
            "via": self.via_access_tier,
        })
        .to_string()
    }

    pub fn write_to(&self, data: &mut ResourceData) {
        data.set("access_tiers", Value::string_set(self.access_tiers.clone()));
        data.set("connectors", Value::string_set(self.connectors.clone()));
        data.set("access_tier_group", self.access_tier_group.clone());
        for (name, scope) in SCOPES.iter().zip(&self.scopes) {
            data.set(format!("{}_include", name), Value::string_set(scope.include.clone()));
            data.set(format!("{}_exclude", name), Value::string_set(scope.exclude.clone()));
        }
        data.set(VIA_ACCESS_TIER, self.via_access_tier.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.access_tiers.is_empty()
            && self.connectors.is_empty()
            && self.access_tier_group.is_empty()
            && self.scopes.iter().all(IncludeExclude::is_empty)
    }

    /// Flat view of one peer
    pub fn mirror(peer: Option<&PeerAccessTier>) -> Self {
        let Some(peer) = peer else {
            return Self::default();
        };
        Self {
            // connectors always sit behind the wildcard tier
            access_tiers: if peer.connectors.is_empty() {
                peer.access_tiers.clone()
            } else {
                Vec::new()
            },
            connectors: peer.connectors.clone(),
            access_tier_group: peer.access_tier_group.clone(),
            scopes: SCOPES.map(|name| scope_of(peer, name).cloned().unwrap_or_default()),
            via_access_tier: String::new(),
        }
    }

    /// Peers equivalent to the flat fields
    ///
    /// Connectors win over a group, which wins over access tiers. The
    /// include/exclude blocks go to the peer named by
    /// `public_traffic_tunnel_via_access_tier`, or the first peer.
    pub fn fold(&self, cluster: &str) -> Vec<PeerAccessTier> {
        let base = PeerAccessTier {
            cluster: cluster.to_string(),
            ..Default::default()
        };
        let mut peers = if !self.connectors.is_empty() {
            vec![PeerAccessTier {
                access_tiers: vec!["*".to_string()],
                connectors: self.connectors.clone(),
                ..base
            }]
        } else if !self.access_tier_group.is_empty() {
            vec![PeerAccessTier {
                access_tier_group: self.access_tier_group.clone(),
                ..base
            }]
        } else {
            self.access_tiers
                .iter()
                .map(|tier| PeerAccessTier {
                    access_tiers: vec![tier.clone()],
                    ..base.clone()
                })
                .collect()
        };

        let carrier = peers
            .iter()
            .position(|p| p.access_tiers.len() == 1 && p.access_tiers[0] == self.via_access_tier)
            .unwrap_or(0);
        if let Some(peer) = peers.get_mut(carrier) {
            for (name, scope) in SCOPES.iter().zip(&self.scopes) {
                set_scope(peer, name, non_empty(scope.clone()));
            }
        }
        peers
    }
}

/// Drop flat fields that are still the copy the last read mirrored in
///
/// Returns whether anything was dropped.
pub(super) fn strip_mirrored(data: &mut ResourceData) -> bool {
    let mirrored = data
        .get_str(MIRROR_MARKER)
        .is_some_and(|digest| digest == LegacyPeers::from_bag(data).digest());
    if mirrored {
        for key in LegacyPeers::keys() {
            data.remove(&key);
        }
    }
    mirrored
}

/// Peers to send: folded flat fields first, then the structured blocks
pub(super) fn expand(data: &ResourceData) -> Vec<PeerAccessTier> {
    let cluster = data.get_string("cluster");
    let legacy = LegacyPeers::from_bag(data);
    let mut peers: Vec<PeerAccessTier> = data
        .get_blocks("peer_access_tiers")
        .into_iter()
        .map(|b| expand_peer(&cluster, b))
        .collect();

    if legacy.is_empty() || (!peers.is_empty() && legacy == LegacyPeers::mirror(peers.first())) {
        return peers;
    }
    let mut folded = legacy.fold(&cluster);
    folded.append(&mut peers);
    folded
}

/// Split the server's peers back into flat fields and blocks
pub(super) fn flatten(peers: &[PeerAccessTier], data: &mut ResourceData) {
    let legacy = LegacyPeers::from_bag(data);
    let cluster = data.get_string("cluster");
    let user_peers: Vec<PeerAccessTier> = data
        .get_blocks("peer_access_tiers")
        .into_iter()
        .map(|b| expand_peer(&cluster, b))
        .collect();

    let folded = legacy.fold(&cluster);
    let written_by_user = !legacy.is_empty() && legacy != LegacyPeers::mirror(user_peers.first());
    if written_by_user && !folded.is_empty() && peers.starts_with(&folded) {
        legacy.write_to(data);
        data.remove(MIRROR_MARKER);
        data.set("peer_access_tiers", blocks_value(peers[folded.len()..].iter().map(flatten_peer)));
    } else {
        LegacyPeers::mirror(peers.first()).write_to(data);
        let digest = LegacyPeers::from_bag(data).digest();
        data.set(MIRROR_MARKER, digest);
        data.set("peer_access_tiers", blocks_value(peers.iter().map(flatten_peer)));
    }
}

fn expand_peer(cluster: &str, peer: &HashMap<String, Value>) -> PeerAccessTier {
    let mut out = PeerAccessTier {
        cluster: cluster.to_string(),
        access_tiers: peer.string_set("access_tiers"),
        access_tier_group: peer.string("access_tier_group"),
        connectors: peer.string_set("connectors"),
        ..Default::default()
    };
    for name in SCOPES {
        let scope = peer.nested(name).first().map(|b| IncludeExclude {
            include: b.string_set("include"),
            exclude: b.string_set("exclude"),
        });
        set_scope(&mut out, name, scope.and_then(non_empty));
    }
    out
}

fn flatten_peer(peer: &PeerAccessTier) -> HashMap<String, Value> {
    let mut members = block([
        ("access_tiers", Value::string_set(peer.access_tiers.clone())),
        ("access_tier_group", peer.access_tier_group.clone().into()),
        ("connectors", Value::string_set(peer.connectors.clone())),
    ]);
    for name in SCOPES {
        if let Some(scope) = scope_of(peer, name).filter(|s| !s.is_empty()) {
            let scope_block = block([
                ("include", Value::string_set(scope.include.clone())),
                ("exclude", Value::string_set(scope.exclude.clone())),
            ]);
            members.insert(name.to_string(), blocks_value([scope_block]));
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(tiers: &[&str]) -> PeerAccessTier {
        PeerAccessTier {
            cluster: "cluster1".to_string(),
            access_tiers: tiers.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn cidrs(include: &[&str]) -> Option<IncludeExclude> {
        Some(IncludeExclude {
            include: include.iter().map(|c| c.to_string()).collect(),
            exclude: vec![],
        })
    }

    #[test]
    fn tiers_fold_into_one_peer_each() {
        let data = ResourceData::new()
            .with_attribute("cluster", "cluster1")
            .with_attribute("access_tiers", Value::string_set(["a", "b"]))
            .with_attribute("public_cidrs_include", Value::string_set(["8.8.0.0/16"]))
            .with_attribute("public_traffic_tunnel_via_access_tier", "b");
        let peers = expand(&data);
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0], peer(&["a"]));
        assert_eq!(peers[1].access_tiers, vec!["b"]);
        assert_eq!(peers[1].public_cidrs, cidrs(&["8.8.0.0/16"]));
    }

    #[test]
    fn scopes_default_to_first_peer() {
        let legacy = LegacyPeers {
            access_tiers: vec!["a".to_string(), "b".to_string()],
            scopes: [
                IncludeExclude::default(),
                IncludeExclude {
                    include: vec!["example.com".to_string()],
                    exclude: vec![],
                },
                IncludeExclude::default(),
            ],
            ..Default::default()
        };
        let peers = legacy.fold("cluster1");
        assert!(peers[0].public_domains.is_some());
        assert!(peers[1].public_domains.is_none());
    }

    #[test]
    fn connectors_win_over_group_and_tiers() {
        let legacy = LegacyPeers {
            access_tiers: vec!["a".to_string()],
            connectors: vec!["c1".to_string()],
            access_tier_group: "g".to_string(),
            ..Default::default()
        };
        let peers = legacy.fold("cluster1");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].access_tiers, vec!["*"]);
        assert_eq!(peers[0].connectors, vec!["c1"]);
        assert_eq!(peers[0].access_tier_group, "");

        let group = LegacyPeers {
            access_tiers: vec!["a".to_string()],
            access_tier_group: "g".to_string(),
            ..Default::default()
        };
        assert_eq!(group.fold("cluster1")[0].access_tier_group, "g");
        assert!(group.fold("cluster1")[0].access_tiers.is_empty());
    }

    #[test]
    fn folded_peers_come_before_blocks() {
        let data = ResourceData::new()
            .with_attribute("cluster", "cluster1")
            .with_attribute("access_tiers", Value::string_set(["a"]))
            .with_attribute(
                "peer_access_tiers",
                blocks_value([block([("access_tier_group", "g".into())])]),
            );
        let peers = expand(&data);
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].access_tiers, vec!["a"]);
        assert_eq!(peers[1].access_tier_group, "g");
    }

    #[test]
    fn flatten_keeps_user_fields_while_the_fold_matches() {
        let mut data = ResourceData::new()
            .with_attribute("cluster", "cluster1")
            .with_attribute("access_tiers", Value::string_set(["a", "b"]));
        let server = vec![peer(&["a"]), peer(&["b"]), peer(&["c"])];
        flatten(&server, &mut data);
        assert_eq!(data.get_string_set("access_tiers"), vec!["a", "b"]);
        assert_eq!(data.get_blocks("peer_access_tiers").len(), 1);

        // drift: the fold no longer matches, fall back to mirroring
        let server = vec![peer(&["z"])];
        flatten(&server, &mut data);
        assert_eq!(data.get_string_set("access_tiers"), vec!["z"]);
        assert_eq!(data.get_blocks("peer_access_tiers").len(), 1);
    }

    #[test]
    fn mirrored_fields_are_not_folded_again() {
        let mut data = ResourceData::new().with_attribute("cluster", "cluster1");
        let server = vec![PeerAccessTier {
            public_cidrs: cidrs(&["10.0.0.0/8"]),
            ..peer(&["a"])
        }];
        flatten(&server, &mut data);
        assert_eq!(data.get_string_set("public_cidrs_include"), vec!["10.0.0.0/8"]);
        assert_eq!(expand(&data), server);
    }

    #[test]
    fn mirrored_copy_is_stripped_after_a_peer_edit() {
        let mut data = ResourceData::new().with_attribute("cluster", "cluster1");
        flatten(&[peer(&["us-west1"])], &mut data);
        assert_eq!(data.get_string_set("access_tiers"), vec!["us-west1"]);

        data.set(
            "peer_access_tiers",
            blocks_value([block([("access_tiers", Value::string_set(["us-east1"]))])]),
        );
        assert!(strip_mirrored(&mut data));
        assert!(!data.contains("access_tiers"));
        assert_eq!(expand(&data), vec![peer(&["us-east1"])]);
    }

    #[test]
    fn flat_fields_written_by_the_user_are_kept() {
        let mut data = ResourceData::new().with_attribute("cluster", "cluster1");
        flatten(&[peer(&["us-west1"])], &mut data);

        // the user switches to the flat form with a different tier
        data.set("access_tiers", Value::string_set(["us-east1"]));
        assert!(!strip_mirrored(&mut data));
        assert_eq!(expand(&data)[0], peer(&["us-east1"]));

        // a user-kept fold clears the marker
        let mut kept = ResourceData::new()
            .with_attribute("cluster", "cluster1")
            .with_attribute("access_tiers", Value::string_set(["a"]));
        flatten(&[peer(&["a"])], &mut kept);
        assert!(!kept.contains(MIRROR_MARKER));
        assert!(!strip_mirrored(&mut kept));
    }
}
