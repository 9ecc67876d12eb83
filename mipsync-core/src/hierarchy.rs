//! Father/subproposal relations over a [`ProposalMap`].
//!
//! Relations are plain id fields: a subproposal carries its grouping key in
//! [`Proposal::proposal`] and, once linked, the father's id in
//! [`Proposal::father_id`]. Nothing here owns another proposal.

use std::collections::BTreeMap;

use crate::types::{Proposal, ProposalId, ProposalMap};

/// The proposal number embedded in a component label (`MIP4c2` → 4).
pub fn component_mip(label: &str) -> Option<u32> {
    let rest = label.get(..3)?.eq_ignore_ascii_case("mip").then(|| &label[3..])?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Locate the father of `sub` among `candidates`.
///
/// A father is a non-subproposal of the same language that lists the
/// grouping key among its components; when none does, the one whose `mip`
/// matches the number embedded in the key.
pub fn find_father<'a, I>(sub: &Proposal, candidates: I) -> Option<&'a Proposal>
where
    I: IntoIterator<Item = &'a Proposal>,
{
    let key = sub.proposal.as_deref()?;
    let eligible: Vec<&Proposal> = candidates
        .into_iter()
        .filter(|p| !p.is_subproposal() && p.language == sub.language && p.id.is_some())
        .collect();

    if let Some(father) = eligible.iter().find(|p| p.has_component(key)) {
        return Some(father);
    }
    let mip = component_mip(key)?;
    eligible.into_iter().find(|p| p.mip() == Some(mip))
}

/// Fathers with at least one subproposal, ordered by filename.
pub fn group_fathers(proposals: &ProposalMap) -> Vec<Proposal> {
    let mut fathers: BTreeMap<&str, &Proposal> = BTreeMap::new();
    for sub in proposals.values().filter(|p| p.is_subproposal()) {
        if let Some(father) = find_father(sub, proposals.values()) {
            fathers.insert(father.filename.as_str(), father);
        }
    }
    fathers.into_values().cloned().collect()
}

/// Recompute `father_id` on every proposal against `father_ids`.
///
/// A subproposal whose father is in `father_ids` points at it; every other
/// proposal, including subproposals whose father is gone or not listed,
/// has its `father_id` cleared. Returns one flag per id, `false` for ids
/// that are not stored.
pub fn link_fathers(proposals: &mut ProposalMap, father_ids: &[ProposalId]) -> Vec<bool> {
    let found: Vec<bool> = father_ids
        .iter()
        .map(|id| proposals.values().any(|p| p.id.as_ref() == Some(id)))
        .collect();

    let assignments: Vec<(String, Option<ProposalId>)> = proposals
        .values()
        .map(|p| {
            let father = p
                .is_subproposal()
                .then(|| find_father(p, proposals.values()))
                .flatten()
                .and_then(|f| f.id.clone())
                .filter(|id| father_ids.contains(id));
            (p.filename.clone(), father)
        })
        .collect();

    for (filename, father_id) in assignments {
        if let Some(proposal) = proposals.get_mut(&filename) {
            proposal.father_id = father_id;
        }
    }
    found
}

/// Number of linked subproposals per father id.
pub fn subproposal_counts(proposals: &ProposalMap) -> BTreeMap<ProposalId, u32> {
    let mut counts = BTreeMap::new();
    let linked = proposals
        .values()
        .filter(|p| p.is_subproposal())
        .filter_map(|p| p.father_id.as_ref());
    for father_id in linked {
        *counts.entry(father_id.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, GitFile, Language};

    fn stored(id: &str, filename: &str) -> Proposal {
        let mut p = Proposal::from_descriptor(&GitFile::new(filename, "h"));
        p.id = Some(ProposalId::from(id));
        p
    }

    fn father(id: &str, filename: &str, mip: u32, components: &[&str]) -> Proposal {
        let mut p = stored(id, filename);
        p.preamble.mip = Some(mip);
        p.components = components
            .iter()
            .map(|c| Component {
                c_name: (*c).to_string(),
                c_title: String::new(),
                c_body: String::new(),
            })
            .collect();
        p
    }

    fn sub(id: &str, filename: &str, key: &str) -> Proposal {
        let mut p = stored(id, filename);
        p.proposal = Some(key.to_string());
        p
    }

    fn map(items: Vec<Proposal>) -> ProposalMap {
        items.into_iter().map(|p| (p.filename.clone(), p)).collect()
    }

    #[test]
    fn component_mip_parses_label() {
        assert_eq!(component_mip("MIP4c2"), Some(4));
        assert_eq!(component_mip("mip13c3"), Some(13));
        assert_eq!(component_mip("MIPc2"), None);
        assert_eq!(component_mip("XY"), None);
    }

    #[test]
    fn father_found_by_component_before_mip_number() {
        let proposals = map(vec![
            father("p1", "MIP4/mip4.md", 4, &[]),
            father("p2", "MIP40/mip40.md", 40, &["MIP4c2"]),
            sub("p3", "MIP4/MIP4c2-SP1.md", "MIP4c2"),
        ]);
        let s = &proposals["MIP4/MIP4c2-SP1.md"];
        let f = find_father(s, proposals.values()).expect("father");
        assert_eq!(f.filename, "MIP40/mip40.md");
    }

    #[test]
    fn father_falls_back_to_mip_number() {
        let proposals = map(vec![
            father("p1", "MIP4/mip4.md", 4, &[]),
            sub("p3", "MIP4/MIP4c2-SP1.md", "MIP4c2"),
        ]);
        let s = &proposals["MIP4/MIP4c2-SP1.md"];
        assert_eq!(
            find_father(s, proposals.values()).map(|f| f.filename.as_str()),
            Some("MIP4/mip4.md")
        );
    }

    #[test]
    fn father_must_share_language() {
        let mut es = father("p1", "I18N/ES/MIP4/mip4.md", 4, &["MIP4c2"]);
        es.language = Language::Spanish;
        let proposals = map(vec![es, sub("p2", "MIP4/MIP4c2-SP1.md", "MIP4c2")]);
        assert!(group_fathers(&proposals).is_empty());
    }

    #[test]
    fn group_and_link_then_count() {
        let mut proposals = map(vec![
            father("p1", "MIP4/mip4.md", 4, &["MIP4c2"]),
            father("p2", "MIP5/mip5.md", 5, &[]),
            sub("p3", "MIP4/MIP4c2-SP1.md", "MIP4c2"),
            sub("p4", "MIP4/MIP4c2-SP2.md", "MIP4c2"),
        ]);

        let fathers = group_fathers(&proposals);
        assert_eq!(fathers.len(), 1);
        assert_eq!(fathers[0].id, Some(ProposalId::from("p1")));

        let flags = link_fathers(
            &mut proposals,
            &[ProposalId::from("p1"), ProposalId::from("missing")],
        );
        assert_eq!(flags, vec![true, false]);
        assert_eq!(
            proposals["MIP4/MIP4c2-SP2.md"].father_id,
            Some(ProposalId::from("p1"))
        );

        let counts = subproposal_counts(&proposals);
        assert_eq!(counts.get(&ProposalId::from("p1")), Some(&2));
        assert_eq!(counts.get(&ProposalId::from("p2")), None);
    }

    #[test]
    fn relinking_clears_stale_references() {
        let mut former = stored("p3", "MIP4/guide.md");
        former.father_id = Some(ProposalId::from("p1"));
        let mut orphan = sub("p4", "MIP7/MIP7c1-SP1.md", "MIP7c1");
        orphan.father_id = Some(ProposalId::from("p9"));
        let mut proposals = map(vec![father("p1", "MIP4/mip4.md", 4, &["MIP4c2"]), former, orphan]);

        let flags = link_fathers(&mut proposals, &[]);
        assert!(flags.is_empty());
        assert_eq!(proposals["MIP4/guide.md"].father_id, None);
        assert_eq!(proposals["MIP7/MIP7c1-SP1.md"].father_id, None);
        assert!(subproposal_counts(&proposals).is_empty());
    }
}
