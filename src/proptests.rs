use super::*;

use crate::bits::BitString;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

fn validate_trie(t: &DynamicTrie) {
    let root = t.root();
    assert!(root.segment().is_empty(), "root segment must be empty");
    assert!(root.content().is_empty(), "root content must be empty");

    let mut stack = vec![(root, 0usize)];
    let mut nodes = 0usize;
    let mut labeled = 0usize;
    while let Some((node, depth)) = stack.pop() {
        nodes += 1;
        assert!(node.child_count() <= 2, "binary trie node has >2 children");
        if node.label().is_some() {
            labeled += 1;
        } else if depth > 0 {
            assert_eq!(node.child_count(), 2, "branch node must have two children");
        }

        let mut first_bits = Vec::new();
        for child in node.children() {
            assert!(!child.segment().is_empty(), "non-root segment must not be empty");
            let mut expected = node.content().to_vec();
            expected.extend_from_slice(child.segment());
            assert_eq!(
                child.content(),
                expected.as_slice(),
                "content must equal parent content + segment"
            );
            first_bits.push(child.segment()[0]);
            stack.push((child, depth + 1));
        }
        first_bits.sort_unstable();
        first_bits.dedup();
        assert_eq!(
            first_bits.len(),
            node.child_count(),
            "siblings must start with distinct bits"
        );
    }

    assert_eq!(nodes, t.node_count(), "node_count must match reachable nodes");
    assert_eq!(labeled, t.len(), "len must match labeled nodes");
}

fn oracle(routes: &BTreeMap<BitString, Label>, query: &[u8]) -> Option<Label> {
    routes
        .iter()
        .filter(|(k, _)| query.starts_with(k))
        .max_by_key(|(k, _)| k.len())
        .map(|(_, &l)| l)
}

fn reparsed(t: &DynamicTrie) -> StaticTrie {
    let mut out = Vec::new();
    persist::write(t, &mut out).unwrap();
    persist::parse(&out, Family::V4.key_bits()).unwrap()
}

fn canonical(t: &StaticTrie) -> Vec<u8> {
    let mut out = Vec::new();
    persist::write_static(t, &mut out).unwrap();
    out
}

fn bits_strategy(max_len: usize) -> impl Strategy<Value = BitString> + Clone {
    prop::collection::vec(prop_oneof![Just(b'0'), Just(b'1')], 0..=max_len)
}

fn label_strategy() -> impl Strategy<Value = Label> + Clone {
    (1u32..=50).prop_map(|n| Label::new(n).unwrap())
}

fn routes_strategy() -> impl Strategy<Value = Vec<(BitString, Label)>> {
    // Short keys keep the key space small enough to force splits, splices
    // and upserts.
    prop::collection::vec((bits_strategy(10), label_strategy()), 0..=64)
}

fn unique_routes_strategy() -> impl Strategy<Value = Vec<(BitString, Label)>> {
    prop::collection::btree_map(bits_strategy(10), label_strategy(), 0..=48)
        .prop_map(|m| m.into_iter().collect())
}

#[derive(Clone, Debug, Arbitrary)]
struct V4Route {
    #[proptest(strategy = "0x0A00_0000u32..0x0A10_0000")]
    addr: u32,
    #[proptest(strategy = "0usize..=32")]
    len: usize,
    #[proptest(strategy = "1u32..=20")]
    label: u32,
}

impl V4Route {
    fn mask(len: usize) -> u32 {
        if len == 0 {
            0
        } else {
            u32::MAX << (32 - len)
        }
    }

    fn network(&self) -> u32 {
        self.addr & Self::mask(self.len)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_lookup_matches_oracle(
        routes in routes_strategy(),
        queries in prop::collection::vec(bits_strategy(12), 1..32),
    ) {
        let mut t = DynamicTrie::new();
        let mut m: BTreeMap<BitString, Label> = BTreeMap::new();
        for (key, label) in routes {
            let got = t.insert(&key, label);
            let expected = match m.insert(key, label) {
                Some(old) => Insert::Updated(old),
                None => Insert::Added,
            };
            prop_assert_eq!(got, expected);
        }

        validate_trie(&t);
        prop_assert_eq!(t.len(), m.len());
        for (key, &label) in &m {
            prop_assert_eq!(t.get(key), Some(label));
        }
        let mut routes = t.routes();
        routes.sort();
        let expected: Vec<(BitString, Label)> = m.iter().map(|(k, &l)| (k.clone(), l)).collect();
        prop_assert_eq!(routes, expected);

        let flat = StaticTrie::from_dynamic(&t);
        let parsed = reparsed(&t);
        prop_assert_eq!(flat.node_count(), t.node_count());
        prop_assert_eq!(parsed.node_count(), t.node_count());
        for q in &queries {
            prop_assert_eq!(flat.find(q), oracle(&m, q));
            prop_assert_eq!(parsed.find(q), flat.find(q));
        }
    }

    #[test]
    fn prop_insertion_order_independent(
        (routes, shuffled) in unique_routes_strategy()
            .prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle())),
    ) {
        let mut a = DynamicTrie::new();
        for (key, label) in &routes {
            a.insert(key, *label);
        }
        let mut b = DynamicTrie::new();
        for (key, label) in &shuffled {
            b.insert(key, *label);
        }

        validate_trie(&a);
        validate_trie(&b);
        prop_assert_eq!(a.node_count(), b.node_count());
        prop_assert_eq!(
            canonical(&StaticTrie::from_dynamic(&a)),
            canonical(&StaticTrie::from_dynamic(&b))
        );
    }

    #[test]
    fn prop_upsert_is_idempotent(
        routes in unique_routes_strategy(),
        pick in any::<prop::sample::Index>(),
        relabel in label_strategy(),
    ) {
        prop_assume!(!routes.is_empty());
        let mut t = DynamicTrie::new();
        for (key, label) in &routes {
            t.insert(key, *label);
        }
        let before = canonical(&StaticTrie::from_dynamic(&t));
        let (nodes, len) = (t.node_count(), t.len());

        let (key, old) = &routes[pick.index(routes.len())];
        prop_assert_eq!(t.insert(key, relabel), Insert::Updated(*old));
        prop_assert_eq!(t.node_count(), nodes);
        prop_assert_eq!(t.len(), len);
        prop_assert_eq!(t.get(key), Some(relabel));

        // Put the old label back: the structure is exactly as before.
        t.insert(key, *old);
        prop_assert_eq!(canonical(&StaticTrie::from_dynamic(&t)), before);
    }

    #[test]
    fn prop_ipv4_routes_via_codec(
        routes in prop::collection::vec(any::<V4Route>(), 0..48),
        queries in prop::collection::vec(0x0A00_0000u32..0x0A20_0000, 1..48),
    ) {
        let mut t = DynamicTrie::new();
        let mut m: BTreeMap<(u32, usize), u32> = BTreeMap::new();
        for r in &routes {
            let (family, key) = key::encode_prefix(&Ipv4Addr::from(r.addr).to_string(), r.len).unwrap();
            prop_assert_eq!(family, Family::V4);
            t.insert(&key, Label::new(r.label).unwrap());
            m.insert((r.network(), r.len), r.label);
        }
        let flat = StaticTrie::from_dynamic(&t);

        for &q in &queries {
            let expected = m
                .iter()
                .filter(|((net, len), _)| q & V4Route::mask(*len) == *net)
                .max_by_key(|((_, len), _)| *len)
                .map(|(_, &l)| l);
            let (_, key) = key::encode_address(&Ipv4Addr::from(q).to_string()).unwrap();
            prop_assert_eq!(flat.find(&key).map(Label::get), expected);
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    // Covers root labels, splices, appends and splits.
    let raw: [&[u8]; 7] = [b"", b"0", b"1", b"01", b"0110", b"0111", b"10"];
    let keys: Vec<(Vec<u8>, Label)> = raw
        .iter()
        .enumerate()
        .map(|(i, k)| (k.to_vec(), Label::new(i as u32 + 1).unwrap()))
        .collect();

    let mut baseline = DynamicTrie::new();
    for (k, l) in &keys {
        baseline.insert(k, *l);
    }
    let expected = canonical(&StaticTrie::from_dynamic(&baseline));

    for_each_permutation(&keys, |perm| {
        let mut t = DynamicTrie::new();
        for (k, l) in &perm {
            assert_eq!(t.insert(k, *l), Insert::Added);
        }
        validate_trie(&t);
        assert_eq!(t.node_count(), baseline.node_count());
        assert_eq!(canonical(&StaticTrie::from_dynamic(&t)), expected);
        assert_eq!(canonical(&reparsed(&t)), expected);
    });
}
