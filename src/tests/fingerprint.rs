use crate::fingerprint::hash_combine;
use crate::prelude::*;
use crate::smiles;
use rand::prelude::*;

#[test]
fn hash() {
    assert_eq!(hash_combine(0, 0), 0x9e3779b9);
    assert_ne!(hash_combine(1, 2), hash_combine(2, 1));
}

#[test]
fn phenol() {
    let phenol = smiles!("c1ccccc1O");
    let fp = morgan_fingerprint(&phenol, FingerprintConfig::new());
    assert_eq!(fp.len(), 2048);
    assert_eq!(fp.count_ones(), 11);

    let r0 = FingerprintConfig::new().with_radius(0).with_bits(512);
    assert_eq!(morgan_fingerprint(&phenol, r0).count_ones(), 3);
    let r1 = FingerprintConfig::new().with_radius(1).with_bits(1024);
    assert_eq!(morgan_fingerprint(&phenol, r1).count_ones(), 7);
    let short = FingerprintConfig::new().with_bits(512);
    assert_eq!(morgan_fingerprint(&phenol, short).count_ones(), 11);
}

#[test]
fn bits_accumulate_with_radius() {
    let aspirin = smiles!("CC(=O)Oc1ccccc1C(=O)O");
    let mut last = morgan_fingerprint(&aspirin, FingerprintConfig::new().with_radius(0));
    for radius in 1..4 {
        let fp = morgan_fingerprint(&aspirin, FingerprintConfig::new().with_radius(radius));
        assert!(fp.contains(&last), "radius {radius}");
        assert!(fp.count_ones() >= last.count_ones());
        last = fp;
    }
}

#[test]
fn display() {
    let methane = smiles!("C");
    let fp = morgan_fingerprint(&methane, FingerprintConfig::new().with_bits(64));
    let s = fp.to_string();
    assert_eq!(s.len(), 64);
    assert_eq!(s.bytes().filter(|&b| b == b'1').count(), 1);
    assert!(s.bytes().all(|b| b == b'0' || b == b'1'));
    assert_eq!(fp.ones().collect::<Vec<_>>(), [s.find('1').unwrap_or(usize::MAX)]);
}

#[test]
fn empty() {
    let nothing = morgan_fingerprint(&smiles!(""), FingerprintConfig::new());
    assert_eq!(nothing.len(), 2048);
    assert_eq!(nothing.count_ones(), 0);

    let zero = morgan_fingerprint(&smiles!("CCO"), FingerprintConfig::new().with_bits(0));
    assert!(zero.is_empty());
    assert_eq!(zero.to_string(), "");
}

#[test]
fn similarity() {
    let cfg = FingerprintConfig::new();
    let ethanol = morgan_fingerprint(&smiles!("CCO"), cfg);
    let same = morgan_fingerprint(&smiles!("OCC"), cfg);
    let propanol = morgan_fingerprint(&smiles!("CCCO"), cfg);
    let benzene = morgan_fingerprint(&smiles!("c1ccccc1"), cfg);

    assert_eq!(ethanol, same);
    assert_eq!(ethanol.tanimoto(&same), Some(1.0));
    let close = propanol.tanimoto(&ethanol).unwrap_or(0.0);
    let far = benzene.tanimoto(&ethanol).unwrap_or(1.0);
    assert!(close > far, "{close} vs {far}");
    assert!((0.0..1.0).contains(&close));

    let short = morgan_fingerprint(&smiles!("CCO"), cfg.with_bits(1024));
    assert_eq!(short.tanimoto(&ethanol), None);
    assert!(!ethanol.contains(&short));

    let empty = Fingerprint::new(16);
    assert_eq!(empty.tanimoto(&Fingerprint::new(16)), Some(1.0));
}

#[test]
fn ring_membership() {
    let cyclohexane = smiles!("C1CCCCC1");
    let with = morgan_fingerprint(&cyclohexane, FingerprintConfig::new().with_radius(0));
    let without = morgan_fingerprint(
        &cyclohexane,
        FingerprintConfig::new()
            .with_radius(0)
            .with_ring_membership(false),
    );
    assert_eq!(with.count_ones(), 1);
    assert_eq!(without.count_ones(), 1);
    assert_ne!(with, without);
}

#[test]
fn independent_of_atom_order() {
    let mut rng = StdRng::seed_from_u64(7);
    for input in ["CC(=O)Oc1ccccc1C(=O)O", "C1CC2CCC1C2", "OCC(N)C(=O)O"] {
        let mol = SmilesParser::new(input).parse().expect("valid SMILES");
        let expected = morgan_fingerprint(&mol, FingerprintConfig::new());
        let mut order = (0..mol.atom_count()).collect::<Vec<_>>();
        for _ in 0..5 {
            order.shuffle(&mut rng);
            let shuffled = mol.permute_atoms(&order).expect("order is a permutation");
            assert_eq!(
                morgan_fingerprint(&shuffled, FingerprintConfig::new()),
                expected,
                "{input}"
            );
        }
    }
}

#[test]
fn radius_past_saturation() {
    let aspirin = smiles!("CC(=O)Oc1ccccc1C(=O)O");
    let wide = morgan_fingerprint(&aspirin, FingerprintConfig::new().with_radius(32));
    let unbounded = morgan_fingerprint(&aspirin, FingerprintConfig::new().with_radius(u32::MAX));
    assert_eq!(wide, unbounded);
    let ions = morgan_fingerprint(&smiles!("[Na+].[Cl-]"), FingerprintConfig::new().with_radius(u32::MAX));
    assert_eq!(ions.count_ones(), 2);
}
