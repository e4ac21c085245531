use crate::prelude::*;
use crate::smiles;

fn all_aromatic(mol: &Molecule) -> bool {
    mol.atoms().all(|(_, a)| a.is_aromatic())
        && mol.graph().edge_weights().all(|&b| b == Bond::Aromatic)
}
fn none_aromatic(mol: &Molecule) -> bool {
    mol.atoms().all(|(_, a)| !a.is_aromatic())
        && mol.graph().edge_weights().all(|&b| b != Bond::Aromatic)
}

#[test]
fn kekule_rings() {
    // benzene
    assert!(all_aromatic(&smiles!("C1=CC=CC=C1")));
    // pyridine
    assert!(all_aromatic(&smiles!("C1=CC=NC=C1")));
    // pyrrole
    assert!(all_aromatic(&smiles!("C1=CC=CN1")));
    // furan
    assert!(all_aromatic(&smiles!("C1=CC=CO1")));
    // thiophene
    assert!(all_aromatic(&smiles!("C1=CC=CS1")));
    // naphthalene
    assert!(all_aromatic(&smiles!("C1=CC=C2C=CC=CC2=C1")));
    // cyclopentadienyl anion and tropylium
    assert!(all_aromatic(&smiles!("[CH-]1C=CC=C1")));
    assert!(all_aromatic(&smiles!("[CH+]1C=CC=CC=C1")));
}

#[test]
fn exocyclic_double_bonds() {
    // 2-pyridone: the carbonyl carbon gives no electrons, the NH gives two
    let pyridone = smiles!("O=C1C=CC=CN1");
    assert!(!pyridone.atoms().next().is_some_and(|(_, a)| a.is_aromatic()));
    assert!(pyridone.atoms().skip(1).all(|(_, a)| a.is_aromatic()));
    // benzoquinone only has four
    assert!(none_aromatic(&smiles!("O=C1C=CC(=O)C=C1")));
}

#[test]
fn fused_envelope() {
    // azulene fails ring by ring, but its ten-atom perimeter is aromatic
    let azulene = smiles!("C1=CC2=CC=CC=CC2=C1");
    assert!(all_aromatic(&azulene));
}

#[test]
fn not_aromatic() {
    // cyclohexene
    assert!(none_aromatic(&smiles!("C1=CCCCC1")));
    // cyclooctatetraene
    assert!(none_aromatic(&smiles!("C1=CC=CC=CC=C1")));
    // cyclopentadiene
    assert!(none_aromatic(&smiles!("C1=CC=CC1")));
    // cyclohexane
    assert!(none_aromatic(&smiles!("C1CCCCC1")));
}

#[test]
fn written_aromatic() {
    let benzene = smiles!("c1ccccc1");
    assert!(all_aromatic(&benzene));
    assert!(benzene.atoms().all(|(_, a)| a.hydrogens() == 1));
    let pyrrole = smiles!("c1cc[nH]c1");
    assert!(all_aromatic(&pyrrole));
}

#[test]
fn kekule_and_aromatic_agree() {
    let pairs = [
        ("C1=CC=CC=C1", "c1ccccc1"),
        ("C1=CC=CN1", "c1cc[nH]c1"),
        ("C1=CC=C2C=CC=CC2=C1", "c1ccc2ccccc2c1"),
        ("CC1=CC=CC=C1O", "Cc1ccccc1O"),
    ];
    for (kekule, aromatic) in pairs {
        let a = generate_smiles(
            &SmilesParser::new(kekule).parse().expect("valid SMILES"),
            SmilesConfig::new(),
        );
        let b = generate_smiles(
            &SmilesParser::new(aromatic).parse().expect("valid SMILES"),
            SmilesConfig::new(),
        );
        assert_eq!(a, b, "{kekule} vs {aromatic}");
    }
}

#[test]
fn unkekulizable() {
    use crate::parse::smiles::SmilesErrorKind;

    for input in ["c1cccc1", "n1cccc1", "c1ccccC1", "c1ccccc1=O"] {
        let err = SmilesParser::new(input).parse().expect_err(input);
        assert!(
            matches!(err.kind, SmilesErrorKind::Structure(StructureError::Unkekulizable(_))),
            "{input}: {err}"
        );
        assert_eq!(err.category(), ErrorCategory::Semantic, "{input}");
    }
    // four electrons
    let err = SmilesParser::new("c1ccc1").parse().expect_err("cyclobutadiene");
    assert_eq!(
        err.kind,
        SmilesErrorKind::Structure(StructureError::NotAromatic(0))
    );

    for input in [
        "[n-]1cccc1",
        "[cH-]1cccc1",
        "o1cccc1",
        "c1cc[se]c1",
        "O=c1cccc[nH]1",
        "[cH+]1cccccc1",
        "c1ccc2c(c1)[nH]c1ccccc12",
        "c1ccccc1-c1ccccc1",
    ] {
        let mol = SmilesParser::new(input)
            .parse()
            .unwrap_or_else(|err| panic!("{input}: {err}"));
        assert!(mol.atoms().any(|(_, a)| a.is_aromatic()), "{input}");
    }
}
