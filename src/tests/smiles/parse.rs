use crate::parse::smiles::SmilesErrorKind;
use crate::prelude::*;
use crate::smiles;
use petgraph::prelude::*;

fn err_kind(input: &str) -> SmilesErrorKind {
    SmilesParser::new(input)
        .parse()
        .expect_err("parsing should fail")
        .kind
}

#[test]
fn simple() {
    // methane
    smiles!("C");
    // methylene
    smiles!("[CH2]");
    // acetylene
    smiles!("C#C");
    // benzene
    smiles!("c1ccccc1");
    // carbon monoxoide
    smiles!("[C-]#[O+]");
}

#[test]
fn implicit_hydrogens() {
    let ethanol = smiles!("CCO");
    let hs = ethanol.atoms().map(|a| a.1.hydrogens()).collect::<Vec<_>>();
    assert_eq!(hs, [3, 2, 1]);

    let formaldehyde = smiles!("C=O");
    assert_eq!(formaldehyde[NodeIndex::new(0)].hydrogens(), 2);
    assert_eq!(formaldehyde[NodeIndex::new(1)].hydrogens(), 0);

    let pyridine = smiles!("c1ccncc1");
    assert_eq!(pyridine[NodeIndex::new(0)].hydrogens(), 1);
    assert_eq!(pyridine[NodeIndex::new(3)].hydrogens(), 0);

    // sulfur goes up to its next valence
    let dmso = smiles!("CS(=O)C");
    assert_eq!(dmso[NodeIndex::new(1)].hydrogens(), 0);
    let thiol = smiles!("CS");
    assert_eq!(thiol[NodeIndex::new(1)].hydrogens(), 1);
}

#[test]
fn bracket_atoms() {
    let methane = smiles!("[13CH4]");
    let c = methane[NodeIndex::new(0)];
    assert_eq!((c.protons, c.isotope, c.hydrogens()), (6, 13, 4));

    let ammonium = smiles!("[NH4+]");
    let n = ammonium[NodeIndex::new(0)];
    assert_eq!((n.charge, n.hydrogens()), (1, 4));

    let oxide = smiles!("[O--]");
    assert_eq!(oxide[NodeIndex::new(0)].charge, -2);
    let iron = smiles!("[Fe+3]");
    assert_eq!(iron[NodeIndex::new(0)].charge, 3);
    assert_eq!(iron[NodeIndex::new(0)].protons, 26);

    let deuterium = smiles!("[2H]");
    assert_eq!(deuterium[NodeIndex::new(0)].protons, 1);
    assert_eq!(deuterium[NodeIndex::new(0)].isotope, 2);

    // brackets don't get implicit hydrogens
    let carbon = smiles!("[C]");
    assert_eq!(carbon[NodeIndex::new(0)].hydrogens(), 0);

    // atom classes are accepted and dropped
    let classed = smiles!("[CH3:1]C");
    assert_eq!(classed.atom_count(), 2);

    let pyrrole = smiles!("c1cc[nH]c1");
    assert_eq!(pyrrole[NodeIndex::new(3)].hydrogens(), 1);
    assert!(pyrrole[NodeIndex::new(3)].is_aromatic());

    let selenophene = smiles!("c1cc[se]c1");
    assert_eq!(selenophene[NodeIndex::new(3)].protons, 34);
}

#[test]
fn bonds() {
    let benzene = smiles!("c1ccccc1");
    assert!(benzene.graph().edge_weights().all(|&b| b == Bond::Aromatic));

    let biphenyl = smiles!("c1ccccc1-c1ccccc1");
    let link = biphenyl.bond_between(NodeIndex::new(5), NodeIndex::new(6));
    assert_eq!(link.map(|b| b.1), Some(Bond::Single));

    // an implicit bond between aromatic atoms outside of a ring is still single
    let biphenyl = smiles!("c1ccccc1c1ccccc1");
    let link = biphenyl.bond_between(NodeIndex::new(5), NodeIndex::new(6));
    assert_eq!(link.map(|b| b.1), Some(Bond::Single));

    let ethyne = smiles!("C#C");
    assert_eq!(ethyne[EdgeIndex::new(0)], Bond::Triple);
    let quad = smiles!("[C]$[C]");
    assert_eq!(quad[EdgeIndex::new(0)], Bond::Quad);
}

#[test]
fn rings_and_branches() {
    let cyclohexane = smiles!("C1CCCCC1");
    assert_eq!((cyclohexane.atom_count(), cyclohexane.bond_count()), (6, 6));

    let percent = smiles!("C%10CC%10");
    assert_eq!((percent.atom_count(), percent.bond_count()), (3, 3));

    // closure numbers can be reused once they're closed
    let bicyclohexyl = smiles!("C1CCCCC1C1CCCCC1");
    assert_eq!(bicyclohexyl.rings().num_rings(), 2);

    let isobutane = smiles!("CC(C)C");
    assert_eq!(isobutane.degree(NodeIndex::new(1)), 3);

    let neopentane = smiles!("CC(C)(C)C");
    assert_eq!(neopentane.degree(NodeIndex::new(1)), 4);

    let bond_first = smiles!("C=1CCCCC1");
    assert_eq!(bond_first.bond_between(NodeIndex::new(0), NodeIndex::new(5)).map(|b| b.1), Some(Bond::Double));
}

#[test]
fn fragments_and_whitespace() {
    let salt = smiles!("[Na+].[Cl-]");
    assert_eq!((salt.atom_count(), salt.bond_count()), (2, 0));

    assert!(smiles!("").is_empty());
    assert!(smiles!("   ").is_empty());
    assert_eq!(smiles!("  CCO ethanol").atom_count(), 3);
}

#[test]
fn errors() {
    assert_eq!(err_kind("c1ccccc"), SmilesErrorKind::UnclosedLoop(1));
    assert_eq!(err_kind("C(C"), SmilesErrorKind::ExpectedClosingParen);
    assert_eq!(err_kind("CC)"), SmilesErrorKind::UnmatchedParen);
    assert_eq!(err_kind("[C"), SmilesErrorKind::ExpectedClosingBracket);
    assert_eq!(err_kind("C11"), SmilesErrorKind::SelfBond);
    assert_eq!(err_kind("C12CC12"), SmilesErrorKind::DuplicateBond);
    assert_eq!(err_kind("C%1"), SmilesErrorKind::ExpectedRingNumber);
    assert_eq!(err_kind("CC="), SmilesErrorKind::ExpectedAtom(None));
    assert_eq!(err_kind("C?"), SmilesErrorKind::ExpectedAtom(Some(b'?')));
    assert_eq!(err_kind("[C+300]"), SmilesErrorKind::InvalidCharge);
    assert_eq!(
        err_kind("C=1CC-1"),
        SmilesErrorKind::LoopBondMismatch(Bond::Single, Bond::Double)
    );
    assert!(matches!(
        err_kind("[Xx]"),
        SmilesErrorKind::UnknownElement(_)
    ));
    assert!(matches!(
        err_kind("[CH16]"),
        SmilesErrorKind::TooManyHydrogens(_)
    ));
    assert!(matches!(
        err_kind("C(C)(C)(C)(C)C"),
        SmilesErrorKind::Structure(StructureError::Valence { .. })
    ));
    assert!(matches!(
        err_kind("cC"),
        SmilesErrorKind::Structure(StructureError::AromaticOutsideRing(0))
    ));
}

#[test]
fn error_details() {
    let err = SmilesParser::new("CC)").parse().expect_err("unmatched paren");
    assert_eq!(err.index, 2);
    assert_eq!(err.category(), ErrorCategory::Syntax);
    assert!(err.to_string().contains("byte 2"));

    let err = SmilesParser::new("c1ccccc").parse().expect_err("unclosed ring");
    assert_eq!(err.index, 1);
    assert_eq!(err.category(), ErrorCategory::Semantic);

    let err = SmilesParser::new("[Xx]").parse().expect_err("unknown element");
    assert!(err.to_string().contains("Xx"));

    let err = SmilesParser::new("C(C)(C)(C)(C)C").parse().expect_err("pentavalent carbon");
    assert_eq!(err.category(), ErrorCategory::Semantic);

    let err = SmilesParser::new("[CH16]").parse().expect_err("too many hydrogens");
    assert!(matches!(err.kind, SmilesErrorKind::TooManyHydrogens(_)));
    assert_eq!(err.category(), ErrorCategory::Semantic);
}

#[test]
fn glucose() {
    let canon = smiles!("C(C1C(C(C(C(O1)OC2(C(C(C(O2)CO)O)O)CO)O)O)O)O");
    let isomer =
        smiles!("C([C@@H]1[C@@H](C([C@](O1)(CO)O[C@@H]2C([C@H]([C@@H](C(O2)CO)O)O)O)O)O)O");
    assert_eq!(canon.atom_count(), isomer.atom_count());
    assert_eq!(canon.bond_count(), isomer.bond_count());
    let chirals = isomer
        .atoms()
        .filter_map(|(id, atom)| atom.data.chirality().is_chiral().then_some(id.index()))
        .collect::<Vec<_>>();
    assert_eq!(chirals, &[1, 2, 4, 9, 11, 12]);
}
