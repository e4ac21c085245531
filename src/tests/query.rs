use crate::parse::smarts::SmartsErrorKind;
use crate::prelude::*;
use crate::smiles;
use petgraph::prelude::*;

fn smarts(input: &str) -> QueryMolecule {
    SmartsParser::new(input)
        .parse()
        .unwrap_or_else(|err| panic!("failed to parse {input}: {err}"))
}

fn err_kind(input: &str) -> SmartsErrorKind {
    SmartsParser::new(input)
        .parse()
        .expect_err("parsing should fail")
        .kind
}

/// The query's only atom.
fn atom(input: &str) -> AtomQuery {
    let query = smarts(input);
    assert_eq!(query.atom_count(), 1, "{input}");
    query.graph[NodeIndex::new(0)].clone()
}

#[test]
fn organic_atoms() {
    assert_eq!(
        atom("C"),
        AtomQuery::Element {
            protons: 6,
            aromatic: Some(false)
        }
    );
    assert_eq!(
        atom("n"),
        AtomQuery::Element {
            protons: 7,
            aromatic: Some(true)
        }
    );
    assert_eq!(atom("*"), AtomQuery::True);
    assert_eq!(atom("a"), AtomQuery::Aromatic);
    assert_eq!(atom("A"), AtomQuery::Aliphatic);
}

#[test]
fn bracket_expressions() {
    assert_eq!(
        atom("[CH3]"),
        AtomQuery::And(vec![
            AtomQuery::Element {
                protons: 6,
                aromatic: Some(false)
            },
            AtomQuery::TotalH(3),
        ])
    );
    assert_eq!(
        atom("[2H]"),
        AtomQuery::And(vec![
            AtomQuery::Isotope(2),
            AtomQuery::Element {
                protons: 1,
                aromatic: None
            },
        ])
    );
    assert_eq!(atom("[#6]"), AtomQuery::AtomicNum(6));
    assert_eq!(
        atom("[!#1]"),
        AtomQuery::Not(Box::new(AtomQuery::AtomicNum(1)))
    );
    assert_eq!(atom("[R]"), AtomQuery::InRing);
    assert_eq!(atom("[R2]"), AtomQuery::RingCount(2));
    assert_eq!(atom("[r6]"), AtomQuery::RingSize(6));
    assert_eq!(
        atom("[x]"),
        AtomQuery::Not(Box::new(AtomQuery::RingBonds(0)))
    );
    assert_eq!(atom("[D3]"), AtomQuery::Degree(3));
    assert_eq!(atom("[X4]"), AtomQuery::Connectivity(4));
    assert_eq!(atom("[+]"), AtomQuery::Charge(1));
    assert_eq!(atom("[--]"), AtomQuery::Charge(-2));
    assert_eq!(atom("[-3]"), AtomQuery::Charge(-3));
    // atom classes don't constrain anything
    assert!(atom("[C:7]").matches(&smiles!("C"), NodeIndex::new(0)));
    // two-letter elements come before single-letter primitives
    assert_eq!(
        atom("[Cl]"),
        AtomQuery::Element {
            protons: 17,
            aromatic: None
        }
    );
    assert_eq!(
        atom("[as]"),
        AtomQuery::Element {
            protons: 33,
            aromatic: Some(true)
        }
    );
}

#[test]
fn precedence() {
    // `!` over `&` over `,` over `;`
    assert_eq!(atom("[C,N;H1]").to_string(), "C,N&H1");
    assert_eq!(
        atom("[C,N;H1]"),
        AtomQuery::And(vec![
            AtomQuery::Or(vec![
                AtomQuery::Element {
                    protons: 6,
                    aromatic: Some(false)
                },
                AtomQuery::Element {
                    protons: 7,
                    aromatic: Some(false)
                },
            ]),
            AtomQuery::TotalH(1),
        ])
    );
    assert_eq!(
        atom("[C&H1,N]"),
        AtomQuery::Or(vec![
            AtomQuery::And(vec![
                AtomQuery::Element {
                    protons: 6,
                    aromatic: Some(false)
                },
                AtomQuery::TotalH(1),
            ]),
            AtomQuery::Element {
                protons: 7,
                aromatic: Some(false)
            },
        ])
    );
    assert_eq!(
        atom("[!CR]"),
        AtomQuery::And(vec![
            AtomQuery::Not(Box::new(AtomQuery::Element {
                protons: 6,
                aromatic: Some(false)
            })),
            AtomQuery::InRing,
        ])
    );
}

#[test]
fn bonds() {
    let query = smarts("C=C");
    assert_eq!(query.graph[EdgeIndex::new(0)], BondQuery::Double);
    let query = smarts("CC");
    assert_eq!(query.graph[EdgeIndex::new(0)], BondQuery::SingleOrAromatic);
    let query = smarts("C~C");
    assert_eq!(query.graph[EdgeIndex::new(0)], BondQuery::True);
    let query = smarts("C-,=C");
    assert_eq!(
        query.graph[EdgeIndex::new(0)],
        BondQuery::Or(vec![BondQuery::Single, BondQuery::Double])
    );
    let query = smarts("C!@C");
    assert_eq!(
        query.graph[EdgeIndex::new(0)],
        BondQuery::Not(Box::new(BondQuery::Ring))
    );
    let query = smarts("C-@C");
    assert_eq!(
        query.graph[EdgeIndex::new(0)],
        BondQuery::And(vec![BondQuery::Single, BondQuery::Ring])
    );
    let query = smarts("C1CC=1");
    assert_eq!(query.bond_count(), 3);
    assert_eq!(query.graph[EdgeIndex::new(2)], BondQuery::Double);
    let query = smarts("C(C)(C).O");
    assert_eq!((query.atom_count(), query.bond_count()), (4, 2));
}

#[test]
fn empty() {
    assert!(smarts("").is_empty());
    assert!(smarts("  ").is_empty());
}

#[test]
fn errors() {
    assert_eq!(err_kind("[C"), SmartsErrorKind::ExpectedClosingBracket);
    assert_eq!(err_kind("C1CC"), SmartsErrorKind::UnclosedLoop(1));
    assert_eq!(err_kind("C(C"), SmartsErrorKind::ExpectedClosingParen);
    assert_eq!(err_kind("CC)"), SmartsErrorKind::UnmatchedParen);
    assert_eq!(err_kind("C11"), SmartsErrorKind::SelfBond);
    assert_eq!(err_kind("C-1CC=1"), SmartsErrorKind::LoopBondMismatch);
    assert_eq!(err_kind("C="), SmartsErrorKind::ExpectedAtom(None));
    assert_eq!(err_kind("[]"), SmartsErrorKind::ExpectedPrimitive(Some(b']')));
    assert_eq!(err_kind("[#]"), SmartsErrorKind::ExpectedPrimitive(Some(b']')));
    assert!(matches!(err_kind("[Zz]"), SmartsErrorKind::UnknownElement(_)));

    for input in ["[v3]", "[C^2]", "[h1]"] {
        let err = SmartsParser::new(input).parse().expect_err(input);
        assert_eq!(err.category(), ErrorCategory::Unsupported, "{input}");
    }
    let err = SmartsParser::new("[C^2]").parse().expect_err("hybridization");
    assert_eq!(err.index, 2);
    assert!(err.to_string().contains('^'));

    assert_eq!(err_kind("[$(C]"), SmartsErrorKind::ExpectedClosingParen);
    assert_eq!(err_kind("[$()]"), SmartsErrorKind::ExpectedAtom(Some(b')')));
    assert_eq!(err_kind("[$C]"), SmartsErrorKind::ExpectedPrimitive(Some(b'$')));
    let err = SmartsParser::new("[$(C1C)]").parse().expect_err("unclosed ring");
    assert_eq!(err.kind, SmartsErrorKind::UnclosedLoop(1));
    assert!(err.index >= 3, "{}", err.index);
}

#[test]
fn recursive() {
    let AtomQuery::Recursive(inner) = atom("[$(CO)]") else {
        panic!("expected a recursive query");
    };
    assert_eq!(inner.atom_count(), 2);
    assert_eq!(inner.bond_count(), 1);

    let nested = atom("[$(C[$(O=C)])]");
    assert_eq!(nested.to_string(), "$([C][$([O]=[C])])");

    let query = smarts("[$(CO);!$(C=O)]N");
    assert_eq!(query.atom_count(), 2);
    assert_eq!(query.to_string(), "[$([C][O])&!$([C]=[O])][N]");
    assert_eq!(smarts(&query.to_string()), query);
}

#[test]
fn chirality_is_accepted() {
    assert_eq!(atom("[@]"), AtomQuery::True);
    let query = smarts("C[C@H](O)N");
    assert_eq!(query.atom_count(), 4);
    assert_eq!(smarts("C[C@@?H](O)N").atom_count(), 4);
}

#[test]
fn atom_predicates() {
    let mol = smiles!("c1ccccc1C(=O)[O-]");
    let ring_c = NodeIndex::new(0);
    let carboxyl = NodeIndex::new(6);
    let oxide = NodeIndex::new(8);

    assert!(atom("c").matches(&mol, ring_c));
    assert!(!atom("C").matches(&mol, ring_c));
    assert!(atom("[#6]").matches(&mol, ring_c));
    assert!(atom("[#6]").matches(&mol, carboxyl));
    assert!(atom("a").matches(&mol, ring_c));
    assert!(atom("A").matches(&mol, carboxyl));
    assert!(atom("[R]").matches(&mol, ring_c));
    assert!(!atom("[R]").matches(&mol, carboxyl));
    assert!(atom("[R1]").matches(&mol, ring_c));
    assert!(atom("[r6]").matches(&mol, ring_c));
    assert!(!atom("[r5]").matches(&mol, ring_c));
    assert!(atom("[x2]").matches(&mol, ring_c));
    assert!(atom("[x0]").matches(&mol, carboxyl));
    assert!(atom("[cH1]").matches(&mol, ring_c));
    assert!(atom("[D3]").matches(&mol, carboxyl));
    assert!(atom("[X3]").matches(&mol, ring_c));
    assert!(atom("[O-]").matches(&mol, oxide));
    assert!(!atom("[O;+0]").matches(&mol, oxide));
    assert!(atom("[!N]").matches(&mol, oxide));
    assert!(atom("[N,O]").matches(&mol, oxide));

    let labelled = smiles!("[13CH4]");
    assert!(atom("[13C]").matches(&labelled, NodeIndex::new(0)));
    assert!(!atom("[12C]").matches(&labelled, NodeIndex::new(0)));
    assert!(atom("[0C]").matches(&smiles!("C"), NodeIndex::new(0)));
}

#[test]
fn bond_predicates() {
    let mol = smiles!("c1ccccc1C=C");
    let aromatic = mol
        .bond_between(NodeIndex::new(0), NodeIndex::new(1))
        .map(|b| b.0)
        .expect("ring bond");
    let chain = mol
        .bond_between(NodeIndex::new(5), NodeIndex::new(6))
        .map(|b| b.0)
        .expect("chain bond");
    let double = mol
        .bond_between(NodeIndex::new(6), NodeIndex::new(7))
        .map(|b| b.0)
        .expect("double bond");

    assert!(BondQuery::Aromatic.matches(&mol, aromatic));
    assert!(BondQuery::Ring.matches(&mol, aromatic));
    assert!(!BondQuery::Ring.matches(&mol, chain));
    assert!(BondQuery::Single.matches(&mol, chain));
    assert!(BondQuery::SingleOrAromatic.matches(&mol, chain));
    assert!(BondQuery::SingleOrAromatic.matches(&mol, aromatic));
    assert!(!BondQuery::SingleOrAromatic.matches(&mol, double));
    assert!(BondQuery::Double.matches(&mol, double));
    assert!(BondQuery::True.matches(&mol, double));
    assert!(BondQuery::Not(Box::new(BondQuery::Ring)).matches(&mol, double));
}

#[test]
fn from_molecule() {
    let acetate = smiles!("CC(=O)[O-]");
    let query = QueryMolecule::from(&acetate);
    assert_eq!(query.atom_count(), 4);
    assert_eq!(query.bond_count(), 3);
    assert_eq!(query.graph[EdgeIndex::new(1)], BondQuery::Double);
    assert_eq!(query.graph[NodeIndex::new(3)].to_string(), "O&-1");
    assert!(query.graph[NodeIndex::new(3)].matches(&acetate, NodeIndex::new(3)));
    assert!(!query.graph[NodeIndex::new(2)].matches(&acetate, NodeIndex::new(3)));
}
