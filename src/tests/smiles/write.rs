use crate::disp::smiles::write_ring_digit;
use crate::parse::smiles::SmilesErrorKind;
use crate::prelude::*;
use crate::smiles;

fn canon(mol: &Molecule) -> String {
    generate_smiles(mol, SmilesConfig::new())
}

#[test]
fn canonical() {
    assert_eq!(canon(&smiles!("OCC")), "CCO");
    assert_eq!(canon(&smiles!("O.C")), "C.O");
    assert_eq!(canon(&smiles!("OC(C)C")), "CC(C)O");
    assert_eq!(canon(&smiles!("C1=CC=CC=C1")), "c1ccccc1");
    assert_eq!(canon(&smiles!("c1ccccc1O")), "Oc1ccccc1");
    assert_eq!(canon(&smiles!("C(C)(C)(C)C")), "CC(C)(C)C");
    assert_eq!(canon(&smiles!("C/C=C/C")), "C/C=C/C");
    assert_eq!(canon(&smiles!("[H]OC")), "CO");
}

#[test]
fn bracket_atoms() {
    assert_eq!(canon(&smiles!("[NH4+]")), "[NH4+]");
    assert_eq!(canon(&smiles!("[13CH4]")), "[13CH4]");
    assert_eq!(canon(&smiles!("[Fe+3]")), "[Fe+3]");
    assert_eq!(canon(&smiles!("[O--]")), "[O-2]");
    assert_eq!(canon(&smiles!("[2H]")), "[2H]");
    // a bracket atom with its default hydrogens doesn't need brackets
    assert_eq!(canon(&smiles!("[CH4]")), "C");
    // but one with fewer does
    assert_eq!(canon(&smiles!("[CH3]")), "[CH3]");
    assert_eq!(canon(&smiles!("*")), "*");

    let no_isotopes = SmilesConfig::new().with_isotopes(false);
    assert_eq!(generate_smiles(&smiles!("[13CH4]"), no_isotopes), "C");
    assert_eq!(generate_smiles(&smiles!("[2H][2H]"), no_isotopes), "[H][H]");
}

#[test]
fn fast_roundtrip() {
    let cfg = SmilesConfig::fast_roundtrip();
    assert_eq!(generate_smiles(&smiles!("OCC"), cfg), "OCC");
    assert_eq!(generate_smiles(&smiles!("C1CCCCC1C1CCCCC1"), cfg), "C1CCCCC1C1CCCCC1");
    assert_eq!(generate_smiles(&smiles!("c1ccccc1-c1ccccc1"), cfg), "c1ccccc1-c1ccccc1");
    assert_eq!(generate_smiles(&smiles!("CC(=O)[O-]"), cfg), "CC(=O)[O-]");
    assert_eq!(generate_smiles(&smiles!("[Na+].[Cl-]"), cfg), "[Na+].[Cl-]");
}

#[test]
fn empty() {
    assert_eq!(canon(&smiles!("")), "");
    assert_eq!(generate_smiles(&smiles!(""), SmilesConfig::fast_roundtrip()), "");
}

#[test]
fn rings_reparse() {
    for input in [
        "C12C3C4C1C5C2C3C45",
        "c1ccc2ccccc2c1",
        "C1CC2CCC1C2",
        "C1CCC2(CC1)CCCC2",
        "c1ccc2c(c1)[nH]c1ccccc12",
    ] {
        let mol = SmilesParser::new(input)
            .parse()
            .unwrap_or_else(|err| panic!("failed to parse {input}: {err}"));
        let written = canon(&mol);
        let reparsed = SmilesParser::new(&written)
            .parse()
            .unwrap_or_else(|err| panic!("failed to reparse {written} from {input}: {err}"));
        assert_eq!(reparsed.atom_count(), mol.atom_count(), "{input} -> {written}");
        assert_eq!(reparsed.bond_count(), mol.bond_count(), "{input} -> {written}");
        assert_eq!(canon(&reparsed), written, "{input}");
    }
}

#[test]
fn ring_digits() {
    let mut out = String::new();
    for digit in [7, 42, 123] {
        write_ring_digit(&mut out, digit);
    }
    assert_eq!(out, "7%42%(123)");
    for input in ["C%(123)CC%(123)", "C%(1)CC%(1)", "C%01CC%01"] {
        let mol = SmilesParser::new(input)
            .parse()
            .unwrap_or_else(|err| panic!("failed to parse {input}: {err}"));
        assert_eq!(canon(&mol), "C1CC1", "{input}");
    }
    for input in ["C%(12CC%(12)", "C%()CC", "C%1CC%1"] {
        let err = SmilesParser::new(input).parse().expect_err(input);
        assert_eq!(err.kind, SmilesErrorKind::ExpectedRingNumber, "{input}");
    }
}
