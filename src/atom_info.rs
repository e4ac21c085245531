//! Periodic table data, indexed by atomic number.
//!
//! Index 0 is the wildcard atom `*`.

use ElemGroup::*;

/// Element group on the periodic table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemGroup {
    /// Alkali metal
    Alkali,
    /// Alkaline earth metal
    AlkEar,
    /// Transition metal
    Trans,
    /// Post-transition metal
    Poor,
    /// Metalloid
    Metoid,
    /// Nonmetal
    Nonmet,
    /// Halogen
    Halogn,
    /// Noble gas
    Noble,
    /// Rare earth
    RarEar,
}

#[derive(Debug, Clone, Copy)]
pub struct ElementInfo {
    pub name: &'static str,
    pub sym: &'static str,
    pub mass: f32,
    pub group: ElemGroup,
    /// Allowed neutral valences, lowest first. Empty for elements we don't check.
    pub valences: &'static [u8],
}
impl ElementInfo {
    pub const fn new(
        name: &'static str,
        sym: &'static str,
        mass: f32,
        group: ElemGroup,
        valences: &'static [u8],
    ) -> Self {
        Self {
            name,
            sym,
            mass,
            group,
            valences,
        }
    }
    /// The smallest allowed valence, if this element has any.
    pub fn default_valence(&self) -> Option<u8> {
        self.valences.first().copied()
    }
    /// The largest allowed valence, if this element has any.
    pub fn max_valence(&self) -> Option<u8> {
        self.valences.last().copied()
    }
}

/// Look up an element by atomic number.
pub fn element(protons: u8) -> Option<&'static ElementInfo> {
    ATOM_DATA.get(protons as usize)
}

/// Find the atomic number for a symbol, with the case it's written in the periodic table.
pub fn find_symbol(sym: &[u8]) -> Option<u8> {
    ATOM_DATA
        .iter()
        .skip(1)
        .position(|a| a.sym.as_bytes() == sym)
        .map(|i| i as u8 + 1)
}

/// Elements that may be written without brackets in SMILES.
pub fn is_organic(protons: u8) -> bool {
    matches!(protons, 5..=9 | 15..=17 | 35 | 53)
}

/// Elements that may be written as lowercase aromatic symbols.
pub fn can_be_aromatic(protons: u8) -> bool {
    matches!(protons, 5..=8 | 15 | 16 | 33 | 34 | 52)
}

/// All of the data, just index the array by the atomic number
#[rustfmt::skip]
pub static ATOM_DATA: &[ElementInfo] = &[
    ElementInfo::new("wildcard",      "*",  0.0000, Nonmet, &[]),
    ElementInfo::new("hydrogen",      "H",  1.0078, Nonmet, &[1]),
    ElementInfo::new("helium",        "He", 4.0026, Noble,  &[]),
    ElementInfo::new("lithium",       "Li", 6.9410, Alkali, &[]),
    ElementInfo::new("beryllium",     "Be", 9.0122, AlkEar, &[]),
    ElementInfo::new("boron",         "B",  10.811, Metoid, &[3]),
    ElementInfo::new("carbon",        "C",  12.011, Nonmet, &[4]),
    ElementInfo::new("nitrogen",      "N",  14.007, Nonmet, &[3, 5]),
    ElementInfo::new("oxygen",        "O",  15.999, Nonmet, &[2]),
    ElementInfo::new("fluorine",      "F",  18.998, Halogn, &[1]),
    ElementInfo::new("neon",          "Ne", 20.180, Noble,  &[]),
    ElementInfo::new("sodium",        "Na", 22.990, Alkali, &[]),
    ElementInfo::new("magnesium",     "Mg", 24.305, AlkEar, &[]),
    ElementInfo::new("aluminium",     "Al", 26.982, Poor,   &[]),
    ElementInfo::new("silicon",       "Si", 28.086, Metoid, &[4]),
    ElementInfo::new("phosphorus",    "P",  30.974, Nonmet, &[3, 5]),
    ElementInfo::new("sulfur",        "S",  32.065, Nonmet, &[2, 4, 6]),
    ElementInfo::new("chlorine",      "Cl", 35.453, Halogn, &[1]),
    ElementInfo::new("argon",         "Ar", 39.948, Noble,  &[]),
    ElementInfo::new("potassium",     "K",  39.098, Alkali, &[]),
    ElementInfo::new("calcium",       "Ca", 40.078, AlkEar, &[]),
    ElementInfo::new("scandium",      "Sc", 44.956, Trans,  &[]),
    ElementInfo::new("titanium",      "Ti", 47.867, Trans,  &[]),
    ElementInfo::new("vanadium",      "V",  50.942, Trans,  &[]),
    ElementInfo::new("chromium",      "Cr", 51.996, Trans,  &[]),
    ElementInfo::new("manganese",     "Mn", 54.938, Trans,  &[]),
    ElementInfo::new("iron",          "Fe", 55.845, Trans,  &[]),
    ElementInfo::new("cobalt",        "Co", 58.933, Trans,  &[]),
    ElementInfo::new("nickel",        "Ni", 58.693, Trans,  &[]),
    ElementInfo::new("copper",        "Cu", 63.546, Trans,  &[]),
    ElementInfo::new("zinc",          "Zn", 65.380, Trans,  &[]),
    ElementInfo::new("gallium",       "Ga", 69.723, Poor,   &[]),
    ElementInfo::new("germanium",     "Ge", 72.640, Metoid, &[]),
    ElementInfo::new("arsenic",       "As", 74.992, Metoid, &[3, 5]),
    ElementInfo::new("selenium",      "Se", 78.960, Nonmet, &[2, 4, 6]),
    ElementInfo::new("bromine",       "Br", 79.904, Halogn, &[1]),
    ElementInfo::new("krypton",       "Kr", 83.798, Noble,  &[]),
    ElementInfo::new("rubidium",      "Rb", 85.468, Alkali, &[]),
    ElementInfo::new("strontium",     "Sr", 87.620, AlkEar, &[]),
    ElementInfo::new("yttrium",       "Y",  88.906, Trans,  &[]),
    ElementInfo::new("zirconium",     "Zr", 91.224, Trans,  &[]),
    ElementInfo::new("niobium",       "Nb", 92.906, Trans,  &[]),
    ElementInfo::new("molybdenum",    "Mo", 95.950, Trans,  &[]),
    ElementInfo::new("technetium",    "Tc", 98.000, Trans,  &[]),
    ElementInfo::new("ruthenium",     "Ru", 101.07, Trans,  &[]),
    ElementInfo::new("rhodium",       "Rh", 102.91, Trans,  &[]),
    ElementInfo::new("palladium",     "Pd", 106.42, Trans,  &[]),
    ElementInfo::new("silver",        "Ag", 107.87, Trans,  &[]),
    ElementInfo::new("cadmium",       "Cd", 112.41, Trans,  &[]),
    ElementInfo::new("indium",        "In", 114.82, Poor,   &[]),
    ElementInfo::new("tin",           "Sn", 118.71, Poor,   &[]),
    ElementInfo::new("antimony",      "Sb", 121.76, Metoid, &[]),
    ElementInfo::new("tellurium",     "Te", 127.60, Metoid, &[2, 4, 6]),
    ElementInfo::new("iodine",        "I",  126.90, Halogn, &[1, 3, 5]),
    ElementInfo::new("xenon",         "Xe", 131.29, Noble,  &[]),
    ElementInfo::new("cesium",        "Cs", 132.91, Alkali, &[]),
    ElementInfo::new("barium",        "Ba", 137.33, AlkEar, &[]),
    ElementInfo::new("lanthanum",     "La", 138.91, RarEar, &[]),
    ElementInfo::new("cerium",        "Ce", 140.12, RarEar, &[]),
    ElementInfo::new("praseodymium",  "Pr", 140.91, RarEar, &[]),
    ElementInfo::new("neodymium",     "Nd", 144.24, RarEar, &[]),
    ElementInfo::new("prometheum",    "Pm", 145.00, RarEar, &[]),
    ElementInfo::new("samarium",      "Sm", 150.36, RarEar, &[]),
    ElementInfo::new("europium",      "Eu", 151.96, RarEar, &[]),
    ElementInfo::new("gadolinium",    "Gd", 157.25, RarEar, &[]),
    ElementInfo::new("terbium",       "Tb", 158.93, RarEar, &[]),
    ElementInfo::new("dysprosium",    "Dy", 162.50, RarEar, &[]),
    ElementInfo::new("holmium",       "Ho", 164.93, RarEar, &[]),
    ElementInfo::new("erbium",        "Er", 167.26, RarEar, &[]),
    ElementInfo::new("thulium",       "Tm", 168.93, RarEar, &[]),
    ElementInfo::new("ytterbium",     "Yb", 173.04, RarEar, &[]),
    ElementInfo::new("lutetium",      "Lu", 174.97, RarEar, &[]),
    ElementInfo::new("hafnium",       "Hf", 178.49, Trans,  &[]),
    ElementInfo::new("tantalum",      "Ta", 180.95, Trans,  &[]),
    ElementInfo::new("tungsten",      "W",  183.84, Trans,  &[]),
    ElementInfo::new("rhenium",       "Re", 186.21, Trans,  &[]),
    ElementInfo::new("osmium",        "Os", 190.23, Trans,  &[]),
    ElementInfo::new("iridium",       "Ir", 192.22, Trans,  &[]),
    ElementInfo::new("platinum",      "Pt", 195.08, Trans,  &[]),
    ElementInfo::new("gold",          "Au", 196.97, Trans,  &[]),
    ElementInfo::new("mercury",       "Hg", 200.59, Trans,  &[]),
    ElementInfo::new("thallium",      "Tl", 204.38, Poor,   &[]),
    ElementInfo::new("lead",          "Pb", 207.20, Poor,   &[]),
    ElementInfo::new("bismuth",       "Bi", 208.98, Poor,   &[]),
    ElementInfo::new("polonium",      "Po", 209.00, Poor,   &[]),
    ElementInfo::new("astatine",      "At", 210.00, Halogn, &[]),
    ElementInfo::new("radon",         "Rn", 222.00, Noble,  &[]),
    ElementInfo::new("francium",      "Fr", 223.00, Alkali, &[]),
    ElementInfo::new("radium",        "Ra", 226.00, AlkEar, &[]),
    ElementInfo::new("actinium",      "Ac", 227.00, RarEar, &[]),
    ElementInfo::new("thorium",       "Th", 232.04, RarEar, &[]),
    ElementInfo::new("protactinium",  "Pa", 231.04, RarEar, &[]),
    ElementInfo::new("uranium",       "U",  238.03, RarEar, &[]),
    ElementInfo::new("neptunium",     "Np", 237.05, RarEar, &[]),
    ElementInfo::new("plutonium",     "Pu", 244.00, RarEar, &[]),
    ElementInfo::new("americium",     "Am", 243.00, RarEar, &[]),
    ElementInfo::new("curium",        "Cm", 247.00, RarEar, &[]),
    ElementInfo::new("berkelium",     "Bk", 247.00, RarEar, &[]),
    ElementInfo::new("californium",   "Cf", 251.00, RarEar, &[]),
    ElementInfo::new("einsteinium",   "Es", 252.00, RarEar, &[]),
    ElementInfo::new("fermium",       "Fm", 257.00, RarEar, &[]),
    ElementInfo::new("mendelevium",   "Md", 258.00, RarEar, &[]),
    ElementInfo::new("nobelium",      "No", 259.00, RarEar, &[]),
    ElementInfo::new("lawrencium",    "Lr", 262.00, RarEar, &[]),
    ElementInfo::new("rutherfordium", "Rf", 267.00, Trans,  &[]),
    ElementInfo::new("dubnium",       "Db", 262.00, Trans,  &[]),
    ElementInfo::new("seaborgium",    "Sg", 269.00, Trans,  &[]),
    ElementInfo::new("bohrium",       "Bh", 264.00, Trans,  &[]),
    ElementInfo::new("hassium",       "Hs", 269.00, Trans,  &[]),
    ElementInfo::new("meitnerium",    "Mt", 278.00, Trans,  &[]),
    ElementInfo::new("darmstadtium",  "Ds", 281.00, Trans,  &[]),
    ElementInfo::new("roentgenium",   "Rg", 282.00, Trans,  &[]),
    ElementInfo::new("copernicium",   "Cn", 285.00, Trans,  &[]),
    ElementInfo::new("nihonium",      "Nh", 286.00, Poor,   &[]),
    ElementInfo::new("flerovium",     "Fl", 289.00, Poor,   &[]),
    ElementInfo::new("moscovium",     "Mc", 289.00, Poor,   &[]),
    ElementInfo::new("livermorium",   "Lv", 293.00, Poor,   &[]),
    ElementInfo::new("tennessine",    "Ts", 294.00, Halogn, &[]),
    ElementInfo::new("oganesson",     "Og", 294.00, Noble,  &[]),
];
