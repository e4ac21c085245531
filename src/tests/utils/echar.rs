use crate::utils::echar::*;

#[test]
fn echar() {
    let e = EChar::<4>::from_slice(b"Xx");
    assert_eq!(e.as_slice(), b"Xx");
    assert_eq!(e.to_string(), "\"Xx\"");
    let long = EChar::<4>::from_slice(b"abcdefg");
    assert_eq!(long.as_slice(), b"abcd");
    assert_eq!(EChar::<4>::byte(b'q').as_slice(), b"q");
}

#[test]
fn text_byte() {
    assert_eq!(TextByte(b'a').to_string(), "'a'");
    assert_eq!(TextByte(b'\n').to_string(), "'\\n'");
    assert_eq!(TextByte(0x7f).to_string(), "'\\x7f'");
}

#[test]
fn maybe_byte() {
    assert_eq!(MaybeByte(Some(b'(')).to_string(), "'('");
    assert_eq!(MaybeByte(None).to_string(), "EOF");
}

#[test]
fn idx_print() {
    assert_eq!(IdxPrint(4).to_string(), "byte 4");
    assert_eq!(IdxPrint(usize::MAX).to_string(), "unknown index");
}
