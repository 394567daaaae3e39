/// Key tag of a DNSKEY (RFC 4034 Appendix B).
///
/// Algorithm 1 keys use the top 16 of the low 24 bits of the modulus instead of the checksum.
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    if algorithm == 1 {
        return match public_key {
            [.., hi, lo, _] => u16::from_be_bytes([*hi, *lo]),
            _ => 0,
        };
    }

    let [f0, f1] = flags.to_be_bytes();
    let header = [f0, f1, protocol, algorithm];

    // the header is 4 bytes, so key byte parity lines up with rdata parity
    let mut acc: u32 = header
        .iter()
        .chain(public_key)
        .enumerate()
        .map(|(i, &b)| if i % 2 == 0 { (b as u32) << 8 } else { b as u32 })
        .sum();

    acc += (acc >> 16) & 0xFFFF;
    (acc & 0xFFFF) as u16
}
