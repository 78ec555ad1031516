//! The Williams CRC engine.
//!
//! Computes CRCs under an arbitrary `(width, poly, init, xorout, refin,
//! refout, augment)` parameter tuple: the family of algorithms described
//! by Ross Williams' "A Painless Guide to CRC Error Detection Algorithms".
//! This is the one place in the crate that actually runs the bit-serial
//! polynomial division; [`crate::model::Model`] and [`crate::reveng`] both
//! drive it rather than reimplementing it.

use bitflags::bitflags;

use crate::poly::Poly;

bitflags! {
    /// Flags shared by the CRC engine, [`crate::model::Model`], and the
    /// reverse engine. Mirrors the source tool's single flags word; kept
    /// as one type across modules rather than split per-consumer, since
    /// models, searches, and raw CRC calls all read and write the same
    /// bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Reflect each input character before it's consumed.
        const REFIN  = 1 << 0;
        /// Reflect the whole register before XorOut is applied.
        const REFOUT = 1 << 1;
        /// Samples are right-justified in their storage (vs. left).
        const RTJUST = 1 << 2;
        /// Render hex output in uppercase.
        const UPPER  = 1 << 3;
        /// Separate output hex characters with spaces.
        const SPACE  = 1 << 4;
        /// Input files store the low byte of each word first.
        const LTLBYT = 1 << 5;
        /// Treat CLI operands as filenames rather than literal data.
        const DIRECT = 1 << 6;
        /// Augmenting (classical) algorithm: append `width` zero bits
        /// before dividing, matching the bit-width of the generator.
        const MULXN  = 1 << 7;
        /// Exhaustive search: report only the first solution found.
        const EXHST  = 1 << 8;
    }
}

/// Compute the CRC of `message` under the given Williams parameters.
///
/// `poly`, `init`, and `xorout` must all share the same length, the
/// algorithm's `width`. `REFIN`/`REFOUT` reflection of the message and
/// result is the caller's responsibility: this engine always consumes
/// its input MSB-first and only ever reflects the parameters and
/// result, never the loop direction.
pub fn crc(message: &Poly, poly: &Poly, init: &Poly, xorout: &Poly, flags: Flags) -> Poly {
    crc_general(message, poly, init, xorout, flags, false).0
}

/// As [`crc`], but also returns the quotient: the stream of feedback
/// bits produced while consuming the bits of `message` beyond the first
/// `width`. Used by the reverse engine's "short mode" factor search to
/// recover a cofactor once a divisor of the samples' GCD is found.
pub fn crc_with_quotient(message: &Poly, poly: &Poly, init: &Poly, xorout: &Poly, flags: Flags) -> (Poly, Poly) {
    crc_general(message, poly, init, xorout, flags, true)
}

/// Run the CRC engine with the full Williams reflection semantics
/// applied around it: reflect `message` per-character on the way in if
/// `REFIN`, and reflect the register before `xorout` is applied on the
/// way out if `REFOUT`. `crc`/`crc_with_quotient` stay reflection-
/// agnostic; this is the convenience wrapper every higher-level caller
/// (models, the reverse engine) uses instead of juggling reflection by
/// hand.
pub fn pcrc_williams(message: &Poly, poly: &Poly, init: &Poly, xorout: &Poly, flags: Flags) -> Poly {
    let width = poly.len();
    let msg = if flags.contains(Flags::REFIN) { message.prevch(8) } else { message.clone() };
    let engine_xorout = if flags.contains(Flags::REFOUT) { xorout.prev() } else { xorout.clone() };
    let engine_flags = flags & Flags::MULXN;
    let register = crc(&msg, poly, init, &engine_xorout, engine_flags);
    let register = if flags.contains(Flags::REFOUT) { register.prev() } else { register };
    register.pright(width)
}

fn crc_general(message: &Poly, poly: &Poly, init: &Poly, xorout: &Poly, flags: Flags, want_quotient: bool) -> (Poly, Poly) {
    let width = poly.len();

    // len(poly) == 0: no register to speak of, so the "CRC" degenerates
    // to init xor xorout at length 0.
    if width == 0 {
        return (Poly::zero(), Poly::zero());
    }

    assert_eq!(init.len(), width, "init must be width bits wide");
    assert_eq!(xorout.len(), width, "xorout must be width bits wide");

    // len(message) < width: pad right with zeros to width (edge case).
    let message = if message.len() < width {
        message.pad_tail(width)
    } else {
        message.clone()
    };

    // Align: XOR init into the first `width` bits of the message, which
    // is equivalent to prepending init and treating the register as
    // starting in that state before the first bit is consumed.
    let init_bits: Vec<bool> = (0..width).map(|i| message.coeff(i) ^ init.coeff(i)).collect();
    let mut register = Poly::from_bits(&init_bits);

    let tail_len = message.len() - width;
    let mut quotient_bits: Vec<bool> = Vec::with_capacity(if want_quotient { tail_len } else { 0 });

    for i in 0..tail_len {
        let bit_in = message.coeff(width + i);
        let (next, feedback) = register.shl1_in(bit_in);
        register = next;
        if feedback {
            register.pxor_assign(poly);
        }
        if want_quotient {
            quotient_bits.push(feedback);
        }
    }

    // Augmenting mode: shift in `width` more zero bits (the tail doesn't
    // contribute to the quotient).
    if flags.contains(Flags::MULXN) {
        for _ in 0..width {
            let (next, feedback) = register.shl1_in(false);
            register = next;
            if feedback {
                register.pxor_assign(poly);
            }
        }
    }

    register.pxor_assign(xorout);

    let quotient = if want_quotient {
        Poly::from_bits(&quotient_bits)
    } else {
        Poly::zero()
    };
    (register, quotient)
}

#[cfg(test)]
mod test {
    use super::*;

    fn poly_from_hex(hex: &str, width: usize) -> Poly {
        Poly::from_u64(u64::from_str_radix(hex, 16).unwrap(), width)
    }

    #[test]
    fn crc16_ccitt_false() {
        // CRC-16/CCITT-FALSE of "123456789"
        let msg = Poly::from_bytes(b"123456789");
        let poly = poly_from_hex("1021", 16);
        let init = poly_from_hex("ffff", 16);
        let xorout = poly_from_hex("0000", 16);
        let got = crc(&msg, &poly, &init, &xorout, Flags::empty());
        assert_eq!(got.try_to_u64(), Some(0x29b1));
    }

    #[test]
    fn crc32_iso_hdlc() {
        // CRC-32/ISO-HDLC of "123456789", refin=refout=true
        let msg = Poly::from_bytes(b"123456789").prevch(8);
        let poly = poly_from_hex("04c11db7", 32);
        let init = poly_from_hex("ffffffff", 32);
        let xorout = poly_from_hex("ffffffff", 32);
        let got = crc(&msg, &poly, &init, &xorout, Flags::REFIN | Flags::REFOUT);
        let got = got.prev();
        assert_eq!(got.try_to_u64(), Some(0xcbf43926));
    }

    #[test]
    fn crc8_smbus_abc_family() {
        // CRC-8/SMBUS: poly=0x07, init=0x00, refin=refout=false, xorout=0x00
        let poly = poly_from_hex("07", 8);
        let init = poly_from_hex("00", 8);
        let xorout = poly_from_hex("00", 8);

        let crc_of = |s: &[u8]| crc(&Poly::from_bytes(s), &poly, &init, &xorout, Flags::empty()).try_to_u64().unwrap();

        assert_eq!(crc_of(b"1"), 0xa1);
        assert_eq!(crc_of(b"12"), 0x57);
        assert_eq!(crc_of(b"123"), 0x7a);
        assert_eq!(crc_of(b"1234"), 0x9b);
        assert_eq!(crc_of(b"12345"), 0x8f);
    }

    #[test]
    fn empty_poly_returns_init_xor_xorout_at_zero_length() {
        let msg = Poly::from_bytes(b"anything");
        let got = crc(&msg, &Poly::zero(), &Poly::zero(), &Poly::zero(), Flags::empty());
        assert_eq!(got.len(), 0);
    }

    #[test]
    fn short_message_is_zero_padded() {
        let poly = poly_from_hex("1021", 16);
        let init = poly_from_hex("ffff", 16);
        let xorout = poly_from_hex("0000", 16);
        // a one-bit message, far shorter than width
        let msg = Poly::from_u64(1, 1);
        let padded = Poly::from_u64(1 << 15, 16);
        let a = crc(&msg, &poly, &init, &xorout, Flags::empty());
        let b = crc(&padded, &poly, &init, &xorout, Flags::empty());
        assert_eq!(a, b);
    }

    #[test]
    fn linearity_for_equal_length_messages() {
        // crc(a^b, poly, 0, 0) = crc(a) ^ crc(b) for equal-length messages
        let poly = poly_from_hex("07", 8);
        let zero = Poly::palloc(8);
        let a = Poly::from_bytes(b"abc");
        let b = Poly::from_bytes(b"xyz");
        let mut a_xor_b = a.clone();
        a_xor_b.pxor_assign(&b);

        let ca = crc(&a, &poly, &zero, &zero, Flags::empty());
        let cb = crc(&b, &poly, &zero, &zero, Flags::empty());
        let mut ca_xor_cb = ca.clone();
        ca_xor_cb.pxor_assign(&cb);

        let c_axorb = crc(&a_xor_b, &poly, &zero, &zero, Flags::empty());
        assert_eq!(c_axorb, ca_xor_cb);
    }

    #[test]
    fn quotient_length_matches_message_minus_width() {
        let poly = poly_from_hex("07", 8);
        let init = Poly::palloc(8);
        let xorout = Poly::palloc(8);
        let msg = Poly::from_bytes(b"abc");
        let (_, q) = crc_with_quotient(&msg, &poly, &init, &xorout, Flags::empty());
        assert_eq!(q.len(), msg.len() - 8);
    }
}
