//! Randomized structural property tests, generalizing the teacher's
//! exhaustive `for a in 0..=255` style loops to widths where brute-force
//! enumeration isn't feasible.

use proptest::prelude::*;

use reveng::crc::{crc, Flags};
use reveng::model::Model;
use reveng::poly::Poly;

fn arb_poly(max_width: usize) -> impl Strategy<Value = Poly> {
    (1..=max_width, any::<u64>()).prop_map(|(width, bits)| Poly::from_u64(bits, width))
}

proptest! {
    #[test]
    fn pnorm_is_idempotent(p in arb_poly(64)) {
        let mut once = p.clone();
        once.pnorm();
        let mut twice = once.clone();
        twice.pnorm();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.len() == 0 || once.coeff(once.len() - 1));
    }

    #[test]
    fn prev_is_involution(p in arb_poly(64)) {
        prop_assert_eq!(p.prev().prev(), p);
    }

    #[test]
    fn prevch_is_involution(p in arb_poly(64), bperhx in 1usize..=16) {
        prop_assert_eq!(p.prevch(bperhx).prevch(bperhx), p);
    }

    #[test]
    fn prcp_involution_masked_to_width(width in 1usize..=48, bits in any::<u64>()) {
        // chopped poly always has an implicit top +1 term; the low bit
        // need not be set for prcp itself (only mcanon enforces that).
        let p = Poly::from_u64(bits, width);
        let twice = p.prcp().prcp();
        prop_assert_eq!(twice, p);
    }

    #[test]
    fn crc_linearity_for_equal_length_messages(
        width in 1usize..=32,
        poly_bits in any::<u64>(),
        a_bits in any::<u64>(),
        b_bits in any::<u64>(),
    ) {
        let poly = Poly::from_u64(poly_bits | 1, width); // ensure nonzero-degree generator has a term
        let zero = Poly::palloc(width);
        let a = Poly::from_u64(a_bits, width);
        let b = Poly::from_u64(b_bits, width);
        let mut a_xor_b = a.clone();
        a_xor_b.pxor_assign(&b);

        let ca = crc(&a, &poly, &zero, &zero, Flags::empty());
        let cb = crc(&b, &poly, &zero, &zero, Flags::empty());
        let mut ca_xor_cb = ca.clone();
        ca_xor_cb.pxor_assign(&cb);

        let c_axorb = crc(&a_xor_b, &poly, &zero, &zero, Flags::empty());
        prop_assert_eq!(c_axorb, ca_xor_cb);
    }

    #[test]
    fn mrev_is_involution(
        width in 1usize..=32,
        poly_bits in any::<u64>(),
        init_bits in any::<u64>(),
        xorout_bits in any::<u64>(),
        refin in any::<bool>(),
    ) {
        // mrev's domain requires no crossed endianness: refout == refin.
        let mut flags = Flags::empty();
        if refin {
            flags.insert(Flags::REFIN);
            flags.insert(Flags::REFOUT);
        }
        let mut m = Model {
            spoly: Poly::from_u64(poly_bits | 1, width),
            init: Poly::from_u64(init_bits, width),
            xorout: Poly::from_u64(xorout_bits, width),
            check: Poly::zero(),
            magic: Poly::zero(),
            flags,
            name: None,
        };
        m.mcheck();

        let back = m.mrev().mrev();
        prop_assert_eq!(&back.spoly, &m.spoly);
        prop_assert_eq!(&back.init, &m.init);
        prop_assert_eq!(&back.xorout, &m.xorout);
        prop_assert_eq!(back.flags & (Flags::REFIN | Flags::REFOUT), m.flags & (Flags::REFIN | Flags::REFOUT));
    }
}
