//! The Williams model: a bundle of CRC parameters plus derived
//! check/magic values, a flags word, and optional catalog attribution.

use core::fmt;

use crate::crc;
use crate::crc::Flags;
use crate::error::{Error, Result};
use crate::poly::Poly;

/// A complete or partially-specified Williams CRC model.
///
/// `spoly` is stored "chopped": the implicit `+1` top term is omitted,
/// so `spoly.len()` equals the algorithm's `width`. `init` and `xorout`
/// are `width` bits wide. `check` and `magic` are derived, not
/// independently meaningful inputs; see [`Model::mcheck`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    pub spoly: Poly,
    pub init: Poly,
    pub xorout: Poly,
    pub check: Poly,
    pub magic: Poly,
    pub flags: Flags,
    pub name: Option<String>,
}

impl Model {
    /// `width`, the shared length of `spoly`, `init`, and `xorout`.
    pub fn width(&self) -> usize {
        self.spoly.len()
    }

    /// A model with `REFIN != REFOUT` is "crossed-endian" and must never
    /// be passed to [`crate::reveng::reveng`].
    pub fn is_crossed_endian(&self) -> bool {
        self.flags.contains(Flags::REFIN) != self.flags.contains(Flags::REFOUT)
    }

    /// `mcanon`: canonicalise in place. The lowest bit of `spoly` must be
    /// set (the generator must have a `+1` term) or this is an error;
    /// `init`/`xorout` are masked (right-aligned truncated) to `width`.
    /// A fully-zero model loses its catalog name, since an all-zero
    /// model can't meaningfully be "the" catalog entry it might
    /// coincidentally equal.
    pub fn mcanon(&mut self) -> Result<()> {
        let width = self.width();
        if width > 0 && !self.spoly.coeff(width - 1) {
            return Err(Error::PolyMissingUnitTerm);
        }
        self.init = self.init.pright(width);
        self.xorout = self.xorout.pright(width);
        if width == 0 && !self.spoly.ptst() && !self.init.ptst() && !self.xorout.ptst() {
            self.name = None;
        }
        Ok(())
    }

    /// `mnovel`: clear the catalog attribution, marking this model as
    /// not (known to be) a cataloged algorithm.
    pub fn mnovel(&mut self) {
        self.name = None;
    }

    /// `mcheck`: recompute `check` (the CRC of ASCII `"123456789"`) and
    /// `magic` (the residue produced by re-CRCing a valid codeword) under
    /// this model's parameters.
    pub fn mcheck(&mut self) {
        let width = self.width();
        self.check = self.model_crc(&Poly::from_bytes(b"123456789"));
        let ones = Poly::ones(width);
        let mut magic = self.model_crc(&ones);
        magic.pxor_assign(&self.xorout);
        self.magic = magic;
    }

    /// Run the CRC engine with this model's reflection semantics applied.
    /// See [`crc::pcrc_williams`].
    pub fn model_crc(&self, message: &Poly) -> Poly {
        crc::pcrc_williams(message, &self.spoly, &self.init, &self.xorout, self.flags)
    }

    /// `mrev`: the "reverse algorithm" of the same family. Reciprocate
    /// the generator, swap `RefIn`/`RefOut`, and reflect `Init`/`XorOut`
    /// when the *new* `RefOut` calls for it. Clears catalog attribution
    /// (the reversed algorithm is a different, uncataloged model unless
    /// proven otherwise).
    pub fn mrev(&self) -> Model {
        let new_refin = self.flags.contains(Flags::REFOUT);
        let new_refout = self.flags.contains(Flags::REFIN);

        let mut flags = self.flags;
        flags.set(Flags::REFIN, new_refin);
        flags.set(Flags::REFOUT, new_refout);

        let init = if new_refout { self.init.prev() } else { self.init.clone() };
        let xorout = if new_refout { self.xorout.prev() } else { self.xorout.clone() };

        let mut m = Model {
            spoly: self.spoly.prcp(),
            init,
            xorout,
            check: Poly::zero(),
            magic: Poly::zero(),
            flags,
            name: None,
        };
        m.mcheck();
        m
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "width={} poly=0x{} init=0x{} refin={} refout={} xorout=0x{} check=0x{} residue=0x{}",
            self.width(),
            self.spoly.to_hex(self.flags.contains(Flags::UPPER)),
            self.init.to_hex(self.flags.contains(Flags::UPPER)),
            self.flags.contains(Flags::REFIN),
            self.flags.contains(Flags::REFOUT),
            self.xorout.to_hex(self.flags.contains(Flags::UPPER)),
            self.check.to_hex(self.flags.contains(Flags::UPPER)),
            self.magic.to_hex(self.flags.contains(Flags::UPPER)),
        )?;
        if let Some(name) = &self.name {
            write!(f, " name=\"{}\"", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ccitt_false() -> Model {
        let mut m = Model {
            spoly: Poly::from_u64(0x1021, 16),
            init: Poly::from_u64(0xffff, 16),
            xorout: Poly::from_u64(0x0000, 16),
            check: Poly::zero(),
            magic: Poly::zero(),
            flags: Flags::empty(),
            name: Some("CRC-16/CCITT-FALSE".to_string()),
        };
        m.mcheck();
        m
    }

    fn iso_hdlc() -> Model {
        let mut m = Model {
            spoly: Poly::from_u64(0x04c11db7, 32),
            init: Poly::from_u64(0xffffffff, 32),
            xorout: Poly::from_u64(0xffffffff, 32),
            check: Poly::zero(),
            magic: Poly::zero(),
            flags: Flags::REFIN | Flags::REFOUT,
            name: Some("CRC-32/ISO-HDLC".to_string()),
        };
        m.mcheck();
        m
    }

    #[test]
    fn check_value_ccitt_false() {
        let m = ccitt_false();
        assert_eq!(m.check.try_to_u64(), Some(0x29b1));
    }

    #[test]
    fn check_value_iso_hdlc() {
        let m = iso_hdlc();
        assert_eq!(m.check.try_to_u64(), Some(0xcbf43926));
    }

    #[test]
    fn mcanon_rejects_missing_unit_term() {
        let mut m = ccitt_false();
        m.spoly = Poly::from_u64(0x1020, 16); // low bit clear
        assert_eq!(m.mcanon(), Err(Error::PolyMissingUnitTerm));
    }

    #[test]
    fn mcanon_masks_init_and_xorout_to_width() {
        let mut m = ccitt_false();
        m.init = Poly::from_u64(0xffff, 17); // one bit wider than width
        m.xorout = Poly::from_u64(0, 17);
        assert!(m.mcanon().is_ok());
        assert_eq!(m.init.len(), 16);
        assert_eq!(m.xorout.len(), 16);
    }

    #[test]
    fn mrev_is_involution() {
        // For a canonical model with no crossed endianness,
        // mrev(mrev(M)) == M up to name.
        let m = ccitt_false();
        let back = m.mrev().mrev();
        assert_eq!(back.spoly, m.spoly);
        assert_eq!(back.init, m.init);
        assert_eq!(back.xorout, m.xorout);
        assert_eq!(back.flags & (Flags::REFIN | Flags::REFOUT), m.flags & (Flags::REFIN | Flags::REFOUT));
    }

    #[test]
    fn mrev_is_involution_for_reflected_model() {
        let m = iso_hdlc();
        let back = m.mrev().mrev();
        assert_eq!(back.spoly, m.spoly);
        assert_eq!(back.init, m.init);
        assert_eq!(back.xorout, m.xorout);
    }

    #[test]
    fn mrev_clears_catalog_name() {
        let m = ccitt_false();
        assert!(m.name.is_some());
        let reversed = m.mrev();
        assert!(reversed.name.is_none());
    }
}
