//! The model preset catalog.
//!
//! A sorted static table plus three accessors, `mbynam`, `mbynum`, and
//! `mcount`, consulted by the CLI driver before falling back to a
//! brute-force search.

use crate::crc::Flags;
use crate::model::Model;
use crate::poly::Poly;

/// One catalog entry. Stored as integers rather than [`Poly`] so the
/// table can be a `const` slice; [`Preset::to_model`] builds the
/// [`Model`] (and its derived `check`/`magic`) on demand.
pub struct Preset {
    pub name: &'static str,
    pub width: usize,
    pub poly: u64,
    pub init: u64,
    pub refin: bool,
    pub refout: bool,
    pub xorout: u64,
}

impl Preset {
    pub fn to_model(&self) -> Model {
        let mut flags = Flags::empty();
        flags.set(Flags::REFIN, self.refin);
        flags.set(Flags::REFOUT, self.refout);
        let mut m = Model {
            spoly: Poly::from_u64(self.poly, self.width),
            init: Poly::from_u64(self.init, self.width),
            xorout: Poly::from_u64(self.xorout, self.width),
            check: Poly::zero(),
            magic: Poly::zero(),
            flags,
            name: Some(self.name.to_string()),
        };
        m.mcheck();
        m
    }
}

/// Sorted (by name) catalog of commonly cataloged Williams models. Not
/// an exhaustive reproduction of any particular industry list, but a
/// representative set covering the widths and reflection combinations
/// exercised elsewhere in this crate.
pub static PRESETS: &[Preset] = &[
    Preset { name: "CRC-16/ARC", width: 16, poly: 0x8005, init: 0x0000, refin: true, refout: true, xorout: 0x0000 },
    Preset { name: "CRC-16/CCITT-FALSE", width: 16, poly: 0x1021, init: 0xffff, refin: false, refout: false, xorout: 0x0000 },
    Preset { name: "CRC-16/KERMIT", width: 16, poly: 0x1021, init: 0x0000, refin: true, refout: true, xorout: 0x0000 },
    Preset { name: "CRC-16/MODBUS", width: 16, poly: 0x8005, init: 0xffff, refin: true, refout: true, xorout: 0x0000 },
    Preset { name: "CRC-16/XMODEM", width: 16, poly: 0x1021, init: 0x0000, refin: false, refout: false, xorout: 0x0000 },
    Preset { name: "CRC-24", width: 24, poly: 0x864cfb, init: 0xb704ce, refin: false, refout: false, xorout: 0x000000 },
    Preset { name: "CRC-32/BZIP2", width: 32, poly: 0x04c11db7, init: 0xffffffff, refin: false, refout: false, xorout: 0xffffffff },
    Preset { name: "CRC-32/ISO-HDLC", width: 32, poly: 0x04c11db7, init: 0xffffffff, refin: true, refout: true, xorout: 0xffffffff },
    Preset { name: "CRC-32/MPEG-2", width: 32, poly: 0x04c11db7, init: 0xffffffff, refin: false, refout: false, xorout: 0x00000000 },
    Preset { name: "CRC-32C", width: 32, poly: 0x1edc6f41, init: 0xffffffff, refin: true, refout: true, xorout: 0xffffffff },
    Preset { name: "CRC-5/USB", width: 5, poly: 0x05, init: 0x1f, refin: true, refout: true, xorout: 0x1f },
    Preset { name: "CRC-64/ECMA-182", width: 64, poly: 0x42f0e1eba9ea3693, init: 0x0000000000000000, refin: false, refout: false, xorout: 0x0000000000000000 },
    Preset { name: "CRC-64/XZ", width: 64, poly: 0x42f0e1eba9ea3693, init: 0xffffffffffffffff, refin: true, refout: true, xorout: 0xffffffffffffffff },
    Preset { name: "CRC-7/MMC", width: 7, poly: 0x09, init: 0x00, refin: false, refout: false, xorout: 0x00 },
    Preset { name: "CRC-8/MAXIM-DOW", width: 8, poly: 0x31, init: 0x00, refin: true, refout: true, xorout: 0x00 },
    Preset { name: "CRC-8/SMBUS", width: 8, poly: 0x07, init: 0x00, refin: false, refout: false, xorout: 0x00 },
];

/// `mcount`: the number of preset entries.
pub fn mcount() -> usize {
    PRESETS.len()
}

/// `mbynam`: look up a preset by exact (case-sensitive) name. The table
/// is kept sorted by name so this can binary-search it.
pub fn mbynam(name: &str) -> Option<Model> {
    PRESETS.binary_search_by(|p| p.name.cmp(name)).ok().map(|i| PRESETS[i].to_model())
}

/// `mbynum`: look up a preset by table index.
pub fn mbynum(i: usize) -> Option<Model> {
    PRESETS.get(i).map(Preset::to_model)
}
