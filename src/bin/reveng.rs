//! CLI driver: argument parsing, preset lookup, and progress/result
//! printing around the library core. The library itself never parses
//! arguments, touches stdio, or logs.

use std::process;

use structopt::StructOpt;

use reveng::crc::{self, Flags};
use reveng::error::Error;
use reveng::model::Model;
use reveng::poly::Poly;
use reveng::presets;
use reveng::reveng::{self as core_reveng, Reporter, SearchFlags};

#[derive(Debug, StructOpt)]
#[structopt(name = "reveng", rename_all = "kebab")]
struct Opt {
    /// Compute the CRC of each operand under the given model
    #[structopt(short = "c", long)]
    compute: bool,

    /// Compute the CRC under the reverse algorithm (see `mrev`)
    #[structopt(short = "v", long)]
    compute_reversed: bool,

    /// Dump the given model's parameters and check/magic values
    #[structopt(short = "d", long)]
    dump: bool,

    /// List every preset model in the catalog
    #[structopt(short = "D", long)]
    list_presets: bool,

    /// Search for models consistent with the given samples
    #[structopt(short = "s", long)]
    search: bool,

    /// Width in bits of the algorithm's register
    #[structopt(short, long)]
    width: Option<usize>,

    /// Generator polynomial, chopped form, hex
    #[structopt(short, long)]
    poly: Option<String>,

    /// Initial register value, hex
    #[structopt(short, long)]
    init: Option<String>,

    /// Final XOR value, hex
    #[structopt(short = "x", long)]
    xorout: Option<String>,

    /// Exclusive upper bound of the poly search range, hex
    #[structopt(short, long)]
    qpoly: Option<String>,

    /// Look up a preset model by name instead of -w/-p/-i/-x
    #[structopt(short, long)]
    model: Option<String>,

    /// Reflect input characters and the output register (refin=refout=true)
    #[structopt(short = "l", long)]
    little_endian: bool,

    /// Do not reflect input characters or the output register
    #[structopt(short = "b", long)]
    big_endian: bool,

    /// Exhaustive search mode: stop at the first match per branch
    #[structopt(short = "1")]
    exhst: bool,

    /// Disable augmenting (classical, MULXN) mode
    #[structopt(short = "M")]
    non_augmenting: bool,

    /// Render hex output in uppercase
    #[structopt(short = "X")]
    uppercase: bool,

    /// Samples (search/compute modes) or a single model name (dump mode)
    args: Vec<String>,
}

/// Reports search progress/results to stdout/stderr: an injected
/// capability rather than the module-level `found`/`progress` function
/// symbols a C tool would use.
struct CliReporter {
    uppercase: bool,
}

impl Reporter for CliReporter {
    fn found(&mut self, model: &Model) {
        println!("{}", with_case(model, self.uppercase));
    }

    fn progress(&mut self, poly: &Poly, _flags: SearchFlags, seq: u64) {
        if seq > 0 {
            log::debug!("progress: candidate poly=0x{} after {} tested", poly.to_hex(self.uppercase), seq);
        }
    }
}

/// A clone of `m` with `Flags::UPPER` set to `upper`, so its [`Display`]
/// impl renders hex digits in the requested case. Every render site in
/// this driver goes through here rather than reimplementing `Display`'s
/// format string.
fn with_case(m: &Model, upper: bool) -> Model {
    let mut m = m.clone();
    m.flags.set(Flags::UPPER, upper);
    m
}

/// Parse a concatenated `message-hex || crc-hex` sample: hex unless
/// `-z`, message in whole bytes, the trailing `ceil(width/4)` hex
/// digits are the known CRC.
fn parse_sample(s: &str, width: usize) -> reveng::error::Result<Poly> {
    let crc_digits = (width + 3) / 4;
    if s.len() < crc_digits {
        return Err(Error::InvalidHex(0));
    }
    let split = s.len() - crc_digits;
    if split % 2 != 0 {
        return Err(Error::OddHexLength);
    }
    let msg_hex = &s[..split];
    let crc_hex = &s[split..];
    let message = Poly::from_hex(msg_hex)?;
    let crc_bits = Poly::from_hex(crc_hex)?.pright(width);
    Ok(reveng::poly::concat(&message, &crc_bits))
}

fn parse_hex_or_zero(opt: &Option<String>, width: usize) -> reveng::error::Result<Poly> {
    match opt {
        Some(s) => Ok(Poly::from_hex(s)?.pright(width)),
        None => Ok(Poly::palloc(width)),
    }
}

fn build_flags(opt: &Opt) -> Flags {
    let mut flags = Flags::empty();
    if opt.little_endian {
        flags.insert(Flags::REFIN);
        flags.insert(Flags::REFOUT);
    }
    if !opt.non_augmenting {
        flags.insert(Flags::MULXN);
    }
    if opt.uppercase {
        flags.insert(Flags::UPPER);
    }
    if opt.exhst {
        flags.insert(Flags::EXHST);
    }
    flags
}

fn resolve_base_model(opt: &Opt) -> reveng::error::Result<Model> {
    if let Some(name) = &opt.model {
        return presets::mbynam(name).ok_or(Error::PresetNotFound);
    }
    let width = opt.width.ok_or(Error::NoWidth)?;
    let poly_opt = opt.poly.as_ref().ok_or(Error::NoPolynomial)?;
    let spoly = Poly::from_hex(poly_opt)?.pright(width);
    let init = parse_hex_or_zero(&opt.init, width)?;
    let xorout = parse_hex_or_zero(&opt.xorout, width)?;
    let mut m = Model {
        spoly,
        init,
        xorout,
        check: Poly::zero(),
        magic: Poly::zero(),
        flags: build_flags(opt),
        name: None,
    };
    m.mcanon()?;
    m.mcheck();
    Ok(m)
}

fn run(opt: &Opt) -> reveng::error::Result<i32> {
    let mode_count = [opt.compute, opt.compute_reversed, opt.dump, opt.list_presets, opt.search]
        .iter()
        .filter(|&&b| b)
        .count();
    if mode_count != 1 {
        return Err(Error::Other("specify exactly one mode switch (-c, -v, -d, -D, -s)".to_string()));
    }

    if opt.list_presets {
        for i in 0..presets::mcount() {
            let m = presets::mbynum(i).unwrap();
            println!("{}", with_case(&m, opt.uppercase));
        }
        return Ok(0);
    }

    if opt.dump {
        let m = resolve_base_model(opt)?;
        println!("{}", with_case(&m, opt.uppercase));
        return Ok(0);
    }

    if opt.compute || opt.compute_reversed {
        let mut m = resolve_base_model(opt)?;
        if opt.compute_reversed {
            m = m.mrev();
        }
        for arg in &opt.args {
            let message = Poly::from_hex(arg)?;
            let got = crc::pcrc_williams(&message, &m.spoly, &m.init, &m.xorout, m.flags);
            println!("{}", got.to_hex(opt.uppercase));
        }
        return Ok(0);
    }

    // -s: search
    let guess = resolve_base_model(opt)?;
    if guess.is_crossed_endian() {
        return Err(Error::CrossedEndian);
    }

    let mut rflags = SearchFlags::empty();
    if opt.poly.is_some() || opt.model.is_some() {
        rflags.insert(SearchFlags::HAVEP);
    }
    if opt.init.is_some() {
        rflags.insert(SearchFlags::HAVEI);
    }
    if opt.xorout.is_some() {
        rflags.insert(SearchFlags::HAVEX);
    }
    if opt.exhst {
        rflags.insert(SearchFlags::EXHST);
    }
    let qpoly = match &opt.qpoly {
        Some(s) => {
            rflags.insert(SearchFlags::HAVEQ);
            Some(Poly::from_hex(s)?.pright(guess.width()))
        }
        None => None,
    };

    if opt.args.is_empty() {
        log::warn!("no samples given");
    } else if opt.args.len() < 4 {
        log::warn!("only {} sample(s) given, provide >= 4", opt.args.len());
    }

    let width = guess.width();
    let samples: Vec<Poly> = opt
        .args
        .iter()
        .map(|s| parse_sample(s, width))
        .collect::<reveng::error::Result<Vec<_>>>()?;

    let mut reporter = CliReporter { uppercase: opt.uppercase };
    let results = core_reveng::reveng(&guess, qpoly.as_ref(), rflags, &samples, &mut reporter)?;

    if results.is_empty() {
        eprintln!("no models found");
        return Ok(1);
    }
    Ok(0)
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    match run(&opt) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("reveng: {}", e);
            process::exit(1);
        }
    }
}
