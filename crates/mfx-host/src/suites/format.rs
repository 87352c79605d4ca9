//! printf-style rendering of message suite format strings.
//!
//! Arguments are pre-split by register class: integer-class values (ints, chars, pointers)
//! and floating point values are consumed from separate queues, matching how they were passed.

use std::ffi::{c_char, CStr};

/// Trailing arguments of a variadic call, split by class.
#[derive(Debug, Default)]
pub(crate) struct VaArgs<'a> {
    ints: &'a [usize],
    floats: &'a [f64],
}

impl<'a> VaArgs<'a> {
    pub(crate) fn new(ints: &'a [usize], floats: &'a [f64]) -> Self {
        Self { ints, floats }
    }

    fn next_int(&mut self) -> Option<usize> {
        let (first, rest) = self.ints.split_first()?;
        self.ints = rest;
        Some(*first)
    }

    fn next_float(&mut self) -> Option<f64> {
        let (first, rest) = self.floats.split_first()?;
        self.floats = rest;
        Some(*first)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    /// Width of the integer argument in bytes.
    size: usize,
}

/// Renders `format` against `args`.
///
/// A directive whose argument is missing is copied through unchanged, as is an unknown
/// conversion. `%s` arguments must be null or point at NUL-terminated strings.
pub(crate) unsafe fn format(format: &CStr, args: &mut VaArgs<'_>) -> String {
    let bytes = format.to_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let next = bytes[i..].iter().position(|&b| b == b'%').map_or(bytes.len(), |p| i + p);
        out.push_str(&String::from_utf8_lossy(&bytes[i..next]));
        i = next;
        if i >= bytes.len() {
            break;
        }
        let directive_start = i;
        i += 1;
        match directive(bytes, &mut i, args) {
            Some(rendered) => out.push_str(&rendered),
            None => out.push_str(&String::from_utf8_lossy(&bytes[directive_start..i])),
        }
    }
    out
}

unsafe fn directive(bytes: &[u8], i: &mut usize, args: &mut VaArgs<'_>) -> Option<String> {
    let mut spec = Spec {
        size: 4,
        ..Spec::default()
    };
    while let Some(&flag) = bytes.get(*i) {
        match flag {
            b'-' => spec.left = true,
            b'+' => spec.plus = true,
            b' ' => spec.space = true,
            b'0' => spec.zero = true,
            b'#' => spec.alternate = true,
            _ => break,
        }
        *i += 1;
    }

    if bytes.get(*i) == Some(&b'*') {
        *i += 1;
        let width = args.next_int()? as u32 as i32;
        if width < 0 {
            spec.left = true;
        }
        spec.width = width.unsigned_abs() as usize;
    } else {
        spec.width = digits(bytes, i);
    }

    if bytes.get(*i) == Some(&b'.') {
        *i += 1;
        if bytes.get(*i) == Some(&b'*') {
            *i += 1;
            let precision = args.next_int()? as u32 as i32;
            spec.precision = usize::try_from(precision).ok();
        } else {
            spec.precision = Some(digits(bytes, i));
        }
    }

    loop {
        match bytes.get(*i) {
            Some(b'h') => spec.size = if spec.size == 2 { 1 } else { 2 },
            Some(b'l' | b'q' | b'j' | b'z' | b't' | b'L') => spec.size = 8,
            _ => break,
        }
        *i += 1;
    }

    let conversion = *bytes.get(*i)?;
    *i += 1;
    let body = match conversion {
        b'%' => return Some("%".to_owned()),
        b'd' | b'i' => signed(args.next_int()?, &spec),
        b'u' => unsigned(args.next_int()?, &spec, 10, false),
        b'x' => unsigned(args.next_int()?, &spec, 16, false),
        b'X' => unsigned(args.next_int()?, &spec, 16, true),
        b'o' => unsigned(args.next_int()?, &spec, 8, false),
        b'c' => {
            spec.zero = false;
            char::from(args.next_int()? as u8).to_string()
        }
        b's' => {
            spec.zero = false;
            let ptr = args.next_int()? as *const c_char;
            let text = if ptr.is_null() {
                "(null)".to_owned()
            } else {
                CStr::from_ptr(ptr).to_string_lossy().into_owned()
            };
            match spec.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text,
            }
        }
        b'p' => {
            spec.zero = false;
            match args.next_int()? {
                0 => "(nil)".to_owned(),
                address => format!("{address:#x}"),
            }
        }
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' => float(args.next_float()?, conversion, &mut spec),
        _ => return None,
    };
    Some(pad(body, &spec))
}

fn digits(bytes: &[u8], i: &mut usize) -> usize {
    let mut value = 0usize;
    while let Some(d) = bytes.get(*i).filter(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(usize::from(d - b'0'));
        *i += 1;
    }
    value
}

fn sign_prefix(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

/// Applies the integer precision (minimum digit count). An explicit precision disables `0`.
fn min_digits(digits: String, spec: &mut Spec) -> String {
    match spec.precision {
        Some(precision) => {
            spec.zero = false;
            if precision == 0 && digits == "0" {
                String::new()
            } else {
                format!("{digits:0>precision$}")
            }
        }
        None => digits,
    }
}

fn signed(raw: usize, spec: &Spec) -> String {
    let value: i64 = match spec.size {
        1 => i64::from(raw as u8 as i8),
        2 => i64::from(raw as u16 as i16),
        4 => i64::from(raw as u32 as i32),
        _ => raw as u64 as i64,
    };
    let mut spec = *spec;
    let digits = min_digits(value.unsigned_abs().to_string(), &mut spec);
    with_sign(sign_prefix(value < 0, &spec), digits, &spec)
}

fn unsigned(raw: usize, spec: &Spec, radix: u32, upper: bool) -> String {
    let value: u64 = match spec.size {
        1 => u64::from(raw as u8),
        2 => u64::from(raw as u16),
        4 => u64::from(raw as u32),
        _ => raw as u64,
    };
    let rendered = match (radix, upper) {
        (16, true) => format!("{value:X}"),
        (16, false) => format!("{value:x}"),
        (8, _) => format!("{value:o}"),
        _ => value.to_string(),
    };
    let mut spec = *spec;
    let digits = min_digits(rendered, &mut spec);
    let prefix = match (spec.alternate, radix, upper) {
        (true, 16, true) if value != 0 => "0X",
        (true, 16, false) if value != 0 => "0x",
        (true, 8, _) if !digits.starts_with('0') => "0",
        _ => "",
    };
    with_sign(prefix, digits, &spec)
}

/// Joins prefix and digits, zero filling between them when requested.
fn with_sign(prefix: &str, digits: String, spec: &Spec) -> String {
    if spec.zero && !spec.left && prefix.len() + digits.len() < spec.width {
        let fill = spec.width - prefix.len();
        format!("{prefix}{digits:0>fill$}")
    } else {
        format!("{prefix}{digits}")
    }
}

fn float(value: f64, conversion: u8, spec: &mut Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    let precision = spec.precision.unwrap_or(6);
    let sign = sign_prefix(value.is_sign_negative() && !value.is_nan(), spec);

    if !value.is_finite() {
        spec.zero = false;
        let word = if value.is_nan() { "nan" } else { "inf" };
        let word = if upper { word.to_ascii_uppercase() } else { word.to_owned() };
        return format!("{sign}{word}");
    }

    let magnitude = value.abs();
    let body = match conversion.to_ascii_lowercase() {
        b'f' => format!("{magnitude:.precision$}"),
        b'e' => exponential(magnitude, precision),
        _ => general(magnitude, precision, spec.alternate),
    };
    let body = if spec.alternate && precision == 0 && !body.contains('.') && conversion.to_ascii_lowercase() != b'g' {
        insert_point(body)
    } else {
        body
    };
    let body = if upper { body.to_ascii_uppercase() } else { body };
    with_sign(sign, body, spec)
}

fn insert_point(body: String) -> String {
    match body.find('e') {
        Some(at) => format!("{}.{}", &body[..at], &body[at..]),
        None => format!("{body}."),
    }
}

/// `d.ddde±XX`, with at least two exponent digits.
fn exponential(magnitude: f64, precision: usize) -> String {
    let rust = format!("{magnitude:.precision$e}");
    let (mantissa, exponent) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

fn general(magnitude: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let significant = precision - 1;
    let rounded = format!("{magnitude:.significant$e}");
    let exponent: i64 = rounded
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);
    let body = if exponent < -4 || exponent >= precision as i64 {
        exponential(magnitude, significant)
    } else {
        let decimals = (precision as i64 - 1 - exponent) as usize;
        format!("{magnitude:.decimals$}")
    };
    if alternate {
        return body;
    }
    match body.split_once('e') {
        Some((mantissa, exponent)) => format!("{}e{exponent}", trim_zeros(mantissa)),
        None => trim_zeros(&body).to_owned(),
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn pad(body: String, spec: &Spec) -> String {
    let width = spec.width;
    if spec.left {
        format!("{body:<width$}")
    } else {
        format!("{body:>width$}")
    }
}
