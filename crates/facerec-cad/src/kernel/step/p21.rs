//! Part 21 (ISO 10303-21) physical file format parser.
//!
//! Parses the DATA section of a STEP file into entity instances using nom
//! combinators. Only the DATA section is interpreted; the HEADER is skipped.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, digit1, multispace1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

/// One `TYPE_NAME(params)` record of an entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Entity type name, upper-cased (e.g. "CARTESIAN_POINT")
    pub type_name: String,
    /// Record parameters
    pub params: Vec<StepValue>,
}

/// A STEP entity instance.
///
/// Simple instances carry exactly one record; complex instances
/// (`#1=(A(..) B(..));`) carry one record per partial type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    /// Entity ID (e.g., #123)
    pub id: u64,
    pub records: Vec<Record>,
}

impl EntityInstance {
    /// Type name of the first record
    pub fn type_name(&self) -> &str {
        self.records
            .first()
            .map(|r| r.type_name.as_str())
            .unwrap_or("")
    }

    /// Parameters of the first record
    pub fn params(&self) -> &[StepValue] {
        self.records
            .first()
            .map(|r| r.params.as_slice())
            .unwrap_or(&[])
    }

    /// Record with the given type name, if this instance has one
    pub fn record(&self, type_name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.type_name == type_name)
    }

    /// Whether any record has the given type name
    pub fn has_type(&self, type_name: &str) -> bool {
        self.record(type_name).is_some()
    }

}

/// A STEP value in a parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// Integer value
    Integer(i64),
    /// Real/float value
    Real(f64),
    /// String value (escapes decoded)
    String(String),
    /// Entity reference (#123)
    Reference(u64),
    /// Enumeration (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<StepValue>),
    /// Omitted/unset value ($)
    Omitted,
    /// Derived value (*)
    Derived,
    /// Typed value (TYPE(...))
    Typed {
        type_name: String,
        value: Box<StepValue>,
    },
}

impl StepValue {
    /// Numeric value of an integer, real, or typed number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StepValue::Real(v) => Some(*v),
            StepValue::Integer(v) => Some(*v as f64),
            StepValue::Typed { value, .. } => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            StepValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Every entity reference contained in this value, depth first
    pub fn references(&self, out: &mut Vec<u64>) {
        match self {
            StepValue::Reference(id) => out.push(*id),
            StepValue::List(items) => items.iter().for_each(|v| v.references(out)),
            StepValue::Typed { value, .. } => value.references(out),
            _ => {}
        }
    }
}

/// Error produced when the DATA section cannot be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input where parsing stopped
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

/// Skip whitespace and `/* ... */` comments.
fn sp(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ))),
    )(input)
}

/// Parse a STEP entity ID (#123).
fn entity_id(input: &str) -> IResult<&str, u64> {
    preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u64>()))(input)
}

/// Parse an integer.
fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

/// Parse a real number. Part 21 reals always carry a decimal point.
fn real(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse a string literal (`'...'`, with `''` for a quote).
fn string_literal(input: &str) -> IResult<&str, String> {
    let (rest, _) = char('\'')(input)?;
    let mut raw = String::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some(&(_, '\'')) = chars.peek() {
                raw.push('\'');
                chars.next();
            } else {
                return Ok((&rest[i + 1..], decode_step_string(&raw)));
            }
        } else {
            raw.push(c);
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Decode Part 21 control directives inside a string.
///
/// Handles `\\`, `\S\c`, `\X\HH`, `\X2\HHHH..\X0\` and `\X4\HHHHHHHH..\X0\`.
/// `\P?\` code page switches are dropped. Malformed escapes are kept verbatim.
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('\\') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("\\\\") {
            result.push('\\');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\X2\\") {
            let (decoded, after) = decode_hex_run(after, 4);
            result.push_str(&decoded);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\X4\\") {
            let (decoded, after) = decode_hex_run(after, 8);
            result.push_str(&decoded);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\X\\") {
            match after.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    result.push(byte as char);
                    rest = &after[2..];
                }
                None => {
                    result.push_str("\\X\\");
                    rest = after;
                }
            }
        } else if let Some(after) = tail.strip_prefix("\\S\\") {
            let mut it = after.chars();
            match it.next().and_then(|c| char::from_u32(c as u32 + 128)) {
                Some(ch) => {
                    result.push(ch);
                    rest = it.as_str();
                }
                None => {
                    result.push_str("\\S\\");
                    rest = after;
                }
            }
        } else if is_page_directive(tail.as_bytes()) {
            rest = &tail[4..];
        } else {
            result.push('\\');
            rest = &tail[1..];
        }
    }

    result.push_str(rest);
    result
}

fn is_page_directive(b: &[u8]) -> bool {
    b.len() >= 4 && b[1] == b'P' && b[2].is_ascii_uppercase() && b[3] == b'\\'
}

/// Decode hex groups of `width` digits up to the `\X0\` terminator.
fn decode_hex_run(s: &str, width: usize) -> (String, &str) {
    let (body, rest) = match s.find("\\X0\\") {
        Some(end) => (&s[..end], &s[end + 4..]),
        None => (s, ""),
    };

    let mut out = String::new();
    if width == 4 {
        let units: Vec<u16> = body
            .as_bytes()
            .chunks(4)
            .filter_map(|c| std::str::from_utf8(c).ok())
            .filter_map(|h| u16::from_str_radix(h, 16).ok())
            .collect();
        out.extend(char::decode_utf16(units).filter_map(Result::ok));
    } else {
        out.extend(
            body.as_bytes()
                .chunks(width)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|h| u32::from_str_radix(h, 16).ok())
                .filter_map(char::from_u32),
        );
    }
    (out, rest)
}

/// Parse an enumeration value.
fn enumeration(input: &str) -> IResult<&str, String> {
    delimited(
        char('.'),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            String::from,
        ),
        char('.'),
    )(input)
}

/// Parse an entity or type keyword (standard or `!` user-defined).
fn keyword(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            opt(char('!')),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        |s: &str| s.to_ascii_uppercase(),
    )(input)
}

/// Parse a parenthesised, comma separated parameter list.
fn parameter_list(input: &str) -> IResult<&str, Vec<StepValue>> {
    delimited(
        pair(char('('), sp),
        separated_list0(tuple((sp, char(','), sp)), step_value),
        pair(sp, char(')')),
    )(input)
}

/// Parse a typed value: TYPE_NAME(value).
fn typed_parameter(input: &str) -> IResult<&str, StepValue> {
    let (input, type_name) = keyword(input)?;
    let (input, _) = sp(input)?;
    let (input, mut values) = parameter_list(input)?;

    let inner = if values.len() == 1 {
        values.remove(0)
    } else {
        StepValue::List(values)
    };

    Ok((
        input,
        StepValue::Typed {
            type_name,
            value: Box::new(inner),
        },
    ))
}

/// Parse a STEP value.
fn step_value(input: &str) -> IResult<&str, StepValue> {
    let (input, _) = sp(input)?;

    alt((
        value(StepValue::Omitted, char('$')),
        value(StepValue::Derived, char('*')),
        map(entity_id, StepValue::Reference),
        map(enumeration, StepValue::Enum),
        map(string_literal, StepValue::String),
        typed_parameter,
        map(real, StepValue::Real),
        map(integer, StepValue::Integer),
        map(parameter_list, StepValue::List),
    ))(input)
}

/// Parse one `TYPE_NAME ( params )` record.
fn record(input: &str) -> IResult<&str, Record> {
    let (input, _) = sp(input)?;
    let (input, type_name) = keyword(input)?;
    let (input, _) = sp(input)?;
    let (input, params) = parameter_list(input)?;
    Ok((input, Record { type_name, params }))
}

/// Parse an entity instance (simple or complex).
pub fn entity_instance(input: &str) -> IResult<&str, EntityInstance> {
    let (input, _) = sp(input)?;
    let (input, id) = entity_id(input)?;
    let (input, _) = tuple((sp, char('='), sp))(input)?;

    let (input, records) = alt((
        delimited(
            char('('),
            many1(record),
            pair(sp, char(')')),
        ),
        map(record, |r| vec![r]),
    ))(input)?;

    let (input, _) = pair(sp, char(';'))(input)?;

    Ok((input, EntityInstance { id, records }))
}

/// Skip the exchange structure start and the HEADER section, up to and
/// including the `DATA;` keyword.
fn preamble(input: &str) -> IResult<&str, ()> {
    let header_entity = terminated(record, pair(sp, char(';')));

    value(
        (),
        tuple((
            sp,
            opt(pair(tag("ISO-10303-21;"), sp)),
            opt(tuple((
                tag("HEADER;"),
                many0(header_entity),
                sp,
                tag("ENDSEC;"),
                sp,
            ))),
            tag("DATA"),
            sp,
            opt(parameter_list),
            sp,
            char(';'),
        )),
    )(input)
}

/// Parse the DATA section of a STEP file.
pub fn parse_data_section(input: &str) -> Result<Vec<EntityInstance>, ParseError> {
    let input = input.trim_start_matches('\u{feff}');
    let (body, _) = preamble(input).map_err(|_| ParseError {
        message: "missing DATA section".into(),
        offset: 0,
    })?;
    let start = input.len() - body.len();

    let (rest, entities) = many0(entity_instance)(body).map_err(|_| ParseError {
        message: "malformed entity instance".into(),
        offset: start,
    })?;

    let offset = input.len() - rest.len();
    match terminated(sp, tag("ENDSEC;"))(rest) {
        Ok(_) => Ok(entities),
        Err(_) => Err(ParseError {
            message: "malformed entity instance".into(),
            offset,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        assert_eq!(entity_id("#123"), Ok(("", 123)));
        assert_eq!(entity_id("#1"), Ok(("", 1)));
    }

    #[test]
    fn test_real_and_integer() {
        assert!((real("3.14").unwrap().1 - 3.14).abs() < 1e-12);
        assert!((real("1.0E-5").unwrap().1 - 1.0e-5).abs() < 1e-15);
        assert_eq!(real("0.").unwrap().1, 0.0);
        assert!(real("42").is_err());
        assert_eq!(step_value("42"), Ok(("", StepValue::Integer(42))));
        assert_eq!(step_value("-2.5"), Ok(("", StepValue::Real(-2.5))));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("'hello'"), Ok(("", "hello".to_string())));
        assert_eq!(string_literal("'it''s'"), Ok(("", "it's".to_string())));
        assert!(string_literal("'unterminated").is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(decode_step_string("\\X2\\5E739762\\X0\\"), "平面");
        assert_eq!(decode_step_string("a\\X\\E9b"), "a\u{e9}b");
        assert_eq!(decode_step_string("back\\\\slash"), "back\\slash");
        assert_eq!(decode_step_string("IT:7 Ra:1.6"), "IT:7 Ra:1.6");
    }

    #[test]
    fn test_enumeration() {
        assert_eq!(enumeration(".T."), Ok(("", "T".to_string())));
        assert_eq!(enumeration(".MILLI."), Ok(("", "MILLI".to_string())));
    }

    #[test]
    fn test_entity_instance() {
        let input = "#10 = CARTESIAN_POINT('origin', (0., 0., 0.));";
        let (_, entity) = entity_instance(input).unwrap();
        assert_eq!(entity.id, 10);
        assert_eq!(entity.type_name(), "CARTESIAN_POINT");
        assert_eq!(entity.params().len(), 2);
        assert_eq!(entity.records.len(), 1);
    }

    #[test]
    fn test_complex_entity() {
        let input = "#914 =( LENGTH_UNIT ( ) NAMED_UNIT ( * ) SI_UNIT ( .MILLI., .METRE. ) );";
        let (_, entity) = entity_instance(input).unwrap();
        assert_eq!(entity.id, 914);
        assert_eq!(entity.records.len(), 3);
        assert!(entity.has_type("LENGTH_UNIT"));
        let si = entity.record("SI_UNIT").unwrap();
        assert_eq!(si.params[0], StepValue::Enum("MILLI".into()));
    }

    #[test]
    fn test_typed_parameter() {
        let input = "#7 = UNCERTAINTY_MEASURE_WITH_UNIT (LENGTH_MEASURE( 1.0E-05 ), #6, 'distance_accuracy_value', 'NONE');";
        let (_, entity) = entity_instance(input).unwrap();
        assert_eq!(entity.params()[0].as_f64(), Some(1.0e-5));
    }

    #[test]
    fn test_data_section_with_comments_and_crlf() {
        let input = "ISO-10303-21;\r\nHEADER;\r\nFILE_NAME('x','',(''),(''),'','','');\r\nENDSEC;\r\nDATA;\r\n/* points */\r\n#1 = CARTESIAN_POINT ( 'NONE',  ( 31.0, -64.2, -55.0 ) ) ;\r\n#2 = FACE_OUTER_BOUND ( 'NONE', #8586, .T. ) ;\r\nENDSEC;\r\nEND-ISO-10303-21;";
        let entities = parse_data_section(input).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].params()[1].as_reference(), Some(8586));
    }

    #[test]
    fn test_header_strings_do_not_start_data() {
        let input = "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('DATA; exported', 'ENDSEC;'),'2;1');\nFILE_NAME('part.stp','2024-01-01T00:00:00',('DATA;'),(''),'','','');\nFILE_SCHEMA(('AUTOMOTIVE_DESIGN'));\nENDSEC;\nDATA;\n#1 = DIRECTION('', (0., 0., 1.));\nENDSEC;\nEND-ISO-10303-21;";
        let entities = parse_data_section(input).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].type_name(), "DIRECTION");
    }

    #[test]
    fn test_data_section_with_parameters() {
        let input = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA('main', ('CONFIG_CONTROL_DESIGN'));\n#5 = DIRECTION('', (1., 0., 0.));\nENDSEC;";
        let entities = parse_data_section(input).unwrap();
        assert_eq!(entities[0].id, 5);
    }

    #[test]
    fn test_data_section_errors() {
        assert!(parse_data_section("HEADER; ENDSEC;").is_err());
        let err = parse_data_section("DATA;\n#1 = POINT(;\nENDSEC;").unwrap_err();
        assert!(err.offset > 0);
    }

    #[test]
    fn test_references_collects_nested() {
        let (_, value) = step_value("(#1, (#2, $), TYPED(#3))").unwrap();
        let mut refs = Vec::new();
        value.references(&mut refs);
        assert_eq!(refs, vec![1, 2, 3]);
    }
}
