// Path parser for aggregation path expressions

use super::ast::{AggregationPath, BucketRole, Segment};
use super::lexer::{name, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, multispace1},
    combinator::{eof, opt, value},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};

/// Parse a bucket marker
/// Format: [] or [series] or [plot]
fn parse_bucket(input: &str) -> IResult<&str, BucketRole> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, role) = opt(alt((
        value(BucketRole::Series, tag("series")),
        value(BucketRole::Plot, tag("plot")),
    )))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(']')(input)?;

    Ok((input, role.unwrap_or(BucketRole::Auto)))
}

/// Parse one segment
/// Format: Name or "Quoted Name" optionally followed by a bucket marker
fn parse_segment(input: &str) -> IResult<&str, Segment> {
    let (input, name) = name(input)?;
    let (input, bucket) = opt(parse_bucket)(input)?;

    Ok((input, Segment { name, bucket }))
}

/// Parse the trailing alias
/// Format: as name
fn parse_alias(input: &str) -> IResult<&str, String> {
    preceded(delimited(multispace1, tag("as"), multispace1), name)(input)
}

/// Parse a complete aggregation path
/// Format: [..]segment.segment... [as alias]
pub fn parse_aggregation_path(input: &str) -> IResult<&str, AggregationPath> {
    let (input, _) = multispace0(input)?;
    let (input, deep) = opt(tag(".."))(input)?;
    let (input, segments) = separated_list1(char('.'), parse_segment)(input)?;
    let (input, alias) = opt(parse_alias)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    Ok((
        input,
        AggregationPath {
            deep: deep.is_some(),
            segments,
            alias,
        },
    ))
}
