// Shared lexical helpers for the path parser

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so it tolerates surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare aggregation name: letters, digits, `_` and `-`
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
        String::from,
    )(input)
}

/// Quoted name, double or single quotes, no escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            String::from,
        ),
        map(
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            String::from,
        ),
    ))(input)
}

/// Either form of name
pub fn name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}
