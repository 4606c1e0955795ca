//! Just enough CSS value parsing for `font-family` lists and `src`
//! descriptors.

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Splits a `font-family` value into family names.
///
/// Quoted names are taken verbatim; runs of identifiers are joined with a
/// single space, so `Times  New Roman` and `"Times New Roman"` agree.
pub fn parse_font_families(raw: &str) -> Vec<String> {
    let mut input = ParserInput::new(raw);
    let mut parser = Parser::new(&mut input);
    let mut families = Vec::new();
    let mut words: Vec<String> = Vec::new();

    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::QuotedString(name) => families.push(name.to_string()),
            Token::Ident(word) => words.push(word.to_string()),
            Token::Comma => {
                if !words.is_empty() {
                    families.push(words.join(" "));
                    words.clear();
                }
            }
            _ => {}
        }
    }
    if !words.is_empty() {
        families.push(words.join(" "));
    }

    families.retain(|family| !family.trim().is_empty());
    families
}

/// All `url()` references in a `src` descriptor, in declaration order.
pub fn parse_src_urls(raw: &str) -> Vec<String> {
    let mut input = ParserInput::new(raw);
    let mut parser = Parser::new(&mut input);
    let mut urls = Vec::new();

    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::UnquotedUrl(url) => urls.push(url.to_string()),
            Token::Function(ref name) if name.eq_ignore_ascii_case("url") => {
                let url: Result<String, ParseError<'_, ()>> =
                    parser.parse_nested_block(|nested| Ok(nested.expect_string()?.to_string()));
                if let Ok(url) = url {
                    urls.push(url);
                }
            }
            _ => {}
        }
    }

    urls.retain(|url| !url.is_empty());
    urls
}
