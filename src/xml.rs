//! Syntax analyzer output: the token stream and the parse tree as XML.
//!
//! Every production is written as an open/close pair on separate lines, so
//! an empty `parameterList` or `statements` never collapses to `<x/>`.

use crate::lexer::Token;
use crate::parser::{walk_class, Class, TreeSink};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn token_element(token: &Token) -> String {
    let tag = token.kind_name();
    format!("<{tag}> {} </{tag}>", escape(&token.lexeme()))
}

pub fn tokens_to_xml(tokens: &[Token]) -> String {
    let mut out = String::from("<tokens>\n");
    for token in tokens {
        out.push_str(&token_element(token));
        out.push('\n');
    }
    out.push_str("</tokens>\n");
    out
}

#[derive(Debug, Default)]
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn line(&mut self, text: &str) {
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push_str(text);
        self.out.push('\n');
    }
}

impl TreeSink for XmlWriter {
    fn open(&mut self, production: &'static str) {
        self.line(&format!("<{production}>"));
        self.depth += 1;
    }

    fn close(&mut self, production: &'static str) {
        self.depth -= 1;
        self.line(&format!("</{production}>"));
    }

    fn token(&mut self, token: Token) {
        self.line(&token_element(&token));
    }
}

pub fn class_to_xml(class: &Class) -> String {
    let mut writer = XmlWriter::default();
    walk_class(class, &mut writer);
    writer.out
}
