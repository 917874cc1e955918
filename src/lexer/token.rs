use std::fmt::{Display, Formatter};

use phf::phf_map;

pub(crate) static KEYWORDS: phf::Map<&str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

pub(crate) static SYMBOLS: phf::Map<char, Symbol> = phf_map! {
    '{' => Symbol::OpenCurlyBrace,
    '}' => Symbol::CloseCurlyBrace,
    '(' => Symbol::OpenParen,
    ')' => Symbol::CloseParen,
    '[' => Symbol::OpenSquareBrace,
    ']' => Symbol::CloseSquareBrace,
    '.' => Symbol::Dot,
    ',' => Symbol::Comma,
    ';' => Symbol::SemiColon,
    '+' => Symbol::Plus,
    '-' => Symbol::Minus,
    '*' => Symbol::Star,
    '/' => Symbol::Slash,
    '&' => Symbol::Ampersand,
    '|' => Symbol::Pipe,
    '<' => Symbol::LessThan,
    '>' => Symbol::GreaterThan,
    '=' => Symbol::Equal,
    '~' => Symbol::Tilde,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    OpenCurlyBrace,
    CloseCurlyBrace,
    OpenParen,
    CloseParen,
    OpenSquareBrace,
    CloseSquareBrace,
    Dot,
    Comma,
    SemiColon,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Pipe,
    LessThan,
    GreaterThan,
    Equal,
    Tilde,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::OpenCurlyBrace => '{',
            Symbol::CloseCurlyBrace => '}',
            Symbol::OpenParen => '(',
            Symbol::CloseParen => ')',
            Symbol::OpenSquareBrace => '[',
            Symbol::CloseSquareBrace => ']',
            Symbol::Dot => '.',
            Symbol::Comma => ',',
            Symbol::SemiColon => ';',
            Symbol::Plus => '+',
            Symbol::Minus => '-',
            Symbol::Star => '*',
            Symbol::Slash => '/',
            Symbol::Ampersand => '&',
            Symbol::Pipe => '|',
            Symbol::LessThan => '<',
            Symbol::GreaterThan => '>',
            Symbol::Equal => '=',
            Symbol::Tilde => '~',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Keyword(Keyword),
    Symbol(Symbol),
    IntegerConstant(u16),
    StringConstant(String),
    Identifier(String),
}

impl Token {
    /// Element name used by the syntax analyzer's XML output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Keyword(_) => "keyword",
            Token::Symbol(_) => "symbol",
            Token::IntegerConstant(_) => "integerConstant",
            Token::StringConstant(_) => "stringConstant",
            Token::Identifier(_) => "identifier",
        }
    }

    /// The token's payload as text, string constants without their quotes.
    pub fn lexeme(&self) -> String {
        match self {
            Token::Keyword(k) => k.as_str().to_string(),
            Token::Symbol(s) => s.as_char().to_string(),
            Token::IntegerConstant(n) => n.to_string(),
            Token::StringConstant(s) | Token::Identifier(s) => s.clone(),
        }
    }
}

impl From<Keyword> for Token {
    fn from(k: Keyword) -> Self {
        Token::Keyword(k)
    }
}

impl From<Symbol> for Token {
    fn from(s: Symbol) -> Self {
        Token::Symbol(s)
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "keyword '{}'", k),
            Token::Symbol(s) => write!(f, "symbol '{}'", s),
            Token::IntegerConstant(n) => write!(f, "integer constant '{}'", n),
            Token::StringConstant(s) => write!(f, "string constant \"{}\"", s),
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
        }
    }
}
