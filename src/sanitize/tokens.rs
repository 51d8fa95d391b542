//! Token stream of an HTML fragment, produced by the html5ever tokenizer.
//!
//! Entities in text and attribute values are decoded. Text inside `<script>`
//! and `<style>` is consumed as raw text and never emitted.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    self, BufferQueue, TagKind, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::{Cell, RefCell};

/// A single token of an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Opening (or void) tag with lowercase name and decoded attributes
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Closing tag with lowercase name
    End { name: String },
    /// Decoded text run
    Text(String),
}

impl Token {
    /// Look up an attribute value on a start tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::Start { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Split `html` into tags and text runs.
///
/// Adjacent text is merged into one run. Comments, doctypes and parse errors
/// are dropped; malformed markup is recovered the way a browser would.
pub fn tokenize(html: &str) -> Vec<Token> {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let tokenizer = Tokenizer::new(Collector::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.tokens.take()
}

#[derive(Default)]
struct Collector {
    tokens: RefCell<Vec<Token>>,
    in_raw_text: Cell<bool>,
}

impl Collector {
    fn push_text(&self, text: &str) {
        if text.is_empty() || self.in_raw_text.get() {
            return;
        }
        let mut tokens = self.tokens.borrow_mut();
        if let Some(Token::Text(prev)) = tokens.last_mut() {
            prev.push_str(text);
        } else {
            tokens.push(Token::Text(text.to_string()));
        }
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&self, token: tokenizer::Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            tokenizer::Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let raw = match name.as_str() {
                            "script" => Some(RawKind::ScriptData),
                            "style" => Some(RawKind::Rawtext),
                            _ => None,
                        };
                        let attrs = tag
                            .attrs
                            .into_iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect();
                        self.tokens.borrow_mut().push(Token::Start { name, attrs });
                        if let Some(kind) = raw {
                            self.in_raw_text.set(true);
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => {
                        if matches!(name.as_str(), "script" | "style") {
                            self.in_raw_text.set(false);
                        }
                        self.tokens.borrow_mut().push(Token::End { name });
                    }
                }
            }
            tokenizer::Token::CharacterTokens(text) => self.push_text(&text),
            tokenizer::Token::NullCharacterToken => self.push_text("\u{FFFD}"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
