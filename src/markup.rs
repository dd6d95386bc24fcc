//! Conversion between [`StyledText`] and the HTML subset stored in the
//! `formattedContent` column.
//!
//! The encoder writes `<span style="color:..;">`, `<b>`, `<i>` (nested in
//! that order), `<br>` for line breaks and entity-escapes `&`, `<`, `>`
//! and carriage returns.
//! The decoder accepts that grammar plus `<strong>`, `<em>`, `<font color>`
//! and `<p>` blocks. Anything else is skipped, its text kept, and the
//! result flagged as degraded. Decoding never fails.

use crate::styled::{ActiveStyles, StyleKind, StyledRange, StyledText, TextColor};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use log::debug;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Clean,
    /// Input contained markup outside the supported grammar; the result is
    /// a best-effort recovery.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: StyledText,
    pub status: DecodeStatus,
}

impl Decoded {
    pub fn is_degraded(&self) -> bool {
        self.status == DecodeStatus::Degraded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper {
    Color(TextColor),
    Bold,
    Italic,
}

impl Wrapper {
    fn open(&self, out: &mut String) {
        match self {
            Wrapper::Color(color) => {
                out.push_str("<span style=\"color:");
                out.push_str(&color.to_string());
                out.push_str(";\">");
            }
            Wrapper::Bold => out.push_str("<b>"),
            Wrapper::Italic => out.push_str("<i>"),
        }
    }

    fn close(&self, out: &mut String) {
        match self {
            Wrapper::Color(_) => out.push_str("</span>"),
            Wrapper::Bold => out.push_str("</b>"),
            Wrapper::Italic => out.push_str("</i>"),
        }
    }
}

fn wrappers(style: &ActiveStyles) -> Vec<Wrapper> {
    let mut wanted = Vec::with_capacity(3);
    if let Some(color) = style.color {
        wanted.push(Wrapper::Color(color));
    }
    if style.bold {
        wanted.push(Wrapper::Bold);
    }
    if style.italic {
        wanted.push(Wrapper::Italic);
    }
    wanted
}

pub fn encode(text: &StyledText) -> String {
    let mut out = String::with_capacity(text.text().len() + 16);
    let mut open: Vec<Wrapper> = Vec::new();
    for run in text.runs() {
        let wanted = wrappers(&run.style);
        let keep = open
            .iter()
            .zip(&wanted)
            .take_while(|(current, next)| current == next)
            .count();
        while open.len() > keep {
            if let Some(wrapper) = open.pop() {
                wrapper.close(&mut out);
            }
        }
        for wrapper in &wanted[keep..] {
            wrapper.open(&mut out);
            open.push(*wrapper);
        }
        escape_into(text.slice(run.start, run.end), &mut out);
    }
    while let Some(wrapper) = open.pop() {
        wrapper.close(&mut out);
    }
    out
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
}

/// Text content of `markup` with all styling dropped.
pub fn to_plain_text(markup: &str) -> String {
    decode(markup).text.text().to_string()
}

#[derive(Debug)]
enum MarkupToken {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End(String),
    Text(String),
    ParseError,
    Foreign,
}

struct TokenCollector {
    tokens: RefCell<Vec<MarkupToken>>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut tokens = self.tokens.borrow_mut();
        let converted = match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => MarkupToken::Start {
                        name,
                        attrs: tag
                            .attrs
                            .iter()
                            .map(|a| (a.name.local.to_string(), a.value.to_string()))
                            .collect(),
                        self_closing: tag.self_closing,
                    },
                    TagKind::EndTag => MarkupToken::End(name),
                }
            }
            Token::CharacterTokens(text) => {
                // a lone CR can only come from `&#13;`, raw CR arrives as LF
                if &*text == "\r" {
                    forgive_last_error(&mut tokens);
                }
                MarkupToken::Text(text.to_string())
            }
            Token::NullCharacterToken => {
                forgive_last_error(&mut tokens);
                MarkupToken::Text("\0".to_string())
            }
            Token::ParseError(_) => MarkupToken::ParseError,
            Token::EOFToken => return TokenSinkResult::Continue,
            _ => MarkupToken::Foreign,
        };
        tokens.push(converted);
        TokenSinkResult::Continue
    }
}

/// The tokenizer reports NUL and control character references as parse
/// errors right before emitting the character. Both are plain text to us.
fn forgive_last_error(tokens: &mut Vec<MarkupToken>) {
    if matches!(tokens.last(), Some(MarkupToken::ParseError)) {
        tokens.pop();
    }
}

fn tokenize(markup: &str) -> Vec<MarkupToken> {
    let sink = TokenCollector {
        tokens: RefCell::new(Vec::new()),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from(markup));
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();
    tokenizer.sink.tokens.into_inner()
}

struct OpenTag {
    name: String,
    kind: Option<StyleKind>,
    start: usize,
    order: usize,
}

#[derive(Default)]
struct DecodeState {
    text: String,
    len: usize,
    open: Vec<OpenTag>,
    closed: Vec<(usize, StyledRange)>,
    opened: usize,
    in_paragraph: bool,
    saw_paragraph: bool,
    degraded: bool,
}

impl DecodeState {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }

    fn start_tag(&mut self, name: String, attrs: &[(String, String)], self_closing: bool) {
        let kind = match name.as_str() {
            "br" => {
                self.push_text("\n");
                return;
            }
            "p" | "div" => {
                if self.len > 0 && !self.text.ends_with('\n') {
                    self.push_text("\n");
                }
                self.in_paragraph = true;
                self.saw_paragraph = true;
                return;
            }
            "b" | "strong" => Some(StyleKind::Bold),
            "i" | "em" => Some(StyleKind::Italic),
            "span" => attr(attrs, "style")
                .and_then(color_from_style)
                .map(StyleKind::Foreground),
            "font" => attr(attrs, "color")
                .and_then(|value| value.parse::<TextColor>().ok())
                .map(StyleKind::Foreground),
            _ => {
                self.degraded = true;
                return;
            }
        };
        if kind.is_none() {
            // span/font without a usable color still needs to match its end tag
            self.degraded = true;
        }
        if self_closing {
            self.degraded = true;
            return;
        }
        self.open.push(OpenTag {
            name,
            kind,
            start: self.len,
            order: self.opened,
        });
        self.opened += 1;
    }

    fn end_tag(&mut self, name: &str) {
        if matches!(name, "p" | "div") {
            self.in_paragraph = false;
            return;
        }
        match self.open.iter().rposition(|tag| tag.name == name) {
            Some(pos) => {
                if pos + 1 != self.open.len() {
                    self.degraded = true;
                }
                let tag = self.open.remove(pos);
                self.close(tag);
            }
            None => self.degraded = true,
        }
    }

    fn close(&mut self, tag: OpenTag) {
        if let Some(kind) = tag.kind {
            if tag.start < self.len {
                self.closed
                    .push((tag.order, StyledRange::new(kind, tag.start, self.len)));
            }
        }
    }

    fn finish(mut self) -> Decoded {
        if !self.open.is_empty() {
            self.degraded = true;
            let remaining: Vec<OpenTag> = self.open.drain(..).collect();
            for tag in remaining {
                self.close(tag);
            }
        }
        // outer tags open first, so inner colors are applied last and win
        self.closed.sort_by_key(|(order, _)| *order);
        let ranges = self.closed.iter().map(|(_, range)| *range);
        let (text, degraded) = match StyledText::from_parts(self.text.clone(), ranges) {
            Ok(text) => (text, self.degraded),
            Err(_) => (StyledText::new(self.text), true),
        };
        let status = if degraded {
            DecodeStatus::Degraded
        } else {
            DecodeStatus::Clean
        };
        Decoded { text, status }
    }
}

pub fn decode(markup: &str) -> Decoded {
    let mut state = DecodeState::default();
    for token in tokenize(markup) {
        match token {
            MarkupToken::Start {
                name,
                attrs,
                self_closing,
            } => state.start_tag(name, &attrs, self_closing),
            MarkupToken::End(name) => state.end_tag(&name),
            MarkupToken::Text(text) => {
                let between_blocks = state.saw_paragraph && !state.in_paragraph;
                if between_blocks && text.chars().all(char::is_whitespace) {
                    continue;
                }
                state.push_text(&text);
            }
            MarkupToken::ParseError | MarkupToken::Foreign => state.degraded = true,
        }
    }
    let decoded = state.finish();
    if decoded.is_degraded() {
        debug!(
            "markup decoded with degraded fidelity ({} chars recovered)",
            decoded.text.len()
        );
    }
    decoded
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

fn color_from_style(style: &str) -> Option<TextColor> {
    style.split(';').find_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        if property.trim().eq_ignore_ascii_case("color") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
