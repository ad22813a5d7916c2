//! Inline color markup
//!
//! Messages may carry `&`-prefixed escape tokens: `&-4` switches the
//! foreground to dark red, `&_a` the background to bright green, `&l` turns on
//! bold, `&r` resets. `format` renders tokens to ANSI sequences from an
//! injected palette; `clean` strips both the tokens and any ANSI sequences so
//! the same message can go to a color console and a plain file.

use crate::palette::{lookup_code, Code, Palette};

/// Pure text transform from markup to ANSI. No state beyond the palette,
/// safe to share across callers.
#[derive(Debug, Clone)]
pub struct MarkupFormatter {
    palette: Palette,
}

impl MarkupFormatter {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Replace every resolvable markup token with its ANSI sequence.
    ///
    /// Tokens that look like markup but do not resolve in the palette pass
    /// through untouched, so callers can emit literal `&x` sequences.
    pub fn format(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '&' {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            let Some(&key) = chars.get(i + 1) else {
                // trailing ampersand
                out.push('&');
                break;
            };
            match lookup_code(key) {
                Some(Code::Channel(channel)) => {
                    // two-character token: the channel key must be followed
                    // by a color key to resolve
                    match chars.get(i + 2).copied() {
                        Some(color_key) => match lookup_code(color_key) {
                            Some(Code::Color { hue, brightness }) => {
                                out.push_str(self.palette.color(brightness, channel, hue));
                                i += 3;
                            }
                            _ if color_key.is_ascii_alphanumeric() => {
                                // scanned as a full token but unresolvable
                                out.push('&');
                                out.push(key);
                                out.push(color_key);
                                i += 3;
                            }
                            _ => {
                                // bare channel key, nothing to resolve
                                out.push('&');
                                out.push(key);
                                i += 2;
                            }
                        },
                        None => {
                            out.push('&');
                            out.push(key);
                            i += 2;
                        }
                    }
                }
                Some(Code::Special(code)) => {
                    out.push_str(self.palette.special(code));
                    i += 2;
                }
                Some(Code::Format(code)) => {
                    out.push_str(self.palette.text_format(code));
                    i += 2;
                }
                // a lone color key is only meaningful after a channel key
                Some(Code::Color { .. }) | None => {
                    out.push('&');
                    out.push(key);
                    i += 2;
                }
            }
        }
        out
    }
}

/// Strip ANSI sequences and markup tokens, producing plain text suitable for
/// durable storage or markup-free re-display.
///
/// Every token matching the scanning pattern is removed whether or not it
/// resolves in any palette.
pub fn clean(text: &str) -> String {
    strip_tokens(&strip_ansi(text))
}

/// CSI-style final bytes: the character that terminates an escape sequence.
fn is_csi_final(c: char) -> bool {
    matches!(c,
        '0'..='9' | 'A'..='O' | 'R' | 'Z' | 'c' | 'f'..='n' | 'q' | 'r' | 'y' | '=' | '>' | '<')
}

/// Remove ANSI control sequences: an ESC (or single-byte CSI) introducer,
/// optional intermediates, optional `;`-separated parameters, and a final byte.
fn strip_ansi(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\u{1b}' && c != '\u{9b}' {
            out.push(c);
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j], '[' | '(' | ')' | '#' | ';' | '?') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            loop {
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ';' {
                    j += 1;
                } else {
                    break;
                }
            }
        }
        if j < chars.len() && is_csi_final(chars[j]) {
            i = j + 1;
        } else {
            // not a recognizable sequence, keep the introducer
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Remove every `&`-prefixed token: `&` plus one character, plus one more
/// when it is alphanumeric.
fn strip_tokens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        // a token never spans a line break
        if chars[i] == '&' && i + 1 < chars.len() && !matches!(chars[i + 1], '\n' | '\r') {
            let mut j = i + 2;
            if j < chars.len() && chars[j].is_ascii_alphanumeric() {
                j += 1;
            }
            i = j;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
