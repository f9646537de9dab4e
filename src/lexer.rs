//! Character cursor shared by the schema-text parser and the text rewrites.
//!
//! The schema language is scanned line by line with a forgiving cursor
//! instead of a token stream: any construct the cursor cannot recognize is
//! simply skipped, so a half-typed document still yields a renderable schema.

/// Identifier characters: Unicode alphanumerics and `_`.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Byte offset into the source.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// Skip whitespace (newlines included). Returns true if anything was skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        !self.eat_while(char::is_whitespace).is_empty()
    }

    pub fn eat_ident(&mut self) -> Option<&'a str> {
        let ident = self.eat_while(is_ident_char);
        (!ident.is_empty()).then_some(ident)
    }

    /// Consume everything up to `end` and the delimiter itself. Returns the
    /// text in between, or `None` (cursor untouched) if `end` never occurs.
    pub fn take_until(&mut self, end: &str) -> Option<&'a str> {
        let offset = self.rest().find(end)?;
        let taken = &self.rest()[..offset];
        self.pos += offset + end.len();
        Some(taken)
    }

    /// Consume the ASCII keyword `kw` (case-insensitive) if it sits at the
    /// cursor as a whole word.
    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        let rest = self.rest();
        if !starts_with_ignore_case(rest, kw)
            || rest[kw.len()..].chars().next().is_some_and(is_ident_char)
        {
            return false;
        }
        self.pos += kw.len();
        true
    }

    /// Advance past the next occurrence of the ASCII keyword `kw` that
    /// stands as a whole word (case-insensitive). Returns the keyword's start
    /// offset; on failure the cursor moves to end of input.
    pub fn find_keyword(&mut self, kw: &str) -> Option<usize> {
        let src = self.src;
        let mut prev = src[..self.pos].chars().next_back();
        for (offset, c) in src[self.pos..].char_indices() {
            let at = self.pos + offset;
            let boundary_before = !prev.is_some_and(is_ident_char);
            prev = Some(c);
            if !boundary_before || !starts_with_ignore_case(&src[at..], kw) {
                continue;
            }
            let after = at + kw.len();
            if src[after..].chars().next().is_some_and(is_ident_char) {
                continue;
            }
            self.pos = after;
            return Some(at);
        }
        self.pos = src.len();
        None
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_and_whitespace() {
        let mut c = Cursor::new("users  {");
        assert_eq!(c.eat_ident(), Some("users"));
        assert!(c.skip_whitespace());
        assert!(c.eat('{'));
        assert!(c.is_eof());
    }

    #[test]
    fn test_unicode_ident() {
        let mut c = Cursor::new("ユーザー 名前");
        assert_eq!(c.eat_ident(), Some("ユーザー"));
        c.skip_whitespace();
        assert_eq!(c.eat_ident(), Some("名前"));
    }

    #[test]
    fn test_find_keyword_respects_word_boundaries() {
        let mut c = Cursor::new("MyTable x; TableGroup y; table z");
        assert_eq!(c.find_keyword("table"), Some(25));
        assert_eq!(c.rest(), " z");
        assert_eq!(c.find_keyword("table"), None);
        assert!(c.is_eof());
    }

    #[test]
    fn test_eat_keyword() {
        let mut c = Cursor::new("TABLES table(");
        assert!(!c.eat_keyword("table"));
        c.eat_ident();
        c.skip_whitespace();
        assert!(c.eat_keyword("TABLE"));
        assert_eq!(c.peek(), Some('('));
    }

    #[test]
    fn test_take_until_missing_delimiter() {
        let mut c = Cursor::new("a int\nb int");
        assert_eq!(c.take_until("}"), None);
        assert_eq!(c.pos(), 0);
        assert_eq!(c.take_until("\n"), Some("a int"));
        assert_eq!(c.rest(), "b int");
    }
}
