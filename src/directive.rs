//! Directive keys inside a section.
//!
//! Any key starting with `@` is a directive. `@Inherits` splices referenced
//! sections; every other `@name` invokes the macro `name`.

/// The inheritance directive key.
pub const INHERITS_KEY: &str = "@Inherits";

const DIRECTIVE_PREFIX: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind<'a> {
    Inherit,
    /// Macro invocation; carries the macro name without the `@`.
    Macro(&'a str),
    /// An ordinary key.
    None,
}

impl<'a> DirectiveKind<'a> {
    pub fn classify(key: &'a str) -> Self {
        if key == INHERITS_KEY {
            return DirectiveKind::Inherit;
        }
        match key.strip_prefix(DIRECTIVE_PREFIX) {
            Some(name) => DirectiveKind::Macro(name),
            None => DirectiveKind::None,
        }
    }
}
