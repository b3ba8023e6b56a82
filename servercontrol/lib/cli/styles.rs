use clap::builder::styling::{AnsiColor, Effects, Style, Styles};
use std::{
    fmt::Write,
    io::{self, IsTerminal},
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

#[cfg(not(test))]
/// Whether stdout is an ANSI-capable interactive terminal
static IS_ANSI_TERMINAL: std::sync::LazyLock<bool> =
    std::sync::LazyLock::new(is_ansi_interactive_terminal);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns a `Styles` object with the default styles for the CLI.
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default() | Effects::BOLD)
        .invalid(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Whether stdout is a terminal that understands ANSI escapes.
pub fn is_ansi_interactive_terminal() -> bool {
    io::stdout().is_terminal() && !is_dumb_terminal()
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM").map(|term| term == "dumb").unwrap_or(false)
}

fn apply_style(text: String, style: &Style) -> String {
    #[cfg(not(test))]
    if !*IS_ANSI_TERMINAL {
        return text;
    }

    #[cfg(test)]
    if is_dumb_terminal() {
        return text;
    }

    let mut styled = String::with_capacity(text.len() + 20);
    let _ = write!(styled, "{}", style);
    styled.push_str(&text);
    let _ = write!(styled, "{}", style.render_reset());
    styled
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A trait for applying Styles defined in [`styles`] to text.
pub trait AnsiStyles {
    /// Apply header style to text
    fn header(&self) -> String;

    /// Apply literal style to text
    fn literal(&self) -> String;

    /// Apply placeholder style to text
    fn placeholder(&self) -> String;

    /// Apply error style to text
    fn error(&self) -> String;

    /// Apply valid style to text
    fn valid(&self) -> String;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl AnsiStyles for str {
    fn header(&self) -> String {
        apply_style(self.to_string(), styles().get_header())
    }

    fn literal(&self) -> String {
        apply_style(self.to_string(), styles().get_literal())
    }

    fn placeholder(&self) -> String {
        apply_style(self.to_string(), styles().get_placeholder())
    }

    fn error(&self) -> String {
        apply_style(self.to_string(), styles().get_error())
    }

    fn valid(&self) -> String {
        apply_style(self.to_string(), styles().get_valid())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------


#[cfg(test)]
mod helper {
    use std::env;

    pub(super) fn setup_non_interactive() {
        env::set_var("TERM", "dumb");
    }

    pub(super) fn setup_interactive() {
        env::set_var("TERM", "xterm-256color");
    }
}
