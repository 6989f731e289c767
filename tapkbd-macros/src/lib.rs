//! `layout!` turns a pipe-delimited table into a `[[KeyAction; COLS]; ROWS]` literal.
//!
//! ```ignore
//! const BASE: [[KeyAction; 4]; 2] = layout! { r#"
//!     | Esc  | Q           | W  | HT(E,LCtl) |
//!     | LSft | LT(1,Space) | "" | LSft+1     |
//! "# };
//! ```
//!
//! Cells hold a key name, nothing (`NoOp`), `Trn`, `MO(n)`, `TG(n)`, `LT(n,Key)`,
//! `HT(Tap,Hold)` or `Modifier+Key`. Unknown names fail to compile.
use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_macro_input, LitStr};

macro_rules! key {
    ($n:tt, $i:ident) => {
        ($n, quote!(::tapkbd::keyboard::Key::$i))
    };
    ($i:ident) => {
        (stringify!($i), quote!(::tapkbd::keyboard::Key::$i))
    };
}

type KeyTable = HashMap<&'static str, TokenStream>;

fn key_table() -> KeyTable {
    [
        key!(A),
        key!(B),
        key!(C),
        key!(D),
        key!(E),
        key!(F),
        key!(G),
        key!(H),
        key!(I),
        key!(J),
        key!(K),
        key!(L),
        key!(M),
        key!(N),
        key!(O),
        key!(P),
        key!(Q),
        key!(R),
        key!(S),
        key!(T),
        key!(U),
        key!(V),
        key!(W),
        key!(X),
        key!(Y),
        key!(Z),
        key!("1", Digit1_Exclamation),
        key!("2", Digit2_At),
        key!("3", Digit3_Number),
        key!("4", Digit4_Dollar),
        key!("5", Digit5_Percent),
        key!("6", Digit6_Circumflex),
        key!("7", Digit7_Ampersand),
        key!("8", Digit8_Asterisk),
        key!("9", Digit9_LeftParenthesis),
        key!("0", Digit0_RightParenthesis),
        key!(Enter),
        key!("Esc", Escape),
        key!("Del", Delete),
        key!("BSpc", Delete),
        key!(Tab),
        key!(Space),
        key!("-", HyphenMinus_LowLine),
        key!("=", Equal_Plus),
        key!("[", LeftSquareBracket_LeftCurlyBracket),
        key!("]", RightSquareBracket_RightCurlyBracket),
        key!("\\", Backslash_VerticalBar),
        key!(";", Semicolon_Colon),
        key!("'", Apostrophe_Quotation),
        key!("`", Grave_Tilde),
        key!(",", Comma_LessThan),
        key!(".", Period_GreaterThan),
        key!("/", Slash_Question),
        key!("Caps", CapsLock),
        key!(F1),
        key!(F2),
        key!(F3),
        key!(F4),
        key!(F5),
        key!(F6),
        key!(F7),
        key!(F8),
        key!(F9),
        key!(F10),
        key!(F11),
        key!(F12),
        key!("PrScr", PrintScreen),
        key!("ScLck", ScrollLock),
        key!(Pause),
        key!("Ins", Insert),
        key!(Home),
        key!("PgUp", PageUp),
        key!("DelFw", DeleteForward),
        key!(End),
        key!("PgDn", PageDown),
        key!("Right", RightArrow),
        key!("Left", LeftArrow),
        key!("Down", DownArrow),
        key!("Up", UpArrow),
        key!("LCtl", LeftControl),
        key!("LSft", LeftShift),
        key!("LAlt", LeftAlt),
        key!("LGui", LeftGui),
        key!("RCtl", RightControl),
        key!("RSft", RightShift),
        key!("RAlt", RightAlt),
        key!("RGui", RightGui),
        key!("MPlay", MediaPlay),
        key!("MPau", MediaPause),
        key!("MNext", MediaNextTrack),
        key!("MPrev", MediaPrevTrack),
        key!("MStop", MediaStop),
        key!("MPlPs", MediaPlayPause),
        key!("MMute", MediaMute),
        key!("MVlUp", MediaVolumeIncrement),
        key!("MVlDn", MediaVolumeDecrement),
        key!("~", Tilde),
        key!("!", Exclamation),
        key!("@", At),
        key!("#", Hash),
        key!("$", Dollar),
        key!("%", Percent),
        key!("^", Circumflex),
        key!("&", Ampersand),
        key!("*", Asterisk),
        key!("(", LeftParenthesis),
        key!(")", RightParenthesis),
        key!("_", LowLine),
        key!("+", Plus),
        key!("{", LeftCurlyBracket),
        key!("}", RightCurlyBracket),
        key!("Pipe", VerticalBar),
        key!(":", Colon),
        key!("\"", Quotation),
        key!("<", LessThan),
        key!(">", GreaterThan),
        key!("?", Question),
    ]
    .into_iter()
    .collect()
}

#[proc_macro]
pub fn layout(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as LitStr).value();
    let table = key_table();

    let rows = input
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let cells = split_cells(line)
                .into_iter()
                .map(|cell| match action(&table, cell) {
                    Ok(action) => action,
                    Err(message) => quote!(compile_error!(#message)),
                })
                .map(|t| quote! {#t,})
                .collect::<TokenStream>();
            quote! {
                [#cells]
            }
        })
        .map(|t| quote! {#t,})
        .collect::<TokenStream>();

    let expanded = quote! {
        [#rows]
    };

    proc_macro::TokenStream::from(expanded)
}

/// Cells between the outer pipes. `""` is an explicitly empty cell.
fn split_cells(line: &str) -> Vec<&str> {
    let mut cells = line.split('|').map(str::trim).collect::<Vec<_>>();
    if cells.first() == Some(&"") {
        cells.remove(0);
    }
    if cells.last() == Some(&"") {
        cells.pop();
    }
    cells
        .into_iter()
        .map(|cell| if cell == "\"\"" { "" } else { cell })
        .collect()
}

fn action(table: &KeyTable, cell: &str) -> Result<TokenStream, String> {
    let action = quote!(::tapkbd::keyboard::KeyAction);
    if cell.is_empty() {
        return Ok(quote!(#action::NoOp));
    }
    if cell == "Trn" {
        return Ok(quote!(#action::Transparent));
    }
    if let Ok(key) = key(table, cell) {
        return Ok(quote!(#action::Key(#key)));
    }
    if let Some(args) = arguments(cell, "MO") {
        let layer = layer(args)?;
        return Ok(quote!(#action::Momentary(#layer)));
    }
    if let Some(args) = arguments(cell, "TG") {
        let layer = layer(args)?;
        return Ok(quote!(#action::LayerToggle(#layer)));
    }
    if let Some(args) = arguments(cell, "LT") {
        let (layer_arg, key_arg) = args
            .split_once(',')
            .ok_or_else(|| format!("layout: LT needs a layer and a key: {}", cell))?;
        let layer = layer(layer_arg)?;
        let key = key(table, key_arg.trim())?;
        return Ok(quote!(#action::LayerTap(#layer, #key)));
    }
    if let Some(args) = arguments(cell, "HT") {
        let (tap, hold) = args
            .rsplit_once(',')
            .ok_or_else(|| format!("layout: HT needs a tap key and a hold key: {}", cell))?;
        let tap = key(table, tap.trim())?;
        let hold = key(table, hold.trim())?;
        return Ok(quote!(#action::HoldTap(#tap, #hold)));
    }
    if let Some((modifier, modified)) = cell.split_once('+') {
        let modifier = key(table, modifier.trim())?;
        let modified = key(table, modified.trim())?;
        return Ok(quote!(#action::Modified(#modifier, #modified)));
    }
    Err(format!("layout: Unknown symbol: {}", cell))
}

fn key(table: &KeyTable, name: &str) -> Result<TokenStream, String> {
    table
        .get(name)
        .cloned()
        .ok_or_else(|| format!("layout: Unknown symbol: {}", name))
}

/// `"MO(1)"` with `"MO"` gives `Some("1")`.
fn arguments<'a>(cell: &'a str, name: &str) -> Option<&'a str> {
    cell.strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn layer(arg: &str) -> Result<u8, String> {
    arg.trim()
        .parse()
        .map_err(|_| format!("layout: Invalid layer: {}", arg))
}
