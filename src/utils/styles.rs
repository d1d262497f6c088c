//! Used to color and otherwise style various bits of output using a
//! ~/.dwarfview/styles.tcss file.
use std::fs::OpenOptions;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::sync::LazyLock;
use std::{fs, path::PathBuf};
use termio::prelude::*;
use termio::{StyledString, Termio};

/// Create the style file if it is missing.
pub fn generate_style_file() {
    if let Some(mut path) = dirs::home_dir() {
        path.push(".dwarfview");
        if make_dir(&path) {
            path.push("styles.tcss");
            default_styles(path);
        }
    } else {
        println!("couldn't find home directory"); // don't use warn() here
    }
}

pub trait Styling {
    fn explain_title(self) -> StyledString;
    fn explain_text(self) -> StyledString;
    fn hex_offset(self) -> StyledString;
    fn hex_hex(self) -> StyledString;
    fn hex_ascii(self) -> StyledString;
    fn table_header(self) -> StyledString;
    fn table_sep(self) -> StyledString;
    fn table_field(self) -> StyledString;
    fn tree_tag(self) -> StyledString;
    fn tree_attr(self) -> StyledString;
    fn code_keyword(self) -> StyledString;
    fn code_identifier(self) -> StyledString;
    fn code_literal(self) -> StyledString;
    fn code_comment(self) -> StyledString;
    fn code_punctuation(self) -> StyledString;
    fn warn(self) -> StyledString;
}

// Each method maps onto an element in the tcss file.
macro_rules! impl_styling {
    ($t:ty) => {
        impl Styling for $t {
            fn explain_title(self) -> StyledString {
                self.style("explain title", &TCSS)
            }

            fn explain_text(self) -> StyledString {
                self.style("explain text", &TCSS)
            }

            fn hex_offset(self) -> StyledString {
                self.style("hex offset", &TCSS)
            }

            fn hex_hex(self) -> StyledString {
                self.style("hex hex", &TCSS)
            }

            fn hex_ascii(self) -> StyledString {
                self.style("hex ascii", &TCSS)
            }

            fn table_header(self) -> StyledString {
                self.style("table header", &TCSS)
            }

            fn table_sep(self) -> StyledString {
                self.style("table separator", &TCSS)
            }

            fn table_field(self) -> StyledString {
                self.style("table field", &TCSS)
            }

            fn tree_tag(self) -> StyledString {
                self.style("tree tag", &TCSS)
            }

            fn tree_attr(self) -> StyledString {
                self.style("tree attribute", &TCSS)
            }

            fn code_keyword(self) -> StyledString {
                self.style("code keyword", &TCSS)
            }

            fn code_identifier(self) -> StyledString {
                self.style("code identifier", &TCSS)
            }

            fn code_literal(self) -> StyledString {
                self.style("code literal", &TCSS)
            }

            fn code_comment(self) -> StyledString {
                self.style("code comment", &TCSS)
            }

            fn code_punctuation(self) -> StyledString {
                self.style("code punctuation", &TCSS)
            }

            fn warn(self) -> StyledString {
                self.style("warn", &TCSS)
            }
        }
    };
}

impl_styling!(String);
impl_styling!(&str);

static TCSS: LazyLock<Termio> = LazyLock::new(|| {
    if let Some(mut path) = dirs::home_dir() {
        path.push(".dwarfview");
        path.push("styles.tcss");
        let os_path = path.to_string_lossy().into_owned();
        match Termio::from_file(&os_path) {
            Ok(tcss) => tcss,
            Err(err) => {
                println!("could't parse file at {os_path}: {err}"); // don't use warn() here
                Termio::new()
            }
        }
    } else {
        Termio::new() // we'll have warned about this already
    }
});

fn make_dir(path: &Path) -> bool {
    match fs::create_dir(path) {
        Ok(_) => true,
        Err(err) => match err.kind() {
            io::ErrorKind::AlreadyExists => true,
            _ => {
                println!("could't create path for {}: {err}", path.display()); // don't use warn() here
                false
            }
        },
    }
}

fn default_styles(path: PathBuf) {
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path.clone())
    {
        Ok(mut file) => {
            let defaults = include_str!("default.tcss");
            if let Err(err) = file.write_all(defaults.as_bytes()) {
                println!("error writing defaults to {}: {err}", path.display());
            }
        }
        Err(err) => match err.kind() {
            io::ErrorKind::AlreadyExists => (), // user already has a styles file
            _ => println!("error creating {}: {err}", path.display()), // don't use warn() here
        },
    }
}
