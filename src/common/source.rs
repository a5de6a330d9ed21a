use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    rc::Rc,
};

/// A chunk of text moving through the toolchain, with the path it came
/// from serving as its name in diagnostics. Both halves of the pipeline
/// share it: the compile half reads TinyLisp forms out of one, and the
/// run half reads bytecode lines out of one. The `parse-sexprs`
/// primitive also wraps one around whatever string the running program
/// hands it; those have no file to point at and are named `<string>`.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub contents: String,
    pub path: PathBuf,
}

impl Source {
    /// Wraps a bare string, named `<string>`.
    pub fn source(contents: &str) -> Rc<Source> {
        Rc::new(Source {
            contents: contents.to_string(),
            path: PathBuf::from("<string>"),
        })
    }

    /// Reads a file into a new source.
    pub fn path(path: &Path) -> io::Result<Rc<Source>> {
        Ok(Rc::new(Source {
            contents: fs::read_to_string(path)?,
            path: path.to_owned(),
        }))
    }

    /// Drains standard input, for `compile` runs sitting in a pipeline.
    pub fn stdin() -> io::Result<Rc<Source>> {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;

        Ok(Rc::new(Source {
            contents,
            path: PathBuf::from("<stdin>"),
        }))
    }
}
